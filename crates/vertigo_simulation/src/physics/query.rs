//! `PhysicsQuery`: единственная точка доступа к геометрии мира.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

/// Форма probe'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeShape {
    Ray,
    Sphere { radius: f32 },
    /// Вертикальная капсула (ось Y), `half_height`: половина цилиндра
    Capsule { half_height: f32, radius: f32 },
}

/// Результат cast'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Точка контакта на поверхности (world space)
    pub point: Vec3,
    /// Нормаль поверхности в точке контакта (unit)
    pub normal: Vec3,
    /// Пройденная дистанция вдоль direction
    pub distance: f32,
    /// Entity collider'а (None для анонимной геометрии)
    pub entity: Option<Entity>,
}

impl ProbeHit {
    /// Угол нормали от вертикали (градусы)
    pub fn slope_degrees(&self) -> f32 {
        self.normal.angle_between(Vec3::Y).to_degrees()
    }
}

/// Synchronous physics queries (sphereCast / capsuleCast / raycast).
///
/// `direction` нормализуется реализацией; нулевой direction → `None`.
pub trait PhysicsQuery {
    fn cast(
        &self,
        shape: ProbeShape,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit>;

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: Group) -> Option<ProbeHit> {
        self.cast(ProbeShape::Ray, origin, direction, max_distance, mask)
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit> {
        self.cast(ProbeShape::Sphere { radius }, origin, direction, max_distance, mask)
    }

    fn capsule_cast(
        &self,
        origin: Vec3,
        half_height: f32,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit> {
        self.cast(
            ProbeShape::Capsule { half_height, radius },
            origin,
            direction,
            max_distance,
            mask,
        )
    }
}
