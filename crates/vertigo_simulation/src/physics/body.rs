//! Character body: габариты капсулы + коммит movement delta
//!
//! Архитектура:
//! - Locomotion state machine решает КУДА двигаться (MotionIntent)
//! - integrate_motion коммитит delta в Transform, не давая капсуле уйти
//!   сквозь статичный мир (sweep по горизонтали и вертикали)
//!
//! Коллизии в игре остаются за движком; sweep здесь: минимальный
//! kinematic контроллер для headless симуляции.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::backend::ProbeBackend;
use super::layers::MASK_WORLD;
use super::query::PhysicsQuery;
use super::scene::ProbeScene;
use crate::lifecycle::SimulationPause;

/// Зазор между капсулой и геометрией после sweep
const SKIN: f32 = 0.02;

/// Габариты капсулы персонажа
///
/// Transform.translation: центр капсулы.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CharacterBody {
    /// Полная высота (метры)
    pub height: f32,
    pub radius: f32,
}

impl Default for CharacterBody {
    fn default() -> Self {
        Self {
            height: 2.0,
            radius: 0.5,
        }
    }
}

impl CharacterBody {
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Нижняя точка капсулы
    pub fn feet(&self, center: Vec3) -> Vec3 {
        center - Vec3::Y * self.half_height()
    }

    pub fn head(&self, center: Vec3) -> Vec3 {
        center + Vec3::Y * (self.half_height() - self.radius * 0.5)
    }

    /// Уровень груди (origin для wall probes)
    pub fn chest(&self, center: Vec3) -> Vec3 {
        center + Vec3::Y * 0.5
    }
}

/// Горизонтальные оси персонажа (forward, right) по yaw, без наклона
///
/// Forward: `-Z` локально (Bevy convention).
pub fn planar_axes(rotation: Quat) -> (Vec3, Vec3) {
    let forward = rotation * Vec3::NEG_Z;
    let forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z);
    (forward, forward.cross(Vec3::Y))
}

/// Yaw-only ориентация, смотрящая вдоль `forward` (вертикаль игнорируется)
pub fn yaw_rotation(forward: Vec3) -> Quat {
    let planar = Vec3::new(forward.x, 0.0, forward.z);
    if planar.length_squared() < 1e-6 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(f32::atan2(-planar.x, -planar.z))
}

/// Намерение движения на текущий tick (пишет locomotion, читает integrate_motion)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MotionIntent {
    /// World-space displacement за tick
    pub delta: Vec3,
    /// Целевая ориентация (None: не менять)
    pub rotation: Option<Quat>,
    /// Телепорт без sweep (mantle interpolation)
    pub kinematic: bool,
}

/// Sweep капсулы: горизонталь на уровне груди, вертикаль нижней/верхней сферой.
///
/// Возвращает новую позицию центра.
pub fn sweep_motion(physics: &dyn PhysicsQuery, center: Vec3, delta: Vec3, body: &CharacterBody) -> Vec3 {
    let mut position = center;

    let horizontal = Vec3::new(delta.x, 0.0, delta.z);
    let horizontal_distance = horizontal.length();
    if horizontal_distance > f32::EPSILON {
        let direction = horizontal / horizontal_distance;
        let allowed = physics
            .sphere_cast(body.chest(position), body.radius * 0.9, direction, horizontal_distance + SKIN, MASK_WORLD)
            .map(|hit| (hit.distance - SKIN).max(0.0))
            .unwrap_or(horizontal_distance);
        position += direction * allowed.min(horizontal_distance);
    }

    let vertical_distance = delta.y.abs();
    if vertical_distance > f32::EPSILON {
        let direction = Vec3::Y * delta.y.signum();
        // Центр нижней (или верхней) сферы капсулы
        let sphere_offset = body.half_height() - body.radius;
        let origin = position + direction * sphere_offset;
        let allowed = physics
            .sphere_cast(origin, body.radius, direction, vertical_distance + SKIN, MASK_WORLD)
            .map(|hit| (hit.distance - SKIN).max(0.0))
            .unwrap_or(vertical_distance);
        position += direction * allowed.min(vertical_distance);
    }

    position
}

/// Система: коммит MotionIntent → Transform
///
/// Работает в FixedUpdate после locomotion.
pub fn integrate_motion(
    mut query: Query<(Entity, &CharacterBody, &mut MotionIntent, &mut Transform)>,
    backend: ProbeBackend,
    pause: Res<SimulationPause>,
) {
    if pause.is_paused() {
        return;
    }

    for (entity, body, mut intent, mut transform) in query.iter_mut() {
        let delta = std::mem::take(&mut intent.delta);

        if intent.kinematic {
            transform.translation += delta;
        } else if delta != Vec3::ZERO {
            let current = transform.translation;
            // Нет backend'а → двигаемся без sweep (движок сам разрешит коллизии)
            transform.translation = backend
                .with_query(Some(entity), |physics| sweep_motion(physics, current, delta, body))
                .unwrap_or(current + delta);
        }

        if let Some(rotation) = intent.rotation.take() {
            transform.rotation = rotation;
        }
        intent.kinematic = false;
    }
}

/// Компонент: collider, дублируемый в ProbeScene (headless vision/contacts)
///
/// Сфера радиуса `radius` на слое `layer`, центр: Transform.translation.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneProxy {
    pub radius: f32,
    pub layer: Group,
}

/// Система: синхронизирует proxy-сферы ProbeScene с Transform
///
/// Новые proxy регистрируются в сцене при первом проходе.
pub fn sync_scene_proxies(
    scene: Option<ResMut<ProbeScene>>,
    proxies: Query<(Entity, &Transform, &SceneProxy)>,
) {
    let Some(mut scene) = scene else {
        return;
    };
    for (entity, transform, proxy) in proxies.iter() {
        scene.upsert_sphere(entity, transform.translation, proxy.radius, proxy.layer);
    }
}

/// Spawn helper: Rapier collider для персонажа
///
/// Kinematic capsule; membership/mask задаются `groups`.
pub fn spawn_character_collider(body: &CharacterBody, groups: CollisionGroups) -> impl Bundle {
    (
        RigidBody::KinematicPositionBased,
        Collider::capsule_y((body.half_height() - body.radius).max(0.0), body.radius),
        groups,
    )
}
