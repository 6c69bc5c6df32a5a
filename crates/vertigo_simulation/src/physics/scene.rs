//! ProbeScene: аналитическая геометрия для headless симуляции
//!
//! Плоскости (half-space), axis-aligned boxes и сферы. Sphere cast считается
//! как ray cast против геометрии, раздутой на радиус probe'а (точно для
//! граней, консервативно на рёбрах box'ов). Capsule cast: три sphere cast'а
//! (низ, центр, верх), берётся ближайший hit.
//!
//! Collider'ы, внутри которых probe стартует, игнорируются (как в движковых
//! sphere cast'ах).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

use super::query::{PhysicsQuery, ProbeHit, ProbeShape};

const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolidShape {
    /// Бесконечная плоскость, всё что ниже (против normal): твёрдое
    Plane { point: Vec3, normal: Vec3 },
    /// Axis-aligned box
    Cuboid { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSolid {
    pub shape: SolidShape,
    pub layer: Group,
    pub entity: Option<Entity>,
}

/// Статичная сцена для probes
#[derive(Resource, Debug, Clone, Default)]
pub struct ProbeScene {
    solids: Vec<SceneSolid>,
}

impl ProbeScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, solid: SceneSolid) -> &mut Self {
        self.solids.push(solid);
        self
    }

    pub fn with_plane(mut self, point: Vec3, normal: Vec3, layer: Group) -> Self {
        self.add(SceneSolid {
            shape: SolidShape::Plane {
                point,
                normal: normal.normalize_or(Vec3::Y),
            },
            layer,
            entity: None,
        });
        self
    }

    pub fn with_cuboid(mut self, center: Vec3, half_extents: Vec3, layer: Group, entity: Option<Entity>) -> Self {
        self.add(SceneSolid {
            shape: SolidShape::Cuboid { center, half_extents },
            layer,
            entity,
        });
        self
    }

    pub fn with_sphere(mut self, center: Vec3, radius: f32, layer: Group, entity: Option<Entity>) -> Self {
        self.add(SceneSolid {
            shape: SolidShape::Sphere { center, radius },
            layer,
            entity,
        });
        self
    }

    /// Двигает сферу, привязанную к entity; нет такой: добавляет
    pub fn upsert_sphere(&mut self, entity: Entity, center: Vec3, radius: f32, layer: Group) {
        let mut found = false;
        for solid in self.solids.iter_mut().filter(|s| s.entity == Some(entity)) {
            if let SolidShape::Sphere { center: c, .. } = &mut solid.shape {
                *c = center;
                found = true;
            }
        }
        if !found {
            self.add(SceneSolid {
                shape: SolidShape::Sphere { center, radius },
                layer,
                entity: Some(entity),
            });
        }
    }

    /// Убирает все solids entity (разрушенная поверхность)
    pub fn remove_entity(&mut self, entity: Entity) {
        self.solids.retain(|s| s.entity != Some(entity));
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    fn sphere_cast_nearest(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit> {
        self.solids
            .iter()
            .filter(|solid| solid.layer.intersects(mask))
            .filter_map(|solid| {
                cast_against(&solid.shape, origin, radius, direction, max_distance).map(|(distance, normal)| {
                    ProbeHit {
                        point: origin + direction * distance - normal * radius,
                        normal,
                        distance,
                        entity: solid.entity,
                    }
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl PhysicsQuery for ProbeScene {
    fn cast(
        &self,
        shape: ProbeShape,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        match shape {
            ProbeShape::Ray => self.sphere_cast_nearest(origin, 0.0, direction, max_distance, mask),
            ProbeShape::Sphere { radius } => {
                self.sphere_cast_nearest(origin, radius.max(0.0), direction, max_distance, mask)
            }
            ProbeShape::Capsule { half_height, radius } => [-half_height, 0.0, half_height]
                .into_iter()
                .filter_map(|offset| {
                    self.sphere_cast_nearest(origin + Vec3::Y * offset, radius.max(0.0), direction, max_distance, mask)
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance)),
        }
    }
}

/// Ray против раздутой на `inflate` фигуры → (distance, outward normal)
fn cast_against(
    shape: &SolidShape,
    origin: Vec3,
    inflate: f32,
    direction: Vec3,
    max_distance: f32,
) -> Option<(f32, Vec3)> {
    let hit = match *shape {
        SolidShape::Plane { point, normal } => ray_plane(origin, direction, point + normal * inflate, normal),
        SolidShape::Cuboid { center, half_extents } => {
            ray_aabb(origin, direction, center, half_extents + Vec3::splat(inflate))
        }
        SolidShape::Sphere { center, radius } => ray_sphere(origin, direction, center, radius + inflate),
    }?;

    (hit.0 <= max_distance).then_some(hit)
}

fn ray_plane(origin: Vec3, direction: Vec3, point: Vec3, normal: Vec3) -> Option<(f32, Vec3)> {
    let signed = (origin - point).dot(normal);
    if signed < 0.0 {
        // старт внутри half-space
        return None;
    }
    let denom = direction.dot(normal);
    if denom >= -PARALLEL_EPSILON {
        return None;
    }
    Some((signed / -denom, normal))
}

fn ray_aabb(origin: Vec3, direction: Vec3, center: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let min = center - half_extents;
    let max = center + half_extents;

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let (near, far, sign) = if d > 0.0 {
            ((min[axis] - o) / d, (max[axis] - o) / d, -1.0)
        } else {
            ((max[axis] - o) / d, (min[axis] - o) / d, 1.0)
        };

        if near > t_enter {
            t_enter = near;
            enter_normal = Vec3::ZERO;
            enter_normal[axis] = sign;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    // t_enter < 0 → старт внутри box'а
    (t_enter >= 0.0 && enter_normal != Vec3::ZERO).then_some((t_enter, enter_normal))
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = to_origin.dot(direction);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    let normal = (origin + direction * t - center).normalize_or(Vec3::Y);
    Some((t.max(0.0), normal))
}
