//! RapierProbe: `PhysicsQuery` поверх bevy_rapier3d контекста
//!
//! Используется когда хост подключил `RapierPhysicsPlugin` (в headless
//! прогонах вместо него ресурс `ProbeScene`).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::query::{PhysicsQuery, ProbeHit, ProbeShape};

pub struct RapierProbe<'w> {
    context: RapierContext<'w>,
    /// Собственный collider персонажа (не должен попадать в свои probes)
    exclude: Option<Entity>,
}

impl<'w> RapierProbe<'w> {
    pub fn new(context: RapierContext<'w>, exclude: Option<Entity>) -> Self {
        Self { context, exclude }
    }

    fn filter(&self, mask: Group) -> QueryFilter<'_> {
        let filter = QueryFilter::new()
            .exclude_sensors()
            .groups(CollisionGroups::new(Group::ALL, mask));

        match self.exclude {
            Some(entity) => filter.exclude_collider(entity).exclude_rigid_body(entity),
            None => filter,
        }
    }

    fn shape_cast(
        &self,
        collider: &Collider,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<ProbeHit> {
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: false,
            compute_impact_geometry_on_penetration: true,
        };

        let (entity, hit) = self.context.cast_shape(
            origin,
            Quat::IDENTITY,
            direction,
            &*collider.raw,
            options,
            self.filter(mask),
        )?;
        let details = hit.details?;

        Some(ProbeHit {
            point: details.witness1,
            normal: details.normal1.normalize_or(Vec3::Y),
            distance: hit.time_of_impact,
            entity: Some(entity),
        })
    }
}

impl PhysicsQuery for RapierProbe<'_> {
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
            ProbeShape::Ray => self
                .context
                .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter(mask))
                .map(|(entity, intersection)| ProbeHit {
                    point: intersection.point,
                    normal: intersection.normal,
                    distance: intersection.time_of_impact,
                    entity: Some(entity),
                }),
            ProbeShape::Sphere { radius } => {
                self.shape_cast(&Collider::ball(radius), origin, direction, max_distance, mask)
            }
            ProbeShape::Capsule { half_height, radius } => self.shape_cast(
                &Collider::capsule_y(half_height, radius),
                origin,
                direction,
                max_distance,
                mask,
            ),
        }
    }
}
