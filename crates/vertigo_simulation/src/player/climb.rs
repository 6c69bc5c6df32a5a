//! Climb / Mantle kinematics
//!
//! Climbing:
//! - wall normal пере-сэмплируется каждый tick (кривые стены)
//! - wall-local frame: `up` = вертикаль, спроецированная на плоскость стены,
//!   `right` = up × normal (right-handed)
//! - input → frame (с учётом ClimbSurfaceProperties) → tangent plane
//! - stick correction: мягкий nudge вдоль нормали к stand-off дистанции
//!
//! Mantling: ledge search вниз перед персонажем, clearance вверх, проверка
//! высоты. Любой провал → `MantleAbort`, state не меняется.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::{yaw_rotation, CharacterBody, PhysicsQuery, ProbeHit, MASK_WORLD};

/// Параметры climbing + mantling
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbConfig {
    /// Forward cast от центра: есть ли что-то для latch
    pub climb_detection_distance: f32,
    pub detection_radius: f32,
    /// Forward cast от груди: уточнение нормали
    pub sample_distance: f32,
    pub sample_radius: f32,
    /// Множитель walk_speed при лазании
    pub climb_speed_multiplier: f32,
    /// Зазор капсула ↔ стена
    pub stick_distance: f32,
    /// Скорость сглаживания stick correction (1/сек)
    pub stick_lerp: f32,
    /// Скорость разворота к стене (1/сек)
    pub wall_turn_speed: f32,
    /// Допустимое отклонение взгляда от стены (градусы)
    pub max_climbing_rotation_angle: f32,
    /// Forward-down probe от головы
    pub mantle_probe_distance: f32,
    /// normal·up выше: поверхность считается ledge
    pub mantle_min_flatness: f32,
    pub mantle_forward_offset: f32,
    pub mantle_search_distance: f32,
    /// Максимальная высота ledge над ногами
    pub mantle_max_height: f32,
    pub mantle_duration: f32,
    /// Доля jump impulse после mantle
    pub mantle_impulse_ratio: f32,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            climb_detection_distance: 1.5,
            detection_radius: 0.5,
            sample_distance: 1.0,
            sample_radius: 0.25,
            climb_speed_multiplier: 0.6,
            stick_distance: 0.12,
            stick_lerp: 8.0,
            wall_turn_speed: 5.0,
            max_climbing_rotation_angle: 60.0,
            mantle_probe_distance: 1.5,
            mantle_min_flatness: 0.7,
            mantle_forward_offset: 0.75,
            mantle_search_distance: 3.0,
            mantle_max_height: 1.5,
            mantle_duration: 0.3,
            mantle_impulse_ratio: 0.3,
        }
    }
}

/// Snapshot свойств поверхности на момент latch
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ClimbSurfaceProperties {
    pub allows_horizontal_movement: bool,
    pub allows_upward_movement: bool,
    pub speed_multiplier: f32,
}

impl Default for ClimbSurfaceProperties {
    fn default() -> Self {
        Self {
            allows_horizontal_movement: true,
            allows_upward_movement: true,
            speed_multiplier: 1.0,
        }
    }
}

/// Компонент на collider entity: по этой поверхности можно лазить
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ClimbableSurface {
    /// Зарезервировано (движение не использует)
    pub grip_strength: f32,
    pub allows_horizontal_movement: bool,
    pub allows_upward_movement: bool,
    pub climb_speed_multiplier: f32,
}

impl Default for ClimbableSurface {
    fn default() -> Self {
        Self {
            grip_strength: 1.0,
            allows_horizontal_movement: true,
            allows_upward_movement: true,
            climb_speed_multiplier: 1.0,
        }
    }
}

impl ClimbableSurface {
    pub fn properties(&self) -> ClimbSurfaceProperties {
        ClimbSurfaceProperties {
            allows_horizontal_movement: self.allows_horizontal_movement,
            allows_upward_movement: self.allows_upward_movement,
            speed_multiplier: self.climb_speed_multiplier,
        }
    }
}

/// Источник свойств поверхностей по entity collider'а
pub trait SurfaceLookup {
    /// None: entity больше не существует (или не climbable)
    fn properties(&self, entity: Entity) -> Option<ClimbSurfaceProperties>;
}

impl SurfaceLookup for Query<'_, '_, &ClimbableSurface> {
    fn properties(&self, entity: Entity) -> Option<ClimbSurfaceProperties> {
        self.get(entity).ok().map(ClimbableSurface::properties)
    }
}

impl SurfaceLookup for HashMap<Entity, ClimbSurfaceProperties> {
    fn properties(&self, entity: Entity) -> Option<ClimbSurfaceProperties> {
        self.get(&entity).copied()
    }
}

/// Пустой lookup: все поверхности с default свойствами
pub struct NoSurfaces;

impl SurfaceLookup for NoSurfaces {
    fn properties(&self, _entity: Entity) -> Option<ClimbSurfaceProperties> {
        None
    }
}

/// Wall-local базис
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallFrame {
    pub normal: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl WallFrame {
    pub fn from_normal(normal: Vec3) -> Self {
        let normal = normal.normalize_or(Vec3::Z);
        let projected_up = Vec3::Y - normal * Vec3::Y.dot(normal);
        // Горизонтальная поверхность (потолок/пол): любая касательная
        let up = if projected_up.length_squared() < 1e-3 {
            normal.any_orthonormal_vector()
        } else {
            projected_up.normalize()
        };
        let right = up.cross(normal).normalize_or_zero();
        Self { normal, up, right }
    }

    /// Убирает компоненту вдоль нормали
    pub fn project_on_plane(&self, v: Vec3) -> Vec3 {
        v - self.normal * v.dot(self.normal)
    }
}

/// Направление лазания (не масштабировано скоростью)
///
/// Запрещённые поверхностью оси отбрасываются целиком (вверх И вниз).
pub fn climb_move(input: Vec2, frame: &WallFrame, properties: &ClimbSurfaceProperties) -> Vec3 {
    let mut direction = Vec3::ZERO;
    if properties.allows_horizontal_movement {
        direction += frame.right * input.x;
    }
    if properties.allows_upward_movement {
        direction += frame.up * input.y;
    }
    frame.project_on_plane(direction)
}

/// Nudge вдоль нормали к `radius + stick_distance` от поверхности
///
/// `axis_point`: точка на оси капсулы, от которой меряется зазор.
pub fn stick_correction(hit: &ProbeHit, axis_point: Vec3, radius: f32, config: &ClimbConfig, delta: f32) -> Vec3 {
    let desired = hit.point + hit.normal * (radius + config.stick_distance);
    let along_normal = hit.normal * (desired - axis_point).dot(hit.normal);
    along_normal * (config.stick_lerp * delta).clamp(0.0, 1.0)
}

/// Есть ли перед персонажем поверхность для latch
pub fn can_climb(physics: &dyn PhysicsQuery, config: &ClimbConfig, center: Vec3, forward: Vec3) -> Option<ProbeHit> {
    physics.sphere_cast(
        center,
        config.detection_radius,
        forward,
        config.climb_detection_distance,
        MASK_WORLD,
    )
}

/// Нормаль стены: сначала detection cast от центра, затем cast от груди
pub fn wall_normal(
    physics: &dyn PhysicsQuery,
    config: &ClimbConfig,
    body: &CharacterBody,
    center: Vec3,
    forward: Vec3,
) -> Option<ProbeHit> {
    can_climb(physics, config, center, forward).or_else(|| {
        physics.sphere_cast(
            body.chest(center),
            config.sample_radius,
            forward,
            config.sample_distance,
            MASK_WORLD,
        )
    })
}

/// Перед головой почти горизонтальная поверхность (ledge, не стена)
pub fn can_mantle(
    physics: &dyn PhysicsQuery,
    config: &ClimbConfig,
    body: &CharacterBody,
    center: Vec3,
    forward: Vec3,
) -> bool {
    let direction = (forward - Vec3::Y).normalize_or_zero();
    physics
        .raycast(body.head(center), direction, config.mantle_probe_distance, MASK_WORLD)
        .is_some_and(|hit| hit.normal.dot(Vec3::Y) > config.mantle_min_flatness)
}

/// Почему mantle не состоялся
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MantleAbort {
    #[error("no ledge found below search origin")]
    NoLedge,
    #[error("space above ledge is blocked")]
    Blocked,
    #[error("ledge too high ({height:.2}m, max {max:.2}m)")]
    TooHigh { height: f32, max: f32 },
}

/// Рассчитанный mantle: eased interpolation start → target
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MantlePlan {
    pub start: Vec3,
    pub target: Vec3,
    pub start_rotation: Quat,
    pub end_rotation: Quat,
    pub duration: f32,
}

impl MantlePlan {
    /// Прогресс 0..1 (smoothstep)
    pub fn eased_progress(&self, elapsed: f32) -> f32 {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.duration).clamp(0.0, 1.0)
        };
        t * t * (3.0 - 2.0 * t)
    }

    /// Позиция центра и ориентация в момент `elapsed`
    pub fn sample(&self, elapsed: f32) -> (Vec3, Quat) {
        let s = self.eased_progress(elapsed);
        (
            self.start.lerp(self.target, s),
            self.start_rotation.slerp(self.end_rotation, s),
        )
    }

    pub fn is_complete(&self, elapsed: f32) -> bool {
        elapsed >= self.duration
    }
}

/// Ledge search + clearance + height check
pub fn plan_mantle(
    physics: &dyn PhysicsQuery,
    config: &ClimbConfig,
    body: &CharacterBody,
    center: Vec3,
    rotation: Quat,
    forward: Vec3,
) -> Result<MantlePlan, MantleAbort> {
    let feet = body.feet(center);
    let forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z);

    let search_origin = feet + forward * config.mantle_forward_offset + Vec3::Y * (body.height + 1.0);
    let ledge = physics
        .raycast(search_origin, Vec3::NEG_Y, config.mantle_search_distance, MASK_WORLD)
        .ok_or(MantleAbort::NoLedge)?
        .point;

    if physics
        .raycast(ledge + Vec3::Y * 0.1, Vec3::Y, body.height, MASK_WORLD)
        .is_some()
    {
        return Err(MantleAbort::Blocked);
    }

    let height = ledge.y - feet.y;
    if height > config.mantle_max_height + 0.1 {
        return Err(MantleAbort::TooHigh {
            height,
            max: config.mantle_max_height,
        });
    }

    let edge = ledge + forward * body.radius * 1.1;
    let target = Vec3::new(edge.x, ledge.y.max(feet.y) + body.half_height() + 0.01, edge.z);

    Ok(MantlePlan {
        start: center,
        target,
        start_rotation: rotation,
        end_rotation: yaw_rotation(forward),
        duration: config.mantle_duration,
    })
}
