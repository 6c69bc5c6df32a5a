//! Ground / Fall probe
//!
//! Два независимых landing сигнала:
//! 1. Ground path: пять sphere cast'ов вниз (центр + 4 cardinal offsets в
//!    character-local space). Валидный hit: нормаль не круче
//!    `max_walkable_angle`. Landing требует `required_valid_hits` (тонкие
//!    рёбра не считаются землёй).
//! 2. Fall probe: свободно падающий point proxy, активный только в воздухе.
//!    Принимается только когда ground probes не видят ничего, либо сами
//!    набрали `required_valid_hits` на той же высоте.
//!
//! Оба пути принимают landing только если контакт по высоте близко к ногам
//! (`max_landing_height_delta`), чтобы не проваливаться сквозь геометрию.
//!
//! Нет landing и сбоку стена → Sliding (unstick от стены, recovery из углов).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::{planar_axes, PhysicsQuery, MASK_WORLD};

/// Запас ray cast'а fall probe за шаг
const PROBE_SKIN: f32 = 0.05;

/// Параметры grounding
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProbeConfig {
    /// Радиус sphere cast'ов
    pub probe_radius: f32,
    /// Origin probe'ов над ногами (старт вне пола)
    pub probe_lift: f32,
    /// Дистанция cast'а вниз
    pub check_distance: f32,
    /// Смещение 4 боковых probe'ов от оси
    pub lateral_offset: f32,
    /// Максимальный угол нормали от вертикали (градусы)
    pub max_walkable_angle: f32,
    /// Валидных hit'ов для `is_grounded`
    pub required_grounded_hits: usize,
    /// Валидных hit'ов для landing
    pub required_valid_hits: usize,
    /// Допустимая разница высот контакт ↔ ноги
    pub max_landing_height_delta: f32,
    /// Дистанция боковых cast'ов (стены)
    pub lateral_check_distance: f32,
    /// Скорость unstick от стены (м/с)
    pub unstick_speed: f32,
    /// Fall probe: горизонтальная близость к ногам
    pub proximity_radius: f32,
    /// Fall probe с |vy| ниже считается осевшим
    pub settle_velocity: f32,
    /// Fall probe: velocity-сигнал только после этого airtime
    pub probe_min_airtime: f32,
}

impl Default for GroundProbeConfig {
    fn default() -> Self {
        Self {
            probe_radius: 0.25,
            probe_lift: 0.3,
            check_distance: 0.5,
            lateral_offset: 0.25,
            max_walkable_angle: 45.0,
            required_grounded_hits: 1,
            required_valid_hits: 3,
            max_landing_height_delta: 0.3,
            lateral_check_distance: 0.6,
            unstick_speed: 2.0,
            proximity_radius: 1.0,
            settle_velocity: 0.5,
            probe_min_airtime: 0.1,
        }
    }
}

/// Результат poll_landing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LandingDecision {
    Grounded,
    /// Зажаты у стены: `unstick` это горизонтальная скорость от стены,
    /// `normal`: усреднённая нормаль (для разворота параллельно стене)
    Sliding { unstick: Vec3, normal: Vec3 },
    StillFalling,
}

/// Сводка пяти ground probe'ов
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundSample {
    pub valid_hits: usize,
    pub total_hits: usize,
    /// Средняя высота валидных контактов
    pub mean_valid_height: Option<f32>,
    pub avg_valid_normal: Vec3,
}

/// Ground probe над `PhysicsQuery`
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundProbe {
    pub config: GroundProbeConfig,
}

impl GroundProbe {
    pub fn new(config: GroundProbeConfig) -> Self {
        Self { config }
    }

    /// Пять cast'ов вниз от ног
    pub fn sample(&self, physics: &dyn PhysicsQuery, feet: Vec3, rotation: Quat) -> GroundSample {
        let cfg = &self.config;
        let (forward, right) = planar_axes(rotation);
        let offsets = [
            Vec3::ZERO,
            forward * cfg.lateral_offset,
            -forward * cfg.lateral_offset,
            right * cfg.lateral_offset,
            -right * cfg.lateral_offset,
        ];

        let mut sample = GroundSample::default();
        let mut height_sum = 0.0;
        let mut normal_sum = Vec3::ZERO;

        for offset in offsets {
            let origin = feet + offset + Vec3::Y * cfg.probe_lift;
            let Some(hit) = physics.sphere_cast(origin, cfg.probe_radius, Vec3::NEG_Y, cfg.check_distance, MASK_WORLD)
            else {
                continue;
            };

            sample.total_hits += 1;
            if hit.slope_degrees() <= cfg.max_walkable_angle {
                sample.valid_hits += 1;
                height_sum += hit.point.y;
                normal_sum += hit.normal;
            }
        }

        if sample.valid_hits > 0 {
            sample.mean_valid_height = Some(height_sum / sample.valid_hits as f32);
            sample.avg_valid_normal = normal_sum.normalize_or(Vec3::Y);
        }
        sample
    }

    pub fn is_grounded(&self, physics: &dyn PhysicsQuery, feet: Vec3, rotation: Quat) -> bool {
        self.sample(physics, feet, rotation).valid_hits >= self.config.required_grounded_hits.max(1)
    }

    /// Landing readiness в Falling (первый сработавший путь побеждает)
    pub fn poll_landing(
        &self,
        physics: &dyn PhysicsQuery,
        feet: Vec3,
        rotation: Quat,
        fall_probe: &FallProbe,
    ) -> LandingDecision {
        let cfg = &self.config;

        // 1. Ground path
        let sample = self.sample(physics, feet, rotation);
        if sample.valid_hits >= cfg.required_valid_hits.max(1) {
            if let Some(height) = sample.mean_valid_height {
                if (feet.y - height).abs() <= cfg.max_landing_height_delta {
                    return LandingDecision::Grounded;
                }
            }
        }

        // 2. Fall probe path: только если ground probes ничего не видят
        // или согласны с ним (тонкое ребро под центральным ray'ем не land)
        if fall_probe.is_active() && fall_probe.has_landing_signal(cfg) && agrees_with_sample(cfg, &sample, fall_probe) {
            let offset = fall_probe.position() - feet;
            let horizontal = Vec2::new(offset.x, offset.z).length();
            if horizontal <= cfg.proximity_radius && offset.y.abs() <= cfg.max_landing_height_delta {
                return LandingDecision::Grounded;
            }
        }

        // 3. Боковые стены → unstick
        if let Some(normal) = self.side_contact(physics, feet, rotation) {
            let horizontal = Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero();
            if horizontal != Vec3::ZERO {
                return LandingDecision::Sliding {
                    unstick: horizontal * cfg.unstick_speed,
                    normal,
                };
            }
        }

        LandingDecision::StillFalling
    }

    /// Четыре боковых cast'а (right, left, forward, back) → усреднённая нормаль
    pub fn side_contact(&self, physics: &dyn PhysicsQuery, feet: Vec3, rotation: Quat) -> Option<Vec3> {
        let cfg = &self.config;
        let (forward, right) = planar_axes(rotation);
        let origin = feet + Vec3::Y * cfg.probe_lift;

        let normals: Vec<Vec3> = [right, -right, forward, -forward]
            .into_iter()
            .filter_map(|direction| {
                physics
                    .sphere_cast(origin, cfg.probe_radius, direction, cfg.lateral_check_distance, MASK_WORLD)
                    .map(|hit| hit.normal)
            })
            .collect();

        if normals.is_empty() {
            return None;
        }
        let sum: Vec3 = normals.iter().copied().sum();
        Some(sum.normalize_or_zero())
    }
}

fn agrees_with_sample(cfg: &GroundProbeConfig, sample: &GroundSample, fall_probe: &FallProbe) -> bool {
    if sample.total_hits == 0 {
        return true;
    }
    if sample.valid_hits < cfg.required_valid_hits.max(1) {
        return false;
    }
    sample
        .mean_valid_height
        .is_some_and(|height| (fall_probe.position().y - height).abs() <= cfg.max_landing_height_delta)
}

/// Fall probe: независимый point proxy в свободном падении
///
/// Активируется на входе в Falling у ног, деактивируется на выходе.
/// Каждый tick: интегрирует гравитацию, ray cast вдоль шага; hit → settle.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct FallProbe {
    active: bool,
    position: Vec3,
    vertical_speed: f32,
    settled: bool,
    ray_hit: bool,
    airtime: f32,
}

impl FallProbe {
    pub fn activate(&mut self, position: Vec3) {
        *self = Self {
            active: true,
            position,
            ..Default::default()
        };
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    /// settled ∨ ray hit ∨ почти нулевая vertical speed (после min airtime)
    pub fn has_landing_signal(&self, config: &GroundProbeConfig) -> bool {
        self.settled
            || self.ray_hit
            || (self.airtime >= config.probe_min_airtime && self.vertical_speed.abs() < config.settle_velocity)
    }

    /// Шаг свободного падения (`gravity`: модуль ускорения)
    pub fn step(&mut self, physics: &dyn PhysicsQuery, delta: f32, gravity: f32) {
        if !self.active || self.settled || delta <= 0.0 {
            return;
        }

        self.airtime += delta;
        self.vertical_speed -= gravity * delta;
        let drop = -self.vertical_speed * delta;
        if drop <= 0.0 {
            return;
        }

        if let Some(hit) = physics.raycast(self.position, Vec3::NEG_Y, drop + PROBE_SKIN, MASK_WORLD) {
            self.position = hit.point;
            self.vertical_speed = 0.0;
            self.settled = true;
            self.ray_hit = true;
        } else {
            self.position.y -= drop;
        }
    }
}
