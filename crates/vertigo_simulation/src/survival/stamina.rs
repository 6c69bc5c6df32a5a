//! Stamina economy: hunger/damage penalties, regen, fall damage
//!
//! Инвариант (после каждого шага): 0 ≤ current ≤ max_cap ≤ max
//!
//! - max_cap = max(0, max·(1-hunger) - max·damage): штрафы вычитают ёмкость
//! - cap вниз: мгновенно, regen вверх: плавно (regen_rate units/sec)
//! - hunger растёт дискретными шагами (accumulator, не зависит от jitter кадра)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Параметры stamina economy
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    /// Стартовая (и абсолютная) ёмкость
    pub max_stamina: f32,
    /// Regen (units/sec)
    pub regen_rate: f32,
    /// Climbing drain (units/sec)
    pub climb_cost: f32,
    /// Sprint drain (units/sec)
    pub sprint_cost: f32,
    /// Разовая стоимость прыжка
    pub jump_cost: f32,
    /// Порог laborious action (доля от max, строго больше)
    pub labor_threshold: f32,
    /// Секунд между шагами голода
    pub hunger_interval: f32,
    /// Прирост hunger_penalty за шаг
    pub hunger_increment: f32,
    pub fall: FallDamageConfig,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            max_stamina: 100.0,
            regen_rate: 10.0,
            climb_cost: 20.0,
            sprint_cost: 25.0,
            jump_cost: 30.0,
            labor_threshold: 0.2,
            hunger_interval: 60.0,
            hunger_increment: 0.05,
            fall: FallDamageConfig::default(),
        }
    }
}

/// Fall damage: 0 до safe_distance, дальше base + multiplier·(d - safe)^exponent
///
/// Разрыв на пороге намеренный: любое падение выше safe_distance стоит
/// минимум base_damage.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct FallDamageConfig {
    /// Безопасная высота (метры)
    pub safe_distance: f32,
    /// Минимальный урон сразу за порогом (доля damage_penalty)
    pub base_damage: f32,
    pub multiplier: f32,
    pub exponent: f32,
}

impl Default for FallDamageConfig {
    fn default() -> Self {
        Self {
            safe_distance: 4.0,
            base_damage: 0.05,
            multiplier: 0.02,
            exponent: 1.5,
        }
    }
}

/// Урон от падения (доля damage_penalty, 0..1)
pub fn fall_damage(fall_distance: f32, config: &FallDamageConfig) -> f32 {
    if fall_distance <= config.safe_distance {
        return 0.0;
    }
    let excess = fall_distance - config.safe_distance;
    (config.base_damage + config.multiplier * excess.powf(config.exponent)).clamp(0.0, 1.0)
}

/// Замер падения: старт в Falling.enter, финиш в Landing.enter
///
/// Урон применяется ровно один раз на замер (`take_fall_distance`).
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FallSample {
    pub start_height: f32,
    pub start_time: f32,
    pub end_height: Option<f32>,
    pub end_time: Option<f32>,
    consumed: bool,
}

impl FallSample {
    pub fn begin(height: f32, time: f32) -> Self {
        Self {
            start_height: height,
            start_time: time,
            end_height: None,
            end_time: None,
            consumed: false,
        }
    }

    pub fn finish(&mut self, height: f32, time: f32) {
        self.end_height = Some(height);
        self.end_time = Some(time);
    }

    /// start - end (отрицательное если приземлились выше старта)
    pub fn fall_distance(&self) -> Option<f32> {
        self.end_height.map(|end| self.start_height - end)
    }

    pub fn airtime(&self) -> Option<f32> {
        self.end_time.map(|end| (end - self.start_time).max(0.0))
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Дистанция для расчёта урона; второй вызов → None
    pub fn take_fall_distance(&mut self) -> Option<f32> {
        if self.consumed {
            return None;
        }
        let distance = self.fall_distance()?;
        self.consumed = true;
        Some(distance)
    }
}

/// Stamina/hunger/damage состояние персонажа
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct StaminaEconomy {
    pub current: f32,
    pub max: f32,
    /// 0..1
    pub hunger_penalty: f32,
    /// 0..1
    pub damage_penalty: f32,
    hunger_timer: f32,
    pub config: StaminaConfig,
}

impl Default for StaminaEconomy {
    fn default() -> Self {
        Self::new(StaminaConfig::default())
    }
}

impl StaminaEconomy {
    pub fn new(config: StaminaConfig) -> Self {
        let max = config.max_stamina.max(0.0);
        Self {
            current: max,
            max,
            hunger_penalty: 0.0,
            damage_penalty: 0.0,
            hunger_timer: 0.0,
            config,
        }
    }

    pub fn hunger_loss(&self) -> f32 {
        self.max * self.hunger_penalty
    }

    pub fn damage_loss(&self) -> f32 {
        self.max * self.damage_penalty
    }

    /// Текущий потолок stamina с учётом штрафов
    pub fn max_cap(&self) -> f32 {
        (self.max - self.hunger_loss() - self.damage_loss()).clamp(0.0, self.max)
    }

    /// Персонаж истощён окончательно (lose condition)
    pub fn is_depleted(&self) -> bool {
        self.max_cap() <= 0.0
    }

    pub fn drain(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn drain_over_time(&mut self, rate_per_second: f32, delta: f32) {
        self.drain(rate_per_second * delta);
    }

    pub fn has_stamina(&self, minimum: f32) -> bool {
        self.current >= minimum
    }

    /// current / max (не от max_cap)
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    /// Sprint start / jump / climb start разрешены только выше порога
    pub fn labor_allowed(&self) -> bool {
        self.percentage() > self.config.labor_threshold
    }

    /// Шаг economy: hunger accumulator, затем cap-down или regen
    pub fn tick(&mut self, delta: f32) {
        let delta = delta.max(0.0);

        if self.config.hunger_interval > 0.0 {
            self.hunger_timer += delta;
            while self.hunger_timer >= self.config.hunger_interval {
                self.hunger_timer -= self.config.hunger_interval;
                self.add_hunger(self.config.hunger_increment);
            }
        }

        let cap = self.max_cap();
        if self.current > cap {
            self.current = cap;
        } else {
            self.current = move_towards(self.current, cap, self.config.regen_rate * delta);
        }
    }

    /// Урон от падения → damage_penalty. Возвращает применённый урон.
    pub fn apply_fall_damage(&mut self, fall_distance: f32) -> f32 {
        let damage = fall_damage(fall_distance, &self.config.fall);
        if damage > 0.0 {
            self.add_damage(damage);
        }
        damage
    }

    /// Применяет урон по замеру падения (идемпотентно)
    pub fn apply_landing(&mut self, sample: &mut FallSample) -> Option<f32> {
        let distance = sample.take_fall_distance()?;
        Some(self.apply_fall_damage(distance))
    }

    pub fn add_damage(&mut self, fraction: f32) {
        self.damage_penalty = (self.damage_penalty + fraction).clamp(0.0, 1.0);
        self.clamp_to_cap();
    }

    pub fn heal_damage(&mut self, fraction: f32) {
        self.damage_penalty = (self.damage_penalty - fraction).clamp(0.0, 1.0);
    }

    pub fn add_hunger(&mut self, fraction: f32) {
        self.hunger_penalty = (self.hunger_penalty + fraction).clamp(0.0, 1.0);
        self.clamp_to_cap();
    }

    pub fn eat(&mut self, fraction: f32) {
        self.hunger_penalty = (self.hunger_penalty - fraction).clamp(0.0, 1.0);
    }

    fn clamp_to_cap(&mut self) {
        self.current = self.current.min(self.max_cap());
    }
}

fn move_towards(current: f32, target: f32, max_step: f32) -> f32 {
    if (target - current).abs() <= max_step {
        target
    } else {
        current + (target - current).signum() * max_step
    }
}
