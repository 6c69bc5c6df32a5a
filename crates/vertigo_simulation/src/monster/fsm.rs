//! Monster perception state machine (Lurking / Chasing / Fleeing).
//!
//! Как и у игрока: update(текущий state) → MonsterRequest → exit/enter.
//! Машина не двигает монстра сама: goal уходит в `MovementCommand`
//! (navigator), presentation получает `MonsterEffect`.

use bevy::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::movement::MovementCommand;
use super::perception::{
    advance_sweep, height_correct, pick_wander_target, scan_for_player, sweep_direction, vision_fan, SWEEP_LIMIT,
};
use crate::physics::PhysicsQuery;

/// Параметры монстра
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConfig {
    pub vision_distance: f32,
    /// Скорость sweep'а (градусы/сек)
    pub sweep_speed: f32,
    pub vertical_ray_count: usize,
    /// Полный вертикальный угол веера (градусы)
    pub vertical_angle_range: f32,
    /// Высота глаз над Transform монстра
    pub eye_height: f32,
    /// Разброс направления lurk-точки (±градусы)
    pub lurk_angle_range: f32,
    /// Таймаут до смены lurk-точки
    pub lurk_duration: f32,
    pub min_lurk_distance: f32,
    pub max_lurk_distance: f32,
    /// Запас: lurk-точка не ближе к игроку, чем текущая дистанция минус это
    pub lurk_distance_margin: f32,
    /// "Дошёл до точки"
    pub reach_threshold: f32,
    /// Максимум Lurking без обнаружения → Chasing
    pub max_lurk_time: f32,
    /// Задержка перед первой lurk-точкой
    pub settle_delay: f32,
    pub chase_duration: f32,
    /// Ближе этого включается chase effect, на таймауте re-lurk рядом
    pub alert_radius: f32,
    pub catch_distance: f32,
    pub min_flee_distance: f32,
    pub max_flee_distance: f32,
    pub flee_duration: f32,
    /// Разброс направления отступления (±градусы)
    pub flee_angle_range: f32,
    /// Скорость headless navigator'а (м/с)
    pub move_speed: f32,
    /// Игрок ниже по z → монстры просыпаются
    pub release_z: f32,
    /// Или по таймеру (сек, на паузе не тикает)
    pub release_after: f32,
}

impl Default for MonsterConfig {
    fn default() -> Self {
        Self {
            vision_distance: 50.0,
            sweep_speed: 60.0,
            vertical_ray_count: 16,
            vertical_angle_range: 60.0,
            eye_height: 1.5,
            lurk_angle_range: 30.0,
            lurk_duration: 6.0,
            min_lurk_distance: 25.0,
            max_lurk_distance: 100.0,
            lurk_distance_margin: 10.0,
            reach_threshold: 2.0,
            max_lurk_time: 45.0,
            settle_delay: 0.5,
            chase_duration: 10.0,
            alert_radius: 20.0,
            catch_distance: 2.0,
            min_flee_distance: 50.0,
            max_flee_distance: 150.0,
            flee_duration: 8.0,
            flee_angle_range: 45.0,
            move_speed: 6.0,
            release_z: 500.0,
            release_after: 180.0,
        }
    }
}

/// Тег состояния (сигналы, логи)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum MonsterStateKind {
    Lurking,
    Chasing,
    Fleeing,
}

/// Активный state монстра + его таймеры
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum MonsterState {
    Lurking {
        /// С последней смены lurk-точки
        elapsed: f32,
        /// Всего в Lurking (cap → Chasing)
        total: f32,
        /// Осталось до первой lurk-точки (None: точка уже выбрана)
        settle: Option<f32>,
        sweep_angle: f32,
        sweeping_right: bool,
        /// Направление, куда смещаются lurk-точки (от взгляда игрока)
        bias: Vec3,
        /// Re-lurk после chase: радиус ограничен alert_radius
        close_range: bool,
    },
    Chasing {
        timer: f32,
    },
    Fleeing {
        timer: f32,
    },
}

impl Default for MonsterState {
    fn default() -> Self {
        Self::lurking(0.0, false)
    }
}

impl MonsterState {
    pub fn lurking(settle_delay: f32, close_range: bool) -> Self {
        Self::Lurking {
            elapsed: 0.0,
            total: 0.0,
            settle: Some(settle_delay),
            sweep_angle: -SWEEP_LIMIT,
            sweeping_right: true,
            bias: Vec3::ZERO,
            close_range,
        }
    }

    pub fn kind(&self) -> MonsterStateKind {
        match self {
            MonsterState::Lurking { .. } => MonsterStateKind::Lurking,
            MonsterState::Chasing { .. } => MonsterStateKind::Chasing,
            MonsterState::Fleeing { .. } => MonsterStateKind::Fleeing,
        }
    }
}

/// Что монстр знает об игроке в этом tick'е
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSighting {
    pub entity: Entity,
    pub position: Vec3,
    /// Горизонтальный forward игрока
    pub forward: Vec3,
}

pub struct MonsterContext<'a> {
    pub physics: &'a dyn PhysicsQuery,
    pub rng: &'a mut dyn RngCore,
    /// Transform монстра (на уровне ног)
    pub position: Vec3,
    pub forward: Vec3,
    /// None: игрока нет (despawned)
    pub player: Option<PlayerSighting>,
    pub config: &'a MonsterConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonsterEffect {
    Entered(MonsterStateKind),
    Exited(MonsterStateKind),
    PlayerSpotted { at: Vec3 },
    ChaseEffect { enabled: bool },
    CaughtPlayer,
    TargetChosen(Vec3),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonsterOutput {
    /// Новая команда navigator'у (None: оставить как есть)
    pub command: Option<MovementCommand>,
    pub effects: Vec<MonsterEffect>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MonsterRequest {
    Lurk { close_range: bool },
    Chase,
    Flee,
}

impl MonsterRequest {
    fn kind(&self) -> MonsterStateKind {
        match self {
            MonsterRequest::Lurk { .. } => MonsterStateKind::Lurking,
            MonsterRequest::Chase => MonsterStateKind::Chasing,
            MonsterRequest::Flee => MonsterStateKind::Fleeing,
        }
    }
}

/// Perception brain монстра
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct MonsterBrain {
    state: MonsterState,
    started: bool,
    /// Текущая wander/pursuit точка
    target: Option<Vec3>,
    /// Поймал игрока (валиден от выхода из Chasing до выхода из Fleeing)
    caught_player: bool,
    chase_effect: bool,
}

impl MonsterBrain {
    pub fn in_state(state: MonsterState) -> Self {
        Self {
            state,
            started: true,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &MonsterState {
        &self.state
    }

    pub fn kind(&self) -> MonsterStateKind {
        self.state.kind()
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    pub fn caught_player(&self) -> bool {
        self.caught_player
    }

    pub fn chase_effect(&self) -> bool {
        self.chase_effect
    }

    pub fn update(&mut self, delta: f32, ctx: &mut MonsterContext) -> MonsterOutput {
        let mut out = MonsterOutput::default();

        if !self.started {
            self.started = true;
            self.state = self.enter(MonsterRequest::Lurk { close_range: false }, ctx, &mut out);
        }

        let request = match self.state.kind() {
            MonsterStateKind::Lurking => self.update_lurking(delta, ctx, &mut out),
            MonsterStateKind::Chasing => self.update_chasing(delta, ctx, &mut out),
            MonsterStateKind::Fleeing => self.update_fleeing(delta, ctx.config),
        };

        if let Some(request) = request {
            self.switch(request, ctx, &mut out);
        }
        out
    }

    fn update_lurking(&mut self, delta: f32, ctx: &mut MonsterContext, out: &mut MonsterOutput) -> Option<MonsterRequest> {
        let cfg = ctx.config;
        let MonsterState::Lurking {
            elapsed,
            total,
            settle,
            sweep_angle,
            sweeping_right,
            bias,
            close_range,
        } = &mut self.state
        else {
            return None;
        };

        if *total >= cfg.max_lurk_time {
            crate::log_info("🕷️ Lurk time cap reached, forcing chase");
            return Some(MonsterRequest::Chase);
        }
        *total += delta;
        *elapsed += delta;

        (*sweep_angle, *sweeping_right) = advance_sweep(*sweep_angle, *sweeping_right, cfg.sweep_speed, delta);

        let player = ctx.player?;

        // Vision sweep
        let eye = ctx.position + Vec3::Y * cfg.eye_height;
        let fan = vision_fan(
            sweep_direction(ctx.forward, *sweep_angle),
            cfg.vertical_ray_count,
            cfg.vertical_angle_range,
        );
        if let Some(hit) = scan_for_player(ctx.physics, eye, &fan, cfg.vision_distance, player.entity) {
            out.effects.push(MonsterEffect::PlayerSpotted { at: hit.point });
            return Some(MonsterRequest::Chase);
        }

        // Первая lurk-точка после settle delay
        let mut reposition = false;
        if let Some(remaining) = settle.as_mut() {
            *remaining -= delta;
            if *remaining <= 0.0 {
                *settle = None;
                *bias = -player.forward;
                reposition = true;
            }
        } else if let Some(target) = self.target {
            let reached = ctx.position.distance(target) <= cfg.reach_threshold;
            reposition = reached || *elapsed >= cfg.lurk_duration;
        }

        if reposition {
            *elapsed = 0.0;
            let planar = Vec2::new(ctx.position.x - player.position.x, ctx.position.z - player.position.z).length();
            let (min_distance, max_distance) = if *close_range {
                (cfg.min_lurk_distance.min(cfg.alert_radius * 0.5), cfg.alert_radius)
            } else {
                (cfg.min_lurk_distance, cfg.max_lurk_distance)
            };
            let max_distance = max_distance.min(planar - cfg.lurk_distance_margin);

            let point = pick_wander_target(
                &mut *ctx.rng,
                player.position,
                min_distance,
                max_distance,
                Some(*bias),
                cfg.lurk_angle_range,
            );
            let target = height_correct(ctx.physics, point);
            self.set_goal(target, out);
            out.effects.push(MonsterEffect::TargetChosen(target));
        }
        None
    }

    fn update_chasing(&mut self, delta: f32, ctx: &mut MonsterContext, out: &mut MonsterOutput) -> Option<MonsterRequest> {
        let cfg = ctx.config;
        let Some(player) = ctx.player else {
            return Some(MonsterRequest::Flee);
        };

        self.set_goal(player.position, out);

        let distance = ctx.position.distance(player.position);
        if distance < cfg.alert_radius && !self.chase_effect {
            self.chase_effect = true;
            out.effects.push(MonsterEffect::ChaseEffect { enabled: true });
        }

        if distance <= cfg.catch_distance {
            self.caught_player = true;
            out.effects.push(MonsterEffect::CaughtPlayer);
            return Some(MonsterRequest::Flee);
        }

        let MonsterState::Chasing { timer } = &mut self.state else {
            return None;
        };
        *timer += delta;
        if *timer >= cfg.chase_duration {
            // Не поймал: рядом затаиться поблизости, иначе разорвать контакт
            return Some(if distance < cfg.alert_radius {
                MonsterRequest::Lurk { close_range: true }
            } else {
                MonsterRequest::Flee
            });
        }
        None
    }

    fn update_fleeing(&mut self, delta: f32, config: &MonsterConfig) -> Option<MonsterRequest> {
        let MonsterState::Fleeing { timer } = &mut self.state else {
            return None;
        };
        *timer += delta;
        (*timer >= config.flee_duration).then_some(MonsterRequest::Lurk { close_range: false })
    }

    fn set_goal(&mut self, target: Vec3, out: &mut MonsterOutput) {
        self.target = Some(target);
        out.command = Some(MovementCommand::MoveToPosition { target });
    }

    fn switch(&mut self, request: MonsterRequest, ctx: &mut MonsterContext, out: &mut MonsterOutput) {
        if request.kind() == self.state.kind() {
            return;
        }

        let previous = self.state.kind();
        self.exit(out);
        self.state = self.enter(request, ctx, out);
        crate::log_info(&format!("🕷️ Monster: {:?} → {:?}", previous, self.state.kind()));
    }

    fn exit(&mut self, out: &mut MonsterOutput) {
        match self.state.kind() {
            MonsterStateKind::Chasing => {
                if self.chase_effect {
                    self.chase_effect = false;
                    out.effects.push(MonsterEffect::ChaseEffect { enabled: false });
                }
            }
            MonsterStateKind::Fleeing => {
                self.caught_player = false;
            }
            MonsterStateKind::Lurking => {}
        }
        out.effects.push(MonsterEffect::Exited(self.state.kind()));
    }

    fn enter(&mut self, request: MonsterRequest, ctx: &mut MonsterContext, out: &mut MonsterOutput) -> MonsterState {
        let state = match request {
            MonsterRequest::Lurk { close_range } => MonsterState::lurking(ctx.config.settle_delay, close_range),
            MonsterRequest::Chase => {
                self.caught_player = false;
                MonsterState::Chasing { timer: 0.0 }
            }
            MonsterRequest::Flee => {
                let cfg = ctx.config;
                // Прочь от игрока; игрока нет: в любую сторону
                let away = ctx
                    .player
                    .map(|player| ctx.position - player.position)
                    .filter(|away| Vec2::new(away.x, away.z).length_squared() > 1e-6);
                let point = pick_wander_target(
                    &mut *ctx.rng,
                    ctx.position,
                    cfg.min_flee_distance,
                    cfg.max_flee_distance,
                    away,
                    cfg.flee_angle_range,
                );
                let target = height_correct(ctx.physics, point);
                self.set_goal(target, out);
                out.effects.push(MonsterEffect::TargetChosen(target));
                MonsterState::Fleeing { timer: 0.0 }
            }
        };

        out.effects.push(MonsterEffect::Entered(state.kind()));
        state
    }
}
