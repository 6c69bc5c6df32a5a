//! Player locomotion state machine
//!
//! Closed enum + одна transition функция на state (enter/update/exit).
//!
//! Порядок внутри tick'а:
//! 1. update(текущий state) → возможно StateRequest
//! 2. switch: exit(old) → enter(new); one-shot states (Jumping, Landing)
//!    сразу запрашивают следующий state: цепочка в том же tick'е
//! 3. gravity (кроме Climbing/Mantling)
//!
//! Machine ничего не двигает сама, результат в `LocomotionOutput`
//! (delta + rotation), коммит делает `integrate_motion`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::climb::{
    can_climb, can_mantle, climb_move, plan_mantle, stick_correction, wall_normal, ClimbConfig, MantleAbort,
    MantlePlan, SurfaceLookup, WallFrame,
};
use super::grounding::{FallProbe, GroundProbe, GroundProbeConfig, LandingDecision};
use super::input::PlayerInput;
use super::state::{LocomotionState, LocomotionStateKind};
use crate::physics::{planar_axes, yaw_rotation, CharacterBody, PhysicsQuery, MASK_WORLD};
use crate::survival::{FallSample, StaminaEconomy};

/// Защита от бесконечной цепочки one-shot переходов
const MAX_CHAIN: usize = 8;

/// Параметры движения
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Базовая скорость (м/с)
    pub walk_speed: f32,
    pub sprint_multiplier: f32,
    pub crouch_multiplier: f32,
    pub slide_multiplier: f32,
    /// Длительность slide (сек)
    pub slide_duration: f32,
    /// Доля lateral input в slide
    pub slide_lateral_control: f32,
    /// Высота прыжка (м)
    pub jump_height: f32,
    /// Модуль ускорения свободного падения
    pub gravity: f32,
    /// Вертикальная скорость прижатия к земле (модуль)
    pub grounded_stick_velocity: f32,
    /// Доля walk_speed под управлением в воздухе
    pub air_control: f32,
    /// Длительность возврата в вертикаль после Falling (сек)
    pub upright_reset_time: f32,
    /// Скорость разворота параллельно стене при unstick (1/сек)
    pub rotation_smooth_speed: f32,
    /// Высота капсулы в приседе (для проверки потолка)
    pub crouch_height: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            sprint_multiplier: 1.5,
            crouch_multiplier: 0.5,
            slide_multiplier: 1.2,
            slide_duration: 1.0,
            slide_lateral_control: 0.5,
            jump_height: 1.5,
            gravity: 9.81,
            grounded_stick_velocity: 2.0,
            air_control: 0.5,
            upright_reset_time: 0.2,
            rotation_smooth_speed: 5.0,
            crouch_height: 1.0,
        }
    }
}

impl LocomotionConfig {
    /// Vertical impulse прыжка: sqrt(2·g·h)
    pub fn jump_speed(&self) -> f32 {
        (2.0 * self.gravity * self.jump_height).max(0.0).sqrt()
    }
}

/// Всё, что state machine читает/пишет за tick (передаётся явно, без глобалов)
pub struct LocomotionContext<'a> {
    pub physics: &'a dyn PhysicsQuery,
    pub surfaces: &'a dyn SurfaceLookup,
    /// Единственный writer за tick: активный state
    pub stamina: &'a mut StaminaEconomy,
    pub fall_probe: &'a mut FallProbe,
    pub body: CharacterBody,
    /// Центр капсулы на начало tick'а
    pub position: Vec3,
    pub rotation: Quat,
    /// Время симуляции (сек) для FallSample
    pub elapsed: f32,
    pub config: &'a LocomotionConfig,
    pub grounding: &'a GroundProbeConfig,
    pub climbing: &'a ClimbConfig,
}

impl LocomotionContext<'_> {
    fn feet(&self) -> Vec3 {
        self.body.feet(self.position)
    }

    fn ground_probe(&self) -> GroundProbe {
        GroundProbe::new(*self.grounding)
    }
}

/// Side effects tick'а (presentation, логи, тесты)
#[derive(Debug, Clone, PartialEq)]
pub enum LocomotionEffect {
    Entered(LocomotionStateKind),
    Exited(LocomotionStateKind),
    Jumped,
    Landed { fall_distance: f32, damage: f32, airtime: f32 },
    MantleStarted { target: Vec3 },
    MantleAborted(MantleAbort),
}

/// Результат tick'а
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocomotionOutput {
    /// World-space displacement
    pub delta: Vec3,
    /// Новая ориентация (None: без изменений)
    pub rotation: Option<Quat>,
    /// Delta применяется без sweep (mantle interpolation)
    pub kinematic: bool,
    pub effects: Vec<LocomotionEffect>,
}

/// Запрос на переход
///
/// Landing и Mantling несут свой payload: без FallSample / MantlePlan
/// в них не войти.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StateRequest {
    Idle,
    Walking,
    Sprinting,
    Crouching,
    Sliding,
    Jumping,
    Falling,
    /// Landing с завершаемым FallSample
    Landing(FallSample),
    Climbing,
    Mantling(MantlePlan),
}

impl StateRequest {
    fn kind(&self) -> LocomotionStateKind {
        match self {
            StateRequest::Idle => LocomotionStateKind::Idle,
            StateRequest::Walking => LocomotionStateKind::Walking,
            StateRequest::Sprinting => LocomotionStateKind::Sprinting,
            StateRequest::Crouching => LocomotionStateKind::Crouching,
            StateRequest::Sliding => LocomotionStateKind::Sliding,
            StateRequest::Jumping => LocomotionStateKind::Jumping,
            StateRequest::Falling => LocomotionStateKind::Falling,
            StateRequest::Landing(_) => LocomotionStateKind::Landing,
            StateRequest::Climbing => LocomotionStateKind::Climbing,
            StateRequest::Mantling(_) => LocomotionStateKind::Mantling,
        }
    }
}

/// Плавный возврат в вертикаль (explicit progress вместо coroutine)
#[derive(Debug, Clone, Copy, PartialEq)]
struct UprightReset {
    from: Quat,
    to: Quat,
    elapsed: f32,
}

/// Рабочие значения одного tick'а
struct Frame {
    grounded: bool,
    rotation: Quat,
    delta: Vec3,
    kinematic: bool,
}

/// State machine игрока (компонент на player entity)
#[derive(Component, Debug, Clone, Default)]
pub struct PlayerStateMachine {
    state: LocomotionState,
    started: bool,
    vertical_velocity: f32,
    /// Горизонтальная скорость на момент прыжка
    stored_momentum: Vec3,
    /// Горизонтальная скорость прошлого tick'а
    planar_velocity: Vec3,
    upright_reset: Option<UprightReset>,
    /// Отклонение взгляда от стены при лазании (градусы)
    climb_yaw_offset: f32,
}

impl PlayerStateMachine {
    /// Machine, уже находящаяся в `state` (без начального enter)
    pub fn in_state(state: LocomotionState) -> Self {
        Self {
            state,
            started: true,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn kind(&self) -> LocomotionStateKind {
        self.state.kind()
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn stored_momentum(&self) -> Vec3 {
        self.stored_momentum
    }

    pub fn is_resetting_upright(&self) -> bool {
        self.upright_reset.is_some()
    }

    pub fn update(&mut self, input: &PlayerInput, delta: f32, ctx: &mut LocomotionContext) -> LocomotionOutput {
        let mut out = LocomotionOutput::default();
        let mut frame = Frame {
            grounded: ctx
                .ground_probe()
                .is_grounded(ctx.physics, ctx.feet(), ctx.rotation),
            rotation: ctx.rotation,
            delta: Vec3::ZERO,
            kinematic: false,
        };

        if !self.started {
            self.started = true;
            self.state = LocomotionState::Idle;
            out.effects.push(LocomotionEffect::Entered(LocomotionStateKind::Idle));
        }

        self.advance_orientation(input, delta, ctx, &mut frame);

        if let Some(request) = self.update_state(input, delta, ctx, &mut frame, &mut out) {
            self.switch(request, input, ctx, &mut frame, &mut out);
        }

        self.integrate_gravity(delta, ctx, &mut frame);

        out.delta = frame.delta;
        out.kinematic = frame.kinematic;
        if frame.rotation != ctx.rotation {
            out.rotation = Some(frame.rotation);
        }
        out
    }

    /// Upright reset + free look (на стене и в mantle взгляд ведёт state)
    fn advance_orientation(&mut self, input: &PlayerInput, delta: f32, ctx: &LocomotionContext, frame: &mut Frame) {
        let free_look = !matches!(
            self.state.kind(),
            LocomotionStateKind::Climbing | LocomotionStateKind::Mantling
        );
        let look = if free_look && input.look_yaw != 0.0 {
            Some(Quat::from_rotation_y(input.look_yaw.to_radians()))
        } else {
            None
        };

        if let Some(reset) = self.upright_reset.as_mut() {
            if let Some(look) = look {
                reset.from = look * reset.from;
                reset.to = look * reset.to;
            }
            reset.elapsed += delta;
            let t = if ctx.config.upright_reset_time <= 0.0 {
                1.0
            } else {
                (reset.elapsed / ctx.config.upright_reset_time).clamp(0.0, 1.0)
            };
            frame.rotation = reset.from.slerp(reset.to, t);
            if t >= 1.0 {
                self.upright_reset = None;
            }
        } else if let Some(look) = look {
            frame.rotation = look * frame.rotation;
        }
    }

    fn update_state(
        &mut self,
        input: &PlayerInput,
        delta: f32,
        ctx: &mut LocomotionContext,
        frame: &mut Frame,
        out: &mut LocomotionOutput,
    ) -> Option<StateRequest> {
        let mut state = std::mem::take(&mut self.state);
        let request = match &mut state {
            LocomotionState::Idle => {
                self.planar_velocity = Vec3::ZERO;
                if input.is_moving() {
                    Some(StateRequest::Walking)
                } else if input.sprint_held && ctx.stamina.labor_allowed() {
                    Some(StateRequest::Sprinting)
                } else if input.crouch_held {
                    Some(StateRequest::Crouching)
                } else {
                    self.grounded_gates(input, ctx, frame)
                }
            }
            LocomotionState::Walking => {
                if !input.is_moving() {
                    Some(StateRequest::Idle)
                } else if input.sprint_held && ctx.stamina.labor_allowed() {
                    Some(StateRequest::Sprinting)
                } else if input.crouch_held {
                    Some(StateRequest::Crouching)
                } else {
                    self.grounded_gates(input, ctx, frame).or_else(|| {
                        self.walk(input, ctx.config.walk_speed, delta, frame);
                        None
                    })
                }
            }
            LocomotionState::Sprinting => {
                let cost = ctx.stamina.config.sprint_cost;
                ctx.stamina.drain_over_time(cost, delta);

                if ctx.stamina.current <= 0.0 || !input.sprint_held {
                    Some(moving_or_idle(input))
                } else if input.crouch_held {
                    Some(StateRequest::Sliding)
                } else {
                    self.grounded_gates(input, ctx, frame).or_else(|| {
                        let speed = ctx.config.walk_speed * ctx.config.sprint_multiplier;
                        self.walk(input, speed, delta, frame);
                        None
                    })
                }
            }
            LocomotionState::Crouching => {
                if !input.crouch_held && can_stand_up(ctx) {
                    Some(moving_or_idle(input))
                } else if input.sprint_held {
                    Some(StateRequest::Sliding)
                } else {
                    self.grounded_gates(input, ctx, frame).or_else(|| {
                        let speed = ctx.config.walk_speed * ctx.config.crouch_multiplier;
                        self.walk(input, speed, delta, frame);
                        None
                    })
                }
            }
            LocomotionState::Sliding { elapsed } => {
                *elapsed += delta;

                if !frame.grounded {
                    Some(StateRequest::Falling)
                } else if *elapsed >= ctx.config.slide_duration || !input.crouch_held {
                    Some(if input.crouch_held {
                        StateRequest::Crouching
                    } else {
                        moving_or_idle(input)
                    })
                } else {
                    self.grounded_gates(input, ctx, frame).or_else(|| {
                        self.slide(input, ctx, delta, frame);
                        None
                    })
                }
            }
            LocomotionState::Falling { sample } => self.update_falling(*sample, input, delta, ctx, frame),
            LocomotionState::Climbing { surface, properties } => {
                if surface.is_some_and(|entity| ctx.surfaces.properties(entity).is_none()) {
                    crate::log("🧗 Climb surface vanished, falling back to default properties");
                    *surface = None;
                    *properties = Default::default();
                }
                self.update_climbing(*properties, input, delta, ctx, frame, out)
            }
            LocomotionState::Mantling { plan, elapsed } => {
                *elapsed += delta;
                let (position, rotation) = plan.sample(*elapsed);
                frame.delta = position - ctx.position;
                frame.kinematic = true;
                frame.rotation = rotation;

                if plan.is_complete(*elapsed) {
                    self.vertical_velocity = ctx.config.jump_speed() * ctx.climbing.mantle_impulse_ratio;
                    Some(dispatch_grounded(input, ctx.stamina))
                } else {
                    None
                }
            }
            // One-shot states не доживают до update; если всё же попали: дочищаем
            LocomotionState::Jumping => Some(StateRequest::Falling),
            LocomotionState::Landing => Some(dispatch_grounded(input, ctx.stamina)),
        };
        self.state = state;
        request
    }

    /// Jump / Falling / Climb: общие для всех наземных states
    fn grounded_gates(&self, input: &PlayerInput, ctx: &LocomotionContext, frame: &Frame) -> Option<StateRequest> {
        let labor = ctx.stamina.labor_allowed();

        if input.jump_pressed && frame.grounded && labor {
            return Some(StateRequest::Jumping);
        }
        if !frame.grounded {
            return Some(StateRequest::Falling);
        }
        if input.climb_held && labor && self.climb_target(ctx, frame).is_some() {
            return Some(StateRequest::Climbing);
        }
        None
    }

    fn climb_target(&self, ctx: &LocomotionContext, frame: &Frame) -> Option<crate::physics::ProbeHit> {
        let (forward, _) = planar_axes(frame.rotation);
        can_climb(ctx.physics, ctx.climbing, ctx.position, forward)
    }

    fn walk(&mut self, input: &PlayerInput, speed: f32, delta: f32, frame: &mut Frame) {
        let (forward, right) = planar_axes(frame.rotation);
        let direction = (forward * input.movement.y + right * input.movement.x).clamp_length_max(1.0);
        self.planar_velocity = direction * speed;
        frame.delta += self.planar_velocity * delta;
    }

    fn slide(&mut self, input: &PlayerInput, ctx: &LocomotionContext, delta: f32, frame: &mut Frame) {
        let (forward, right) = planar_axes(frame.rotation);
        let direction = forward + right * input.movement.x * ctx.config.slide_lateral_control;
        self.planar_velocity = direction * ctx.config.walk_speed * ctx.config.slide_multiplier;
        frame.delta += self.planar_velocity * delta;
    }

    fn update_falling(
        &mut self,
        sample: FallSample,
        input: &PlayerInput,
        delta: f32,
        ctx: &mut LocomotionContext,
        frame: &mut Frame,
    ) -> Option<StateRequest> {
        // Падение: тоже расход stamina
        let cost = ctx.stamina.config.regen_rate;
        ctx.stamina.drain_over_time(cost, delta);
        ctx.fall_probe
            .step(ctx.physics, delta, ctx.config.gravity);

        // На подъёме прыжка земля под ногами ещё рядом: landing не проверяем
        if self.vertical_velocity <= 0.0 {
            match ctx
                .ground_probe()
                .poll_landing(ctx.physics, ctx.feet(), frame.rotation, ctx.fall_probe)
            {
                LandingDecision::Grounded => return Some(StateRequest::Landing(sample)),
                LandingDecision::Sliding { unstick, normal } => {
                    self.planar_velocity = unstick;
                    frame.delta += unstick * delta;
                    let parallel = Quat::from_rotation_arc(Vec3::NEG_Z, normal);
                    let t = (ctx.config.rotation_smooth_speed * delta).clamp(0.0, 1.0);
                    frame.rotation = frame.rotation.slerp(parallel, t);
                    return None;
                }
                LandingDecision::StillFalling => {}
            }
        }

        let (forward, right) = planar_axes(frame.rotation);
        let steer = (forward * input.movement.y + right * input.movement.x).clamp_length_max(1.0);
        self.planar_velocity = self.stored_momentum + steer * ctx.config.walk_speed * ctx.config.air_control;
        frame.delta += self.planar_velocity * delta;

        if input.climb_held && ctx.stamina.labor_allowed() && self.climb_target(ctx, frame).is_some() {
            return Some(StateRequest::Climbing);
        }
        None
    }

    fn update_climbing(
        &mut self,
        properties: super::climb::ClimbSurfaceProperties,
        input: &PlayerInput,
        delta: f32,
        ctx: &mut LocomotionContext,
        frame: &mut Frame,
        out: &mut LocomotionOutput,
    ) -> Option<StateRequest> {
        if !input.climb_held || ctx.stamina.current <= 0.0 {
            return Some(StateRequest::Falling);
        }

        let (forward, _) = planar_axes(frame.rotation);
        let Some(hit) = wall_normal(ctx.physics, ctx.climbing, &ctx.body, ctx.position, forward) else {
            // Стена кончилась: вылезаем на верх, иначе падаем
            return Some(match self.try_mantle(ctx, frame, out) {
                Some(plan) => StateRequest::Mantling(plan),
                None => StateRequest::Falling,
            });
        };

        let wall = WallFrame::from_normal(hit.normal);
        let direction = climb_move(input.movement, &wall, &properties).clamp_length_max(1.0);
        let speed = ctx.config.walk_speed * ctx.climbing.climb_speed_multiplier * properties.speed_multiplier;
        frame.delta += direction * speed * delta;
        frame.delta += stick_correction(&hit, ctx.position, ctx.body.radius, ctx.climbing, delta);

        let cost = ctx.stamina.config.climb_cost;
        ctx.stamina.drain_over_time(cost, delta);

        // Лицом к стене, с ограниченным отклонением взгляда
        let max_offset = ctx.climbing.max_climbing_rotation_angle;
        self.climb_yaw_offset = (self.climb_yaw_offset + input.look_yaw).clamp(-max_offset, max_offset);
        let target = Quat::from_rotation_y(self.climb_yaw_offset.to_radians()) * yaw_rotation(-hit.normal);
        let t = (ctx.climbing.wall_turn_speed * delta).clamp(0.0, 1.0);
        frame.rotation = frame.rotation.slerp(target, t);

        if can_mantle(ctx.physics, ctx.climbing, &ctx.body, ctx.position, forward) {
            if let Some(plan) = self.try_mantle(ctx, frame, out) {
                return Some(StateRequest::Mantling(plan));
            }
        }
        None
    }

    /// Mantle opportunistic: при провале debug лог, state не меняется
    fn try_mantle(&self, ctx: &LocomotionContext, frame: &Frame, out: &mut LocomotionOutput) -> Option<MantlePlan> {
        let (forward, _) = planar_axes(frame.rotation);
        match plan_mantle(ctx.physics, ctx.climbing, &ctx.body, ctx.position, frame.rotation, forward) {
            Ok(plan) => Some(plan),
            Err(reason) => {
                crate::log(&format!("Mantle aborted: {}", reason));
                out.effects.push(LocomotionEffect::MantleAborted(reason));
                None
            }
        }
    }

    fn switch(
        &mut self,
        mut request: StateRequest,
        input: &PlayerInput,
        ctx: &mut LocomotionContext,
        frame: &mut Frame,
        out: &mut LocomotionOutput,
    ) {
        for _ in 0..MAX_CHAIN {
            if request.kind() == self.state.kind() {
                return;
            }

            let previous = std::mem::take(&mut self.state);
            self.exit(&previous, frame, ctx, out);

            let (next, chained) = self.enter(request, input, ctx, frame, out);
            crate::log_info(&format!("🏃 Locomotion: {} → {}", previous.name(), next.name()));
            self.state = next;

            match chained {
                Some(next_request) => request = next_request,
                None => return,
            }
        }
        crate::log_warning(&format!(
            "Locomotion transition chain exceeded {} steps, staying in {}",
            MAX_CHAIN,
            self.state.name()
        ));
    }

    fn exit(&mut self, previous: &LocomotionState, frame: &Frame, ctx: &mut LocomotionContext, out: &mut LocomotionOutput) {
        match previous {
            LocomotionState::Falling { .. } => {
                ctx.fall_probe.deactivate();
                let (forward, _) = planar_axes(frame.rotation);
                self.upright_reset = Some(UprightReset {
                    from: frame.rotation,
                    to: yaw_rotation(forward),
                    elapsed: 0.0,
                });
            }
            LocomotionState::Climbing { .. } => {
                self.climb_yaw_offset = 0.0;
            }
            _ => {}
        }
        out.effects.push(LocomotionEffect::Exited(previous.kind()));
    }

    fn enter(
        &mut self,
        request: StateRequest,
        input: &PlayerInput,
        ctx: &mut LocomotionContext,
        frame: &mut Frame,
        out: &mut LocomotionOutput,
    ) -> (LocomotionState, Option<StateRequest>) {
        let (state, chained) = match request {
            StateRequest::Idle => {
                self.planar_velocity = Vec3::ZERO;
                (LocomotionState::Idle, None)
            }
            StateRequest::Walking => (LocomotionState::Walking, None),
            StateRequest::Sprinting => (LocomotionState::Sprinting, None),
            StateRequest::Crouching => (LocomotionState::Crouching, None),
            StateRequest::Sliding => (LocomotionState::Sliding { elapsed: 0.0 }, None),
            StateRequest::Jumping => {
                if frame.grounded {
                    ctx.fall_probe.deactivate();
                    self.stored_momentum = self.planar_velocity;
                    self.vertical_velocity = ctx.config.jump_speed();
                    let cost = ctx.stamina.config.jump_cost;
                    ctx.stamina.drain(cost);
                    out.effects.push(LocomotionEffect::Jumped);
                }
                (LocomotionState::Jumping, Some(StateRequest::Falling))
            }
            StateRequest::Falling => {
                ctx.fall_probe.activate(ctx.feet());
                let sample = FallSample::begin(ctx.position.y, ctx.elapsed);
                (LocomotionState::Falling { sample }, None)
            }
            StateRequest::Landing(sample) => self.enter_landing(sample, input, ctx, out),
            StateRequest::Climbing => {
                let (forward, _) = planar_axes(frame.rotation);
                let surface = wall_normal(ctx.physics, ctx.climbing, &ctx.body, ctx.position, forward)
                    .and_then(|hit| hit.entity);
                let properties = surface
                    .and_then(|entity| ctx.surfaces.properties(entity))
                    .unwrap_or_default();

                self.vertical_velocity = 0.0;
                self.stored_momentum = Vec3::ZERO;
                self.planar_velocity = Vec3::ZERO;
                self.climb_yaw_offset = 0.0;
                (LocomotionState::Climbing { surface, properties }, None)
            }
            StateRequest::Mantling(plan) => {
                self.vertical_velocity = 0.0;
                self.planar_velocity = Vec3::ZERO;
                out.effects.push(LocomotionEffect::MantleStarted { target: plan.target });
                (LocomotionState::Mantling { plan, elapsed: 0.0 }, None)
            }
        };

        out.effects.push(LocomotionEffect::Entered(state.kind()));
        (state, chained)
    }

    /// Landing (one-shot): урон по FallSample ровно один раз, затем dispatch
    fn enter_landing(
        &mut self,
        mut sample: FallSample,
        input: &PlayerInput,
        ctx: &mut LocomotionContext,
        out: &mut LocomotionOutput,
    ) -> (LocomotionState, Option<StateRequest>) {
        sample.finish(ctx.position.y, ctx.elapsed);
        if let Some(damage) = ctx.stamina.apply_landing(&mut sample) {
            out.effects.push(LocomotionEffect::Landed {
                fall_distance: sample.fall_distance().unwrap_or(0.0),
                damage,
                airtime: sample.airtime().unwrap_or(0.0),
            });
        }

        self.stored_momentum = Vec3::ZERO;
        self.vertical_velocity = -ctx.config.grounded_stick_velocity;

        let next = dispatch_grounded(input, ctx.stamina);
        (LocomotionState::Landing, Some(next))
    }

    fn integrate_gravity(&mut self, delta: f32, ctx: &LocomotionContext, frame: &mut Frame) {
        let gravity = ctx.config.gravity;
        match self.state.kind() {
            LocomotionStateKind::Climbing | LocomotionStateKind::Mantling => return,
            LocomotionStateKind::Falling | LocomotionStateKind::Jumping => {
                self.vertical_velocity -= gravity * delta;
            }
            _ => {
                if frame.grounded && self.vertical_velocity < 0.0 {
                    self.vertical_velocity = -ctx.config.grounded_stick_velocity;
                } else {
                    self.vertical_velocity -= gravity * delta;
                }
            }
        }
        frame.delta.y += self.vertical_velocity * delta;
    }
}

fn moving_or_idle(input: &PlayerInput) -> StateRequest {
    if input.is_moving() {
        StateRequest::Walking
    } else {
        StateRequest::Idle
    }
}

/// Куда вернуться на землю по удерживаемому input'у (Landing, Mantling)
fn dispatch_grounded(input: &PlayerInput, stamina: &StaminaEconomy) -> StateRequest {
    if input.is_moving() {
        if input.sprint_held && stamina.labor_allowed() {
            StateRequest::Sprinting
        } else if input.crouch_held {
            StateRequest::Crouching
        } else {
            StateRequest::Walking
        }
    } else if input.crouch_held {
        StateRequest::Crouching
    } else {
        StateRequest::Idle
    }
}

/// Над головой хватает места, чтобы встать из приседа
fn can_stand_up(ctx: &LocomotionContext) -> bool {
    let crouch_height = ctx.config.crouch_height.min(ctx.body.height);
    let clearance = ctx.body.height - crouch_height - 0.1;
    if clearance <= 0.0 {
        return true;
    }
    let origin = ctx.feet() + Vec3::Y * (crouch_height + 0.1);
    ctx.physics
        .raycast(origin, Vec3::Y, clearance, MASK_WORLD)
        .is_none()
}
