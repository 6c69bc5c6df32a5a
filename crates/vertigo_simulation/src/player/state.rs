//! LocomotionState: активный state игрока + его transient данные

use bevy::prelude::*;

use super::climb::{ClimbSurfaceProperties, MantlePlan};
use crate::survival::FallSample;

/// Тег состояния без payload (для сигналов, логов, сравнений)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum LocomotionStateKind {
    Idle,
    Walking,
    Sprinting,
    Crouching,
    Sliding,
    Jumping,
    Falling,
    Landing,
    Climbing,
    Mantling,
}

impl LocomotionStateKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocomotionStateKind::Idle => "Idle",
            LocomotionStateKind::Walking => "Walking",
            LocomotionStateKind::Sprinting => "Sprinting",
            LocomotionStateKind::Crouching => "Crouching",
            LocomotionStateKind::Sliding => "Sliding",
            LocomotionStateKind::Jumping => "Jumping",
            LocomotionStateKind::Falling => "Falling",
            LocomotionStateKind::Landing => "Landing",
            LocomotionStateKind::Climbing => "Climbing",
            LocomotionStateKind::Mantling => "Mantling",
        }
    }
}

/// Активный state
///
/// Transient поля живут внутри варианта и пропадают при смене state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocomotionState {
    #[default]
    Idle,
    Walking,
    Sprinting,
    Crouching,
    Sliding {
        elapsed: f32,
    },
    /// One-shot (в update никогда не попадает)
    Jumping,
    Falling {
        sample: FallSample,
    },
    /// One-shot
    Landing,
    Climbing {
        /// Collider стены при latch (None: анонимная геометрия)
        surface: Option<Entity>,
        properties: ClimbSurfaceProperties,
    },
    /// Non-interruptible interpolation на ledge
    Mantling {
        plan: MantlePlan,
        elapsed: f32,
    },
}

impl LocomotionState {
    pub fn kind(&self) -> LocomotionStateKind {
        match self {
            LocomotionState::Idle => LocomotionStateKind::Idle,
            LocomotionState::Walking => LocomotionStateKind::Walking,
            LocomotionState::Sprinting => LocomotionStateKind::Sprinting,
            LocomotionState::Crouching => LocomotionStateKind::Crouching,
            LocomotionState::Sliding { .. } => LocomotionStateKind::Sliding,
            LocomotionState::Jumping => LocomotionStateKind::Jumping,
            LocomotionState::Falling { .. } => LocomotionStateKind::Falling,
            LocomotionState::Landing => LocomotionStateKind::Landing,
            LocomotionState::Climbing { .. } => LocomotionStateKind::Climbing,
            LocomotionState::Mantling { .. } => LocomotionStateKind::Mantling,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Presentation signal: state name + enter/exit
///
/// Animation/UI слой слушает, core никогда не ждёт consumer'а.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AnimationSignal {
    pub entity: Entity,
    pub state: LocomotionStateKind,
    pub entering: bool,
}
