//! Navigator contract: goal-команды от brain'а + headless steering.
//!
//! В игре `MovementCommand` читает внешний navigator (pathfinding);
//! headless `steer_towards_goal` просто идёт по прямой.

use bevy::prelude::*;

use super::fsm::MonsterBrain;
use super::systems::MonsterRelease;
use crate::lifecycle::SimulationPause;
use crate::physics::yaw_rotation;

/// Текущая команда движения монстра
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub enum MovementCommand {
    #[default]
    Idle,
    MoveToPosition {
        target: Vec3,
    },
    Stop,
}

impl MovementCommand {
    pub fn target(&self) -> Option<Vec3> {
        match self {
            MovementCommand::MoveToPosition { target } => Some(*target),
            _ => None,
        }
    }
}

/// Скорость headless navigator'а (м/с)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct MovementSpeed(pub f32);

impl Default for MovementSpeed {
    fn default() -> Self {
        Self(6.0)
    }
}

/// Один шаг к цели: (новая позиция, дошли)
///
/// Overshoot не допускается: остаток меньше шага → ровно в target.
pub fn step_towards(position: Vec3, target: Vec3, speed: f32, delta: f32) -> (Vec3, bool) {
    let offset = target - position;
    let distance = offset.length();
    let step = speed * delta;

    if distance <= step || distance < f32::EPSILON {
        (target, true)
    } else {
        (position + offset / distance * step, false)
    }
}

/// Система: MoveToPosition → Transform (по прямой, лицом к цели)
///
/// Спящие монстры (до MonsterRelease) и пауза: стоим.
pub fn steer_towards_goal(
    mut monsters: Query<(&mut MovementCommand, &MovementSpeed, &mut Transform), With<MonsterBrain>>,
    release: Res<MonsterRelease>,
    pause: Res<SimulationPause>,
    time: Res<Time>,
) {
    if pause.is_paused() || !release.is_released() {
        return;
    }

    let delta = time.delta_secs();
    for (mut command, speed, mut transform) in monsters.iter_mut() {
        let Some(target) = command.target() else {
            continue;
        };

        let facing = target - transform.translation;
        if Vec2::new(facing.x, facing.z).length_squared() > 1e-6 {
            transform.rotation = yaw_rotation(facing);
        }

        let (position, arrived) = step_towards(transform.translation, target, speed.0, delta);
        transform.translation = position;
        if arrived {
            *command = MovementCommand::Idle;
        }
    }
}
