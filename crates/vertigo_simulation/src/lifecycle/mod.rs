//! Lifecycle domain: pause/resume + win/lose
//!
//! Архитектура:
//! - `SimulationPause`: единственный флаг, который проверяют ВСЕ системы
//!   симуляции в начале tick'а (timers, probes, motion замораживаются)
//! - `LifecycleCommand`: event от host'а (меню паузы, Escape)
//! - `SimulationClock`: время симуляции, идёт только без паузы
//!   (FallSample airtime не раздувается паузой)
//! - `GameOutcome`: победа (игрок выше `win_height`) или поражение
//!   (max_cap == 0); автоматически ставит паузу
//!
//! Память state machines (state, timers, targets) на паузе не трогается.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::survival::StaminaEconomy;
use crate::SimulationConfig;

/// Параметры lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Высота вершины (победа когда игрок выше)
    pub win_height: f32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { win_height: 400.0 }
    }
}

/// Исход игры
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Команда host'а
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    Pause,
    Resume,
    Toggle,
}

/// Resource: глобальный pause flag
///
/// После `GameOutcome` симуляция остаётся на паузе (resume игнорируется,
/// рестарт: пересоздание App).
#[derive(Resource, Debug, Clone, Default, Reflect)]
#[reflect(Resource)]
pub struct SimulationPause {
    paused: bool,
    outcome: Option<GameOutcome>,
}

impl SimulationPause {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Возвращает false если игра уже закончилась (пауза остаётся)
    pub fn resume(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.paused = false;
        true
    }

    pub fn toggle(&mut self) -> bool {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.paused
    }

    /// Фиксирует исход (первый побеждает) и ставит паузу
    pub fn finish(&mut self, outcome: GameOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        self.paused = true;
        true
    }
}

/// Resource: время симуляции (сек), сумма fixed delta вне паузы
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct SimulationClock {
    elapsed: f32,
}

impl SimulationClock {
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn advance(&mut self, delta: f32) {
        self.elapsed += delta.max(0.0);
    }
}

/// Система: шаг SimulationClock (последней в Lifecycle, после win/lose)
pub fn advance_simulation_clock(time: Res<Time>, pause: Res<SimulationPause>, mut clock: ResMut<SimulationClock>) {
    if pause.is_paused() {
        return;
    }
    clock.advance(time.delta_secs());
}

/// Система: LifecycleCommand → SimulationPause
pub fn apply_lifecycle_commands(mut commands: EventReader<LifecycleCommand>, mut pause: ResMut<SimulationPause>) {
    for command in commands.read() {
        let was_paused = pause.is_paused();
        match command {
            LifecycleCommand::Pause => pause.pause(),
            LifecycleCommand::Resume => {
                if !pause.resume() {
                    crate::log_warning(&format!(
                        "Resume ignored: game already finished ({:?})",
                        pause.outcome()
                    ));
                }
            }
            LifecycleCommand::Toggle => {
                pause.toggle();
            }
        }

        if was_paused != pause.is_paused() {
            crate::log_info(&format!(
                "{} Simulation {}",
                if pause.is_paused() { "⏸️" } else { "▶️" },
                if pause.is_paused() { "paused" } else { "resumed" }
            ));
        }
    }
}

/// Система: проверка win/lose по состоянию игрока
///
/// Lose имеет приоритет (истощённый игрок на вершине всё равно проиграл).
pub fn detect_outcome(
    players: Query<(&Transform, &StaminaEconomy), With<Player>>,
    config: Res<SimulationConfig>,
    mut pause: ResMut<SimulationPause>,
    mut outcomes: EventWriter<GameOutcome>,
) {
    if pause.is_paused() {
        return;
    }

    for (transform, stamina) in players.iter() {
        let outcome = if stamina.is_depleted() {
            Some(GameOutcome::Lost)
        } else if transform.translation.y > config.lifecycle.win_height {
            Some(GameOutcome::Won)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            if pause.finish(outcome) {
                crate::log_info(&format!(
                    "🏁 Game over: {:?} at height {:.1}",
                    outcome, transform.translation.y
                ));
                outcomes.write(outcome);
            }
            return;
        }
    }
}

/// Lifecycle Plugin
///
/// Первым в FixedUpdate chain: команды host'а, затем win/lose.
pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationPause>()
            .init_resource::<SimulationClock>()
            .add_event::<LifecycleCommand>()
            .add_event::<GameOutcome>()
            .add_systems(
                FixedUpdate,
                (apply_lifecycle_commands, detect_outcome, advance_simulation_clock)
                    .chain()
                    .in_set(crate::SimulationSet::Lifecycle),
            );
    }
}
