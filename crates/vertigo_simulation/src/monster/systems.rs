//! Monster systems (FixedUpdate, SimulationSet::Monster).

use bevy::prelude::*;

use super::fsm::{MonsterBrain, MonsterContext, MonsterEffect, PlayerSighting};
use super::movement::MovementCommand;
use crate::lifecycle::SimulationPause;
use crate::physics::{planar_axes, ProbeBackend};
use crate::player::Player;
use crate::{DeterministicRng, SimulationConfig};

/// Монстры спят до release: игрок прошёл `release_z` или истёк таймер
#[derive(Resource, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Resource)]
pub struct MonsterRelease {
    released: bool,
    /// Накопленное (не paused) время до release
    timer: f32,
}

impl MonsterRelease {
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Принудительный release (host / тесты)
    pub fn release(&mut self) {
        self.released = true;
    }
}

/// Presentation/audio signal от brain'а
#[derive(Event, Debug, Clone, PartialEq)]
pub struct MonsterSignal {
    pub entity: Entity,
    pub effect: MonsterEffect,
}

/// Система: таймер release + проверка позиции игрока
pub fn update_monster_release(
    players: Query<&Transform, With<Player>>,
    config: Res<SimulationConfig>,
    pause: Res<SimulationPause>,
    time: Res<Time>,
    mut release: ResMut<MonsterRelease>,
) {
    if pause.is_paused() || release.released {
        return;
    }

    release.timer += time.delta_secs();

    let cfg = &config.monster;
    let passed = players.iter().any(|transform| transform.translation.z < cfg.release_z);
    if passed || release.timer >= cfg.release_after {
        release.released = true;
        crate::log_info(&format!(
            "🕷️ Monsters released after {:.1}s ({})",
            release.timer,
            if passed { "player passed threshold" } else { "timer" }
        ));
    }
}

/// Система: один tick perception brain'а каждого монстра
///
/// Brain пишет только MovementCommand; Transform двигает navigator.
pub fn update_monster_brains(
    mut monsters: Query<(Entity, &Transform, &mut MonsterBrain, &mut MovementCommand), Without<Player>>,
    players: Query<(Entity, &Transform), (With<Player>, Without<MonsterBrain>)>,
    backend: ProbeBackend,
    config: Res<SimulationConfig>,
    release: Res<MonsterRelease>,
    pause: Res<SimulationPause>,
    time: Res<Time>,
    mut rng: ResMut<DeterministicRng>,
    mut signals: EventWriter<MonsterSignal>,
) {
    if pause.is_paused() || !release.is_released() {
        return;
    }

    let delta = time.delta_secs();
    let player = players.iter().next().map(|(entity, transform)| PlayerSighting {
        entity,
        position: transform.translation,
        forward: planar_axes(transform.rotation).0,
    });

    for (entity, transform, mut brain, mut command) in monsters.iter_mut() {
        let output = backend.with_query(Some(entity), |physics| {
            let mut ctx = MonsterContext {
                physics,
                rng: &mut rng.rng,
                position: transform.translation,
                forward: planar_axes(transform.rotation).0,
                player,
                config: &config.monster,
            };
            brain.update(delta, &mut ctx)
        });

        let Some(output) = output else {
            continue;
        };

        if let Some(next) = output.command {
            *command = next;
        }

        for effect in output.effects {
            match &effect {
                MonsterEffect::PlayerSpotted { at } => {
                    crate::log_info(&format!("👁️ {:?} spotted player at {:?}", entity, at));
                }
                MonsterEffect::CaughtPlayer => {
                    crate::log_info(&format!("💀 {:?} caught the player", entity));
                }
                MonsterEffect::TargetChosen(target) => {
                    crate::log(&format!("{:?} heading to {:?}", entity, target));
                }
                _ => {}
            }
            signals.write(MonsterSignal { entity, effect });
        }
    }
}
