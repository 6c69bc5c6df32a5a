//! Player systems (FixedUpdate, SimulationSet::Locomotion).

use bevy::prelude::*;

use super::climb::ClimbableSurface;
use super::grounding::FallProbe;
use super::input::{InputLatch, PlayerInput, RawInput};
use super::machine::{LocomotionContext, LocomotionEffect, PlayerStateMachine};
use super::state::AnimationSignal;
use super::Player;
use crate::lifecycle::{SimulationClock, SimulationPause};
use crate::physics::{CharacterBody, MotionIntent, ProbeBackend};
use crate::survival::StaminaEconomy;
use crate::SimulationConfig;

/// Система: RawInput → PlayerInput (jump edge, crouch toggle)
///
/// На паузе latch не обновляется: нажатие во время паузы не "копится".
pub fn latch_player_input(
    mut query: Query<(&RawInput, &mut InputLatch, &mut PlayerInput)>,
    pause: Res<SimulationPause>,
) {
    if pause.is_paused() {
        return;
    }

    for (raw, mut latch, mut input) in query.iter_mut() {
        *input = latch.latch(raw);
    }
}

/// Система: один tick player state machine
///
/// Probes через ProbeBackend; результат пишется в MotionIntent,
/// коммит в Transform делает integrate_motion (SimulationSet::Motion).
pub fn update_locomotion(
    mut players: Query<
        (
            Entity,
            &PlayerInput,
            &CharacterBody,
            &Transform,
            &mut PlayerStateMachine,
            &mut StaminaEconomy,
            &mut FallProbe,
            &mut MotionIntent,
        ),
        With<Player>,
    >,
    surfaces: Query<&ClimbableSurface>,
    backend: ProbeBackend,
    config: Res<SimulationConfig>,
    time: Res<Time>,
    clock: Res<SimulationClock>,
    pause: Res<SimulationPause>,
    mut signals: EventWriter<AnimationSignal>,
) {
    if pause.is_paused() {
        return;
    }

    let delta = time.delta_secs();
    // Часы симуляции (не wall clock): пауза не попадает в airtime
    let elapsed = clock.elapsed();

    for (entity, input, body, transform, mut machine, mut stamina, mut fall_probe, mut intent) in players.iter_mut() {
        let output = backend.with_query(Some(entity), |physics| {
            let mut ctx = LocomotionContext {
                physics,
                surfaces: &surfaces,
                stamina: &mut *stamina,
                fall_probe: &mut *fall_probe,
                body: *body,
                position: transform.translation,
                rotation: transform.rotation,
                elapsed,
                config: &config.locomotion,
                grounding: &config.grounding,
                climbing: &config.climbing,
            };
            machine.update(input, delta, &mut ctx)
        });

        // Нет физики: state machine ждёт (probes невозможны)
        let Some(output) = output else {
            continue;
        };

        intent.delta = output.delta;
        intent.rotation = output.rotation;
        intent.kinematic = output.kinematic;

        for effect in output.effects {
            match effect {
                LocomotionEffect::Entered(state) => {
                    signals.write(AnimationSignal {
                        entity,
                        state,
                        entering: true,
                    });
                }
                LocomotionEffect::Exited(state) => {
                    signals.write(AnimationSignal {
                        entity,
                        state,
                        entering: false,
                    });
                }
                LocomotionEffect::Landed {
                    fall_distance,
                    damage,
                    airtime,
                } => {
                    if damage > 0.0 {
                        crate::log_info(&format!(
                            "💥 {:?} landed: fell {:.1}m in {:.2}s, damage {:.2} (stamina cap {:.1})",
                            entity,
                            fall_distance,
                            airtime,
                            damage,
                            stamina.max_cap()
                        ));
                    } else {
                        crate::log(&format!("{:?} landed: fell {:.1}m", entity, fall_distance));
                    }
                }
                LocomotionEffect::Jumped => {
                    crate::log(&format!("{:?} jumped (stamina {:.1})", entity, stamina.current));
                }
                LocomotionEffect::MantleStarted { target } => {
                    crate::log_info(&format!("🧗 {:?} mantling onto ledge at {:?}", entity, target));
                }
                LocomotionEffect::MantleAborted(_) => {}
            }
        }
    }
}
