//! Player domain: locomotion
//!
//! Содержит:
//! - PlayerInput (tick snapshot) + InputLatch
//! - PlayerStateMachine (Idle/Walking/.../Climbing/Mantling)
//! - GroundProbe + FallProbe (grounding, landing)
//! - Climb/Mantle kinematics
//!
//! Tick: latch_player_input → update_locomotion → (Motion) integrate_motion

use bevy::prelude::*;

pub mod climb;
pub mod grounding;
pub mod input;
pub mod machine;
pub mod state;
pub mod systems;

#[cfg(test)]
mod machine_tests;

pub use climb::{
    can_climb, can_mantle, climb_move, plan_mantle, stick_correction, wall_normal, ClimbConfig, ClimbSurfaceProperties,
    ClimbableSurface, MantleAbort, MantlePlan, NoSurfaces, SurfaceLookup, WallFrame,
};
pub use grounding::{FallProbe, GroundProbe, GroundProbeConfig, GroundSample, LandingDecision};
pub use input::{InputLatch, PlayerInput, RawInput, MOVE_DEADZONE};
pub use machine::{LocomotionConfig, LocomotionContext, LocomotionEffect, LocomotionOutput, PlayerStateMachine};
pub use state::{AnimationSignal, LocomotionState, LocomotionStateKind};
pub use systems::{latch_player_input, update_locomotion};

use crate::physics::{player_groups, spawn_character_collider, CharacterBody, MotionIntent, SceneProxy, LAYER_PLAYER};
use crate::survival::StaminaEconomy;
use crate::SimulationConfig;

/// Marker: управляемый игроком персонаж
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Spawn игрока со всеми компонентами симуляции
///
/// Rapier collider инертен без RapierPhysicsPlugin; SceneProxy нужен
/// headless vision (ProbeScene).
pub fn spawn_player(commands: &mut Commands, position: Vec3, config: &SimulationConfig) -> Entity {
    let body = CharacterBody::default();

    commands
        .spawn((
            Player,
            Transform::from_translation(position),
            body,
            PlayerInput::default(),
            RawInput::default(),
            InputLatch::default(),
            PlayerStateMachine::default(),
            StaminaEconomy::new(config.stamina),
            FallProbe::default(),
            MotionIntent::default(),
            SceneProxy {
                radius: body.half_height(),
                layer: LAYER_PLAYER,
            },
        ))
        .insert(spawn_character_collider(&body, player_groups()))
        .id()
}

/// Player Plugin
///
/// Регистрирует системы в FixedUpdate (SimulationSet::Locomotion):
/// 1. latch_player_input: RawInput → PlayerInput
/// 2. update_locomotion: state machine → MotionIntent + AnimationSignal
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationSignal>().add_systems(
            FixedUpdate,
            (latch_player_input, update_locomotion)
                .chain()
                .in_set(crate::SimulationSet::Locomotion),
        );
    }
}
