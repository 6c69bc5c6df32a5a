//! Monster domain: perception + navigator contract
//!
//! Содержит:
//! - MonsterBrain (Lurking/Chasing/Fleeing)
//! - Vision sweep, wander/flee точки, height correction
//! - MovementCommand (goal для navigator'а) + headless steering
//! - MonsterRelease (монстры спят до порога/таймера)
//!
//! Tick: update_monster_release → update_monster_brains → (Navigation) steer_towards_goal

use bevy::prelude::*;

pub mod fsm;
pub mod movement;
pub mod perception;
pub mod systems;


pub use fsm::{
    MonsterBrain, MonsterConfig, MonsterContext, MonsterEffect, MonsterOutput, MonsterState, MonsterStateKind,
    PlayerSighting,
};
pub use movement::{step_towards, steer_towards_goal, MovementCommand, MovementSpeed};
pub use perception::{advance_sweep, height_correct, pick_wander_target, scan_for_player, sweep_direction, vision_fan};
pub use systems::{update_monster_brains, update_monster_release, MonsterRelease, MonsterSignal};

use crate::physics::{monster_groups, spawn_character_collider, CharacterBody, SceneProxy, LAYER_MONSTER};
use crate::SimulationConfig;

/// Spawn монстра (Transform: на уровне ног)
pub fn spawn_monster(commands: &mut Commands, position: Vec3, config: &SimulationConfig) -> Entity {
    let body = CharacterBody::default();

    commands
        .spawn((
            Transform::from_translation(position),
            MonsterBrain::default(),
            MovementCommand::default(),
            MovementSpeed(config.monster.move_speed),
            SceneProxy {
                radius: body.radius,
                layer: LAYER_MONSTER,
            },
        ))
        .insert(spawn_character_collider(&body, monster_groups()))
        .id()
}

/// Monster Plugin
///
/// SimulationSet::Monster: release → brains; SimulationSet::Navigation: steering.
pub struct MonsterPlugin;

impl Plugin for MonsterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MonsterRelease>()
            .add_event::<MonsterSignal>()
            .add_systems(
                FixedUpdate,
                (update_monster_release, update_monster_brains)
                    .chain()
                    .in_set(crate::SimulationSet::Monster),
            )
            .add_systems(FixedUpdate, steer_towards_goal.in_set(crate::SimulationSet::Navigation));
    }
}
