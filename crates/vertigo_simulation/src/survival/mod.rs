//! Survival domain: stamina economy
//!
//! Содержит:
//! - StaminaEconomy (stamina + hunger/damage penalties)
//! - FallSample + fall damage
//! - ConsumableUsed (event от внешнего inventory: еда/лекарство)

use bevy::prelude::*;

pub mod events;
pub mod stamina;
pub mod systems;

#[cfg(test)]
mod stamina_tests;

pub use events::{Consumable, ConsumableUsed};
pub use stamina::{fall_damage, FallDamageConfig, FallSample, StaminaConfig, StaminaEconomy};
pub use systems::{apply_consumables, tick_stamina};

/// Survival Plugin
///
/// Регистрирует системы в FixedUpdate (до locomotion):
/// 1. apply_consumables: еда/лекарства от inventory
/// 2. tick_stamina: hunger accumulator + regen/cap
pub struct SurvivalPlugin;

impl Plugin for SurvivalPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ConsumableUsed>().add_systems(
            FixedUpdate,
            (apply_consumables, tick_stamina)
                .chain()
                .in_set(crate::SimulationSet::Survival),
        );
    }
}
