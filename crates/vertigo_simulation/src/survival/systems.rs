//! Survival systems.

use bevy::prelude::*;

use super::events::{Consumable, ConsumableUsed};
use super::stamina::StaminaEconomy;
use crate::lifecycle::SimulationPause;

/// Система: hunger + regen для всех StaminaEconomy
///
/// На паузе не тикает (regen и голод заморожены).
pub fn tick_stamina(
    mut query: Query<&mut StaminaEconomy>,
    time: Res<Time>,
    pause: Res<SimulationPause>,
) {
    if pause.is_paused() {
        return;
    }

    let delta = time.delta_secs();
    for mut economy in query.iter_mut() {
        economy.tick(delta);
    }
}

/// Система: ConsumableUsed → eat / heal
pub fn apply_consumables(mut events: EventReader<ConsumableUsed>, mut query: Query<&mut StaminaEconomy>) {
    for event in events.read() {
        let Ok(mut economy) = query.get_mut(event.entity) else {
            crate::log_warning(&format!(
                "ConsumableUsed: entity {:?} has no StaminaEconomy, item {:?} ignored",
                event.entity, event.item
            ));
            continue;
        };

        match event.item {
            Consumable::Food { amount } => {
                economy.eat(amount);
                crate::log_info(&format!(
                    "🍖 {:?} ate: hunger penalty now {:.2}",
                    event.entity, economy.hunger_penalty
                ));
            }
            Consumable::Medicine { amount } => {
                economy.heal_damage(amount);
                crate::log_info(&format!(
                    "🩹 {:?} healed: damage penalty now {:.2}",
                    event.entity, economy.damage_penalty
                ));
            }
        }
    }
}
