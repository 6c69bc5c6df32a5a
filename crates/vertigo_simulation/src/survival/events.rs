//! Survival events

use bevy::prelude::*;

/// Расходник, применённый к персонажу
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Consumable {
    /// Уменьшает hunger_penalty на долю
    Food { amount: f32 },
    /// Уменьшает damage_penalty на долю
    Medicine { amount: f32 },
}

/// Event: inventory применил предмет (timers/UI на стороне inventory)
#[derive(Event, Debug, Clone, Copy)]
pub struct ConsumableUsed {
    pub entity: Entity,
    pub item: Consumable,
}
