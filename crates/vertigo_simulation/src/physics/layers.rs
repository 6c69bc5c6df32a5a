//! Collision layers для probes
//!
//! ## Архитектура:
//! - **Membership:** на каком слое находится collider
//! - **Mask:** какие слои видит конкретный probe
//!
//! Слои: rapier `Group` битовые маски, чтобы `ProbeScene` и `RapierProbe`
//! фильтровали одинаково.

use bevy_rapier3d::prelude::{CollisionGroups, Group};

/// Layer 1: Ground (terrain, walkable static geometry)
pub const LAYER_GROUND: Group = Group::GROUP_1;

/// Layer 2: Climbable (скалы, стены с ClimbableSurface)
pub const LAYER_CLIMBABLE: Group = Group::GROUP_2;

/// Layer 3: Player capsule
pub const LAYER_PLAYER: Group = Group::GROUP_3;

/// Layer 4: Monsters
pub const LAYER_MONSTER: Group = Group::GROUP_4;

/// Mask: статичный мир (grounding, wall, ledge probes)
pub const MASK_WORLD: Group = LAYER_GROUND.union(LAYER_CLIMBABLE);

/// Mask: vision rays монстра (мир закрывает обзор + игрок)
pub const MASK_VISION: Group = MASK_WORLD.union(LAYER_PLAYER);

/// Collision groups для player collider
pub fn player_groups() -> CollisionGroups {
    CollisionGroups::new(LAYER_PLAYER, MASK_WORLD.union(LAYER_MONSTER))
}

/// Collision groups для monster collider
pub fn monster_groups() -> CollisionGroups {
    CollisionGroups::new(LAYER_MONSTER, MASK_WORLD.union(LAYER_PLAYER))
}
