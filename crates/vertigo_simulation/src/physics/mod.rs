//! Physics query surface
//!
//! Симуляция не владеет физикой: ground/wall/vision probes это синхронные
//! point-in-time casts через `PhysicsQuery`.
//!
//! Реализации:
//! - `RapierProbe`: поверх bevy_rapier3d контекста (игра)
//! - `ProbeScene`: аналитическая геометрия (headless прогоны, тесты)

pub mod backend;
pub mod body;
pub mod layers;
pub mod query;
pub mod rapier;
pub mod scene;


pub use backend::ProbeBackend;
pub use body::{
    integrate_motion, planar_axes, spawn_character_collider, sweep_motion, sync_scene_proxies, yaw_rotation,
    CharacterBody, MotionIntent, SceneProxy,
};
pub use layers::*;
pub use query::{PhysicsQuery, ProbeHit, ProbeShape};
pub use rapier::RapierProbe;
pub use scene::{ProbeScene, SceneSolid, SolidShape};

use bevy::prelude::*;

/// Physics Plugin
///
/// Коммит motion после locomotion:
/// 1. integrate_motion: MotionIntent → Transform (sweep)
/// 2. sync_scene_proxies: proxy-сферы ProbeScene следуют за Transform
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (integrate_motion, sync_scene_proxies)
                .chain()
                .in_set(crate::SimulationSet::Motion),
        );
    }
}
