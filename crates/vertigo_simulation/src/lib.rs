//! VERTIGO Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: locomotion игрока, stamina economy,
//! perception монстра, pause/lifecycle.
//!
//! Архитектура:
//! - ECS = правила игры (state machines, ресурсы, таймеры)
//! - Физика снаружи: probes через `physics::PhysicsQuery`
//!   (Rapier в игре, аналитическая `ProbeScene` headless)
//! - Presentation слушает `AnimationSignal` / `MonsterSignal`
//!
//! Порядок tick'а (FixedUpdate 60Hz, chain):
//! Lifecycle → Survival → Locomotion → Motion → Monster → Navigation

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod config;
pub mod lifecycle;
pub mod logger;
pub mod monster;
pub mod physics;
pub mod player;
pub mod survival;

pub use config::{ConfigError, SimulationConfig};
pub use lifecycle::{GameOutcome, LifecycleCommand, LifecyclePlugin, SimulationClock, SimulationPause};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel};
pub use monster::{MonsterBrain, MonsterConfig, MonsterPlugin, MonsterState, MovementCommand};
pub use physics::{CharacterBody, MotionIntent, PhysicsPlugin, ProbeScene};
pub use player::{LocomotionState, Player, PlayerInput, PlayerPlugin, PlayerStateMachine};
pub use survival::{StaminaEconomy, SurvivalPlugin};

/// Частота simulation tick'а
pub const FIXED_HZ: f64 = 60.0;

/// Фазы simulation tick'а (FixedUpdate, строго последовательно)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pause/resume команды, win/lose
    Lifecycle,
    /// Hunger + regen
    Survival,
    /// Input latch + player state machine
    Locomotion,
    /// Коммит MotionIntent в Transform
    Motion,
    /// Perception state machine монстров
    Monster,
    /// Headless navigator (движение к goal)
    Navigation,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed/config от create_headless_app или host'а не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .init_resource::<SimulationConfig>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Lifecycle,
                    SimulationSet::Survival,
                    SimulationSet::Locomotion,
                    SimulationSet::Motion,
                    SimulationSet::Monster,
                    SimulationSet::Navigation,
                )
                    .chain(),
            )
            .add_plugins((
                LifecyclePlugin,
                SurvivalPlugin,
                PlayerPlugin,
                PhysicsPlugin,
                MonsterPlugin,
            ));

        if let Some(level) = app.world().resource::<SimulationConfig>().log_level() {
            set_log_level(level);
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает вручную ровно на один fixed tick за `app.update()`
/// (первый update: нулевой delta), прогоны детерминированы.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / FIXED_HZ)));

    app
}

/// Snapshot компонентов для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
