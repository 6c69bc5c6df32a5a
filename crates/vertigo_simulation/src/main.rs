//! Headless симуляция VERTIGO
//!
//! Скала + игрок, бегущий к подножию, + один монстр.
//! Опционально: путь к TOML конфигу первым аргументом.

use bevy::prelude::*;
use vertigo_simulation::monster::spawn_monster;
use vertigo_simulation::physics::{LAYER_CLIMBABLE, LAYER_GROUND};
use vertigo_simulation::player::{spawn_player, ClimbableSurface, RawInput};
use vertigo_simulation::*;

fn cliff_scene(surface: Entity) -> ProbeScene {
    ProbeScene::new()
        .with_plane(Vec3::ZERO, Vec3::Y, LAYER_GROUND)
        // Стена: передняя грань z = -20, высота 30м
        .with_cuboid(Vec3::new(0.0, 15.0, -25.0), Vec3::new(20.0, 15.0, 5.0), LAYER_CLIMBABLE, Some(surface))
}

fn main() {
    let seed = 42;
    println!("Starting VERTIGO headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    // Битый конфиг: defaults + warning в логе
    if let Some(path) = std::env::args().nth(1) {
        app.insert_resource(SimulationConfig::load_or_default(&path));
    }

    app.add_plugins(SimulationPlugin);

    let config = app.world().resource::<SimulationConfig>().clone();
    let surface = app.world_mut().spawn(ClimbableSurface::default()).id();
    app.insert_resource(cliff_scene(surface));

    let player = spawn_player(&mut app.world_mut().commands(), Vec3::new(0.0, 1.0, 0.0), &config);
    let monster = spawn_monster(&mut app.world_mut().commands(), Vec3::new(15.0, 0.0, 10.0), &config);
    app.world_mut().flush();

    // Бежим к стене и лезем
    if let Some(mut raw) = app.world_mut().get_mut::<RawInput>(player) {
        raw.movement = Vec2::Y;
        raw.climb = true;
    }

    // 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let (Some(transform), Some(machine), Some(stamina)) = (
                world.get::<Transform>(player),
                world.get::<PlayerStateMachine>(player),
                world.get::<StaminaEconomy>(player),
            ) else {
                continue;
            };
            let monster_state = world.get::<MonsterBrain>(monster).map(|brain| brain.kind());

            println!(
                "Tick {}: player {:?} at {:.2?}, stamina {:.1}/{:.1}, monster {:?}",
                tick,
                machine.kind(),
                transform.translation,
                stamina.current,
                stamina.max_cap(),
                monster_state
            );
        }

        if let Some(outcome) = app.world().resource::<SimulationPause>().outcome() {
            println!("Game over at tick {}: {:?}", tick, outcome);
            break;
        }
    }

    println!("Simulation complete!");
}
