//! Tests for the player locomotion state machine.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bevy::prelude::*;
    use bevy_rapier3d::prelude::Group;

    use crate::physics::{
        sweep_motion, CharacterBody, PhysicsQuery, ProbeHit, ProbeScene, ProbeShape, LAYER_CLIMBABLE, LAYER_GROUND,
    };
    use crate::player::climb::{ClimbSurfaceProperties, MantlePlan};
    use crate::player::grounding::FallProbe;
    use crate::player::input::PlayerInput;
    use crate::player::machine::{LocomotionContext, LocomotionEffect, LocomotionOutput, PlayerStateMachine};
    use crate::player::state::{LocomotionState, LocomotionStateKind as K};
    use crate::survival::StaminaEconomy;
    use crate::SimulationConfig;

    const DT: f32 = 1.0 / 60.0;

    /// Machine + мир без ECS: коммит как у integrate_motion
    struct Rig<Q: PhysicsQuery = ProbeScene> {
        scene: Q,
        surfaces: HashMap<Entity, ClimbSurfaceProperties>,
        config: SimulationConfig,
        stamina: StaminaEconomy,
        fall_probe: FallProbe,
        machine: PlayerStateMachine,
        body: CharacterBody,
        position: Vec3,
        rotation: Quat,
        elapsed: f32,
    }

    impl<Q: PhysicsQuery> Rig<Q> {
        fn new(scene: Q, position: Vec3) -> Self {
            let config = SimulationConfig::default();
            Self {
                scene,
                surfaces: HashMap::new(),
                stamina: StaminaEconomy::new(config.stamina),
                config,
                fall_probe: FallProbe::default(),
                machine: PlayerStateMachine::default(),
                body: CharacterBody::default(),
                position,
                rotation: Quat::IDENTITY,
                elapsed: 0.0,
            }
        }

        fn in_state(mut self, state: LocomotionState) -> Self {
            self.machine = PlayerStateMachine::in_state(state);
            self
        }

        fn step(&mut self, input: PlayerInput) -> LocomotionOutput {
            let mut ctx = LocomotionContext {
                physics: &self.scene,
                surfaces: &self.surfaces,
                stamina: &mut self.stamina,
                fall_probe: &mut self.fall_probe,
                body: self.body,
                position: self.position,
                rotation: self.rotation,
                elapsed: self.elapsed,
                config: &self.config.locomotion,
                grounding: &self.config.grounding,
                climbing: &self.config.climbing,
            };
            let output = self.machine.update(&input, DT, &mut ctx);

            self.position = if output.kinematic {
                self.position + output.delta
            } else {
                sweep_motion(&self.scene, self.position, output.delta, &self.body)
            };
            if let Some(rotation) = output.rotation {
                self.rotation = rotation;
            }
            self.elapsed += DT;
            output
        }

        fn kind(&self) -> K {
            self.machine.kind()
        }
    }

    impl Rig {
        fn on_ground() -> Self {
            Self::new(flat_ground(), Vec3::new(0.0, 1.0, 0.0))
        }
    }

    /// Тонкое ребро под осью игрока (x = z = 0): центральный probe видит
    /// ровную площадку, 4 боковых: склон 60°. Только cast'ы вниз.
    struct ThinEdge;

    impl PhysicsQuery for ThinEdge {
        fn cast(
            &self,
            shape: ProbeShape,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            _mask: Group,
        ) -> Option<ProbeHit> {
            if direction.y > -0.9 || origin.y < 0.0 {
                return None;
            }
            let on_axis = origin.x.abs() < 1e-3 && origin.z.abs() < 1e-3;
            let normal = if on_axis {
                Vec3::Y
            } else {
                Quat::from_rotation_x(60f32.to_radians()) * Vec3::Y
            };
            let radius = match shape {
                ProbeShape::Sphere { radius } => radius,
                _ => 0.0,
            };
            let distance = (origin.y - radius).max(0.0);
            (distance <= max_distance).then_some(ProbeHit {
                point: Vec3::new(origin.x, 0.0, origin.z),
                normal,
                distance,
                entity: None,
            })
        }
    }

    fn flat_ground() -> ProbeScene {
        ProbeScene::new().with_plane(Vec3::ZERO, Vec3::Y, LAYER_GROUND)
    }

    /// Стена перед игроком (forward = -Z), лицевая грань на z = -1.5
    fn ground_with_wall(entity: Option<Entity>) -> ProbeScene {
        flat_ground().with_cuboid(
            Vec3::new(0.0, 5.0, -2.0),
            Vec3::new(5.0, 5.0, 0.5),
            LAYER_CLIMBABLE,
            entity,
        )
    }

    fn forward() -> PlayerInput {
        PlayerInput {
            movement: Vec2::Y,
            ..Default::default()
        }
    }

    fn entered(output: &LocomotionOutput) -> Vec<K> {
        output
            .effects
            .iter()
            .filter_map(|effect| match effect {
                LocomotionEffect::Entered(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_first_tick_enters_idle() {
        let mut rig = Rig::on_ground();
        let output = rig.step(PlayerInput::default());

        assert_eq!(rig.kind(), K::Idle);
        assert_eq!(entered(&output), vec![K::Idle]);
    }

    #[test]
    fn test_idle_walk_idle() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());

        rig.step(forward());
        assert_eq!(rig.kind(), K::Walking);

        // Walking двигает вдоль -Z со скоростью walk_speed
        let before = rig.position;
        rig.step(forward());
        let moved = before.z - rig.position.z;
        assert!((moved - 5.0 * DT).abs() < 1e-3, "moved {}", moved);

        rig.step(PlayerInput::default());
        assert_eq!(rig.kind(), K::Idle);
    }

    #[test]
    fn test_zero_stamina_sprint_downgrades_to_walking() {
        let mut rig = Rig::on_ground().in_state(LocomotionState::Sprinting);
        rig.stamina.current = 0.0;

        let input = PlayerInput {
            sprint_held: true,
            ..forward()
        };
        rig.step(input);
        assert_eq!(rig.kind(), K::Walking);

        // Ниже порога labor sprint заново не стартует
        rig.step(input);
        assert_eq!(rig.kind(), K::Walking);
    }

    #[test]
    fn test_sprint_drains_stamina() {
        let mut rig = Rig::on_ground().in_state(LocomotionState::Sprinting);
        let input = PlayerInput {
            sprint_held: true,
            ..forward()
        };

        for _ in 0..60 {
            rig.step(input);
        }

        assert_eq!(rig.kind(), K::Sprinting);
        assert!((rig.stamina.current - 75.0).abs() < 0.1, "stamina {}", rig.stamina.current);
    }

    #[test]
    fn test_jump_chains_into_falling_same_tick() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());

        let output = rig.step(PlayerInput {
            jump_pressed: true,
            ..Default::default()
        });

        assert_eq!(rig.kind(), K::Falling);
        assert_eq!(entered(&output), vec![K::Jumping, K::Falling]);
        assert!(output.effects.contains(&LocomotionEffect::Jumped));
        assert!(output.delta.y > 0.0);
        assert!(rig.machine.vertical_velocity() > 0.0);
        assert!((rig.stamina.current - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_jump_requires_labor_threshold() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());
        rig.stamina.current = 20.0;

        rig.step(PlayerInput {
            jump_pressed: true,
            ..Default::default()
        });

        assert_eq!(rig.kind(), K::Idle);
        assert_eq!(rig.stamina.current, 20.0);
    }

    #[test]
    fn test_jump_lands_without_damage() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());
        rig.step(PlayerInput {
            jump_pressed: true,
            ..Default::default()
        });

        let mut peak = rig.position.y;
        let mut landed = 0;
        for _ in 0..180 {
            let output = rig.step(PlayerInput::default());
            peak = peak.max(rig.position.y);
            landed += entered(&output).iter().filter(|kind| **kind == K::Landing).count();
            if rig.kind() == K::Idle {
                break;
            }
        }

        assert_eq!(rig.kind(), K::Idle);
        assert_eq!(landed, 1);
        // jump_height 1.5 над стартом (центр на 1.0)
        assert!(peak > 2.3 && peak < 2.6, "peak {}", peak);
        assert_eq!(rig.stamina.damage_penalty, 0.0);
    }

    #[test]
    fn test_long_fall_damages_once_and_resets_upright() {
        let mut rig = Rig::new(flat_ground(), Vec3::new(0.0, 12.0, 0.0));

        let mut landings = Vec::new();
        for _ in 0..600 {
            let output = rig.step(PlayerInput::default());
            landings.extend(output.effects.into_iter().filter_map(|effect| match effect {
                LocomotionEffect::Landed { damage, .. } => Some(damage),
                _ => None,
            }));
            if rig.kind() == K::Idle && !landings.is_empty() {
                break;
            }
        }

        assert_eq!(landings.len(), 1);
        assert!(landings[0] > 0.0);
        assert!(rig.stamina.damage_penalty > 0.0);
        assert!(rig.machine.is_resetting_upright());

        for _ in 0..30 {
            rig.step(PlayerInput::default());
        }
        assert_eq!(rig.kind(), K::Idle);
        assert!(!rig.machine.is_resetting_upright());
        assert!(rig.rotation.angle_between(Quat::IDENTITY) < 1e-3);
        // Повторного урона нет
        assert_eq!(rig.stamina.damage_penalty, landings[0].min(1.0));
    }

    #[test]
    fn test_crouch_stays_under_low_ceiling() {
        let ceiling = flat_ground().with_cuboid(Vec3::new(0.0, 2.0, 0.0), Vec3::new(3.0, 0.5, 3.0), LAYER_GROUND, None);
        let mut rig = Rig::new(ceiling, Vec3::new(0.0, 1.0, 0.0)).in_state(LocomotionState::Crouching);

        rig.step(PlayerInput::default());
        assert_eq!(rig.kind(), K::Crouching);

        let mut open = Rig::on_ground().in_state(LocomotionState::Crouching);
        open.step(PlayerInput::default());
        assert_eq!(open.kind(), K::Idle);
    }

    #[test]
    fn test_slide_expires_into_crouch() {
        let mut rig = Rig::on_ground().in_state(LocomotionState::Sprinting);
        let input = PlayerInput {
            sprint_held: true,
            crouch_held: true,
            ..forward()
        };

        rig.step(input);
        assert_eq!(rig.kind(), K::Sliding);

        let held = PlayerInput {
            crouch_held: true,
            ..forward()
        };
        let mut ticks = 0;
        while rig.kind() == K::Sliding && ticks < 120 {
            rig.step(held);
            ticks += 1;
        }

        assert_eq!(rig.kind(), K::Crouching);
        assert!((59..=61).contains(&ticks), "slide lasted {} ticks", ticks);
    }

    #[test]
    fn test_slide_cancelled_by_releasing_crouch() {
        let mut rig = Rig::on_ground().in_state(LocomotionState::Sliding { elapsed: 0.0 });

        rig.step(forward());
        assert_eq!(rig.kind(), K::Walking);
    }

    #[test]
    fn test_climb_latch_move_and_release() {
        let mut rig = Rig::new(ground_with_wall(None), Vec3::new(0.0, 1.0, 0.0));
        rig.step(PlayerInput::default());

        let climb = PlayerInput {
            climb_held: true,
            ..Default::default()
        };
        rig.step(climb);
        assert_eq!(rig.kind(), K::Climbing);
        assert_eq!(rig.machine.vertical_velocity(), 0.0);

        let up = PlayerInput {
            climb_held: true,
            ..forward()
        };
        let before = rig.position.y;
        let output = rig.step(up);
        assert_eq!(rig.kind(), K::Climbing);
        // walk_speed · climb_speed_multiplier = 3 м/с, без гравитации
        assert!((output.delta.y - 3.0 * DT).abs() < 1e-3, "delta {:?}", output.delta);
        assert!(rig.position.y > before);
        assert!(rig.stamina.current < 100.0);

        rig.step(PlayerInput::default());
        assert_eq!(rig.kind(), K::Falling);
    }

    #[test]
    fn test_climb_surface_without_upward_movement() {
        let wall = Entity::from_raw(11);
        let mut rig = Rig::new(ground_with_wall(Some(wall)), Vec3::new(0.0, 1.0, 0.0));
        rig.surfaces.insert(
            wall,
            ClimbSurfaceProperties {
                allows_upward_movement: false,
                ..Default::default()
            },
        );
        rig.step(PlayerInput::default());

        rig.step(PlayerInput {
            climb_held: true,
            ..Default::default()
        });
        assert!(matches!(
            rig.machine.state(),
            LocomotionState::Climbing { surface: Some(entity), .. } if *entity == wall
        ));

        let up = PlayerInput {
            climb_held: true,
            ..forward()
        };
        let output = rig.step(up);
        assert!(output.delta.y.abs() < 1e-5, "delta {:?}", output.delta);

        // Поверхность исчезла → default свойства, вверх снова можно
        rig.surfaces.clear();
        let output = rig.step(up);
        assert!(matches!(
            rig.machine.state(),
            LocomotionState::Climbing { surface: None, .. }
        ));
        assert!(output.delta.y > 0.0);
    }

    #[test]
    fn test_climb_exhaustion_falls() {
        let mut rig = Rig::new(ground_with_wall(None), Vec3::new(0.0, 1.0, 0.0)).in_state(LocomotionState::Climbing {
            surface: None,
            properties: ClimbSurfaceProperties::default(),
        });
        rig.stamina.current = 0.0;

        rig.step(PlayerInput {
            climb_held: true,
            ..Default::default()
        });
        assert_eq!(rig.kind(), K::Falling);
    }

    #[test]
    fn test_mantle_runs_to_completion() {
        let start = Vec3::new(0.0, 1.0, 0.0);
        let plan = MantlePlan {
            start,
            target: Vec3::new(0.0, 2.51, -1.0),
            start_rotation: Quat::IDENTITY,
            end_rotation: Quat::IDENTITY,
            duration: 0.3,
        };
        let mut rig = Rig::on_ground().in_state(LocomotionState::Mantling { plan, elapsed: 0.0 });

        // Input не прерывает mantle
        let noisy = PlayerInput {
            jump_pressed: true,
            climb_held: false,
            ..forward()
        };

        let mut ticks = 0;
        while rig.kind() == K::Mantling && ticks < 60 {
            let output = rig.step(noisy);
            assert!(output.kinematic);
            ticks += 1;
        }

        assert!((18..=19).contains(&ticks), "mantle took {} ticks", ticks);
        assert_eq!(rig.kind(), K::Walking);
        assert!((rig.position.x - plan.target.x).abs() < 1e-4);
        assert!((rig.position.z - plan.target.z).abs() < 1e-4);
        assert!((rig.position.y - plan.target.y).abs() < 0.05);
        // Небольшой upward impulse после mantle
        assert!(rig.machine.vertical_velocity() > 0.0);
    }

    #[test]
    fn test_same_state_request_is_noop() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());

        let output = rig.step(PlayerInput::default());
        assert!(output.effects.is_empty());
        assert_eq!(rig.kind(), K::Idle);
    }

    #[test]
    fn test_look_yaw_turns_walk_direction() {
        let mut rig = Rig::on_ground();
        rig.step(PlayerInput::default());

        // +90° влево: forward становится -X
        rig.step(PlayerInput {
            look_yaw: 90.0,
            ..Default::default()
        });
        let before = rig.position;
        rig.step(forward());
        rig.step(forward());

        let moved = rig.position - before;
        assert!(moved.x < -0.05, "moved {:?}", moved);
        assert!(moved.z.abs() < 1e-3);
    }

    #[test]
    fn test_thin_edge_is_not_a_landing() {
        let mut rig = Rig::new(ThinEdge, Vec3::new(0.0, 2.0, 0.0));

        let mut seen = Vec::new();
        for _ in 0..180 {
            let output = rig.step(PlayerInput::default());
            seen.extend(entered(&output));
        }

        // Стоим на ребре, fall probe осел на центральный столбик
        assert!(rig.body.feet(rig.position).y < 0.1, "feet {:?}", rig.body.feet(rig.position));
        assert!(rig.fall_probe.is_active() && rig.fall_probe.is_settled());
        assert!(!seen.contains(&K::Landing), "entered {:?}", seen);
        assert!(matches!(rig.kind(), K::Falling | K::Sliding), "state {:?}", rig.kind());
    }

    #[test]
    fn test_falls_until_any_ground_signal_then_lands_once() {
        let mut rig = Rig::new(ProbeScene::new(), Vec3::new(0.0, 10.0, 0.0));

        let count_landings = |output: &LocomotionOutput| entered(output).iter().filter(|kind| **kind == K::Landing).count();

        // Пустой мир: 3 секунды в Falling
        let mut landings = 0;
        for _ in 0..180 {
            landings += count_landings(&rig.step(PlayerInput::default()));
        }
        assert_eq!(rig.kind(), K::Falling);
        assert_eq!(landings, 0);
        assert!(rig.position.y < -30.0, "y {}", rig.position.y);

        // Под игроком появился пол
        let floor = rig.body.feet(rig.position) - Vec3::Y * 5.0;
        rig.scene = ProbeScene::new().with_plane(floor, Vec3::Y, LAYER_GROUND);
        for _ in 0..120 {
            landings += count_landings(&rig.step(PlayerInput::default()));
        }

        assert_eq!(landings, 1);
        assert_eq!(rig.kind(), K::Idle);
        assert!((rig.body.feet(rig.position).y - floor.y).abs() < 0.1);
    }

    #[test]
    fn test_climb_to_ledge_mantles_into_walking() {
        // Ledge: передняя грань z = -1, верх y = 1.5
        let ledge = flat_ground().with_cuboid(
            Vec3::new(0.0, 0.75, -2.0),
            Vec3::new(5.0, 0.75, 1.0),
            LAYER_CLIMBABLE,
            None,
        );
        let mut rig = Rig::new(ledge, Vec3::new(0.0, 1.0, -0.4));
        let input = PlayerInput {
            climb_held: true,
            ..forward()
        };

        let mut seen = Vec::new();
        for _ in 0..90 {
            let output = rig.step(input);
            seen.extend(entered(&output));
            if seen.contains(&K::Mantling) && rig.kind() != K::Mantling {
                break;
            }
        }

        let climbing = seen.iter().position(|kind| *kind == K::Climbing).expect("climbing entered");
        let mantling = seen.iter().position(|kind| *kind == K::Mantling).expect("mantling entered");
        assert!(climbing < mantling, "entered {:?}", seen);
        assert_eq!(seen.last(), Some(&K::Walking), "entered {:?}", seen);
        assert_eq!(rig.kind(), K::Walking);

        // Стоим на ledge, а не у подножия
        assert!((rig.position.y - 2.51).abs() < 0.05, "y {}", rig.position.y);
        assert!(rig.position.z < -1.0, "z {}", rig.position.z);

        for _ in 0..10 {
            rig.step(forward());
        }
        assert_eq!(rig.kind(), K::Walking);
    }

    #[test]
    fn test_sliding_off_edge_falls() {
        // Платформа: верх y = 0, край на z = -2.5
        let platform = ProbeScene::new().with_cuboid(
            Vec3::new(0.0, -0.5, -1.0),
            Vec3::new(5.0, 0.5, 1.5),
            LAYER_GROUND,
            None,
        );
        let mut rig = Rig::new(platform, Vec3::new(0.0, 1.0, 0.0)).in_state(LocomotionState::Sliding { elapsed: 0.0 });
        let input = PlayerInput {
            crouch_held: true,
            ..forward()
        };

        let mut ticks = 0;
        let mut last = LocomotionOutput::default();
        while rig.kind() == K::Sliding && ticks < 55 {
            last = rig.step(input);
            ticks += 1;
        }

        // Slide ещё не истёк (60 тиков): выход только из-за потери земли
        assert_eq!(rig.kind(), K::Falling);
        assert_eq!(entered(&last), vec![K::Falling]);
        assert!(last.effects.contains(&LocomotionEffect::Exited(K::Sliding)));
        assert!(rig.position.z < -2.4, "z {}", rig.position.z);
        assert!(rig.fall_probe.is_active());
    }

    #[test]
    fn test_falling_next_to_wall_grabs_on() {
        // Грань стены z = -1.5, игрок в воздухе в 0.9м от неё
        let mut rig = Rig::new(ground_with_wall(None), Vec3::new(0.0, 5.0, -0.6));
        let climb = PlayerInput {
            climb_held: true,
            ..Default::default()
        };

        let first = rig.step(climb);
        assert_eq!(entered(&first), vec![K::Idle, K::Falling]);

        let second = rig.step(climb);
        assert_eq!(entered(&second), vec![K::Climbing]);
        assert_eq!(rig.kind(), K::Climbing);
        assert_eq!(rig.machine.vertical_velocity(), 0.0);
        assert!(!rig.fall_probe.is_active());

        // На стене без input'а не падаем
        let held_at = rig.position.y;
        for _ in 0..10 {
            rig.step(climb);
        }
        assert_eq!(rig.kind(), K::Climbing);
        assert!((rig.position.y - held_at).abs() < 1e-3, "y {}", rig.position.y);
    }
}
