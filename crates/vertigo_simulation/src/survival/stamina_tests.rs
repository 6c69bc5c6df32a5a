//! Tests for stamina economy.

#[cfg(test)]
mod tests {
    use crate::survival::stamina::*;
    use proptest::prelude::*;

    fn economy() -> StaminaEconomy {
        StaminaEconomy::new(StaminaConfig::default())
    }

    #[test]
    fn test_spawn_full_stamina() {
        let stamina = economy();
        assert_eq!(stamina.current, 100.0);
        assert_eq!(stamina.max_cap(), 100.0);
        assert_eq!(stamina.percentage(), 1.0);
    }

    #[test]
    fn test_max_cap_subtracts_penalties() {
        let mut stamina = economy();
        stamina.add_hunger(0.25);
        stamina.add_damage(0.5);

        // 100 - 25 - 50, не 100·0.75·0.5
        assert!((stamina.max_cap() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_max_cap_never_negative() {
        let mut stamina = economy();
        stamina.add_hunger(0.8);
        stamina.add_damage(0.8);

        assert_eq!(stamina.max_cap(), 0.0);
        assert!(stamina.is_depleted());
        assert_eq!(stamina.current, 0.0);
    }

    #[test]
    fn test_drain_clamps_at_zero() {
        let mut stamina = economy();
        stamina.drain(30.0);
        assert_eq!(stamina.current, 70.0);

        stamina.drain(500.0);
        assert_eq!(stamina.current, 0.0);
        assert!(!stamina.has_stamina(1.0));
    }

    #[test]
    fn test_drain_over_time() {
        let mut stamina = economy();
        stamina.drain_over_time(25.0, 0.5);
        assert!((stamina.current - 87.5).abs() < 1e-4);
    }

    #[test]
    fn test_regen_moves_towards_cap() {
        let mut stamina = economy();
        stamina.drain(50.0);

        stamina.tick(1.0); // +10
        assert!((stamina.current - 60.0).abs() < 1e-4);

        stamina.tick(10.0); // clamp на cap
        assert_eq!(stamina.current, 100.0);
    }

    #[test]
    fn test_damage_clamps_instantly() {
        let mut stamina = economy();
        stamina.add_damage(0.4);

        // cap вниз: мгновенно, без decay
        assert!((stamina.current - 60.0).abs() < 1e-4);

        stamina.heal_damage(0.4);
        assert!((stamina.current - 60.0).abs() < 1e-4);

        // regen вверх: плавно
        stamina.tick(1.0);
        assert!((stamina.current - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_hunger_accrues_in_discrete_steps() {
        let mut stamina = economy();

        stamina.tick(59.0);
        assert_eq!(stamina.hunger_penalty, 0.0);

        stamina.tick(1.0);
        assert!((stamina.hunger_penalty - 0.05).abs() < 1e-6);

        // Остаток аккумулятора не теряется при неровных шагах
        for _ in 0..4 {
            stamina.tick(15.5);
        }
        assert!((stamina.hunger_penalty - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_hunger_clamped_to_one() {
        let mut stamina = economy();
        for _ in 0..30 {
            stamina.tick(60.0);
        }
        assert_eq!(stamina.hunger_penalty, 1.0);
        assert_eq!(stamina.max_cap(), 0.0);
    }

    #[test]
    fn test_labor_threshold_is_strict() {
        let mut stamina = economy();
        stamina.current = 20.0;
        assert!(!stamina.labor_allowed());

        stamina.current = 20.5;
        assert!(stamina.labor_allowed());
    }

    #[test]
    fn test_eat_and_heal_are_symmetric() {
        let mut stamina = economy();
        stamina.add_hunger(0.3);
        stamina.add_damage(0.3);

        stamina.eat(0.1);
        stamina.heal_damage(0.1);
        assert!((stamina.hunger_penalty - 0.2).abs() < 1e-6);
        assert!((stamina.damage_penalty - 0.2).abs() < 1e-6);

        stamina.eat(5.0);
        stamina.heal_damage(5.0);
        assert_eq!(stamina.hunger_penalty, 0.0);
        assert_eq!(stamina.damage_penalty, 0.0);
    }

    #[test]
    fn test_fall_damage_boundary() {
        let config = FallDamageConfig::default();

        assert_eq!(fall_damage(config.safe_distance, &config), 0.0);
        assert_eq!(fall_damage(1.0, &config), 0.0);

        // Разрыв на пороге: сразу за ним минимум base_damage
        let just_over = fall_damage(config.safe_distance + 1e-3, &config);
        assert!(just_over >= config.base_damage);
    }

    #[test]
    fn test_fall_damage_grows_and_saturates() {
        let config = FallDamageConfig::default();

        let small = fall_damage(6.0, &config);
        let big = fall_damage(20.0, &config);
        assert!(big > small);

        assert_eq!(fall_damage(10_000.0, &config), 1.0);
    }

    #[test]
    fn test_landing_damage_applied_once() {
        let mut stamina = economy();
        let mut sample = FallSample::begin(30.0, 0.0);
        sample.finish(10.0, 2.0);

        let first = stamina.apply_landing(&mut sample);
        let penalty_after_first = stamina.damage_penalty;
        let second = stamina.apply_landing(&mut sample);

        assert!(first.is_some_and(|damage| damage > 0.0));
        assert_eq!(second, None);
        assert_eq!(stamina.damage_penalty, penalty_after_first);
        assert!(sample.is_consumed());
    }

    #[test]
    fn test_unfinished_sample_applies_nothing() {
        let mut stamina = economy();
        let mut sample = FallSample::begin(30.0, 0.0);

        assert_eq!(stamina.apply_landing(&mut sample), None);
        assert!(!sample.is_consumed());
    }

    #[test]
    fn test_fall_sample_airtime() {
        let mut sample = FallSample::begin(5.0, 1.0);
        sample.finish(1.0, 2.5);

        assert_eq!(sample.fall_distance(), Some(4.0));
        assert_eq!(sample.airtime(), Some(1.5));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Tick(f32),
        Drain(f32),
        Damage(f32),
        Hunger(f32),
        Heal(f32),
        Eat(f32),
        Fall(f32),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0.0f32..5.0).prop_map(Step::Tick),
            (0.0f32..80.0).prop_map(Step::Drain),
            (0.0f32..0.5).prop_map(Step::Damage),
            (0.0f32..0.5).prop_map(Step::Hunger),
            (0.0f32..0.5).prop_map(Step::Heal),
            (0.0f32..0.5).prop_map(Step::Eat),
            (0.0f32..40.0).prop_map(Step::Fall),
        ]
    }

    proptest! {
        #[test]
        fn prop_stamina_invariant_holds(steps in proptest::collection::vec(step_strategy(), 1..200)) {
            let mut stamina = economy();

            for step in steps {
                match step {
                    Step::Tick(dt) => stamina.tick(dt),
                    Step::Drain(amount) => stamina.drain(amount),
                    Step::Damage(f) => stamina.add_damage(f),
                    Step::Hunger(f) => stamina.add_hunger(f),
                    Step::Heal(f) => stamina.heal_damage(f),
                    Step::Eat(f) => stamina.eat(f),
                    Step::Fall(d) => { stamina.apply_fall_damage(d); }
                }

                // Heal/Eat поднимают cap, не current: инвариант проверяем после tick
                stamina.tick(0.0);
                prop_assert!(stamina.current >= 0.0);
                prop_assert!(stamina.current <= stamina.max_cap() + 1e-4);
                prop_assert!(stamina.max_cap() <= stamina.max);
            }
        }
    }
}
