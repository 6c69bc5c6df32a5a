//! Monster perception: vision sweep + выбор точек (wander / flee)
//!
//! Vision: горизонтальный sweep в [-90°, 90°] от forward (положительный
//! угол: вправо) + вертикальный веер лучей на каждый sample.
//! Игрок замечен, если ПЕРВЫЙ hit луча: collider игрока.

use bevy::prelude::*;
use rand::Rng;

use crate::physics::{PhysicsQuery, ProbeHit, MASK_VISION, MASK_WORLD};

/// Границы sweep'а (градусы)
pub const SWEEP_LIMIT: f32 = 90.0;

/// Дистанция лучей height correction
const HEIGHT_PROBE_DISTANCE: f32 = 500.0;

/// 8×8 веер для height correction
const HEIGHT_FAN_SLICES: usize = 8;

/// Шаг sweep'а: угол осциллирует между ±SWEEP_LIMIT
pub fn advance_sweep(angle: f32, sweeping_right: bool, speed: f32, delta: f32) -> (f32, bool) {
    let step = speed * delta;
    let angle = if sweeping_right { angle + step } else { angle - step };

    if angle >= SWEEP_LIMIT {
        (SWEEP_LIMIT, false)
    } else if angle <= -SWEEP_LIMIT {
        (-SWEEP_LIMIT, true)
    } else {
        (angle, sweeping_right)
    }
}

/// Горизонтальное направление взгляда при угле sweep'а
pub fn sweep_direction(forward: Vec3, angle_degrees: f32) -> Vec3 {
    let planar = Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z);
    Quat::from_rotation_y(-angle_degrees.to_radians()) * planar
}

/// Вертикальный веер: `count` лучей равномерно в [-range/2, range/2]
pub fn vision_fan(base: Vec3, count: usize, angle_range: f32) -> Vec<Vec3> {
    let axis = base.cross(Vec3::Y).normalize_or(Vec3::X);
    let half = angle_range * 0.5;

    (0..count)
        .map(|i| {
            let t = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.5 };
            let pitch = (-half + (angle_range * t)).to_radians();
            Quat::from_axis_angle(axis, pitch) * base
        })
        .collect()
}

/// Первый hit каждого луча; Some(hit) если хоть один луч упёрся в `player`
pub fn scan_for_player(
    physics: &dyn PhysicsQuery,
    eye: Vec3,
    directions: &[Vec3],
    distance: f32,
    player: Entity,
) -> Option<ProbeHit> {
    directions
        .iter()
        .filter_map(|direction| physics.raycast(eye, *direction, distance, MASK_VISION))
        .find(|hit| hit.entity == Some(player))
}

/// Случайная точка на расстоянии [min, max] от `base`
///
/// `bias`: предпочтительное направление (разброс ±`angle_range`°);
/// None → любое горизонтальное направление.
pub fn pick_wander_target(
    rng: &mut (impl Rng + ?Sized),
    base: Vec3,
    min_distance: f32,
    max_distance: f32,
    bias: Option<Vec3>,
    angle_range: f32,
) -> Vec3 {
    let direction = match bias.map(|b| Vec3::new(b.x, 0.0, b.z).normalize_or_zero()) {
        Some(direction) if direction != Vec3::ZERO => {
            let spread = if angle_range > 0.0 {
                rng.gen_range(-angle_range..=angle_range)
            } else {
                0.0
            };
            Quat::from_rotation_y(spread.to_radians()) * direction
        }
        _ => {
            let heading = rng.gen_range(0.0..std::f32::consts::TAU);
            Vec3::new(heading.cos(), 0.0, heading.sin())
        }
    };

    let min_distance = min_distance.max(0.0);
    let max_distance = max_distance.max(min_distance);
    let distance = if max_distance > min_distance {
        rng.gen_range(min_distance..=max_distance)
    } else {
        min_distance
    };

    base + direction * distance
}

/// Прижимает точку к ближайшей поверхности (веер 8×8 лучей)
///
/// Нет ни одного hit'а → точка без изменений.
pub fn height_correct(physics: &dyn PhysicsQuery, point: Vec3) -> Vec3 {
    let step = std::f32::consts::TAU / HEIGHT_FAN_SLICES as f32;
    let mut nearest: Option<ProbeHit> = None;

    for i in 0..HEIGHT_FAN_SLICES {
        for j in 0..HEIGHT_FAN_SLICES {
            let rotation = Quat::from_euler(EulerRot::YXZ, j as f32 * step, i as f32 * step, 0.0);
            let direction = (rotation * Vec3::ONE).normalize();
            let Some(hit) = physics.raycast(point, direction, HEIGHT_PROBE_DISTANCE, MASK_WORLD) else {
                continue;
            };
            if nearest.is_none_or(|best| hit.distance < best.distance) {
                nearest = Some(hit);
            }
        }
    }

    nearest.map_or(point, |hit| hit.point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{ProbeScene, LAYER_GROUND, LAYER_PLAYER};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sweep_bounces_between_limits() {
        let (angle, right) = advance_sweep(85.0, true, 60.0, 0.5);
        assert_eq!((angle, right), (90.0, false));

        let (angle, right) = advance_sweep(angle, right, 60.0, 0.5);
        assert_eq!((angle, right), (60.0, false));

        let (angle, right) = advance_sweep(-80.0, false, 60.0, 1.0);
        assert_eq!((angle, right), (-90.0, true));
    }

    #[test]
    fn test_sweep_direction_sign() {
        // forward -Z: +90° смотрит вправо (+X), -90° влево (-X)
        assert!(sweep_direction(Vec3::NEG_Z, 90.0).abs_diff_eq(Vec3::X, 1e-5));
        assert!(sweep_direction(Vec3::NEG_Z, -90.0).abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn test_vision_fan_is_symmetric() {
        let fan = vision_fan(Vec3::NEG_Z, 16, 60.0);
        assert_eq!(fan.len(), 16);

        let first = fan[0];
        let last = fan[15];
        assert!((first.y + last.y).abs() < 1e-5);
        assert!((first.y.abs() - 30f32.to_radians().sin()).abs() < 1e-4);
        assert!(fan.iter().all(|d| (d.length() - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_scan_ignores_player_behind_wall() {
        let player = Entity::from_raw(5);
        let visible = ProbeScene::new().with_sphere(Vec3::new(0.0, 1.5, -10.0), 1.0, LAYER_PLAYER, Some(player));
        let fan = vision_fan(Vec3::NEG_Z, 5, 20.0);

        assert!(scan_for_player(&visible, Vec3::new(0.0, 1.5, 0.0), &fan, 50.0, player).is_some());

        let hidden = visible.with_cuboid(Vec3::new(0.0, 1.5, -5.0), Vec3::new(5.0, 5.0, 0.5), LAYER_GROUND, None);
        assert!(scan_for_player(&hidden, Vec3::new(0.0, 1.5, 0.0), &fan, 50.0, player).is_none());
    }

    #[test]
    fn test_wander_target_respects_radius_and_bias() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let base = Vec3::new(10.0, 0.0, 10.0);

        for _ in 0..100 {
            let point = pick_wander_target(&mut rng, base, 25.0, 40.0, Some(Vec3::X), 30.0);
            let offset = point - base;
            let distance = offset.length();
            assert!((25.0 - 1e-3..=40.0 + 1e-3).contains(&distance));
            // В пределах ±30° от bias
            assert!(offset.normalize().dot(Vec3::X) >= 30f32.to_radians().cos() - 1e-4);
        }

        // max < min → ровно min
        let point = pick_wander_target(&mut rng, base, 25.0, 5.0, None, 30.0);
        assert!(((point - base).length() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_height_correct_snaps_to_ground() {
        let scene = ProbeScene::new().with_plane(Vec3::ZERO, Vec3::Y, LAYER_GROUND);
        let corrected = height_correct(&scene, Vec3::new(3.0, 4.0, 3.0));
        assert!(corrected.y.abs() < 1e-4);

        let empty = ProbeScene::new();
        let point = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(height_correct(&empty, point), point);
    }
}
