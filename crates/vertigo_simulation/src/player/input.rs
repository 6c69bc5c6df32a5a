//! Player input snapshot
//!
//! Host (input bindings) пишет `RawInput` каждый кадр; `InputLatch`
//! превращает его в immutable `PlayerInput` на tick:
//! - jump: edge (true только в tick нажатия)
//! - crouch: toggle по нажатию
//!
//! Тесты и AI могут писать `PlayerInput` напрямую (без RawInput latch не работает).

use bevy::prelude::*;

/// Порог |movement| для "двигается"
pub const MOVE_DEADZONE: f32 = 0.1;

/// Снимок input на один simulation tick
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PlayerInput {
    /// x = вправо, y = вперёд (character-local)
    pub movement: Vec2,
    /// Поворот по yaw за tick (градусы, + влево)
    pub look_yaw: f32,
    pub jump_pressed: bool,
    pub sprint_held: bool,
    /// Состояние crouch toggle (не сырая кнопка)
    pub crouch_held: bool,
    pub climb_held: bool,
}

impl PlayerInput {
    pub fn is_moving(&self) -> bool {
        self.movement.length() > MOVE_DEADZONE
    }
}

/// Сырое состояние устройств
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct RawInput {
    pub movement: Vec2,
    pub look_yaw: f32,
    pub jump: bool,
    pub sprint: bool,
    pub crouch: bool,
    pub climb: bool,
}

/// Edge detection для jump + crouch toggle
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct InputLatch {
    crouch_toggled: bool,
    prev_crouch: bool,
    prev_jump: bool,
}

impl InputLatch {
    pub fn latch(&mut self, raw: &RawInput) -> PlayerInput {
        if raw.crouch && !self.prev_crouch {
            self.crouch_toggled = !self.crouch_toggled;
        }
        let jump_pressed = raw.jump && !self.prev_jump;

        self.prev_crouch = raw.crouch;
        self.prev_jump = raw.jump;

        PlayerInput {
            movement: raw.movement.clamp_length_max(1.0),
            look_yaw: raw.look_yaw,
            jump_pressed,
            sprint_held: raw.sprint,
            crouch_held: self.crouch_toggled,
            climb_held: raw.climb,
        }
    }

    pub fn is_crouch_toggled(&self) -> bool {
        self.crouch_toggled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_is_edge_triggered() {
        let mut latch = InputLatch::default();
        let held = RawInput {
            jump: true,
            ..default()
        };

        assert!(latch.latch(&held).jump_pressed);
        assert!(!latch.latch(&held).jump_pressed);

        latch.latch(&RawInput::default());
        assert!(latch.latch(&held).jump_pressed);
    }

    #[test]
    fn test_crouch_toggles_on_press() {
        let mut latch = InputLatch::default();
        let press = RawInput {
            crouch: true,
            ..default()
        };
        let release = RawInput::default();

        assert!(latch.latch(&press).crouch_held);
        // Отпустили: toggle остаётся
        assert!(latch.latch(&release).crouch_held);
        assert!(latch.is_crouch_toggled());
        // Второе нажатие: выключает
        assert!(!latch.latch(&press).crouch_held);
        assert!(!latch.latch(&release).crouch_held);
    }

    #[test]
    fn test_deadzone() {
        let input = PlayerInput {
            movement: Vec2::new(0.05, 0.05),
            ..default()
        };
        assert!(!input.is_moving());

        let input = PlayerInput {
            movement: Vec2::Y,
            ..default()
        };
        assert!(input.is_moving());
    }
}
