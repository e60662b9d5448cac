//! Kinematic body: позиция, velocity, knockback impulse, facing
//!
//! 2D плоскость beat'em-up: x — вдоль уровня, y — глубина/высота.

use bevy::prelude::*;

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);

/// Velocity (steering, перезаписывается каждый тик) + knockback (затухающий impulse)
#[derive(Component, Debug, Clone, Copy)]
pub struct KinematicBody {
    pub velocity: Vec2,
    pub knockback: Vec2,
    /// Пишет внешний физический коллаборатор (прыжок/подброс); ядро только читает
    /// для airborne веток и `air_usable` мувов.
    pub grounded: bool,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            knockback: Vec2::ZERO,
            grounded: true,
        }
    }
}

impl KinematicBody {
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.knockback += impulse;
    }

    pub fn is_airborne(&self) -> bool {
        !self.grounded
    }
}

/// Направление взгляда: +1 вправо, -1 влево
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Facing(pub f32);

impl Default for Facing {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Facing {
    pub fn towards(from: Vec2, to: Vec2) -> Option<Self> {
        let dx = to.x - from.x;
        if dx.abs() < f32::EPSILON {
            None
        } else {
            Some(Self(dx.signum()))
        }
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.0, 0.0)
    }

    /// Зеркалит локальный offset по facing
    pub fn mirror(&self, offset: Vec2) -> Vec2 {
        Vec2::new(offset.x * self.0, offset.y)
    }
}
