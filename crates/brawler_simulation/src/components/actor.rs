//! Базовые компоненты акторов: Actor, Damageable, Hurtbox

use bevy::prelude::*;

/// Актор (игрок, враг) — базовый компонент для живых существ
///
/// Автоматически добавляет Damageable и Hurtbox через Required Components.
#[derive(Component, Debug, Clone, Default)]
#[require(Damageable, Hurtbox)]
pub struct Actor {
    pub faction_id: u64,
}

impl Actor {
    pub const PLAYER_FACTION: u64 = 1;
    pub const HOSTILE_FACTION: u64 = 2;

    pub fn player() -> Self {
        Self { faction_id: Self::PLAYER_FACTION }
    }

    pub fn hostile() -> Self {
        Self { faction_id: Self::HOSTILE_FACTION }
    }
}

/// Минимальный knockback resistance (делим на него)
pub const MIN_KNOCKBACK_RESISTANCE: f32 = 0.01;

/// Damage-eligible состояние entity
///
/// Инварианты:
/// - 0 ≤ health ≤ max_health
/// - dead == true → навсегда (no revive), hurtbox_enabled == false
#[derive(Component, Debug, Clone)]
pub struct Damageable {
    pub health: u32,
    pub max_health: u32,
    pub dead: bool,
    /// Оставшиеся секунды неуязвимости (INFINITY = пока не снимут явно)
    pub invulnerable_for: f32,
    pub knockback_resistance: f32,
    pub hurtbox_enabled: bool,
}

impl Default for Damageable {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Damageable {
    pub fn new(max_health: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            dead: false,
            invulnerable_for: 0.0,
            knockback_resistance: 1.0,
            hurtbox_enabled: true,
        }
    }

    pub fn with_knockback_resistance(mut self, resistance: f32) -> Self {
        self.knockback_resistance = resistance.max(MIN_KNOCKBACK_RESISTANCE);
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_for > 0.0
    }

    pub fn can_be_hit(&self) -> bool {
        !self.dead && !self.is_invulnerable() && self.hurtbox_enabled
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    pub fn resistance(&self) -> f32 {
        self.knockback_resistance.max(MIN_KNOCKBACK_RESISTANCE)
    }

    /// Применить урон. Мёртвый или неуязвимый — без изменений (false).
    ///
    /// health == 0 → dead + hurtbox выключен в том же вызове.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.dead || self.is_invulnerable() {
            return false;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.dead = true;
            self.hurtbox_enabled = false;
            self.invulnerable_for = 0.0;
        }
        true
    }

    pub fn set_invulnerable(&mut self, duration: f32) {
        if !self.dead {
            self.invulnerable_for = self.invulnerable_for.max(duration);
        }
    }

    pub fn clear_invulnerable(&mut self) {
        self.invulnerable_for = 0.0;
    }

    pub fn tick_invulnerability(&mut self, delta: f32) {
        if self.invulnerable_for > 0.0 && self.invulnerable_for.is_finite() {
            self.invulnerable_for = (self.invulnerable_for - delta).max(0.0);
        }
    }
}

/// Damage-eligible регион (круг вокруг позиции + offset)
#[derive(Component, Debug, Clone, Copy)]
pub struct Hurtbox {
    pub radius: f32,
    pub offset: Vec2,
}

impl Default for Hurtbox {
    fn default() -> Self {
        Self {
            radius: 0.4,
            offset: Vec2::ZERO,
        }
    }
}
