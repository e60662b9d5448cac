//! AI events

use bevy::prelude::*;

/// Число выданных токенов изменилось (OnTokenCountChanged для UI)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCountChanged {
    pub count: usize,
}

/// Запрос спавна врага от уровня/спавнера
#[derive(Event, Debug, Clone)]
pub struct SpawnHostile {
    pub archetype: String,
    pub position: Vec2,
}
