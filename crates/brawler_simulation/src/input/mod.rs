//! Timed Input Buffer
//!
//! Нажатие, пришедшее чуть раньше, чем его можно использовать, не теряется:
//! оно живёт в очереди `retention` секунд (scaled time).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::time::CombatClock;

#[cfg(test)]
mod buffer_tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    Light,
    Heavy,
    Special,
    Jump,
}

/// Одно нажатие (immutable, живёт до consume или expiry)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputIntent {
    pub kind: InputKind,
    pub timestamp: f32,
}

/// FIFO буфер нажатий.
///
/// Хронологический порядок гарантирован `register` (timestamp текущего тика),
/// поэтому prune может останавливаться на первой свежей записи.
#[derive(Component, Debug, Clone)]
pub struct InputBuffer {
    intents: VecDeque<InputIntent>,
    retention: f32,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(crate::config::CombatConfig::default().input_retention)
    }
}

impl InputBuffer {
    pub fn new(retention: f32) -> Self {
        Self {
            intents: VecDeque::new(),
            retention: retention.max(0.0),
        }
    }

    pub fn retention(&self) -> f32 {
        self.retention
    }

    pub fn register(&mut self, kind: InputKind, now: f32) {
        self.intents.push_back(InputIntent { kind, timestamp: now });
    }

    /// Выкинуть протухшие (now - timestamp > retention) с головы очереди
    pub fn prune_expired(&mut self, now: f32) -> usize {
        let mut dropped = 0;
        while let Some(oldest) = self.intents.front() {
            if now - oldest.timestamp > self.retention {
                self.intents.pop_front();
                dropped += 1;
            } else {
                break;
            }
        }
        dropped
    }

    pub fn peek_oldest(&self) -> Option<InputIntent> {
        self.intents.front().copied()
    }

    pub fn consume(&mut self) -> Option<InputIntent> {
        self.intents.pop_front()
    }

    /// Consume только если самое старое нажатие нужного типа
    pub fn try_consume_kind(&mut self, kind: InputKind) -> bool {
        match self.intents.front() {
            Some(oldest) if oldest.kind == kind => {
                self.intents.pop_front();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.intents.clear();
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Raw input от внешнего источника (клавиатура, скрипт, тест)
#[derive(Event, Debug, Clone, Copy)]
pub struct InputPressed {
    pub entity: Entity,
    pub kind: InputKind,
}

/// System: input sampling → InputBuffer (первый шаг тика после часов)
pub fn sample_input(
    clock: Res<CombatClock>,
    mut pressed: EventReader<InputPressed>,
    mut buffers: Query<&mut InputBuffer>,
) {
    let now = clock.elapsed;

    for event in pressed.read() {
        let Ok(mut buffer) = buffers.get_mut(event.entity) else {
            crate::logger::log_warning(&format!(
                "InputPressed for {:?} without InputBuffer — dropped",
                event.entity
            ));
            continue;
        };
        buffer.register(event.kind, now);
    }

    for mut buffer in buffers.iter_mut() {
        buffer.prune_expired(now);
    }
}
