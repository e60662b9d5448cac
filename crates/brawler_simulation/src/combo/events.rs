//! Combo events (UI/награды слушают, ядро не ждёт ответа)

use bevy::prelude::*;

/// Подтверждённое попадание в комбо (OnComboHit)
#[derive(Event, Debug, Clone, Copy)]
pub struct ComboHit {
    pub entity: Entity,
    pub count: u32,
}

/// Combo counter сброшен по timeout (OnComboReset)
#[derive(Event, Debug, Clone, Copy)]
pub struct ComboReset {
    pub entity: Entity,
}

/// Внешний запрос прервать текущий мув (урон, смерть, катсцена)
#[derive(Event, Debug, Clone, Copy)]
pub struct ForceInterrupt {
    pub entity: Entity,
}
