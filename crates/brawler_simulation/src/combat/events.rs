//! Combat events (fire-and-forget для UI/наград/аудио)

use bevy::prelude::*;

/// Урон нанесён
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub impulse: Vec2,
}

/// Entity умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Подтверждение попадания для владельца региона (OnHitConfirm)
#[derive(Event, Debug, Clone)]
pub struct HitConfirmed {
    pub owner: Entity,
    pub target: Entity,
    pub damage: u32,
}

/// Регион `owner` перекрыл hurtbox `target` (активация `serial`)
///
/// Пишется detect_region_overlaps; внешний коллизионный слой может писать тоже.
#[derive(Event, Debug, Clone, Copy)]
pub struct RegionOverlap {
    pub owner: Entity,
    pub target: Entity,
    pub serial: u64,
}

/// Запрос звука (аудио вне ядра; отсутствующий звук — не ошибка)
#[derive(Event, Debug, Clone)]
pub struct SoundRequested {
    pub entity: Entity,
    pub name: String,
}

/// Marker: entity мёртв (терминально)
///
/// Для внешних коллабораторов (рендер, UI, спавнер) и фильтров `Without<Dead>`;
/// внутри ядра источник истины — `Damageable::dead`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;
