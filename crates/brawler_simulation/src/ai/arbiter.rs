//! Attacker Token Arbiter — ограничивает число одновременно атакующих врагов.
//!
//! Переоценка раз в `interval` (не каждый тик — гистерезис против flapping):
//! 1. выкинуть мёртвых/пропавших из обоих множеств
//! 2. отозвать токены у тех, кто не в Chase/Attack
//! 3. раздать свободные токены Chase/Idle кандидатам, ближайшие к цели первыми
//!
//! Инвариант: holders.len() ≤ max_tokens, holder ⊆ registered, без дублей.

use bevy::prelude::*;

use super::brain::HostileState;

/// Capability флаг на враге. Пишет только система арбитра.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackToken {
    pub granted: bool,
}

/// Снимок врага на момент прохода арбитра
#[derive(Debug, Clone, Copy)]
pub struct HostileSnapshot {
    pub entity: Entity,
    pub state: HostileState,
    pub alive: bool,
    /// До primary target (None = цели нет)
    pub distance: Option<f32>,
}

/// Что изменил один проход
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPass {
    pub removed: Vec<Entity>,
    pub revoked: Vec<Entity>,
    pub granted: Vec<Entity>,
}

impl TokenPass {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.revoked.is_empty() && self.granted.is_empty()
    }
}

fn keeps_token(state: HostileState) -> bool {
    matches!(state, HostileState::Chase | HostileState::Attack)
}

fn can_receive_token(state: HostileState) -> bool {
    matches!(state, HostileState::Chase | HostileState::Idle)
}

#[derive(Resource, Debug, Clone)]
pub struct AttackTokenArbiter {
    max_tokens: usize,
    interval: f32,
    timer: f32,
    registered: Vec<Entity>,
    holders: Vec<Entity>,
    last_reported: usize,
}

impl Default for AttackTokenArbiter {
    fn default() -> Self {
        let config = crate::config::CombatConfig::default();
        Self::new(config.max_attack_tokens, config.token_interval)
    }
}

impl AttackTokenArbiter {
    pub fn new(max_tokens: usize, interval: f32) -> Self {
        Self {
            max_tokens,
            interval: interval.max(0.0),
            timer: 0.0,
            registered: Vec::new(),
            holders: Vec::new(),
            last_reported: 0,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Idempotent: повторная регистрация — no-op (false)
    pub fn register(&mut self, entity: Entity) -> bool {
        if self.registered.contains(&entity) {
            return false;
        }
        self.registered.push(entity);
        true
    }

    /// Idempotent: незарегистрированный — no-op (false). Токен уходит вместе с entity.
    pub fn unregister(&mut self, entity: Entity) -> bool {
        let Some(index) = self.registered.iter().position(|&e| e == entity) else {
            return false;
        };
        self.registered.remove(index);
        self.holders.retain(|&e| e != entity);
        true
    }

    pub fn is_registered(&self, entity: Entity) -> bool {
        self.registered.contains(&entity)
    }

    pub fn has_token(&self, entity: Entity) -> bool {
        self.holders.contains(&entity)
    }

    pub fn registered(&self) -> &[Entity] {
        &self.registered
    }

    pub fn holders(&self) -> &[Entity] {
        &self.holders
    }

    /// GetActiveAttackerCount
    pub fn active_attacker_count(&self) -> usize {
        self.holders.len()
    }

    /// Продвинуть таймер; true = пора переоценивать (таймер сброшен в 0)
    pub fn tick(&mut self, delta: f32) -> bool {
        self.timer += delta;
        if self.timer >= self.interval {
            self.timer = 0.0;
            return true;
        }
        false
    }

    /// Один проход переоценки по снимкам всех врагов
    pub fn reevaluate(&mut self, snapshots: &[HostileSnapshot]) -> TokenPass {
        let mut pass = TokenPass::default();
        let find = |entity: Entity| snapshots.iter().find(|snapshot| snapshot.entity == entity);

        // 1. Мёртвые и пропавшие
        let mut index = 0;
        while index < self.registered.len() {
            let entity = self.registered[index];
            match find(entity) {
                Some(snapshot) if snapshot.alive => index += 1,
                _ => {
                    self.registered.remove(index);
                    self.holders.retain(|&e| e != entity);
                    pass.removed.push(entity);
                }
            }
        }

        // 2. Вышли из offense
        self.holders.retain(|&entity| {
            let keep = find(entity).is_some_and(|snapshot| keeps_token(snapshot.state));
            if !keep {
                pass.revoked.push(entity);
            }
            keep
        });

        // 3. Раздача ближайшим
        if self.holders.len() < self.max_tokens {
            let mut candidates: Vec<(Entity, f32)> = self
                .registered
                .iter()
                .filter(|&&entity| !self.holders.contains(&entity))
                .filter_map(|&entity| {
                    let snapshot = find(entity)?;
                    if !snapshot.alive || !can_receive_token(snapshot.state) {
                        return None;
                    }
                    snapshot.distance.map(|distance| (entity, distance))
                })
                .collect();

            // Stable sort: при равной дистанции — порядок регистрации
            candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

            for (entity, _) in candidates {
                if self.holders.len() >= self.max_tokens {
                    break;
                }
                self.holders.push(entity);
                pass.granted.push(entity);
            }
        }

        pass
    }

    /// Проверка инварианта. Debug: panic (дефект). Release: force revoke.
    ///
    /// Возвращает отозванные принудительно.
    pub fn enforce_invariants(&mut self, dead: &[Entity]) -> Vec<Entity> {
        let mut revoked = Vec::new();

        let mut seen = Vec::with_capacity(self.holders.len());
        let registered = &self.registered;
        self.holders.retain(|&entity| {
            let valid = registered.contains(&entity) && !dead.contains(&entity) && !seen.contains(&entity);
            seen.push(entity);
            if !valid {
                revoked.push(entity);
            }
            valid
        });

        while self.holders.len() > self.max_tokens {
            if let Some(entity) = self.holders.pop() {
                revoked.push(entity);
            }
        }

        debug_assert!(
            revoked.is_empty(),
            "AttackTokenArbiter invariant violated, force-revoked {:?}",
            revoked
        );
        revoked
    }

    /// Число токенов изменилось с последнего отчёта → Some(count)
    pub fn take_count_change(&mut self) -> Option<usize> {
        let count = self.holders.len();
        if count == self.last_reported {
            return None;
        }
        self.last_reported = count;
        Some(count)
    }

    #[cfg(test)]
    pub(crate) fn force_grant_for_test(&mut self, entity: Entity) {
        self.holders.push(entity);
    }
}
