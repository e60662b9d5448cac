//! Archetypes: данные + стратегия решения для HostileBrain
//!
//! - brawler: сбалансированный, патрулирует, front combo / flank grab
//! - dodger: hit-and-run, держит дистанцию, i-frame roll
//! - tank: медленный, super armor, charge / grab / ground pound
//!
//! Новый archetype = новая реализация `Archetype`, brain не меняется.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::brain::{BrainContext, BrainMemory, Decision, HostileBrain, HostileState};
use crate::combat::{AttackRegion, RegionSpec};
use crate::components::{Actor, AnimationPlayback, Damageable, Facing, Hurtbox, KinematicBody, Position};
use crate::config::CombatConfig;
use crate::error::{ContentError, ContentResult};

pub mod brawler;
pub mod dodger;
pub mod tank;

pub use brawler::Brawler;
pub use dodger::Dodger;
pub use tank::Tank;

/// Базовые параметры врага
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostileStats {
    pub max_health: u32,
    pub move_speed: f32,
    pub attack_damage: u32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub knockback_resistance: f32,
    pub detection_range: f32,
}

impl Default for HostileStats {
    fn default() -> Self {
        Self {
            max_health: 50,
            move_speed: 3.0,
            attack_damage: 10,
            attack_range: 1.5,
            attack_cooldown: 2.0,
            knockback_resistance: 1.0,
            detection_range: 8.0,
        }
    }
}

impl HostileStats {
    /// Обычный удар врага (урон из stats)
    pub fn strike(&self) -> RegionSpec {
        RegionSpec {
            damage: self.attack_damage,
            ..RegionSpec::default()
        }
    }

    fn validate(&self, name: &str) -> ContentResult<()> {
        let invalid = |reason: &str| ContentError::InvalidArchetype {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if self.max_health == 0 {
            return Err(invalid("max_health must be > 0"));
        }
        if self.move_speed < 0.0 || self.attack_range < 0.0 || self.detection_range < 0.0 {
            return Err(invalid("speeds and ranges must be non-negative"));
        }
        if self.attack_cooldown < 0.0 {
            return Err(invalid("attack_cooldown must be non-negative"));
        }
        Ok(())
    }
}

/// Стратегия archetype. Все методы кроме `decide` — параметры с разумными умолчаниями.
pub trait Archetype: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn stats(&self) -> &HostileStats;

    /// Decision layer: вызывается каждый тик, пока brain не занят паттерном/Hurt/Stunned
    fn decide(&self, brain: &HostileBrain, ctx: &BrainContext, rng: &mut dyn RngCore) -> Decision;

    /// Порог health fraction для one-way mode shift
    fn mode_shift_threshold(&self) -> Option<f32> {
        None
    }

    fn on_mode_shift(&self, _memory: &mut BrainMemory) {}

    /// true = урон переводит в Hurt (super armor проверяет brain)
    fn reacts_to_damage(&self, _memory: &BrainMemory, _rng: &mut dyn RngCore) -> bool {
        true
    }

    fn hurt_duration(&self) -> f32 {
        0.4
    }

    fn after_hurt(&self) -> HostileState {
        HostileState::Chase
    }

    fn speed_multiplier(&self, state: HostileState, _memory: &BrainMemory) -> f32 {
        match state {
            HostileState::Patrol => 0.5,
            HostileState::Strafe => 0.6,
            HostileState::Retreat => 0.7,
            _ => 1.0,
        }
    }

    /// Chase останавливается ближе этой дистанции (состояние не меняется)
    fn chase_stop_distance(&self) -> f32 {
        self.stats().attack_range
    }

    /// Retreat длится пока цель ближе
    fn retreat_until(&self) -> f32 {
        self.stats().attack_range + 1.0
    }

    fn after_retreat(&self) -> HostileState {
        HostileState::Strafe
    }

    fn patrols(&self) -> bool {
        false
    }

    fn patrol_radius(&self) -> f32 {
        0.0
    }

    fn observe_time(&self) -> f32 {
        1.0
    }

    fn strafe_time(&self) -> f32 {
        2.0
    }

    fn dodge_chance(&self) -> f32 {
        0.0
    }

    fn always_super_armor(&self, _memory: &BrainMemory) -> bool {
        false
    }
}

/// Запись в `data/archetypes.ron`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArchetypeProfile {
    Brawler(Brawler),
    Dodger(Dodger),
    Tank(Tank),
}

impl ArchetypeProfile {
    fn into_archetype(self) -> Arc<dyn Archetype> {
        match self {
            ArchetypeProfile::Brawler(brawler) => Arc::new(brawler),
            ArchetypeProfile::Dodger(dodger) => Arc::new(dodger),
            ArchetypeProfile::Tank(tank) => Arc::new(tank),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchetypeSetData {
    pub archetypes: Vec<ArchetypeProfile>,
}

/// Resource: имя → archetype
#[derive(Resource, Debug, Clone, Default)]
pub struct ArchetypeRegistry {
    archetypes: HashMap<String, Arc<dyn Archetype>>,
}

impl ArchetypeRegistry {
    pub fn from_ron(text: &str) -> ContentResult<Self> {
        let data: ArchetypeSetData = ron::from_str(text).map_err(|source| ContentError::Parse {
            what: "archetypes",
            source,
        })?;
        Self::from_data(data)
    }

    pub fn builtin() -> ContentResult<Self> {
        Self::from_ron(include_str!("../../../data/archetypes.ron"))
    }

    /// Три reference archetype с параметрами по умолчанию
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.insert(Arc::new(Brawler::default()));
        registry.insert(Arc::new(Dodger::default()));
        registry.insert(Arc::new(Tank::default()));
        registry
    }

    pub fn from_data(data: ArchetypeSetData) -> ContentResult<Self> {
        let mut registry = Self::default();
        for profile in data.archetypes {
            let archetype = profile.into_archetype();
            archetype.stats().validate(archetype.name())?;
            if registry.archetypes.contains_key(archetype.name()) {
                return Err(ContentError::Duplicate {
                    what: "archetype",
                    name: archetype.name().to_string(),
                });
            }
            registry.insert(archetype);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, archetype: Arc<dyn Archetype>) {
        self.archetypes.insert(archetype.name().to_string(), archetype);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Archetype>> {
        self.archetypes.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.archetypes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

/// Bundle врага. Неизвестный archetype → None (спавн не происходит).
pub fn hostile_bundle(
    registry: &ArchetypeRegistry,
    name: &str,
    position: Vec2,
    config: &CombatConfig,
) -> Option<impl Bundle> {
    let archetype = registry.get(name)?;
    let stats = archetype.stats().clone();

    Some((
        Actor::hostile(),
        Damageable::new(stats.max_health).with_knockback_resistance(stats.knockback_resistance),
        Hurtbox::default(),
        Position(position),
        KinematicBody::default(),
        Facing::default(),
        AnimationPlayback::default(),
        AttackRegion::default(),
        HostileBrain::new(archetype, config.token_interval),
        Name::new(format!("Hostile ({})", name)),
    ))
}
