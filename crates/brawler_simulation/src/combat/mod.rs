//! Combat module: Hit Resolution Contract
//!
//! ECS ответственность:
//! - AttackRegion (атака) vs Hurtbox/Damageable (цель)
//! - урон, knockback impulse, death, hit confirm, hitstop request
//! - Events: DamageDealt, EntityDied, HitConfirmed, SoundRequested
//!
//! Регионы открывают ComboMachine (игрок) и паттерны HostileBrain (враги).

use bevy::prelude::*;

pub mod events;
pub mod region;
pub mod resolution;
pub mod systems;


pub use events::{DamageDealt, Dead, EntityDied, HitConfirmed, RegionOverlap, SoundRequested};
pub use region::{AttackRegion, Falloff, RegionSpec};
pub use resolution::{resolve_hit, HitContext, HitOutcome, HitRejection};

/// Combat Plugin
///
/// Порядок выполнения (SimulationSet::HitResolution, chain):
/// 1. tick_attack_regions
/// 2. detect_region_overlaps
/// 3. resolve_region_overlaps
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<HitConfirmed>()
            .add_event::<RegionOverlap>()
            .add_event::<SoundRequested>();

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_attack_regions,
                systems::detect_region_overlaps,
                systems::resolve_region_overlaps,
            )
                .chain()
                .in_set(crate::SimulationSet::HitResolution),
        );
    }
}
