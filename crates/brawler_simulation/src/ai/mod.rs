//! Hostile AI module
//!
//! - arbiter: Attacker Token Arbiter (ограничение одновременных атакующих)
//! - brain: общий FSM врага (HostileBrain)
//! - pattern: attack patterns как явные phase timers
//! - archetypes: brawler / dodger / tank стратегии + registry

use bevy::prelude::*;

pub mod arbiter;
pub mod archetypes;
pub mod brain;
pub mod events;
pub mod pattern;
pub mod systems;


pub use arbiter::{AttackToken, AttackTokenArbiter, HostileSnapshot, TokenPass};
pub use archetypes::{hostile_bundle, Archetype, ArchetypeProfile, ArchetypeRegistry, Brawler, Dodger, HostileStats, Tank};
pub use brain::{BrainContext, BrainEffect, BrainMemory, Decision, HostileBrain, HostileState, TargetView};
pub use events::{SpawnHostile, TokenCountChanged};
pub use pattern::{AttackPattern, PatternPhase, PatternRun, PatternStep, PhaseMotion};

/// AI Plugin
///
/// SimulationSet::Arbiter (chain):
/// 1. spawn_requested_hostiles
/// 2. register_spawned_hostiles
/// 3. run_token_arbiter
///
/// SimulationSet::Hostile:
/// 4. run_hostile_brains
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<crate::config::CombatConfig>()
            .cloned()
            .unwrap_or_default();
        app.insert_resource(AttackTokenArbiter::new(config.max_attack_tokens, config.token_interval));

        if !app.world().contains_resource::<ArchetypeRegistry>() {
            let registry = match ArchetypeRegistry::builtin() {
                Ok(registry) => registry,
                Err(error) => {
                    crate::logger::log_error(&format!(
                        "Builtin archetypes failed to load: {} → using defaults",
                        error
                    ));
                    ArchetypeRegistry::with_defaults()
                }
            };
            app.insert_resource(registry);
        }

        app.add_event::<TokenCountChanged>().add_event::<SpawnHostile>();

        app.add_systems(
            FixedUpdate,
            (
                systems::spawn_requested_hostiles,
                systems::register_spawned_hostiles,
                systems::run_token_arbiter,
            )
                .chain()
                .in_set(crate::SimulationSet::Arbiter),
        );
        app.add_systems(
            FixedUpdate,
            systems::run_hostile_brains.in_set(crate::SimulationSet::Hostile),
        );
    }
}
