//! Combo / Move State Machine управляемого entity
//!
//! raw input → InputBuffer → ComboMachine выбирает opener/ветку → hit window
//! открывает AttackRegion → hit resolution → confirm_hit обратно в машину.

use bevy::prelude::*;

pub mod events;
pub mod machine;
pub mod moves;
pub mod systems;

#[cfg(test)]
mod machine_tests;

pub use events::{ComboHit, ComboReset, ForceInterrupt};
pub use machine::{ComboMachine, ComboState, ComboStep, HitWindowEdge};
pub use moves::{BranchData, MoveBranch, MoveData, MoveDefinition, MoveId, MoveLibrary, MoveSetData, OpenerData};

/// Combo Plugin
///
/// MoveLibrary: если уже вставлена (свои данные) — не трогаем, иначе builtin.
/// Битые builtin данные → пустая библиотека (мувы не стартуют, бой идёт).
pub struct ComboPlugin;

impl Plugin for ComboPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ComboHit>()
            .add_event::<ComboReset>()
            .add_event::<ForceInterrupt>();

        if !app.world().contains_resource::<MoveLibrary>() {
            let library = match MoveLibrary::builtin() {
                Ok(library) => library,
                Err(error) => {
                    crate::logger::log_error(&format!("Builtin move set failed to load: {}", error));
                    MoveLibrary::default()
                }
            };
            app.insert_resource(library);
        }

        app.add_systems(
            FixedUpdate,
            systems::run_combo_machines.in_set(crate::SimulationSet::Combo),
        );
    }
}
