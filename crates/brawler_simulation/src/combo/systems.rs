//! System: ComboMachine update для управляемых entity (SimulationSet::Combo)
//!
//! Порядок внутри тика для каждого entity:
//! 1. смерть / ForceInterrupt / урон прошлого тика → Idle, регион закрыт, буфер пуст
//! 2. combo timeout (каждый тик, в любом состоянии)
//! 3. advance: таймер, cancel window, ветки, конец мува
//! 4. Idle → opener из буфера
//! 5. hit window → открыть/закрыть регион

use bevy::prelude::*;

use super::events::{ComboReset, ForceInterrupt};
use super::machine::{ComboMachine, ComboStep, HitWindowEdge};
use super::moves::{MoveDefinition, MoveId, MoveLibrary};
use crate::combat::{AttackRegion, DamageDealt, SoundRequested};
use crate::components::{AnimationPlayback, Damageable, Facing, KinematicBody};
use crate::input::InputBuffer;
use crate::time::CombatClock;

const MOVE_BLEND: f32 = 0.1;
const IDLE_BLEND: f32 = 0.2;

fn enter_move(
    entity: Entity,
    definition: &MoveDefinition,
    body: &mut KinematicBody,
    facing: &Facing,
    playback: &mut AnimationPlayback,
    region: &mut AttackRegion,
    sounds: &mut EventWriter<SoundRequested>,
) {
    region.deactivate();
    body.set_velocity(facing.direction() * definition.forward_momentum);
    playback.play_clip(&definition.clip, MOVE_BLEND, Some(definition.duration));
    sounds.write(SoundRequested {
        entity,
        name: definition.attack_sound.clone(),
    });
}

fn return_to_idle(body: &mut KinematicBody, playback: &mut AnimationPlayback, region: &mut AttackRegion) {
    region.deactivate();
    body.stop();
    playback.play_clip("Idle", IDLE_BLEND, None);
}

fn move_name(library: &MoveLibrary, id: MoveId) -> &str {
    library.get(id).map(|definition| definition.name.as_str()).unwrap_or("<missing>")
}

pub fn run_combo_machines(
    clock: Res<CombatClock>,
    library: Res<MoveLibrary>,
    mut interrupts: EventReader<ForceInterrupt>,
    mut damage_events: EventReader<DamageDealt>,
    mut resets: EventWriter<ComboReset>,
    mut sounds: EventWriter<SoundRequested>,
    mut fighters: Query<(
        Entity,
        &mut ComboMachine,
        &mut InputBuffer,
        &mut KinematicBody,
        &Facing,
        &mut AnimationPlayback,
        &mut AttackRegion,
        &Damageable,
    )>,
) {
    let now = clock.elapsed;
    let delta = clock.delta;

    let interrupted: Vec<Entity> = interrupts.read().map(|event| event.entity).collect();
    // Урон прошлого тика (hit resolution идёт после combo)
    let damaged: Vec<Entity> = damage_events.read().map(|event| event.target).collect();

    for (entity, mut machine, mut buffer, mut body, facing, mut playback, mut region, damageable) in
        fighters.iter_mut()
    {
        // 1. Прерывания
        if damageable.dead {
            if !machine.is_idle() || region.active {
                machine.force_interrupt(&mut buffer);
                region.deactivate();
                body.stop();
                crate::logger::log(&format!("☠️ {:?} died mid-combo → interrupted", entity));
            }
            continue;
        }

        let super_armor = machine
            .current_move()
            .and_then(|id| library.get(id))
            .is_some_and(|definition| definition.super_armor);
        let forced = interrupted.contains(&entity);
        let staggered = damaged.contains(&entity) && !super_armor;

        if (forced || staggered) && !machine.is_idle() {
            if let Some(id) = machine.force_interrupt(&mut buffer) {
                crate::logger::log(&format!(
                    "✋ {:?} interrupted in '{}' ({})",
                    entity,
                    move_name(&library, id),
                    if forced { "forced" } else { "damage" }
                ));
            }
            return_to_idle(&mut body, &mut playback, &mut region);
        } else if forced {
            buffer.clear();
        }

        // 2. Timeout combo counter
        if machine.check_timeout(now) {
            resets.write(ComboReset { entity });
            crate::logger::log(&format!("🔄 {:?} combo reset (timeout)", entity));
        }

        // 3. Текущий мув
        let airborne = body.is_airborne();
        match machine.advance(delta, &mut buffer, &library, airborne) {
            ComboStep::Finished => return_to_idle(&mut body, &mut playback, &mut region),
            ComboStep::Branched { from, to } => {
                if let Some(definition) = library.get(to) {
                    enter_move(entity, definition, &mut body, facing, &mut playback, &mut region, &mut sounds);
                }
                crate::logger::log(&format!(
                    "⚔️ {:?} cancel '{}' → '{}' (combo {})",
                    entity,
                    move_name(&library, from),
                    move_name(&library, to),
                    machine.hit_count()
                ));
            }
            ComboStep::Idle | ComboStep::Continue => {}
        }

        // 4. Opener
        if let Some(id) = machine.try_start_from_buffer(&mut buffer, &library, airborne) {
            if let Some(definition) = library.get(id) {
                enter_move(entity, definition, &mut body, facing, &mut playback, &mut region, &mut sounds);
                crate::logger::log(&format!("⚔️ {:?} starts '{}'", entity, definition.name));
            }
        }

        // 5. Hit window
        let Some(definition) = machine.current_move().and_then(|id| library.get(id)) else {
            continue;
        };
        match machine.poll_hit_window(definition) {
            Some(HitWindowEdge::Open) => {
                region.activate(definition.region_spec(), facing.0);
            }
            Some(HitWindowEdge::Close) => {
                region.deactivate();
            }
            None => {}
        }
    }
}
