//! AI systems: спавн, регистрация в арбитре, проход арбитра, тик HostileBrain.

use bevy::prelude::*;

use super::arbiter::{AttackToken, AttackTokenArbiter, HostileSnapshot};
use super::archetypes::{hostile_bundle, ArchetypeRegistry};
use super::brain::{BrainContext, BrainEffect, HostileBrain, HostileState, TargetView};
use super::events::{SpawnHostile, TokenCountChanged};
use crate::combat::{AttackRegion, DamageDealt, SoundRequested};
use crate::combo::ComboMachine;
use crate::components::{AnimationPlayback, Damageable, Facing, KinematicBody, Player, Position};
use crate::config::CombatConfig;
use crate::physics::PhysicsProbe;
use crate::time::CombatClock;
use crate::DeterministicRng;

/// System: SpawnHostile → entity. Неизвестный archetype — warning, спавна нет.
pub fn spawn_requested_hostiles(
    mut commands: Commands,
    registry: Res<ArchetypeRegistry>,
    config: Res<CombatConfig>,
    mut requests: EventReader<SpawnHostile>,
) {
    for request in requests.read() {
        match hostile_bundle(&registry, &request.archetype, request.position, &config) {
            Some(bundle) => {
                let entity = commands.spawn(bundle).id();
                crate::logger::log_info(&format!(
                    "👾 Spawned {} {:?} at {:?}",
                    request.archetype, entity, request.position
                ));
            }
            None => crate::logger::log_warning(&format!(
                "Unknown archetype '{}' → spawn skipped",
                request.archetype
            )),
        }
    }
}

/// System: новые HostileBrain → RegisterHostile
pub fn register_spawned_hostiles(
    mut arbiter: ResMut<AttackTokenArbiter>,
    spawned: Query<Entity, Added<HostileBrain>>,
) {
    for entity in spawned.iter() {
        if arbiter.register(entity) {
            crate::logger::log(&format!("📝 Hostile {:?} registered with arbiter", entity));
        }
    }
}

/// System: периодическая переоценка токенов + синхронизация AttackToken
///
/// Проход только по интервалу. AttackToken синхронизируется каждый тик
/// (unregister на смерти снимает токен сразу).
pub fn run_token_arbiter(
    clock: Res<CombatClock>,
    mut arbiter: ResMut<AttackTokenArbiter>,
    mut changes: EventWriter<TokenCountChanged>,
    player: Query<&Position, With<Player>>,
    mut hostiles: Query<(Entity, &HostileBrain, &Position, &Damageable, &mut AttackToken), Without<Player>>,
) {
    if arbiter.tick(clock.delta) {
        let target = player.iter().next().map(|position| position.0);

        let snapshots: Vec<HostileSnapshot> = hostiles
            .iter()
            .map(|(entity, brain, position, damageable, _)| HostileSnapshot {
                entity,
                state: brain.state(),
                alive: brain.is_alive() && damageable.is_alive(),
                distance: target.map(|target| position.0.distance(target)),
            })
            .collect();

        let pass = arbiter.reevaluate(&snapshots);
        if !pass.is_empty() {
            crate::logger::log(&format!(
                "🎟️ Token pass: granted {:?}, revoked {:?}, removed {:?} → {}/{}",
                pass.granted,
                pass.revoked,
                pass.removed,
                arbiter.active_attacker_count(),
                arbiter.max_tokens()
            ));
        }

        let dead: Vec<Entity> = snapshots
            .iter()
            .filter(|snapshot| !snapshot.alive)
            .map(|snapshot| snapshot.entity)
            .collect();
        let revoked = arbiter.enforce_invariants(&dead);
        if !revoked.is_empty() {
            crate::logger::log_error(&format!(
                "AttackTokenArbiter invariant violated → force-revoked {:?}",
                revoked
            ));
        }
    }

    for (entity, _, _, _, mut token) in hostiles.iter_mut() {
        let granted = arbiter.has_token(entity);
        if token.granted != granted {
            token.granted = granted;
        }
    }

    if let Some(count) = arbiter.take_count_change() {
        changes.write(TokenCountChanged { count });
    }
}

/// System: тик HostileBrain каждого врага + применение эффектов
///
/// Урон виден brain только со следующего тика (hit resolution идёт позже в цепочке).
pub fn run_hostile_brains(
    clock: Res<CombatClock>,
    probe: Res<PhysicsProbe>,
    mut rng: ResMut<DeterministicRng>,
    mut arbiter: ResMut<AttackTokenArbiter>,
    mut damage_events: EventReader<DamageDealt>,
    mut sounds: EventWriter<SoundRequested>,
    player: Query<(&Position, &Facing, Option<&ComboMachine>, Option<&Damageable>), With<Player>>,
    mut hostiles: Query<
        (
            Entity,
            &mut HostileBrain,
            &mut Position,
            &mut KinematicBody,
            &mut Facing,
            &mut AnimationPlayback,
            &mut AttackRegion,
            &mut Damageable,
            &AttackToken,
        ),
        Without<Player>,
    >,
) {
    let damaged: Vec<Entity> = damage_events.read().map(|event| event.target).collect();

    let target = player
        .iter()
        .find(|(_, _, _, damageable)| damageable.map_or(true, |d| d.is_alive()))
        .map(|(position, facing, machine, _)| TargetView {
            position: position.0,
            facing: facing.0,
            attacking: machine.is_some_and(|machine| !machine.is_idle()),
            move_serial: machine.map_or(0, ComboMachine::move_serial),
        });

    for (
        entity,
        mut brain,
        mut position,
        mut body,
        mut facing,
        mut playback,
        mut region,
        mut damageable,
        token,
    ) in hostiles.iter_mut()
    {
        if brain.is_retired() {
            continue;
        }

        let ctx = BrainContext {
            now: clock.elapsed,
            dt: clock.delta,
            position: position.0,
            facing: facing.0,
            target,
            has_token: token.granted,
            health_fraction: damageable.health_fraction(),
            alive: damageable.is_alive(),
            damaged: damaged.contains(&entity),
            probe: probe.raycaster.as_ref(),
        };

        let effects = brain.tick(&ctx, &mut rng.rng);

        for effect in effects {
            match effect {
                BrainEffect::SetVelocity(velocity) => body.set_velocity(velocity),
                BrainEffect::SetFacing(direction) => facing.0 = direction,
                BrainEffect::PlayClip { clip, blend } => playback.play_clip(&clip, blend, None),
                BrainEffect::PlaySound(name) => {
                    sounds.write(SoundRequested { entity, name });
                }
                BrainEffect::ActivateRegion(spec) => {
                    region.activate(spec, facing.0);
                }
                BrainEffect::DeactivateRegion => {
                    region.deactivate();
                }
                BrainEffect::SetInvulnerable => damageable.set_invulnerable(f32::INFINITY),
                BrainEffect::ClearInvulnerable => damageable.clear_invulnerable(),
                BrainEffect::Teleport(destination) => position.0 = destination,
                BrainEffect::Retire => {
                    if arbiter.unregister(entity) {
                        crate::logger::log_info(&format!(
                            "🪦 {} {:?} unregistered from arbiter",
                            brain.archetype().name(),
                            entity
                        ));
                    }
                }
            }
        }

        debug_assert!(
            brain.state() != HostileState::Death || !region.active,
            "dead hostile left an active attack region"
        );
    }
}
