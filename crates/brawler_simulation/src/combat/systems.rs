//! Hit resolution systems (HitResolution set, порядок chain):
//! 1. tick_attack_regions — lifetime регионов + таймеры неуязвимости
//! 2. detect_region_overlaps — геометрия region vs hurtbox → RegionOverlap
//! 3. resolve_region_overlaps — resolve_hit + knockback + события + hitstop

use bevy::prelude::*;

use super::events::{DamageDealt, Dead, EntityDied, HitConfirmed, RegionOverlap, SoundRequested};
use super::region::AttackRegion;
use super::resolution::{resolve_hit, HitContext};
use crate::combo::{ComboHit, ComboMachine};
use crate::components::{Actor, Damageable, Hurtbox, KinematicBody, Position};
use crate::time::{CombatClock, TimeScale};

/// System: регионы с lifetime гаснут сами, i-frames с длительностью тикают
pub fn tick_attack_regions(
    clock: Res<CombatClock>,
    mut regions: Query<&mut AttackRegion>,
    mut damageables: Query<&mut Damageable>,
) {
    let delta = clock.delta;

    for mut region in regions.iter_mut() {
        region.tick(delta);
    }

    for mut damageable in damageables.iter_mut() {
        damageable.tick_invulnerability(delta);
    }
}

/// System: все активные регионы против всех hurtbox'ов (мёртвые владельцы не бьют)
pub fn detect_region_overlaps(
    regions: Query<(Entity, &AttackRegion, &Position), Without<Dead>>,
    hurtboxes: Query<(Entity, &Hurtbox, &Position, &Damageable)>,
    mut overlaps: EventWriter<RegionOverlap>,
) {
    for (owner, region, owner_position) in regions.iter() {
        if !region.active {
            continue;
        }

        for (target, hurtbox, target_position, damageable) in hurtboxes.iter() {
            if target == owner || !damageable.can_be_hit() || region.already_hit(target) {
                continue;
            }

            let hurtbox_center = target_position.0 + hurtbox.offset;
            if region.overlaps(owner_position.0, hurtbox_center, hurtbox.radius) {
                overlaps.write(RegionOverlap {
                    owner,
                    target,
                    serial: region.serial,
                });
            }
        }
    }
}

/// Цель — потомок владельца по ChildOf цепочке
fn is_descendant(target: Entity, owner: Entity, parents: &Query<&ChildOf>) -> bool {
    let mut current = target;
    while let Ok(child_of) = parents.get(current) {
        let parent = child_of.parent();
        if parent == owner {
            return true;
        }
        current = parent;
    }
    false
}

/// System: RegionOverlap → Hit Resolution Contract
///
/// Effects видны state machines только со следующего тика (они уже отработали в этом).
pub fn resolve_region_overlaps(
    mut commands: Commands,
    clock: Res<CombatClock>,
    mut time_scale: ResMut<TimeScale>,
    mut overlaps: EventReader<RegionOverlap>,
    mut owners: Query<(&mut AttackRegion, &Position, Option<&Actor>, Option<&mut ComboMachine>)>,
    mut targets: Query<(&mut Damageable, &Position, Option<&Actor>, Option<&mut KinematicBody>)>,
    parents: Query<&ChildOf>,
    mut damage_events: EventWriter<DamageDealt>,
    mut death_events: EventWriter<EntityDied>,
    mut confirm_events: EventWriter<HitConfirmed>,
    mut combo_events: EventWriter<ComboHit>,
    mut sounds: EventWriter<SoundRequested>,
) {
    for overlap in overlaps.read() {
        // Владельца могли убить раньше в этом же проходе
        let owner_dead = targets.get(overlap.owner).is_ok_and(|(damageable, ..)| damageable.dead);
        if owner_dead {
            continue;
        }

        let killed = {
            let Ok((mut region, owner_position, owner_actor, combo)) = owners.get_mut(overlap.owner) else {
                continue;
            };
            // Overlap от прошлой активации — регион уже другой
            if region.serial != overlap.serial {
                continue;
            }
            let Ok((mut damageable, target_position, target_actor, body)) = targets.get_mut(overlap.target) else {
                continue;
            };

            let ctx = HitContext {
                owner: overlap.owner,
                target: overlap.target,
                owner_position: owner_position.0,
                target_position: target_position.0,
                same_faction: match (owner_actor, target_actor) {
                    (Some(a), Some(b)) => a.faction_id == b.faction_id,
                    _ => false,
                },
                target_is_descendant: is_descendant(overlap.target, overlap.owner, &parents),
            };

            let Ok(outcome) = resolve_hit(&mut region, &mut damageable, &ctx) else {
                continue;
            };

            if let Some(mut body) = body {
                body.apply_impulse(outcome.impulse);
            }

            damage_events.write(DamageDealt {
                attacker: overlap.owner,
                target: overlap.target,
                damage: outcome.damage,
                impulse: outcome.impulse,
            });

            crate::logger::log(&format!(
                "💥 {:?} hit {:?}: {} dmg, impulse {:?}, HP left {}",
                overlap.owner, overlap.target, outcome.damage, outcome.impulse, damageable.health
            ));

            // Hit confirm → владельцу (после того как его state machine уже отработала в этом тике)
            confirm_events.write(HitConfirmed {
                owner: overlap.owner,
                target: overlap.target,
                damage: outcome.damage,
            });
            if let Some(mut combo) = combo {
                let count = combo.confirm_hit(clock.elapsed);
                combo_events.write(ComboHit {
                    entity: overlap.owner,
                    count,
                });
            }

            if let Some(sound) = region.spec.hit_sound.clone() {
                sounds.write(SoundRequested {
                    entity: overlap.owner,
                    name: sound,
                });
            }

            // Last writer wins
            time_scale.request_hitstop(outcome.hitstop, clock.real_elapsed);

            outcome.killed
        };

        if killed {
            // Мёртвые не бьют: регион гаснет сразу, до следующих overlap'ов прохода
            if let Ok((mut region, ..)) = owners.get_mut(overlap.target) {
                region.deactivate();
            }
            commands.entity(overlap.target).insert(Dead);
            death_events.write(EntityDied {
                entity: overlap.target,
                killer: Some(overlap.owner),
            });
            crate::logger::log_info(&format!("💀 {:?} killed by {:?}", overlap.target, overlap.owner));
        }
    }
}
