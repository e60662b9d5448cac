//! Hit Resolution Contract — единственное правило "регион атаки задел hurtbox".
//!
//! Порядок эффектов (атомарно, в одном вызове):
//! 1. урон
//! 2. направление удара = normalize(target - owner)
//! 3. impulse = direction × force / resistance (+ lift)
//! 4. health == 0 → Death (hurtbox выключен)
//!
//! Hit confirm и hitstop — забота системы, вызвавшей `resolve_hit`.

use bevy::prelude::*;

use super::region::AttackRegion;
use crate::components::Damageable;

/// Кто кого бьёт и где они стоят
#[derive(Debug, Clone, Copy)]
pub struct HitContext {
    pub owner: Entity,
    pub target: Entity,
    pub owner_position: Vec2,
    pub target_position: Vec2,
    pub same_faction: bool,
    /// Цель — потомок владельца (ChildOf цепочка)
    pub target_is_descendant: bool,
}

/// Результат успешного попадания
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub damage: u32,
    pub direction: Vec2,
    pub impulse: Vec2,
    pub killed: bool,
    pub hitstop: f32,
}

/// Почему попадание не засчитано
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRejection {
    RegionInactive,
    SelfHit,
    Descendant,
    SameFaction,
    AlreadyHit,
    /// Мёртв, неуязвим или hurtbox выключен
    TargetUnavailable,
}

pub fn resolve_hit(
    region: &mut AttackRegion,
    target: &mut Damageable,
    ctx: &HitContext,
) -> Result<HitOutcome, HitRejection> {
    if !region.active {
        return Err(HitRejection::RegionInactive);
    }
    if ctx.owner == ctx.target {
        return Err(HitRejection::SelfHit);
    }
    if ctx.target_is_descendant {
        return Err(HitRejection::Descendant);
    }
    if ctx.same_faction {
        return Err(HitRejection::SameFaction);
    }
    if region.already_hit(ctx.target) {
        return Err(HitRejection::AlreadyHit);
    }
    if !target.can_be_hit() {
        return Err(HitRejection::TargetUnavailable);
    }

    let to_target = ctx.target_position - ctx.owner_position;
    let damage = region.spec.damage_at(to_target.length());

    // 1. Урон
    if !target.take_damage(damage) {
        return Err(HitRejection::TargetUnavailable);
    }

    // 2. Направление (совпадающие позиции → по facing владельца)
    let direction = match to_target.try_normalize() {
        Some(direction) => direction,
        None => Vec2::new(region.facing, 0.0),
    };

    // 3. Knockback impulse
    let resistance = target.resistance();
    let impulse = direction * (region.spec.knockback / resistance)
        + Vec2::Y * (region.spec.lift / resistance);

    // 4. Death уже выставлен take_damage
    let killed = target.dead;

    region.record_hit(ctx.target);

    Ok(HitOutcome {
        damage,
        direction,
        impulse,
        killed,
        hitstop: region.spec.hitstop,
    })
}
