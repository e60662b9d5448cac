//! Tank: медленный, тяжёлые атаки с телеграфом, super armor в charge.
//! Ниже 30% health — berserk (super armor всегда, charge / ground pound).

use bevy::prelude::*;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{Archetype, HostileStats};
use crate::ai::brain::{BrainContext, BrainMemory, Decision, HostileBrain, HostileState};
use crate::ai::pattern::{AttackPattern, PatternPhase, PhaseMotion};
use crate::combat::{Falloff, RegionSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tank {
    pub name: String,
    pub stats: HostileStats,
    pub charge_speed: f32,
    pub charge_range: f32,
    pub charge_time: f32,
    pub grab_range: f32,
    /// Раскрутка charge до контакта
    pub contact_distance: f32,
    pub wall_probe: f32,
    pub wall_stun: f32,
    pub ground_pound_radius: f32,
    pub berserk_threshold: f32,
    pub berserk_cooldown: f32,
    pub berserk_speed: f32,
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            name: "tank".to_string(),
            stats: HostileStats {
                max_health: 120,
                move_speed: 1.5,
                attack_damage: 20,
                attack_range: 2.5,
                attack_cooldown: 3.0,
                knockback_resistance: 3.0,
                detection_range: 8.0,
            },
            charge_speed: 6.0,
            charge_range: 8.0,
            charge_time: 1.5,
            grab_range: 1.5,
            contact_distance: 1.0,
            wall_probe: 0.5,
            wall_stun: 2.0,
            ground_pound_radius: 3.0,
            berserk_threshold: 0.3,
            berserk_cooldown: 1.5,
            berserk_speed: 1.5,
        }
    }
}

impl Tank {
    fn heavy_strike(&self) -> RegionSpec {
        RegionSpec {
            damage: self.stats.attack_damage,
            knockback: 8.0,
            radius: 1.0,
            offset: Vec2::new(1.2, 0.0),
            hitstop: 0.1,
            ..RegionSpec::default()
        }
    }

    /// Windup 0.6 (телеграф) → swing → recovery 0.5 (окно для игрока)
    pub fn heavy_swing(&self) -> AttackPattern {
        AttackPattern::new("heavy_swing", HostileState::Chase)
            .phase(PatternPhase::hold("windup", 0.6).clip("Heavy_Windup"))
            .phase(PatternPhase::hold("swing", 0.2).clip("Heavy_Swing"))
            .phase(PatternPhase::hold("strike", 0.2).strike(self.heavy_strike()))
            .phase(PatternPhase::hold("recovery", 0.5))
    }

    /// Roar → бег с super armor до контакта → удар. Стена → stun.
    pub fn charge(&self) -> AttackPattern {
        AttackPattern::new("charge", HostileState::Chase)
            .phase(PatternPhase::hold("roar", 0.3).clip("Charge_Roar"))
            .phase(
                PatternPhase::hold("charging", self.charge_time)
                    .clip("Charging")
                    .motion(PhaseMotion::Charge { speed: self.charge_speed })
                    .super_armor()
                    .until_contact(self.contact_distance)
                    .wall_probe(self.wall_probe, self.wall_stun),
            )
            .phase(
                PatternPhase::hold("impact", 0.1)
                    .gate(self.contact_distance)
                    .super_armor()
                    .strike(self.heavy_strike()),
            )
            .phase(PatternPhase::hold("recovery", 0.3))
            .miss_recovery(0.3)
    }

    /// Захват → подъём → бросок. Промах → долгое восстановление.
    pub fn grab(&self) -> AttackPattern {
        let throw = RegionSpec {
            knockback: 10.0,
            ..self.heavy_strike()
        };
        AttackPattern::new("grab", HostileState::Chase)
            .phase(PatternPhase::hold("attempt", 0.2).clip("Grab_Attempt"))
            .phase(PatternPhase::hold("lift", 0.3).clip("Grab_Success").gate(self.grab_range))
            .phase(PatternPhase::hold("throw", 0.2).clip("Throw"))
            .phase(PatternPhase::hold("release", 0.3).strike(throw))
            .miss_recovery(1.0)
    }

    /// Прыжок → slam → shockwave (полный урон в радиусе 2, дальше половина)
    pub fn ground_pound(&self) -> AttackPattern {
        let shockwave = RegionSpec {
            damage: 30,
            knockback: 6.0,
            radius: self.ground_pound_radius,
            offset: Vec2::ZERO,
            multi_hit: true,
            falloff: Some(Falloff {
                inner_radius: 2.0,
                outer_damage: 15,
            }),
            hitstop: 0.15,
            lifetime: 0.3,
            hit_sound: Some("Ground_Pound".to_string()),
            ..RegionSpec::default()
        };
        AttackPattern::new("ground_pound", HostileState::Chase)
            .phase(PatternPhase::hold("jump", 0.3).clip("Jump_Windup"))
            .phase(PatternPhase::hold("peak", 0.2))
            .phase(PatternPhase::hold("slam", 0.4).clip("Ground_Slam"))
            .phase(PatternPhase::hold("shockwave", 0.3).strike(shockwave))
    }
}

impl Archetype for Tank {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> &HostileStats {
        &self.stats
    }

    fn decide(&self, brain: &HostileBrain, ctx: &BrainContext, rng: &mut dyn RngCore) -> Decision {
        let distance = ctx.distance();
        let ready = ctx.has_token && brain.cooldown_ready(ctx.now);

        if brain.memory().mode_shifted {
            if ready && distance <= self.charge_range {
                let pattern = if rng.gen_bool(0.5) {
                    self.charge()
                } else {
                    self.ground_pound()
                };
                return Decision::Engage(pattern);
            }
            return Decision::Enter(HostileState::Chase);
        }

        if ready {
            if distance <= self.grab_range {
                return Decision::Engage(self.grab());
            }
            if distance <= self.stats.attack_range {
                return Decision::Engage(self.heavy_swing());
            }
            if distance <= self.charge_range {
                return Decision::Engage(self.charge());
            }
        }

        // Без токена или на cooldown — медленное наступление
        if distance > self.stats.detection_range {
            Decision::Enter(HostileState::Idle)
        } else {
            Decision::Enter(HostileState::Chase)
        }
    }

    fn mode_shift_threshold(&self) -> Option<f32> {
        Some(self.berserk_threshold)
    }

    fn on_mode_shift(&self, memory: &mut BrainMemory) {
        memory.attack_cooldown = self.berserk_cooldown;
    }

    fn speed_multiplier(&self, state: HostileState, memory: &BrainMemory) -> f32 {
        match state {
            HostileState::Chase if memory.mode_shifted => self.berserk_speed,
            HostileState::Patrol | HostileState::Strafe => 0.5,
            _ => 1.0,
        }
    }

    fn always_super_armor(&self, memory: &BrainMemory) -> bool {
        memory.mode_shifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shockwave_falloff() {
        let pattern = Tank::default().ground_pound();
        let shockwave = pattern.phases.last().and_then(|phase| phase.strike.clone()).unwrap();
        assert_eq!(shockwave.damage_at(1.5), 30);
        assert_eq!(shockwave.damage_at(2.5), 15);
        assert!(shockwave.multi_hit);
    }

    #[test]
    fn test_charge_has_super_armor_and_wall_probe() {
        let pattern = Tank::default().charge();
        let charging = &pattern.phases[1];
        assert!(charging.super_armor);
        assert_eq!(charging.until_contact, Some(1.0));
        assert!(charging.wall_probe.is_some());
    }

    #[test]
    fn test_berserk_is_always_super_armored() {
        let tank = Tank::default();
        let mut memory = crate::ai::brain::BrainMemory {
            mode_shifted: false,
            attack_cooldown: 3.0,
            dodge_chance: 0.0,
            dodge_ready_at: 0.0,
            idle_wait: 0.0,
            patrol_origin: None,
            patrol_target: Vec2::ZERO,
            seen_move_serial: 0,
            stun_for: 0.0,
        };
        assert!(!tank.always_super_armor(&memory));

        tank.on_mode_shift(&mut memory);
        memory.mode_shifted = true;
        assert!(tank.always_super_armor(&memory));
        assert_eq!(memory.attack_cooldown, 1.5);
        assert_eq!(tank.speed_multiplier(HostileState::Chase, &memory), 1.5);
    }
}
