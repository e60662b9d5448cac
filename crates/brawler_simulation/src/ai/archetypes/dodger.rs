//! Dodger: hit-and-run, держит дистанцию, уклоняется от атак игрока.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{Archetype, HostileStats};
use crate::ai::brain::{BrainContext, BrainMemory, Decision, HostileBrain, HostileState};
use crate::ai::pattern::{AttackPattern, PatternPhase, PhaseMotion};

/// Ближе этого — отскок, атака только дальше
const SAFE_DISTANCE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dodger {
    pub name: String,
    pub stats: HostileStats,
    pub preferred_distance: f32,
    pub dodge_chance: f32,
    pub dodge_cooldown: f32,
    pub dash_speed: f32,
    /// Шанс feint вместо hit-and-run
    pub feint_chance: f32,
    pub desperation_threshold: f32,
    pub desperation_dodge_chance: f32,
    pub observe_time: f32,
    pub strafe_time: f32,
}

impl Default for Dodger {
    fn default() -> Self {
        Self {
            name: "dodger".to_string(),
            stats: HostileStats {
                max_health: 35,
                move_speed: 4.5,
                attack_damage: 8,
                attack_range: 1.5,
                attack_cooldown: 1.5,
                knockback_resistance: 0.8,
                detection_range: 10.0,
            },
            preferred_distance: 6.0,
            dodge_chance: 0.4,
            dodge_cooldown: 2.0,
            dash_speed: 10.0,
            feint_chance: 0.3,
            desperation_threshold: 0.2,
            desperation_dodge_chance: 0.6,
            observe_time: 2.0,
            strafe_time: 1.5,
        }
    }
}

impl Dodger {
    /// Dash in → quick stab → dash out с i-frames
    pub fn hit_and_run(&self) -> AttackPattern {
        AttackPattern::new("hit_and_run", HostileState::Idle)
            .phase(
                PatternPhase::hold("dash_in", 0.2)
                    .clip("Dash_In")
                    .motion(PhaseMotion::DashToward { speed: self.dash_speed }),
            )
            .phase(PatternPhase::hold("stab_windup", 0.05).clip("Quick_Stab"))
            .phase(PatternPhase::hold("stab", 0.1).strike(self.stats.strike()))
            .phase(
                PatternPhase::hold("dash_out", 0.2)
                    .clip("Dash_Out")
                    .motion(PhaseMotion::DashAway { speed: self.dash_speed })
                    .invulnerable(),
            )
    }

    /// Ложный рывок → пауза → наказание, если цель рядом
    pub fn feint(&self) -> AttackPattern {
        AttackPattern::new("feint", HostileState::Retreat)
            .phase(
                PatternPhase::hold("fake_dash", 0.1)
                    .clip("Dash_In")
                    .motion(PhaseMotion::DashToward { speed: self.dash_speed }),
            )
            .phase(PatternPhase::hold("wait", 0.3).clip("Idle"))
            .phase(
                PatternPhase::hold("punish_windup", 0.05)
                    .clip("Quick_Stab")
                    .gate(self.stats.attack_range),
            )
            .phase(PatternPhase::hold("punish", 0.2).strike(self.stats.strike()))
            .miss_recovery(0.2)
    }

    /// Dash in → три удара без dash out
    pub fn desperation(&self) -> AttackPattern {
        let dash = PatternPhase::hold("dash_in", 0.2)
            .clip("Dash_In")
            .motion(PhaseMotion::DashToward { speed: self.dash_speed });

        (0..3)
            .fold(AttackPattern::new("desperation", HostileState::Retreat).phase(dash), |pattern, _| {
                pattern
                    .phase(PatternPhase::hold("stab_windup", 0.1).clip("Quick_Stab"))
                    .phase(PatternPhase::hold("stab", 0.2).strike(self.stats.strike()))
            })
            .phase(PatternPhase::hold("recovery", 0.3))
    }

    /// I-frame roll от цели
    pub fn dodge_roll(&self) -> AttackPattern {
        AttackPattern::new("dodge_roll", HostileState::Idle).phase(
            PatternPhase::hold("roll", 0.3)
                .clip("Dodge_Roll")
                .motion(PhaseMotion::DashAway { speed: self.dash_speed })
                .invulnerable(),
        )
    }
}

impl Archetype for Dodger {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> &HostileStats {
        &self.stats
    }

    fn decide(&self, brain: &HostileBrain, ctx: &BrainContext, rng: &mut dyn RngCore) -> Decision {
        let distance = ctx.distance();

        // Один бросок на каждую новую атаку цели
        if brain.sees_new_attack(ctx)
            && distance <= self.stats.detection_range
            && ctx.now >= brain.memory().dodge_ready_at
            && rng.gen_bool(f64::from(brain.memory().dodge_chance.clamp(0.0, 1.0)))
        {
            return Decision::Evade {
                pattern: self.dodge_roll(),
                cooldown: self.dodge_cooldown,
            };
        }

        if ctx.has_token {
            if distance >= SAFE_DISTANCE
                && distance <= self.stats.attack_range + SAFE_DISTANCE
                && brain.cooldown_ready(ctx.now)
            {
                let pattern = if brain.memory().mode_shifted {
                    self.desperation()
                } else if rng.gen_bool(f64::from(self.feint_chance.clamp(0.0, 1.0))) {
                    self.feint()
                } else {
                    self.hit_and_run()
                };
                return Decision::Engage(pattern);
            }
            if distance < SAFE_DISTANCE {
                return Decision::Enter(HostileState::Retreat);
            }
            return Decision::Enter(HostileState::Chase);
        }

        if distance < self.preferred_distance - 1.0 {
            Decision::Enter(HostileState::Retreat)
        } else if distance > self.preferred_distance + 1.0 {
            Decision::Enter(HostileState::Idle)
        } else {
            brain.observe_cycle()
        }
    }

    fn mode_shift_threshold(&self) -> Option<f32> {
        Some(self.desperation_threshold)
    }

    fn on_mode_shift(&self, memory: &mut BrainMemory) {
        memory.dodge_chance = self.desperation_dodge_chance;
    }

    fn hurt_duration(&self) -> f32 {
        0.3
    }

    fn after_hurt(&self) -> HostileState {
        HostileState::Retreat
    }

    fn speed_multiplier(&self, state: HostileState, _memory: &BrainMemory) -> f32 {
        match state {
            HostileState::Strafe => 0.8,
            _ => 1.0,
        }
    }

    fn chase_stop_distance(&self) -> f32 {
        self.stats.attack_range + 1.0
    }

    fn retreat_until(&self) -> f32 {
        self.preferred_distance
    }

    fn after_retreat(&self) -> HostileState {
        HostileState::Idle
    }

    fn observe_time(&self) -> f32 {
        self.observe_time
    }

    fn strafe_time(&self) -> f32 {
        self.strafe_time
    }

    fn dodge_chance(&self) -> f32 {
        self.dodge_chance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_run_dash_out_is_invulnerable() {
        let pattern = Dodger::default().hit_and_run();
        let dash_out = pattern.phases.last().unwrap();
        assert!(dash_out.invulnerable);
        assert_eq!(dash_out.motion, PhaseMotion::DashAway { speed: 10.0 });
        assert_eq!(pattern.exit, HostileState::Idle);
    }

    #[test]
    fn test_desperation_combo_commits() {
        let pattern = Dodger::default().desperation();
        assert_eq!(pattern.phases.iter().filter(|phase| phase.strike.is_some()).count(), 3);
        assert!(!pattern.phases.iter().any(|phase| phase.invulnerable));
    }
}
