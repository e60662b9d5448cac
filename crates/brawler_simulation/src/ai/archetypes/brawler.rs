//! Brawler: сбалансированный враг.
//!
//! С токеном — front combo (jab → cross) или flank grab. Без токена — back off
//! вплотную, иначе strafe/observe. Ниже 30% health — desperate mode.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{Archetype, HostileStats};
use crate::ai::brain::{BrainContext, BrainMemory, Decision, HostileBrain, HostileState};
use crate::ai::pattern::{AttackPattern, PatternPhase, PhaseMotion};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Brawler {
    pub name: String,
    pub stats: HostileStats,
    pub patrol_radius: f32,
    pub back_off_distance: f32,
    /// Шанс front combo (иначе flank grab)
    pub combo_chance: f32,
    pub hurt_chance: f32,
    pub desperate_threshold: f32,
    pub desperate_cooldown: f32,
    pub observe_time: f32,
    pub strafe_time: f32,
}

impl Default for Brawler {
    fn default() -> Self {
        Self {
            name: "brawler".to_string(),
            stats: HostileStats::default(),
            patrol_radius: 5.0,
            back_off_distance: 2.0,
            combo_chance: 0.7,
            hurt_chance: 0.2,
            desperate_threshold: 0.3,
            desperate_cooldown: 1.0,
            observe_time: 1.0,
            strafe_time: 2.0,
        }
    }
}

impl Brawler {
    /// Шаг вперёд → jab → cross → recovery
    pub fn front_combo(&self) -> AttackPattern {
        AttackPattern::new("front_combo", HostileState::Chase)
            .phase(PatternPhase::hold("step", 0.1).motion(PhaseMotion::DashToward { speed: 2.0 }))
            .phase(PatternPhase::hold("jab_windup", 0.1).clip("Attack_Light"))
            .phase(PatternPhase::hold("jab", 0.2).strike(self.stats.strike()))
            .phase(PatternPhase::hold("cross_windup", 0.15).clip("Attack_Heavy"))
            .phase(PatternPhase::hold("cross", 0.3).strike(self.stats.strike()))
            .phase(PatternPhase::hold("recovery", 0.3))
    }

    /// Телепорт за спину цели → grab. Цель ушла → 0.5s восстановления.
    pub fn flank_grab(&self) -> AttackPattern {
        AttackPattern::new("flank_grab", HostileState::Chase)
            .phase(PatternPhase::hold("flank", 0.2).motion(PhaseMotion::Flank { distance: 1.5 }))
            .phase(PatternPhase::hold("reach", 0.3).clip("Grab_Attempt"))
            .phase(PatternPhase::hold("grab", 0.1).gate(1.0).strike(self.stats.strike()))
            .miss_recovery(0.5)
    }

    /// Три jab подряд
    pub fn desperate(&self) -> AttackPattern {
        (0..3).fold(AttackPattern::new("desperate", HostileState::Chase), |pattern, _| {
            pattern
                .phase(PatternPhase::hold("windup", 0.2).clip("Attack_Light"))
                .phase(PatternPhase::hold("jab", 0.3).strike(self.stats.strike()))
        })
    }
}

impl Archetype for Brawler {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> &HostileStats {
        &self.stats
    }

    fn decide(&self, brain: &HostileBrain, ctx: &BrainContext, rng: &mut dyn RngCore) -> Decision {
        let distance = ctx.distance();

        if ctx.has_token {
            if distance <= self.stats.attack_range && brain.cooldown_ready(ctx.now) {
                let pattern = if brain.memory().mode_shifted {
                    self.desperate()
                } else if rng.gen_bool(f64::from(self.combo_chance.clamp(0.0, 1.0))) {
                    self.front_combo()
                } else {
                    self.flank_grab()
                };
                return Decision::Engage(pattern);
            }
            if distance > self.stats.attack_range {
                return Decision::Enter(HostileState::Chase);
            }
            return Decision::Hold;
        }

        if distance < self.back_off_distance {
            Decision::Enter(HostileState::Retreat)
        } else if distance <= self.stats.detection_range {
            brain.observe_cycle()
        } else if matches!(brain.state(), HostileState::Chase | HostileState::Strafe) {
            Decision::Enter(HostileState::Idle)
        } else {
            Decision::Hold
        }
    }

    fn mode_shift_threshold(&self) -> Option<f32> {
        Some(self.desperate_threshold)
    }

    fn on_mode_shift(&self, memory: &mut BrainMemory) {
        memory.attack_cooldown = self.desperate_cooldown;
    }

    fn reacts_to_damage(&self, _memory: &BrainMemory, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(f64::from(self.hurt_chance.clamp(0.0, 1.0)))
    }

    fn retreat_until(&self) -> f32 {
        self.back_off_distance + 1.0
    }

    fn patrols(&self) -> bool {
        true
    }

    fn patrol_radius(&self) -> f32 {
        self.patrol_radius
    }

    fn observe_time(&self) -> f32 {
        self.observe_time
    }

    fn strafe_time(&self) -> f32 {
        self.strafe_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_combo_timing() {
        let brawler = Brawler::default();
        let pattern = brawler.front_combo();
        assert_eq!(pattern.phases.len(), 6);
        assert!((pattern.total_duration() - 1.15).abs() < 1e-5);
        assert_eq!(pattern.phases.iter().filter(|phase| phase.strike.is_some()).count(), 2);
    }

    #[test]
    fn test_desperate_has_three_strikes() {
        let pattern = Brawler::default().desperate();
        assert_eq!(pattern.phases.iter().filter(|phase| phase.strike.is_some()).count(), 3);
        assert_eq!(pattern.exit, HostileState::Chase);
    }
}
