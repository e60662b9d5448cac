//! Attack patterns: короткая последовательность фаз с фиксированной длительностью.
//!
//! Вместо suspended sequential execution — явное состояние (`index`, `elapsed`),
//! которое brain продвигает каждый тик. Паттерн всегда доходит до конца
//! детерминированно или прерывается снаружи через `abort`.

use bevy::prelude::*;

use super::brain::{BrainEffect, HostileState};
use crate::combat::RegionSpec;
use crate::physics::Raycaster;

/// Движение во время фазы
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseMotion {
    Hold,
    /// Рывок к цели (направление фиксируется на входе в фазу)
    DashToward { speed: f32 },
    /// Рывок от цели (направление фиксируется на входе в фазу)
    DashAway { speed: f32 },
    /// Бег к цели с переприцеливанием каждый тик
    Charge { speed: f32 },
    /// Телепорт за спину цели на входе в фазу
    Flank { distance: f32 },
}

/// Стена впереди → оглушение
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallProbe {
    pub distance: f32,
    pub stun: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternPhase {
    pub name: &'static str,
    pub clip: Option<&'static str>,
    pub duration: f32,
    pub motion: PhaseMotion,
    /// Регион открывается на входе в фазу, закрывается на выходе
    pub strike: Option<RegionSpec>,
    pub invulnerable: bool,
    /// Урон проходит, но Hurt не прерывает
    pub super_armor: bool,
    /// Фаза заканчивается досрочно когда цель ближе
    pub until_contact: Option<f32>,
    pub wall_probe: Option<WallProbe>,
    /// Вход в фазу только если цель ближе; иначе остаток паттерна → miss recovery
    pub gate: Option<f32>,
}

impl PatternPhase {
    pub fn hold(name: &'static str, duration: f32) -> Self {
        Self {
            name,
            clip: None,
            duration,
            motion: PhaseMotion::Hold,
            strike: None,
            invulnerable: false,
            super_armor: false,
            until_contact: None,
            wall_probe: None,
            gate: None,
        }
    }

    pub fn clip(mut self, clip: &'static str) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn motion(mut self, motion: PhaseMotion) -> Self {
        self.motion = motion;
        self
    }

    pub fn strike(mut self, spec: RegionSpec) -> Self {
        self.strike = Some(spec);
        self
    }

    pub fn invulnerable(mut self) -> Self {
        self.invulnerable = true;
        self
    }

    pub fn super_armor(mut self) -> Self {
        self.super_armor = true;
        self
    }

    pub fn until_contact(mut self, distance: f32) -> Self {
        self.until_contact = Some(distance);
        self
    }

    pub fn wall_probe(mut self, distance: f32, stun: f32) -> Self {
        self.wall_probe = Some(WallProbe { distance, stun });
        self
    }

    pub fn gate(mut self, max_distance: f32) -> Self {
        self.gate = Some(max_distance);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttackPattern {
    pub name: &'static str,
    pub phases: Vec<PatternPhase>,
    /// Длительность восстановления после провала gate
    pub miss_recovery: f32,
    /// Состояние после завершения
    pub exit: HostileState,
}

impl AttackPattern {
    pub fn new(name: &'static str, exit: HostileState) -> Self {
        Self {
            name,
            phases: Vec::new(),
            miss_recovery: 0.0,
            exit,
        }
    }

    pub fn phase(mut self, phase: PatternPhase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn miss_recovery(mut self, duration: f32) -> Self {
        self.miss_recovery = duration;
        self
    }

    pub fn total_duration(&self) -> f32 {
        self.phases.iter().map(|phase| phase.duration).sum()
    }
}

/// Что видит паттерн в этом тике
#[derive(Debug, Clone, Copy)]
pub struct PatternView {
    pub position: Vec2,
    pub facing: f32,
    pub target: Option<Vec2>,
    pub target_facing: f32,
    pub delta: f32,
}

impl PatternView {
    fn distance(&self) -> f32 {
        self.target.map_or(f32::INFINITY, |target| self.position.distance(target))
    }

    fn to_target(&self) -> Vec2 {
        self.target
            .and_then(|target| (target - self.position).try_normalize())
            .unwrap_or(Vec2::new(self.facing, 0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternStep {
    Running,
    Finished(HostileState),
    /// Врезался в стену — оглушение на N секунд
    WallStun(f32),
}

/// Исполняемый экземпляр паттерна
#[derive(Debug, Clone)]
pub struct PatternRun {
    pattern: AttackPattern,
    index: usize,
    elapsed: f32,
    entered: bool,
    direction: Vec2,
    region_open: bool,
    invulnerable: bool,
    missed: bool,
}

impl PatternRun {
    pub fn new(pattern: AttackPattern) -> Self {
        Self {
            pattern,
            index: 0,
            elapsed: 0.0,
            entered: false,
            direction: Vec2::X,
            region_open: false,
            invulnerable: false,
            missed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.pattern.name
    }

    pub fn phase_index(&self) -> usize {
        self.index
    }

    pub fn phase_elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn current_phase(&self) -> Option<&PatternPhase> {
        self.pattern.phases.get(self.index)
    }

    pub fn missed(&self) -> bool {
        self.missed
    }

    pub fn super_armor(&self) -> bool {
        self.current_phase().is_some_and(|phase| phase.super_armor)
    }

    fn enter_phase(&mut self, view: &PatternView, effects: &mut Vec<BrainEffect>) {
        let Some(gate) = self.current_phase().and_then(|phase| phase.gate) else {
            return self.enter_current(view, effects);
        };

        if view.distance() > gate {
            // Промах: остаток паттерна заменяется восстановлением
            self.missed = true;
            self.pattern.phases.truncate(self.index);
            self.pattern
                .phases
                .push(PatternPhase::hold("miss_recovery", self.pattern.miss_recovery));
        }
        self.enter_current(view, effects);
    }

    fn enter_current(&mut self, view: &PatternView, effects: &mut Vec<BrainEffect>) {
        self.entered = true;
        self.elapsed = 0.0;
        self.direction = view.to_target();

        let Some(phase) = self.pattern.phases.get(self.index) else {
            return;
        };

        let mut facing = view.facing;
        if let PhaseMotion::Flank { distance } = phase.motion {
            if let Some(target) = view.target {
                let behind = target - Vec2::new(view.target_facing, 0.0) * distance;
                effects.push(BrainEffect::Teleport(behind));
                facing = (target.x - behind.x).signum();
                self.direction = Vec2::new(facing, 0.0);
            }
        } else if self.direction.x.abs() > f32::EPSILON {
            facing = self.direction.x.signum();
        }
        effects.push(BrainEffect::SetFacing(facing));

        if let Some(clip) = phase.clip {
            effects.push(BrainEffect::PlayClip {
                clip: clip.to_string(),
                blend: 0.05,
            });
        }
        if phase.invulnerable {
            self.invulnerable = true;
            effects.push(BrainEffect::SetInvulnerable);
        }
        if let Some(spec) = &phase.strike {
            self.region_open = true;
            effects.push(BrainEffect::ActivateRegion(spec.clone()));
        }
    }

    fn exit_phase(&mut self, effects: &mut Vec<BrainEffect>) {
        if self.region_open {
            self.region_open = false;
            effects.push(BrainEffect::DeactivateRegion);
        }
        if self.invulnerable {
            self.invulnerable = false;
            effects.push(BrainEffect::ClearInvulnerable);
        }
        self.index += 1;
        self.elapsed = 0.0;
        self.entered = false;
    }

    /// Один тик паттерна
    pub fn advance(
        &mut self,
        view: &PatternView,
        probe: &dyn Raycaster,
        effects: &mut Vec<BrainEffect>,
    ) -> PatternStep {
        if self.index >= self.pattern.phases.len() {
            effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
            return PatternStep::Finished(self.pattern.exit);
        }

        if !self.entered {
            self.enter_phase(view, effects);
        }

        let Some(phase) = self.pattern.phases.get(self.index).cloned() else {
            return PatternStep::Finished(self.pattern.exit);
        };

        let velocity = match phase.motion {
            PhaseMotion::Hold | PhaseMotion::Flank { .. } => Vec2::ZERO,
            PhaseMotion::DashToward { speed } => self.direction * speed,
            PhaseMotion::DashAway { speed } => -self.direction * speed,
            PhaseMotion::Charge { speed } => {
                self.direction = view.to_target();
                if self.direction.x.abs() > f32::EPSILON {
                    effects.push(BrainEffect::SetFacing(self.direction.x.signum()));
                }
                self.direction * speed
            }
        };
        effects.push(BrainEffect::SetVelocity(velocity));

        if let Some(probe_spec) = phase.wall_probe {
            if velocity != Vec2::ZERO
                && probe
                    .raycast(view.position, velocity, probe_spec.distance)
                    .is_some()
            {
                self.abort(effects);
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                return PatternStep::WallStun(probe_spec.stun);
            }
        }

        let contact = phase
            .until_contact
            .is_some_and(|distance| view.distance() <= distance);

        self.elapsed += view.delta;
        if contact || self.elapsed >= phase.duration {
            self.exit_phase(effects);
            if self.index >= self.pattern.phases.len() {
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                return PatternStep::Finished(self.pattern.exit);
            }
        }

        PatternStep::Running
    }

    /// Прервать: регион закрыт, i-frames сняты в том же тике
    pub fn abort(&mut self, effects: &mut Vec<BrainEffect>) {
        if self.region_open {
            self.region_open = false;
            effects.push(BrainEffect::DeactivateRegion);
        }
        if self.invulnerable {
            self.invulnerable = false;
            effects.push(BrainEffect::ClearInvulnerable);
        }
        self.index = self.pattern.phases.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{ArenaWalls, OpenArena};

    fn view(position: Vec2, target: Vec2) -> PatternView {
        PatternView {
            position,
            facing: 1.0,
            target: Some(target),
            target_facing: 1.0,
            delta: 0.05,
        }
    }

    fn run_to_end(run: &mut PatternRun, view: &PatternView) -> (PatternStep, Vec<BrainEffect>, usize) {
        let mut effects = Vec::new();
        for tick in 1..1000 {
            let step = run.advance(view, &OpenArena, &mut effects);
            if step != PatternStep::Running {
                return (step, effects, tick);
            }
        }
        panic!("pattern never finished");
    }

    #[test]
    fn test_strike_region_opens_and_closes() {
        let pattern = AttackPattern::new("jab", HostileState::Chase)
            .phase(PatternPhase::hold("windup", 0.1))
            .phase(PatternPhase::hold("strike", 0.1).strike(RegionSpec::default()))
            .phase(PatternPhase::hold("recovery", 0.1));
        let mut run = PatternRun::new(pattern);

        let (step, effects, ticks) = run_to_end(&mut run, &view(Vec2::ZERO, Vec2::X));
        assert_eq!(step, PatternStep::Finished(HostileState::Chase));
        assert_eq!(ticks, 6, "3 фазы × 0.1 при delta 0.05");

        let opened = effects.iter().filter(|e| matches!(e, BrainEffect::ActivateRegion(_))).count();
        let closed = effects.iter().filter(|e| matches!(e, BrainEffect::DeactivateRegion)).count();
        assert_eq!((opened, closed), (1, 1));
    }

    #[test]
    fn test_failed_gate_switches_to_miss_recovery() {
        let pattern = AttackPattern::new("grab", HostileState::Chase)
            .phase(PatternPhase::hold("reach", 0.1))
            .phase(PatternPhase::hold("grab", 0.1).gate(1.0).strike(RegionSpec::default()))
            .phase(PatternPhase::hold("throw", 0.5))
            .miss_recovery(0.2);
        let mut run = PatternRun::new(pattern);

        let (_, effects, ticks) = run_to_end(&mut run, &view(Vec2::ZERO, Vec2::new(3.0, 0.0)));
        assert!(run.missed());
        assert_eq!(ticks, 6, "reach 0.1 + miss recovery 0.2");
        assert!(!effects.iter().any(|e| matches!(e, BrainEffect::ActivateRegion(_))));
    }

    #[test]
    fn test_invulnerable_phase_sets_and_clears() {
        let pattern = AttackPattern::new("roll", HostileState::Idle)
            .phase(PatternPhase::hold("roll", 0.1).motion(PhaseMotion::DashAway { speed: 10.0 }).invulnerable());
        let mut run = PatternRun::new(pattern);

        let mut effects = Vec::new();
        run.advance(&view(Vec2::ZERO, Vec2::X), &OpenArena, &mut effects);
        assert!(effects.contains(&BrainEffect::SetInvulnerable));
        assert!(effects.contains(&BrainEffect::SetVelocity(Vec2::new(-10.0, 0.0))));

        let (_, effects, _) = run_to_end(&mut run, &view(Vec2::ZERO, Vec2::X));
        assert!(effects.contains(&BrainEffect::ClearInvulnerable));
    }

    #[test]
    fn test_abort_closes_region_and_iframes() {
        let pattern = AttackPattern::new("dash", HostileState::Idle)
            .phase(PatternPhase::hold("dash", 1.0).strike(RegionSpec::default()).invulnerable());
        let mut run = PatternRun::new(pattern);

        let mut effects = Vec::new();
        run.advance(&view(Vec2::ZERO, Vec2::X), &OpenArena, &mut effects);
        effects.clear();
        run.abort(&mut effects);

        assert!(effects.contains(&BrainEffect::DeactivateRegion));
        assert!(effects.contains(&BrainEffect::ClearInvulnerable));
        assert!(run.current_phase().is_none());
    }

    #[test]
    fn test_charge_into_wall_stuns() {
        let pattern = AttackPattern::new("charge", HostileState::Chase)
            .phase(
                PatternPhase::hold("run", 1.5)
                    .motion(PhaseMotion::Charge { speed: 6.0 })
                    .wall_probe(0.5, 2.0)
                    .super_armor(),
            );
        let mut run = PatternRun::new(pattern);
        let walls = ArenaWalls::rect(Vec2::new(-5.0, -2.0), Vec2::new(5.0, 2.0));

        let mut effects = Vec::new();
        let step = run.advance(&view(Vec2::new(4.7, 0.0), Vec2::new(9.0, 0.0)), &walls, &mut effects);
        assert_eq!(step, PatternStep::WallStun(2.0));
    }

    #[test]
    fn test_contact_ends_phase_early() {
        let pattern = AttackPattern::new("charge", HostileState::Chase)
            .phase(PatternPhase::hold("run", 1.5).motion(PhaseMotion::Charge { speed: 6.0 }).until_contact(1.0))
            .phase(PatternPhase::hold("impact", 0.1));
        let mut run = PatternRun::new(pattern);

        let mut effects = Vec::new();
        run.advance(&view(Vec2::ZERO, Vec2::new(0.8, 0.0)), &OpenArena, &mut effects);
        assert_eq!(run.phase_index(), 1);
    }

    #[test]
    fn test_flank_teleports_behind_target() {
        let pattern = AttackPattern::new("flank", HostileState::Chase)
            .phase(PatternPhase::hold("flank", 0.2).motion(PhaseMotion::Flank { distance: 1.5 }));
        let mut run = PatternRun::new(pattern);

        let mut effects = Vec::new();
        run.advance(&view(Vec2::ZERO, Vec2::new(4.0, 0.0)), &OpenArena, &mut effects);
        assert!(effects.contains(&BrainEffect::Teleport(Vec2::new(2.5, 0.0))));
    }
}
