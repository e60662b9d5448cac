//! HostileBrain — общий FSM врага, параметризованный archetype стратегией.
//!
//! Состояния: Idle(observe) → Patrol / Chase / Strafe / Attack / Retreat,
//! Hurt и Stunned прерывают, Death терминален.
//!
//! Порядок внутри `tick`:
//! 1. Death (перекрывает всё) → abort паттерна, Retire
//! 2. mode shift по порогу health (one-way)
//! 3. реакция на урон прошлого тика (super armor → без Hurt)
//! 4. decision layer archetype (пропускается пока паттерн/Hurt/Stunned)
//! 5. per-state update
//!
//! Brain не трогает ECS напрямую: возвращает `BrainEffect`, система применяет.

use std::f32::consts::TAU;
use std::sync::Arc;

use bevy::prelude::*;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::arbiter::AttackToken;
use super::archetypes::Archetype;
use super::pattern::{AttackPattern, PatternRun, PatternStep, PatternView};
use crate::combat::RegionSpec;
use crate::physics::Raycaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HostileState {
    /// Observe: стоим, смотрим на цель
    #[default]
    Idle,
    Patrol,
    Chase,
    /// Circle strafe вокруг цели без токена
    Strafe,
    Attack,
    /// BackOff / keep distance
    Retreat,
    Hurt,
    Stunned,
    Death,
}

/// Что враг видит о primary target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub position: Vec2,
    pub facing: f32,
    /// Цель сейчас в муве
    pub attacking: bool,
    /// Счётчик входов в мув (новое значение = новая атака)
    pub move_serial: u64,
}

/// Снимок мира для одного тика brain
pub struct BrainContext<'a> {
    /// Scaled combat time
    pub now: f32,
    pub dt: f32,
    pub position: Vec2,
    pub facing: f32,
    pub target: Option<TargetView>,
    pub has_token: bool,
    pub health_fraction: f32,
    pub alive: bool,
    /// Получил урон на прошлом тике
    pub damaged: bool,
    pub probe: &'a dyn Raycaster,
}

impl BrainContext<'_> {
    /// До цели; без цели — бесконечность
    pub fn distance(&self) -> f32 {
        self.target
            .map_or(f32::INFINITY, |target| self.position.distance(target.position))
    }

    pub fn in_range(&self, range: f32) -> bool {
        self.distance() <= range
    }
}

/// Побочный эффект, который система применяет к entity
#[derive(Debug, Clone, PartialEq)]
pub enum BrainEffect {
    SetVelocity(Vec2),
    SetFacing(f32),
    PlayClip { clip: String, blend: f32 },
    PlaySound(String),
    ActivateRegion(RegionSpec),
    DeactivateRegion,
    SetInvulnerable,
    ClearInvulnerable,
    Teleport(Vec2),
    /// Death: unregister из арбитра, дальше brain не обновляется
    Retire,
}

/// Per-entity память, которую меняют archetype и brain
#[derive(Debug, Clone, PartialEq)]
pub struct BrainMemory {
    pub mode_shifted: bool,
    pub attack_cooldown: f32,
    pub dodge_chance: f32,
    pub dodge_ready_at: f32,
    pub idle_wait: f32,
    pub patrol_origin: Option<Vec2>,
    pub patrol_target: Vec2,
    pub seen_move_serial: u64,
    pub stun_for: f32,
}

/// Решение decision layer
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Остаться в текущем состоянии
    Hold,
    Enter(HostileState),
    /// Attack с этим паттерном
    Engage(AttackPattern),
    /// Уклонение (i-frame roll), после него cooldown
    Evade { pattern: AttackPattern, cooldown: f32 },
}

const CLIP_BLEND: f32 = 0.1;
const PATROL_ARRIVAL: f32 = 0.5;

#[derive(Component, Debug, Clone)]
#[require(AttackToken)]
pub struct HostileBrain {
    archetype: Arc<dyn Archetype>,
    state: HostileState,
    state_timer: f32,
    last_attack_at: Option<f32>,
    pattern: Option<PatternRun>,
    memory: BrainMemory,
    /// Нижняя граница observe (≥ интервала арбитра, иначе токен не успеет прийти)
    min_observe: f32,
    retired: bool,
}

impl HostileBrain {
    pub fn new(archetype: Arc<dyn Archetype>, min_observe: f32) -> Self {
        let memory = BrainMemory {
            mode_shifted: false,
            attack_cooldown: archetype.stats().attack_cooldown,
            dodge_chance: archetype.dodge_chance(),
            dodge_ready_at: 0.0,
            idle_wait: 0.0,
            patrol_origin: None,
            patrol_target: Vec2::ZERO,
            seen_move_serial: 0,
            stun_for: 0.0,
        };
        Self {
            archetype,
            state: HostileState::Idle,
            state_timer: 0.0,
            last_attack_at: None,
            pattern: None,
            memory,
            min_observe,
            retired: false,
        }
    }

    pub fn archetype(&self) -> &dyn Archetype {
        self.archetype.as_ref()
    }

    pub fn state(&self) -> HostileState {
        self.state
    }

    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    pub fn memory(&self) -> &BrainMemory {
        &self.memory
    }

    pub fn pattern(&self) -> Option<&PatternRun> {
        self.pattern.as_ref()
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn is_alive(&self) -> bool {
        self.state != HostileState::Death
    }

    /// Паттерн, Hurt или Stunned — decision layer молчит
    pub fn is_committed(&self) -> bool {
        self.pattern.is_some() || matches!(self.state, HostileState::Hurt | HostileState::Stunned)
    }

    pub fn cooldown_ready(&self, now: f32) -> bool {
        self.last_attack_at
            .map_or(true, |last| now - last >= self.memory.attack_cooldown)
    }

    /// Токен + дистанция атаки + cooldown
    pub fn can_attack(&self, ctx: &BrainContext) -> bool {
        ctx.has_token
            && self.cooldown_ready(ctx.now)
            && ctx.in_range(self.archetype.stats().attack_range)
    }

    pub fn observe_time(&self) -> f32 {
        self.archetype.observe_time().max(self.min_observe)
    }

    /// Без токена: Strafe ↔ Idle(observe). В Idle враг снова кандидат на токен.
    pub fn observe_cycle(&self) -> Decision {
        match self.state {
            HostileState::Strafe if self.state_timer >= self.archetype.strafe_time() => {
                Decision::Enter(HostileState::Idle)
            }
            HostileState::Idle if self.state_timer >= self.observe_time() => {
                Decision::Enter(HostileState::Strafe)
            }
            HostileState::Strafe | HostileState::Idle | HostileState::Retreat => Decision::Hold,
            _ => Decision::Enter(HostileState::Strafe),
        }
    }

    /// Новая атака цели, которую brain ещё не видел
    pub fn sees_new_attack(&self, ctx: &BrainContext) -> bool {
        ctx.target
            .is_some_and(|target| target.attacking && target.move_serial != self.memory.seen_move_serial)
    }

    fn super_armored(&self) -> bool {
        self.archetype.always_super_armor(&self.memory)
            || self.pattern.as_ref().is_some_and(PatternRun::super_armor)
    }

    fn speed(&self) -> f32 {
        self.archetype.stats().move_speed * self.archetype.speed_multiplier(self.state, &self.memory)
    }

    /// Один тик FSM
    pub fn tick(&mut self, ctx: &BrainContext, rng: &mut dyn RngCore) -> Vec<BrainEffect> {
        let mut effects = Vec::new();
        if self.retired {
            return effects;
        }

        self.state_timer += ctx.dt;
        if self.memory.patrol_origin.is_none() {
            self.memory.patrol_origin = Some(ctx.position);
        }

        if !ctx.alive {
            self.die(&mut effects);
            return effects;
        }

        let archetype = Arc::clone(&self.archetype);

        if !self.memory.mode_shifted {
            if let Some(threshold) = archetype.mode_shift_threshold() {
                if ctx.health_fraction < threshold {
                    self.memory.mode_shifted = true;
                    archetype.on_mode_shift(&mut self.memory);
                    crate::logger::log(&format!(
                        "🔥 {} mode shift at {:.0}% health",
                        archetype.name(),
                        ctx.health_fraction * 100.0
                    ));
                    effects.push(BrainEffect::PlaySound(format!("{}_ModeShift", archetype.name())));
                }
            }
        }

        if ctx.damaged
            && !matches!(self.state, HostileState::Hurt | HostileState::Stunned)
            && !self.super_armored()
            && archetype.reacts_to_damage(&self.memory, rng)
        {
            self.enter_state(HostileState::Hurt, ctx, rng, &mut effects);
        }

        if !self.is_committed() {
            let decision = archetype.decide(self, ctx, rng);
            self.apply_decision(decision, ctx, rng, &mut effects);
        }

        self.update_state(ctx, rng, &mut effects);

        if let Some(target) = ctx.target {
            self.memory.seen_move_serial = target.move_serial;
        }

        effects
    }

    fn apply_decision(
        &mut self,
        decision: Decision,
        ctx: &BrainContext,
        rng: &mut dyn RngCore,
        effects: &mut Vec<BrainEffect>,
    ) {
        match decision {
            Decision::Hold => {}
            Decision::Enter(next) => {
                if next != self.state {
                    self.enter_state(next, ctx, rng, effects);
                }
            }
            Decision::Engage(pattern) => {
                crate::logger::log(&format!(
                    "⚔️ {} starts pattern '{}' at distance {:.2}",
                    self.archetype.name(),
                    pattern.name,
                    ctx.distance()
                ));
                self.enter_state(HostileState::Attack, ctx, rng, effects);
                self.last_attack_at = Some(ctx.now);
                self.pattern = Some(PatternRun::new(pattern));
                effects.push(BrainEffect::PlaySound("Enemy_Attack".to_string()));
            }
            Decision::Evade { pattern, cooldown } => {
                self.enter_state(HostileState::Retreat, ctx, rng, effects);
                self.memory.dodge_ready_at = ctx.now + cooldown;
                self.pattern = Some(PatternRun::new(pattern));
            }
        }
    }

    fn enter_state(
        &mut self,
        next: HostileState,
        ctx: &BrainContext,
        rng: &mut dyn RngCore,
        effects: &mut Vec<BrainEffect>,
    ) {
        // Любая смена состояния прерывает паттерн: регион и i-frames снимаются сразу
        if let Some(mut run) = self.pattern.take() {
            run.abort(effects);
        }

        crate::logger::log_with_level(
            crate::logger::LogLevel::Debug,
            &format!("🤖 {}: {:?} → {:?}", self.archetype.name(), self.state, next),
        );

        self.state = next;
        self.state_timer = 0.0;

        match next {
            HostileState::Idle => {
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                effects.push(play("Idle"));
                if self.archetype.patrols() {
                    self.memory.idle_wait = rng.gen_range(0.5..1.5);
                }
            }
            HostileState::Patrol => {
                let origin = self.memory.patrol_origin.unwrap_or(ctx.position);
                let angle = rng.gen_range(0.0..TAU);
                let radius = self.archetype.patrol_radius() * rng.gen::<f32>().sqrt();
                self.memory.patrol_target = origin + Vec2::from_angle(angle) * radius;
                effects.push(play("Walk"));
            }
            HostileState::Chase => effects.push(play("Run")),
            HostileState::Strafe => effects.push(play("Walk")),
            HostileState::Retreat => effects.push(play("Backflip")),
            HostileState::Attack => effects.push(BrainEffect::SetVelocity(Vec2::ZERO)),
            HostileState::Hurt => {
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                effects.push(play("Hurt"));
            }
            HostileState::Stunned => {
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                effects.push(play("Stunned"));
            }
            HostileState::Death => {}
        }
    }

    fn die(&mut self, effects: &mut Vec<BrainEffect>) {
        if let Some(mut run) = self.pattern.take() {
            run.abort(effects);
        }
        self.state = HostileState::Death;
        self.state_timer = 0.0;
        self.retired = true;

        effects.push(BrainEffect::DeactivateRegion);
        effects.push(BrainEffect::ClearInvulnerable);
        effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
        effects.push(play("Die"));
        effects.push(BrainEffect::Retire);

        crate::logger::log(&format!("💀 {} died → retired", self.archetype.name()));
    }

    fn update_state(&mut self, ctx: &BrainContext, rng: &mut dyn RngCore, effects: &mut Vec<BrainEffect>) {
        if let Some(mut run) = self.pattern.take() {
            let view = PatternView {
                position: ctx.position,
                facing: ctx.facing,
                target: ctx.target.map(|target| target.position),
                target_facing: ctx.target.map_or(1.0, |target| target.facing),
                delta: ctx.dt,
            };
            match run.advance(&view, ctx.probe, effects) {
                PatternStep::Running => self.pattern = Some(run),
                PatternStep::Finished(exit) => self.enter_state(exit, ctx, rng, effects),
                PatternStep::WallStun(duration) => {
                    crate::logger::log(&format!(
                        "🧱 {} hit a wall → stunned {:.1}s",
                        self.archetype.name(),
                        duration
                    ));
                    self.memory.stun_for = duration;
                    effects.push(BrainEffect::PlaySound("Wall_Crash".to_string()));
                    self.enter_state(HostileState::Stunned, ctx, rng, effects);
                }
            }
            return;
        }

        let stats = self.archetype.stats();
        match self.state {
            HostileState::Idle => {
                effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                face_target(ctx, effects);
                if self.archetype.patrols()
                    && !ctx.in_range(stats.detection_range)
                    && self.state_timer > self.memory.idle_wait
                {
                    self.enter_state(HostileState::Patrol, ctx, rng, effects);
                }
            }
            HostileState::Patrol => {
                let to_target = self.memory.patrol_target - ctx.position;
                if to_target.length() < PATROL_ARRIVAL {
                    self.enter_state(HostileState::Idle, ctx, rng, effects);
                } else {
                    move_along(to_target.normalize_or_zero(), self.speed(), effects);
                }
            }
            HostileState::Chase => match ctx.target {
                Some(target) if ctx.distance() > self.archetype.chase_stop_distance() => {
                    let direction = (target.position - ctx.position).normalize_or_zero();
                    move_along(direction, self.speed(), effects);
                }
                _ => {
                    effects.push(BrainEffect::SetVelocity(Vec2::ZERO));
                    face_target(ctx, effects);
                }
            },
            HostileState::Strafe => match ctx.target {
                Some(target) => {
                    let to_target = (target.position - ctx.position).normalize_or_zero();
                    let perpendicular = to_target.perp();
                    let sway = (ctx.now * 2.0).sin();
                    effects.push(BrainEffect::SetVelocity(perpendicular * sway * self.speed()));
                    face_target(ctx, effects);
                }
                None => effects.push(BrainEffect::SetVelocity(Vec2::ZERO)),
            },
            HostileState::Retreat => match ctx.target {
                Some(target) if ctx.distance() < self.archetype.retreat_until() => {
                    let away = (ctx.position - target.position)
                        .try_normalize()
                        .unwrap_or(Vec2::new(-ctx.facing, 0.0));
                    move_along(away, self.speed(), effects);
                }
                _ => {
                    let next = self.archetype.after_retreat();
                    self.enter_state(next, ctx, rng, effects);
                }
            },
            // Attack без паттерна (паттерн уже закончился или пуст)
            HostileState::Attack => self.enter_state(HostileState::Chase, ctx, rng, effects),
            HostileState::Hurt => {
                if self.state_timer >= self.archetype.hurt_duration() {
                    let next = self.archetype.after_hurt();
                    self.enter_state(next, ctx, rng, effects);
                }
            }
            HostileState::Stunned => {
                if self.state_timer >= self.memory.stun_for {
                    self.enter_state(HostileState::Chase, ctx, rng, effects);
                }
            }
            HostileState::Death => {}
        }
    }
}

fn play(clip: &str) -> BrainEffect {
    BrainEffect::PlayClip {
        clip: clip.to_string(),
        blend: CLIP_BLEND,
    }
}

fn move_along(direction: Vec2, speed: f32, effects: &mut Vec<BrainEffect>) {
    effects.push(BrainEffect::SetVelocity(direction * speed));
    if direction.x.abs() > f32::EPSILON {
        effects.push(BrainEffect::SetFacing(direction.x.signum()));
    }
}

fn face_target(ctx: &BrainContext, effects: &mut Vec<BrainEffect>) {
    if let Some(target) = ctx.target {
        let dx = target.position.x - ctx.position.x;
        if dx.abs() > f32::EPSILON {
            effects.push(BrainEffect::SetFacing(dx.signum()));
        }
    }
}
