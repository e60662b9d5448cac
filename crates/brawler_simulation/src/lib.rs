//! Brawler Simulation Core
//!
//! Real-time боевое ядро side-scrolling beat'em-up на Bevy 0.16 (headless ECS):
//! - input: Timed Input Buffer
//! - combo: Combo / Move State Machine управляемого entity
//! - combat: Hit Resolution Contract (AttackRegion vs Damageable)
//! - ai: Attacker Token Arbiter + HostileBrain (brawler / dodger / tank)
//!
//! Рендер, аудио и физика — внешние коллабораторы: ядро пишет AnimationPlayback,
//! SoundRequested и velocity, читает Position и Raycaster.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod combo;
pub mod components;
pub mod config;
pub mod error;
pub mod input;
pub mod logger;
pub mod physics;
pub mod time;

// Re-export для удобства
pub use ai::{
    hostile_bundle, AIPlugin, ArchetypeRegistry, AttackToken, AttackTokenArbiter, HostileBrain, HostileState,
    SpawnHostile, TokenCountChanged,
};
pub use combat::{
    AttackRegion, CombatPlugin, DamageDealt, Dead, EntityDied, HitConfirmed, RegionOverlap, RegionSpec, SoundRequested,
};
pub use combo::{ComboHit, ComboMachine, ComboPlugin, ComboReset, ForceInterrupt, MoveLibrary};
pub use components::*;
pub use config::CombatConfig;
pub use error::{ContentError, ContentResult};
pub use input::{InputBuffer, InputKind, InputPressed};
pub use logger::init_logger;
pub use physics::{ArenaWalls, OpenArena, PhysicsProbe, Raycaster};
pub use time::{CombatClock, TimeScale};

/// Порядок одного тика FixedUpdate (chain)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Scaled combat clock
    Clock,
    /// InputPressed → InputBuffer
    Input,
    Combo,
    /// Только по своему интервалу
    Arbiter,
    Hostile,
    /// velocity + knockback → Position, анимация
    Movement,
    HitResolution,
    /// Hitstop decay
    TimeScale,
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: CombatConfig,
}

impl SimulationPlugin {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Битый config → defaults с логом (иначе Time::<Fixed>::from_hz паникует)
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(error) => {
                logger::log_error(&format!("{} → defaults", error));
                CombatConfig::default()
            }
        };

        app
            // Fixed timestep для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            .insert_resource(CombatClock::default())
            .insert_resource(TimeScale::new(config.hitstop_scale))
            .insert_resource(physics::KnockbackDecay(config.knockback_decay))
            .insert_resource(config);

        // create_headless_app уже мог поставить seed
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        if !app.world().contains_resource::<PhysicsProbe>() {
            app.insert_resource(PhysicsProbe::default());
        }

        app.add_event::<InputPressed>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Clock,
                SimulationSet::Input,
                SimulationSet::Combo,
                SimulationSet::Arbiter,
                SimulationSet::Hostile,
                SimulationSet::Movement,
                SimulationSet::HitResolution,
                SimulationSet::TimeScale,
            )
                .chain(),
        );

        app.add_systems(FixedUpdate, time::advance_combat_clock.in_set(SimulationSet::Clock))
            .add_systems(FixedUpdate, input::sample_input.in_set(SimulationSet::Input))
            .add_systems(
                FixedUpdate,
                (physics::integrate_bodies, components::tick_animation_playback)
                    .chain()
                    .in_set(SimulationSet::Movement),
            )
            .add_systems(FixedUpdate, time::decay_time_scale.in_set(SimulationSet::TimeScale));

        // Подсистемы
        app.add_plugins((CombatPlugin, ComboPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт Bevy App для headless симуляции (MinimalPlugins + SimulationPlugin)
///
/// Тесты гоняют тики напрямую: `app.world_mut().run_schedule(FixedUpdate)`.
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with(seed, CombatConfig::default())
}

pub fn create_headless_app_with(seed: u64, config: CombatConfig) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin::new(config));

    app
}

/// Bundle управляемого entity (игрок)
pub fn player_bundle(position: Vec2, config: &CombatConfig) -> impl Bundle {
    (
        Player,
        Actor::player(),
        Damageable::new(100),
        Hurtbox::default(),
        Position(position),
        KinematicBody::default(),
        Facing::default(),
        AnimationPlayback::default(),
        AttackRegion::default(),
        ComboMachine::new(config.combo_timeout),
        InputBuffer::new(config.input_retention),
        Name::new("Player"),
    )
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
