//! Combat integration test
//!
//! Полный headless App (SimulationPlugin), тики через run_schedule(FixedUpdate).
//!
//! Проверяем:
//! - Hit resolution end-to-end (урон + knockback impulse)
//! - Token bound при нескольких врагах
//! - Неизвестный archetype → спавна нет
//! - Смерть → brain retired, арбитр забыл entity
//! - Combo игрока попадает в цель
//! - Размен: убитый в проходе не добивает своим регионом
//! - Hitstop замедляет CombatClock до real-time дедлайна
//! - Битый config → defaults без паники

use bevy::prelude::*;
use brawler_simulation::*;

fn tick(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn damage_events(app: &App) -> Vec<DamageDealt> {
    app.world()
        .resource::<Events<DamageDealt>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

fn spawn_hostile(app: &mut App, archetype: &str, position: Vec2) -> Entity {
    let config = app.world().resource::<CombatConfig>().clone();
    let bundle = {
        let registry = app.world().resource::<ArchetypeRegistry>();
        hostile_bundle(registry, archetype, position, &config)
    };
    let bundle = bundle.unwrap_or_else(|| panic!("archetype '{}' must be builtin", archetype));
    app.world_mut().spawn(bundle).id()
}

/// Мишень без AI: стоит на месте, получает урон
fn spawn_dummy(app: &mut App, position: Vec2, resistance: f32) -> Entity {
    app.world_mut()
        .spawn((
            Actor::hostile(),
            Damageable::new(100).with_knockback_resistance(resistance),
            Hurtbox::default(),
            Position(position),
            KinematicBody::default(),
        ))
        .id()
}

#[test]
fn test_region_hit_applies_damage_and_scaled_knockback() {
    let mut app = create_headless_app(1);

    let attacker = app
        .world_mut()
        .spawn((Actor::player(), Position(Vec2::ZERO), Facing(1.0), AttackRegion::default()))
        .id();
    let target = spawn_dummy(&mut app, Vec2::new(1.0, 0.0), 2.0);

    let spec = RegionSpec {
        damage: 10,
        knockback: 5.0,
        hitstop: 0.0,
        ..RegionSpec::default()
    };
    if let Some(mut region) = app.world_mut().get_mut::<AttackRegion>(attacker) {
        region.activate(spec, 1.0);
    }

    tick(&mut app, 1);

    let health = app.world().get::<Damageable>(target).map(|d| d.health);
    assert_eq!(health, Some(90));

    let events = damage_events(&app);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].attacker, attacker);
    assert!((events[0].impulse - Vec2::new(2.5, 0.0)).length() < 1e-5);

    // Single-hit: регион погашен, второй тик ничего не добавляет
    tick(&mut app, 3);
    assert_eq!(app.world().get::<Damageable>(target).map(|d| d.health), Some(90));
    assert_eq!(app.world().get::<AttackRegion>(attacker).map(|r| r.active), Some(false));
}

#[test]
fn test_token_bound_goes_to_closest_hostiles() {
    let mut app = create_headless_app(3);
    let config = app.world().resource::<CombatConfig>().clone();
    app.world_mut().spawn(player_bundle(Vec2::ZERO, &config));

    let near = spawn_hostile(&mut app, "tank", Vec2::new(2.0, 0.0));
    let mid = spawn_hostile(&mut app, "tank", Vec2::new(5.0, 0.0));
    let far = spawn_hostile(&mut app, "tank", Vec2::new(8.0, 0.0));

    // Первый проход арбитра через token_interval
    let mut first_pass = false;
    for _ in 0..60 {
        tick(&mut app, 1);
        if app.world().resource::<AttackTokenArbiter>().active_attacker_count() > 0 {
            first_pass = true;
            break;
        }
    }
    assert!(first_pass, "arbiter pass должен случиться за 1 секунду");

    let arbiter = app.world().resource::<AttackTokenArbiter>();
    assert!(arbiter.has_token(near));
    assert!(arbiter.has_token(mid));
    assert!(!arbiter.has_token(far));

    // AttackToken синхронизирован в том же тике
    assert_eq!(app.world().get::<AttackToken>(near).map(|t| t.granted), Some(true));
    assert_eq!(app.world().get::<AttackToken>(far).map(|t| t.granted), Some(false));

    for _ in 0..600 {
        tick(&mut app, 1);
        let holders = app
            .world_mut()
            .query::<&AttackToken>()
            .iter(app.world())
            .filter(|token| token.granted)
            .count();
        assert!(holders <= config.max_attack_tokens);
    }
}

#[test]
fn test_spawn_requests_degrade_on_unknown_archetype() {
    let mut app = create_headless_app(5);

    app.world_mut().send_event(SpawnHostile {
        archetype: "ninja".to_string(),
        position: Vec2::new(3.0, 0.0),
    });
    app.world_mut().send_event(SpawnHostile {
        archetype: "dodger".to_string(),
        position: Vec2::new(-3.0, 0.0),
    });
    tick(&mut app, 1);

    let brains: Vec<(Entity, String)> = app
        .world_mut()
        .query::<(Entity, &HostileBrain)>()
        .iter(app.world())
        .map(|(entity, brain)| (entity, brain.archetype().name().to_string()))
        .collect();
    assert_eq!(brains.len(), 1);
    assert_eq!(brains[0].1, "dodger");

    // Spawn → register в том же тике
    let arbiter = app.world().resource::<AttackTokenArbiter>();
    assert!(arbiter.is_registered(brains[0].0));
    assert_eq!(arbiter.registered().len(), 1);
}

#[test]
fn test_death_retires_brain_and_unregisters() {
    let mut app = create_headless_app(7);
    let config = app.world().resource::<CombatConfig>().clone();
    app.world_mut().spawn(player_bundle(Vec2::ZERO, &config));
    let brawler = spawn_hostile(&mut app, "brawler", Vec2::new(3.0, 0.0));

    tick(&mut app, 2);
    assert!(app.world().resource::<AttackTokenArbiter>().is_registered(brawler));

    if let Some(mut damageable) = app.world_mut().get_mut::<Damageable>(brawler) {
        let max = damageable.max_health;
        assert!(damageable.take_damage(max));
    }
    tick(&mut app, 1);

    let brain = app.world().get::<HostileBrain>(brawler);
    assert_eq!(brain.map(|b| b.state()), Some(HostileState::Death));
    assert_eq!(brain.map(|b| b.is_retired()), Some(true));
    assert!(!app.world().resource::<AttackTokenArbiter>().is_registered(brawler));
    assert_eq!(app.world().get::<AttackToken>(brawler).map(|t| t.granted), Some(false));
    assert_eq!(app.world().get::<AttackRegion>(brawler).map(|r| r.active), Some(false));

    // Дальше мёртвый не двигается и не возвращается в арбитр
    tick(&mut app, 60);
    assert!(!app.world().resource::<AttackTokenArbiter>().is_registered(brawler));
    assert_eq!(
        app.world().get::<HostileBrain>(brawler).map(|b| b.state()),
        Some(HostileState::Death)
    );
}

#[test]
fn test_player_jab_lands_once_and_counts_combo() {
    let mut app = create_headless_app(9);
    let config = app.world().resource::<CombatConfig>().clone();
    let player = app.world_mut().spawn(player_bundle(Vec2::ZERO, &config)).id();
    let dummy = spawn_dummy(&mut app, Vec2::new(1.0, 0.0), 1.0);

    app.world_mut().send_event(InputPressed {
        entity: player,
        kind: InputKind::Light,
    });
    tick(&mut app, 40);

    // Jab: 8 урона, одно попадание за активацию
    assert_eq!(app.world().get::<Damageable>(dummy).map(|d| d.health), Some(92));
    assert_eq!(app.world().get::<ComboMachine>(player).map(|m| m.hit_count()), Some(1));
    assert_eq!(app.world().get::<ComboMachine>(player).map(|m| m.is_idle()), Some(true));

    let combo_hits: Vec<u32> = app
        .world()
        .resource::<Events<ComboHit>>()
        .iter_current_update_events()
        .map(|hit| hit.count)
        .collect();
    assert_eq!(combo_hits, vec![1]);
}

#[test]
fn test_killed_attacker_region_dies_in_same_pass() {
    let mut app = create_headless_app(11);

    // Далеко друг от друга: overlap'ы приходят только наши, в заданном порядке
    let player = app
        .world_mut()
        .spawn((
            Actor::player(),
            Damageable::new(100),
            Hurtbox::default(),
            Position(Vec2::ZERO),
            AttackRegion::default(),
        ))
        .id();
    let hostile = app
        .world_mut()
        .spawn((
            Actor::hostile(),
            Damageable::new(5),
            Hurtbox::default(),
            Position(Vec2::new(50.0, 0.0)),
            AttackRegion::default(),
        ))
        .id();

    let strike = RegionSpec {
        damage: 10,
        hitstop: 0.0,
        ..RegionSpec::default()
    };
    let mut activate = |entity: Entity, facing: f32| {
        app.world_mut()
            .get_mut::<AttackRegion>(entity)
            .map(|mut region| region.activate(strike.clone(), facing))
            .unwrap_or_else(|| panic!("{:?} has no AttackRegion", entity))
    };
    let player_serial = activate(player, 1.0);
    let hostile_serial = activate(hostile, -1.0);

    app.world_mut().send_event(RegionOverlap {
        owner: player,
        target: hostile,
        serial: player_serial,
    });
    app.world_mut().send_event(RegionOverlap {
        owner: hostile,
        target: player,
        serial: hostile_serial,
    });
    tick(&mut app, 1);

    assert_eq!(app.world().get::<Damageable>(hostile).map(|d| d.dead), Some(true));
    assert_eq!(app.world().get::<Damageable>(player).map(|d| d.health), Some(100));
    assert_eq!(app.world().get::<AttackRegion>(hostile).map(|r| r.active), Some(false));
    assert!(app.world().get::<Dead>(hostile).is_some());

    let events = damage_events(&app);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].attacker, player);
}

#[test]
fn test_hitstop_slows_clock_until_real_deadline() {
    let mut app = create_headless_app(13);
    let step = 1.0 / 60.0;

    let attacker = app
        .world_mut()
        .spawn((Actor::player(), Position(Vec2::ZERO), AttackRegion::default()))
        .id();
    spawn_dummy(&mut app, Vec2::new(1.0, 0.0), 1.0);

    if let Some(mut region) = app.world_mut().get_mut::<AttackRegion>(attacker) {
        region.activate(
            RegionSpec {
                hitstop: 0.1,
                ..RegionSpec::default()
            },
            1.0,
        );
    }
    tick(&mut app, 1);

    let time_scale = app.world().resource::<TimeScale>();
    assert!(time_scale.is_hitstop());
    assert_eq!(time_scale.scale, time_scale.hitstop_scale);

    tick(&mut app, 1);
    let slowed = app.world().resource::<CombatClock>().delta;
    assert!(slowed < step * 0.1, "hitstop delta {} должен быть << {}", slowed, step);

    // 0.1s real ≈ 6 тиков; после дедлайна шаг снова полный
    tick(&mut app, 10);
    assert!(!app.world().resource::<TimeScale>().is_hitstop());
    let restored = app.world().resource::<CombatClock>().delta;
    assert!((restored - step).abs() < 1e-5);
}

#[test]
fn test_invalid_config_degrades_to_defaults() {
    let broken = CombatConfig {
        tick_hz: 0.0,
        ..CombatConfig::default()
    };
    let mut app = create_headless_app_with(15, broken);

    assert_eq!(app.world().resource::<CombatConfig>(), &CombatConfig::default());
    let timestep = app.world().resource::<Time<Fixed>>().timestep().as_secs_f64();
    assert!((timestep - 1.0 / 60.0).abs() < 1e-9);

    tick(&mut app, 3);
    assert!(app.world().resource::<CombatClock>().elapsed > 0.0);
}
