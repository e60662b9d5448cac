//! Headless encounter: игрок отбивается от brawler / dodger / tank.
//!
//! Вход скриптовый (ритм light-light-heavy), рендера нет — только лог.

use bevy::prelude::*;
use brawler_simulation::logger::{log_info, log_warning};
use brawler_simulation::{
    create_headless_app_with, player_bundle, ArenaWalls, CombatConfig, ComboHit, Damageable, EntityDied,
    HostileBrain, InputKind, InputPressed, PhysicsProbe, Player, SpawnHostile, TokenCountChanged,
};

const TICKS: u32 = 60 * 40;
/// Light, Light, Heavy, пауза
const RHYTHM: [Option<InputKind>; 4] = [Some(InputKind::Light), Some(InputKind::Light), Some(InputKind::Heavy), None];
const BEAT_TICKS: u32 = 15;

fn main() {
    let config = match CombatConfig::builtin() {
        Ok(config) => config,
        Err(error) => {
            log_warning(&format!("combat.ron rejected ({}) → defaults", error));
            CombatConfig::default()
        }
    };

    let mut app = create_headless_app_with(42, config.clone());
    app.insert_resource(PhysicsProbe::new(ArenaWalls::rect(
        Vec2::new(-12.0, -4.0),
        Vec2::new(12.0, 4.0),
    )));

    let player = app.world_mut().spawn(player_bundle(Vec2::ZERO, &config)).id();
    for (archetype, x) in [("brawler", 5.0), ("dodger", -7.0), ("tank", 9.0)] {
        app.world_mut().send_event(SpawnHostile {
            archetype: archetype.to_string(),
            position: Vec2::new(x, 0.0),
        });
    }

    log_info(&format!("🎮 Encounter start: {} ticks @ {} Hz", TICKS, config.tick_hz));

    let mut best_combo = 0;
    let mut kills = 0;
    let mut player_died = false;

    for tick in 0..TICKS {
        if tick % BEAT_TICKS == 0 {
            let beat = (tick / BEAT_TICKS) as usize % RHYTHM.len();
            if let Some(kind) = RHYTHM[beat] {
                app.world_mut().send_event(InputPressed { entity: player, kind });
            }
        }

        app.world_mut().run_schedule(FixedUpdate);

        let world = app.world_mut();
        for hit in drain::<ComboHit>(world) {
            best_combo = best_combo.max(hit.count);
        }
        for death in drain::<EntityDied>(world) {
            if death.entity == player {
                player_died = true;
            } else {
                kills += 1;
            }
        }
        for change in drain::<TokenCountChanged>(world) {
            log_info(&format!("🎟️ Attackers engaged: {}", change.count));
        }

        if tick % 300 == 0 {
            log_info(&format!("Tick {}: {}", tick, status(app.world_mut())));
        }
        if player_died || kills == 3 {
            break;
        }
    }

    log_info(&format!(
        "🏁 Encounter over: kills {}/3, best combo {}, player {}",
        kills,
        best_combo,
        if player_died { "down" } else { "standing" }
    ));
    log_info(&format!("Final: {}", status(app.world_mut())));
}

/// Забрать все события типа T, накопленные с прошлого вызова
fn drain<T: Event + Clone>(world: &mut World) -> Vec<T> {
    world
        .get_resource_mut::<Events<T>>()
        .map(|mut events| events.drain().collect())
        .unwrap_or_default()
}

fn status(world: &mut World) -> String {
    let mut parts = Vec::new();

    let mut players = world.query_filtered::<&Damageable, With<Player>>();
    for damageable in players.iter(world) {
        parts.push(format!("player {}/{}", damageable.health, damageable.max_health));
    }

    let mut hostiles = world.query::<(&HostileBrain, &Damageable)>();
    for (brain, damageable) in hostiles.iter(world) {
        parts.push(format!(
            "{} {:?} {}/{}",
            brain.archetype().name(),
            brain.state(),
            damageable.health,
            damageable.max_health
        ));
    }

    parts.join(", ")
}
