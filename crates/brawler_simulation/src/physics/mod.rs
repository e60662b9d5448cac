//! Physics collaborator (минимальный)
//!
//! - velocity + knockback интегрируются в Position (scaled delta)
//! - knockback затухает экспоненциально
//! - Raycast через trait `Raycaster` (стены арены для charge паттернов)
//!
//! Коллизий тел нет: ядру нужны только velocity application и wall probe.

use bevy::prelude::*;

use crate::components::{KinematicBody, Position};
use crate::time::CombatClock;

/// Raycast в 2D. Отсутствие коллайдера = no hit, ошибок нет.
pub trait Raycaster: Send + Sync {
    /// Расстояние до первого попадания в пределах `max_distance`
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32>;
}

/// Открытая арена: стен нет
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenArena;

impl Raycaster for OpenArena {
    fn raycast(&self, _origin: Vec2, _direction: Vec2, _max_distance: f32) -> Option<f32> {
        None
    }
}

/// Стены арены как набор отрезков
#[derive(Debug, Clone, Default)]
pub struct ArenaWalls {
    pub segments: Vec<(Vec2, Vec2)>,
}

impl ArenaWalls {
    /// Прямоугольная арена [min, max]
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        let a = min;
        let b = Vec2::new(max.x, min.y);
        let c = max;
        let d = Vec2::new(min.x, max.y);
        Self {
            segments: vec![(a, b), (b, c), (c, d), (d, a)],
        }
    }
}

impl Raycaster for ArenaWalls {
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || max_distance <= 0.0 {
            return None;
        }

        self.segments
            .iter()
            .filter_map(|&(p0, p1)| ray_segment(origin, dir, p0, p1))
            .filter(|&t| t <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Ray (origin + t·dir, t ≥ 0) против отрезка p0–p1
fn ray_segment(origin: Vec2, dir: Vec2, p0: Vec2, p1: Vec2) -> Option<f32> {
    let edge = p1 - p0;
    let denom = dir.perp_dot(edge);
    if denom.abs() < f32::EPSILON {
        return None; // параллельны
    }

    let to_start = p0 - origin;
    let t = to_start.perp_dot(edge) / denom;
    let u = to_start.perp_dot(dir) / denom;

    (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Resource: текущий raycaster арены
#[derive(Resource)]
pub struct PhysicsProbe {
    pub raycaster: Box<dyn Raycaster>,
}

impl PhysicsProbe {
    pub fn new(raycaster: impl Raycaster + 'static) -> Self {
        Self {
            raycaster: Box::new(raycaster),
        }
    }

    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32> {
        self.raycaster.raycast(origin, direction, max_distance)
    }
}

impl Default for PhysicsProbe {
    fn default() -> Self {
        Self::new(OpenArena)
    }
}

/// Resource: скорость затухания knockback (1/сек)
#[derive(Resource, Debug, Clone, Copy)]
pub struct KnockbackDecay(pub f32);

/// System: интеграция velocity + knockback → Position
///
/// Работает в FixedUpdate на scaled delta (во время hitstop тела почти стоят).
pub fn integrate_bodies(
    clock: Res<CombatClock>,
    decay: Res<KnockbackDecay>,
    mut bodies: Query<(&mut Position, &mut KinematicBody)>,
) {
    let delta = clock.delta;
    if delta <= 0.0 {
        return;
    }

    let damping = (-decay.0 * delta).exp();
    for (mut position, mut body) in bodies.iter_mut() {
        let displacement = (body.velocity + body.knockback) * delta;
        position.0 += displacement;

        body.knockback *= damping;
        if body.knockback.length_squared() < 1e-6 {
            body.knockback = Vec2::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_arena_never_hits() {
        assert_eq!(OpenArena.raycast(Vec2::ZERO, Vec2::X, 100.0), None);
    }

    #[test]
    fn test_rect_walls_hit_within_range() {
        let walls = ArenaWalls::rect(Vec2::new(-5.0, -2.0), Vec2::new(5.0, 2.0));

        let hit = walls.raycast(Vec2::new(4.6, 0.0), Vec2::X, 0.5);
        assert!(matches!(hit, Some(d) if (d - 0.4).abs() < 1e-4), "hit = {:?}", hit);

        // До стены 9.6 > 0.5
        assert_eq!(walls.raycast(Vec2::new(-4.6, 0.0), Vec2::X, 0.5), None);
        assert_eq!(walls.raycast(Vec2::ZERO, Vec2::ZERO, 10.0), None);
    }
}
