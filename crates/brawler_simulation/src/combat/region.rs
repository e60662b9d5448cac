//! AttackRegion — временная коллизионная зона атаки, привязанная к владельцу.

use bevy::prelude::*;

/// Урон падает за пределами inner_radius от владельца (shockwave)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Falloff {
    pub inner_radius: f32,
    pub outer_damage: u32,
}

/// Параметры одной активации региона
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub damage: u32,
    /// Сила knockback (делится на resistance цели)
    pub knockback: f32,
    /// Подброс вверх (только launcher)
    pub lift: f32,
    /// Hitstop длительность (real seconds), 0 = без hitstop
    pub hitstop: f32,
    pub radius: f32,
    /// Локальный offset (x зеркалится по facing)
    pub offset: Vec2,
    /// Автоматическое выключение через lifetime (INFINITY = только явно)
    pub lifetime: f32,
    pub multi_hit: bool,
    pub falloff: Option<Falloff>,
    pub hit_sound: Option<String>,
}

impl Default for RegionSpec {
    fn default() -> Self {
        Self {
            damage: 10,
            knockback: 5.0,
            lift: 0.0,
            hitstop: 0.05,
            radius: 0.6,
            offset: Vec2::new(0.8, 0.0),
            lifetime: 0.1,
            multi_hit: false,
            falloff: None,
            hit_sound: Some("Hit_Impact".to_string()),
        }
    }
}

impl RegionSpec {
    /// Урон по цели на расстоянии `distance` от владельца
    pub fn damage_at(&self, distance: f32) -> u32 {
        match self.falloff {
            Some(falloff) if distance > falloff.inner_radius => falloff.outer_damage,
            _ => self.damage,
        }
    }
}

/// Регион атаки владельца (один на entity).
///
/// Инварианты:
/// - неактивный регион никого не бьёт
/// - single-hit: не больше одного попадания за активацию
/// - multi-hit: каждую цель не больше одного раза за активацию
#[derive(Component, Debug, Clone, Default)]
pub struct AttackRegion {
    pub active: bool,
    pub spec: RegionSpec,
    /// Facing владельца в момент активации
    pub facing: f32,
    pub elapsed: f32,
    /// Номер активации (RegionOverlap со старым serial игнорируется)
    pub serial: u64,
    pub hit_targets: Vec<Entity>,
}

impl AttackRegion {
    pub fn activate(&mut self, spec: RegionSpec, facing: f32) -> u64 {
        self.serial += 1;
        self.active = true;
        self.spec = spec;
        self.facing = if facing < 0.0 { -1.0 } else { 1.0 };
        self.elapsed = 0.0;
        self.hit_targets.clear();
        self.serial
    }

    /// Возвращает true если регион был активен
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    /// Центр региона в мировых координатах
    pub fn center(&self, owner_position: Vec2) -> Vec2 {
        owner_position + Vec2::new(self.spec.offset.x * self.facing, self.spec.offset.y)
    }

    /// Продвинуть lifetime; true если регион только что истёк
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += delta;
        if self.elapsed >= self.spec.lifetime {
            self.active = false;
            return true;
        }
        false
    }

    pub fn already_hit(&self, target: Entity) -> bool {
        self.hit_targets.contains(&target)
    }

    /// Записать попадание; single-hit регион сразу выключается
    pub fn record_hit(&mut self, target: Entity) {
        self.hit_targets.push(target);
        if !self.spec.multi_hit {
            self.active = false;
        }
    }

    pub fn overlaps(&self, owner_position: Vec2, hurtbox_center: Vec2, hurtbox_radius: f32) -> bool {
        self.active
            && self.center(owner_position).distance(hurtbox_center) <= self.spec.radius + hurtbox_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_mirrors_by_facing() {
        let mut region = AttackRegion::default();
        region.activate(RegionSpec::default(), -1.0);
        assert_eq!(region.center(Vec2::new(2.0, 1.0)), Vec2::new(1.2, 1.0));
    }

    #[test]
    fn test_lifetime_expires_region() {
        let mut region = AttackRegion::default();
        region.activate(RegionSpec { lifetime: 0.1, ..default() }, 1.0);
        assert!(!region.tick(0.05));
        assert!(region.tick(0.05));
        assert!(!region.active);
        assert!(!region.tick(0.05), "истекает только один раз");
    }

    #[test]
    fn test_reactivation_bumps_serial_and_clears_hits() {
        let mut region = AttackRegion::default();
        let first = region.activate(RegionSpec { multi_hit: true, ..default() }, 1.0);
        region.record_hit(Entity::from_raw(7));
        let second = region.activate(RegionSpec::default(), 1.0);

        assert_eq!(second, first + 1);
        assert!(!region.already_hit(Entity::from_raw(7)));
    }

    #[test]
    fn test_falloff_damage() {
        let spec = RegionSpec {
            damage: 30,
            falloff: Some(Falloff { inner_radius: 2.0, outer_damage: 15 }),
            ..default()
        };
        assert_eq!(spec.damage_at(1.5), 30);
        assert_eq!(spec.damage_at(2.0), 30);
        assert_eq!(spec.damage_at(2.5), 15);
    }
}
