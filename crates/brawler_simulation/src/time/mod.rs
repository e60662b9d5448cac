//! Combat clock + global hitstop time scale.
//!
//! Всё боевое время (таймеры мувов, фазы паттернов, токены) течёт по
//! `CombatClock::delta` — масштабированному шагу FixedUpdate. Hitstop
//! истекает по реальному времени, иначе при scale ≈ 0 он бы не закончился.

use bevy::prelude::*;

use crate::config::CombatConfig;

/// Масштабированные часы симуляции
#[derive(Resource, Debug, Clone, Default)]
pub struct CombatClock {
    /// Scaled seconds since start
    pub elapsed: f32,
    /// Unscaled seconds since start
    pub real_elapsed: f32,
    /// Scaled delta текущего тика
    pub delta: f32,
}

impl CombatClock {
    pub fn advance(&mut self, real_dt: f32, scale: f32) {
        self.real_elapsed += real_dt;
        self.delta = real_dt * scale;
        self.elapsed += self.delta;
    }
}

/// Глобальный множитель времени (hitstop).
///
/// Единственный глобальный mutable в боевом ядре. Запросы не стакаются:
/// новый запрос перезаписывает множитель и дедлайн (last writer wins).
#[derive(Resource, Debug, Clone)]
pub struct TimeScale {
    pub scale: f32,
    /// Real-time дедлайн восстановления (None = hitstop не активен)
    pub restore_at: Option<f32>,
    pub hitstop_scale: f32,
}

impl TimeScale {
    pub fn new(hitstop_scale: f32) -> Self {
        Self {
            scale: 1.0,
            restore_at: None,
            hitstop_scale: hitstop_scale.clamp(0.0, 1.0),
        }
    }

    pub fn request_hitstop(&mut self, duration: f32, real_now: f32) {
        if duration <= 0.0 {
            return;
        }
        self.scale = self.hitstop_scale;
        self.restore_at = Some(real_now + duration);
    }

    /// Возвращает true если hitstop только что закончился
    pub fn decay(&mut self, real_now: f32) -> bool {
        match self.restore_at {
            Some(deadline) if real_now >= deadline => {
                self.scale = 1.0;
                self.restore_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_hitstop(&self) -> bool {
        self.restore_at.is_some()
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(CombatConfig::default().hitstop_scale)
    }
}

/// System: продвинуть CombatClock на fixed timestep × scale (первый сет тика)
pub fn advance_combat_clock(
    fixed: Res<Time<Fixed>>,
    scale: Res<TimeScale>,
    mut clock: ResMut<CombatClock>,
) {
    clock.advance(fixed.timestep().as_secs_f32(), scale.scale);
}

/// System: восстановить scale когда hitstop истёк (последний сет тика)
pub fn decay_time_scale(clock: Res<CombatClock>, mut scale: ResMut<TimeScale>) {
    if scale.decay(clock.real_elapsed) {
        crate::logger::log("⏱️ Hitstop ended → time scale restored");
    }
}
