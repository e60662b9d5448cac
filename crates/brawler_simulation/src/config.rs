//! Combat tuning (RON-loadable).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, ContentResult};

/// Глобальные параметры боевого ядра.
///
/// `SimulationPlugin` строит из них все ресурсы (arbiter, time scale, fixed timestep).
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Сколько секунд живёт нажатие в InputBuffer
    pub input_retention: f32,
    /// Без подтверждённого попадания дольше этого — combo counter в 0
    pub combo_timeout: f32,
    pub max_attack_tokens: usize,
    /// Период переоценки токенов (не каждый тик — гистерезис)
    pub token_interval: f32,
    /// Множитель времени во время hitstop
    pub hitstop_scale: f32,
    /// Экспоненциальное затухание knockback impulse (1/сек)
    pub knockback_decay: f32,
    pub tick_hz: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            input_retention: 0.2,
            combo_timeout: 2.0,
            max_attack_tokens: 2,
            token_interval: 0.5,
            hitstop_scale: 0.05,
            knockback_decay: 10.0,
            tick_hz: 60.0,
        }
    }
}

impl CombatConfig {
    pub fn from_ron(text: &str) -> ContentResult<Self> {
        let config: Self = ron::from_str(text).map_err(|source| ContentError::Parse {
            what: "combat config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Значения, с которыми fixed timestep и таймеры не ломаются
    pub fn validate(&self) -> ContentResult<()> {
        let invalid = |reason: &str| ContentError::InvalidConfig {
            reason: reason.to_string(),
        };

        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 {
            return Err(invalid("tick_hz must be > 0"));
        }
        if self.token_interval < 0.0 {
            return Err(invalid("token_interval must be non-negative"));
        }
        if self.combo_timeout < 0.0 || self.input_retention < 0.0 {
            return Err(invalid("combo_timeout and input_retention must be non-negative"));
        }
        if self.knockback_decay < 0.0 {
            return Err(invalid("knockback_decay must be non-negative"));
        }
        Ok(())
    }

    /// Встроенный `data/combat.ron`.
    pub fn builtin() -> ContentResult<Self> {
        Self::from_ron(include_str!("../data/combat.ron"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_matches_defaults() {
        let config = CombatConfig::builtin().expect("builtin combat.ron must parse");
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn test_partial_ron_falls_back_to_defaults() {
        let config = CombatConfig::from_ron("(max_attack_tokens: 3)").unwrap();
        assert_eq!(config.max_attack_tokens, 3);
        assert_eq!(config.input_retention, 0.2);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for text in ["(tick_hz: 0.0)", "(tick_hz: -30.0)", "(token_interval: -0.5)", "(combo_timeout: -1.0)"] {
            assert!(
                matches!(CombatConfig::from_ron(text), Err(ContentError::InvalidConfig { .. })),
                "{} must be rejected",
                text
            );
        }
    }

    #[test]
    fn test_default_validates() {
        assert!(CombatConfig::default().validate().is_ok());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            CombatConfig::from_ron("(max_attack_tokens: \"two\")"),
            Err(ContentError::Parse { .. })
        ));
    }
}
