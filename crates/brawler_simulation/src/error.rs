//! Ошибки загрузки данных (moves, archetypes, config).
//!
//! Runtime никогда не возвращает ошибки — только деградирует с логом.

use thiserror::Error;

/// Errors raised while loading RON content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// RON не распарсился.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: ron::error::SpannedError,
    },

    /// Два определения с одним именем.
    #[error("Duplicate {what} name: '{name}'")]
    Duplicate { what: &'static str, name: String },

    /// Поле вне допустимого диапазона.
    #[error("Invalid move '{name}': {reason}")]
    InvalidMove { name: String, reason: String },

    /// Глобальный combat config вне допустимого диапазона.
    #[error("Invalid combat config: {reason}")]
    InvalidConfig { reason: String },

    /// Параметры archetype не проходят валидацию.
    #[error("Invalid archetype '{name}': {reason}")]
    InvalidArchetype { name: String, reason: String },
}

pub type ContentResult<T> = Result<T, ContentError>;
