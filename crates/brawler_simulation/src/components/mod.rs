//! ECS Components для боевых entity
//!
//! Организация по доменам:
//! - actor: фракция, Damageable (health/invulnerability/knockback resistance), Hurtbox
//! - body: Position, KinematicBody (velocity + knockback), Facing
//! - animation: AnimationPlayback (граница с рендером)
//! - player: Player marker

pub mod actor;
pub mod animation;
pub mod body;
pub mod player;

pub use actor::*;
pub use animation::*;
pub use body::*;
pub use player::*;
