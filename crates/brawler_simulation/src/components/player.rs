use bevy::prelude::*;

/// Marker: управляемый игроком entity (и primary target для hostile AI)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;
