//! Граница с анимацией: "play clip X with blend Y", normalized playback time.
//!
//! Рендер читает `clip`/`blend`; ядро только считает время проигрывания.

use bevy::prelude::*;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct AnimationPlayback {
    pub clip: String,
    pub blend: f32,
    pub elapsed: f32,
    /// Длина клипа (None = looping/неизвестна)
    pub length: Option<f32>,
}

impl Default for AnimationPlayback {
    fn default() -> Self {
        Self {
            clip: "Idle".to_string(),
            blend: 0.0,
            elapsed: 0.0,
            length: None,
        }
    }
}

impl AnimationPlayback {
    pub fn play_clip(&mut self, clip: &str, blend: f32, length: Option<f32>) {
        self.clip.clear();
        self.clip.push_str(clip);
        self.blend = blend;
        self.elapsed = 0.0;
        self.length = length;
    }

    pub fn tick(&mut self, delta: f32) {
        self.elapsed += delta;
    }

    /// [0, 1] для клипов с длиной; 0 для looping
    pub fn normalized_time(&self) -> f32 {
        match self.length {
            Some(length) if length > 0.0 => (self.elapsed / length).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub fn is_playing(&self, clip: &str) -> bool {
        if self.clip != clip {
            return false;
        }
        match self.length {
            Some(length) => self.elapsed < length,
            None => true,
        }
    }
}

/// System: продвинуть playback всех entity на scaled delta
pub fn tick_animation_playback(
    clock: Res<crate::time::CombatClock>,
    mut playbacks: Query<&mut AnimationPlayback>,
) {
    for mut playback in playbacks.iter_mut() {
        playback.tick(clock.delta);
    }
}
