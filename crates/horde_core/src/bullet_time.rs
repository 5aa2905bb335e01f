//! Bullet time: an energy-limited slow-motion service

use crate::time::{FrameTime, GameClock};
use serde::{Deserialize, Serialize};

/// Bullet time settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTimeSettings {
    /// Time scale while active (0.05 - 1.0)
    pub time_scale: f32,
    /// Energy pool size
    pub max_energy: f32,
    /// Energy regained per scaled second while inactive
    pub recharge_rate: f32,
    /// Energy spent per real second while active
    pub drain_rate: f32,
    /// Volume multiplier the host applies to other sounds while active
    pub other_sound_volume: f32,
    /// Pitch multiplier the host applies to other sounds while active
    pub other_sound_pitch: f32,
}

impl Default for BulletTimeSettings {
    fn default() -> Self {
        Self {
            time_scale: 0.3,
            max_energy: 100.0,
            recharge_rate: 20.0,
            drain_rate: 10.0,
            other_sound_volume: 0.5,
            other_sound_pitch: 0.5,
        }
    }
}

/// Events for the presentation layer (sound ducking, screen tint)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulletTimeEvent {
    /// Slow motion started; scale other sounds by these factors
    Started { volume_scale: f32, pitch_scale: f32 },
    /// Slow motion ended; restore other sounds
    Ended,
}

/// Bullet time service.
///
/// Owns the energy pool and drives the [`GameClock`] time scale. Build one
/// per game session and hand it to whatever handles the player's input.
#[derive(Debug, Clone)]
pub struct BulletTime {
    settings: BulletTimeSettings,
    energy: f32,
    active: bool,
}

impl BulletTime {
    pub fn new(settings: BulletTimeSettings) -> Self {
        let energy = settings.max_energy;
        Self {
            settings,
            energy,
            active: false,
        }
    }

    pub fn settings(&self) -> &BulletTimeSettings {
        &self.settings
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Energy as a fraction of the pool (0.0 - 1.0)
    pub fn energy_percent(&self) -> f32 {
        if self.settings.max_energy <= 0.0 {
            return 0.0;
        }
        self.energy / self.settings.max_energy
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter slow motion. Refused when the pool is empty or already active.
    pub fn activate(&mut self, clock: &mut GameClock) -> Option<BulletTimeEvent> {
        if self.active || self.energy <= 0.0 {
            return None;
        }
        self.active = true;
        clock.set_time_scale(self.settings.time_scale.clamp(0.05, 1.0));
        log::debug!("Bullet time on ({:.0} energy)", self.energy);
        Some(BulletTimeEvent::Started {
            volume_scale: self.settings.other_sound_volume,
            pitch_scale: self.settings.other_sound_pitch,
        })
    }

    /// Leave slow motion and restore normal time
    pub fn deactivate(&mut self, clock: &mut GameClock) -> Option<BulletTimeEvent> {
        if !self.active {
            return None;
        }
        self.active = false;
        clock.set_time_scale(1.0);
        log::debug!("Bullet time off ({:.0} energy)", self.energy);
        Some(BulletTimeEvent::Ended)
    }

    /// Drain or recharge energy for one frame.
    ///
    /// Draining uses real time so slow motion lasts the same wall-clock
    /// duration at any scale. Recharge uses scaled time.
    pub fn update(&mut self, clock: &mut GameClock, time: &FrameTime) -> Option<BulletTimeEvent> {
        if self.active {
            self.energy -= time.unscaled_delta * self.settings.drain_rate;
            if self.energy <= 0.0 {
                self.energy = 0.0;
                return self.deactivate(clock);
            }
        } else {
            self.energy =
                (self.energy + self.settings.recharge_rate * time.delta).min(self.settings.max_energy);
        }
        None
    }
}

impl Default for BulletTime {
    fn default() -> Self {
        Self::new(BulletTimeSettings::default())
    }
}
