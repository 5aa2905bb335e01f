//! Game clock with a time scale

use serde::{Deserialize, Serialize};

/// Clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Fixed physics step at time scale 1
    pub fixed_delta: f32,
    /// Largest real frame delta accepted (lag spikes are clamped to this)
    pub max_delta: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_delta: 1.0 / 60.0,
            max_delta: 0.1,
        }
    }
}

/// Timing for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Frame number, starting at 1 for the first advanced frame
    pub frame: u64,
    /// Scaled delta in seconds (what gameplay timers consume)
    pub delta: f32,
    /// Real delta in seconds
    pub unscaled_delta: f32,
    /// Scaled time since the clock started
    pub now: f64,
    /// Real time since the clock started
    pub unscaled_now: f64,
}

/// The game clock.
///
/// The host advances it once per frame with the real frame delta; gameplay
/// reads the scaled values. Time scale is driven by services such as
/// [`crate::BulletTime`].
#[derive(Debug, Clone)]
pub struct GameClock {
    config: ClockConfig,
    time_scale: f32,
    frame: u64,
    elapsed: f64,
    unscaled_elapsed: f64,
}

impl GameClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            time_scale: 1.0,
            frame: 0,
            elapsed: 0.0,
            unscaled_elapsed: 0.0,
        }
    }

    /// Advance by a real frame delta
    pub fn advance(&mut self, real_delta: f32) -> FrameTime {
        let unscaled_delta = real_delta.clamp(0.0, self.config.max_delta);
        let delta = unscaled_delta * self.time_scale;

        self.frame += 1;
        self.elapsed += delta as f64;
        self.unscaled_elapsed += unscaled_delta as f64;

        self.current()
    }

    /// Timing of the most recent frame without advancing.
    ///
    /// Deltas are zero here; only the running totals are meaningful.
    pub fn current(&self) -> FrameTime {
        FrameTime {
            frame: self.frame,
            delta: 0.0,
            unscaled_delta: 0.0,
            now: self.elapsed,
            unscaled_now: self.unscaled_elapsed,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the time scale (negative values are clamped to 0)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Fixed step scaled by the current time scale
    pub fn fixed_delta(&self) -> f32 {
        self.config.fixed_delta * self.time_scale
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }

    pub fn unscaled_now(&self) -> f64 {
        self.unscaled_elapsed
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_progression() {
        let mut clock = GameClock::default();
        let t = clock.advance(0.016);
        assert_eq!(t.frame, 1);
        assert_relative_eq!(t.delta, 0.016);

        let t = clock.advance(0.016);
        assert_eq!(t.frame, 2);
        assert_relative_eq!(t.now, 0.032, epsilon = 1e-6);
    }

    #[test]
    fn test_max_delta_clamping() {
        let mut clock = GameClock::default();
        let t = clock.advance(1.0);
        assert_relative_eq!(t.unscaled_delta, 0.1);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = GameClock::default();
        clock.set_time_scale(0.5);
        let t = clock.advance(0.1);
        assert_relative_eq!(t.delta, 0.05);
        assert_relative_eq!(t.unscaled_delta, 0.1);
        assert_relative_eq!(clock.fixed_delta(), 0.5 / 60.0);

        clock.set_time_scale(-2.0);
        assert_eq!(clock.time_scale(), 0.0);
    }
}
