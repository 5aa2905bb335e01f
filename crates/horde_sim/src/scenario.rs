//! Scenario files
//!
//! A scenario describes one simulated fight: the arena, the waves and the
//! enemies they draw from, the player and their weapon.
//!
//! # Example
//!
//! ```toml
//! seed = 7
//! duration = 90.0
//!
//! [waves]
//! min_enemies_per_wave = 2
//! max_enemies_per_wave = 4
//!
//! [[enemies]]
//! name = "Grunt"
//! prefab = "enemies/grunt"
//! max_health = 60.0
//! ```

use horde_ai::{AgentConfig, AiError, BehaviorTuning, WaveSettings};
use horde_combat::{HitScanSettings, WeaponStats};
use horde_core::{BulletTimeSettings, ClockConfig};
use horde_math::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Scenario loading errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),

    #[error(transparent)]
    Agent(#[from] AiError),
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Walkable arena
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub depth: f32,
    pub cell_size: f32,
    /// Blocked cells as `[col, row]`
    pub blocked: Vec<[usize; 2]>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            depth: 40.0,
            cell_size: 1.0,
            blocked: Vec::new(),
        }
    }
}

/// The player and how they fight back
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub position: Vec3,
    pub max_health: f32,
    pub respawn_delay: f32,
    pub weapon: WeaponStats,
    pub hitscan: HitScanSettings,
    pub bullet_time: BulletTimeSettings,
    /// Enter bullet time when health drops below this fraction
    pub bullet_time_below: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            max_health: 100.0,
            respawn_delay: 3.0,
            weapon: WeaponStats::default(),
            hitscan: HitScanSettings::default(),
            bullet_time: BulletTimeSettings::default(),
            bullet_time_below: 0.3,
        }
    }
}

/// One simulated fight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// RNG seed; the same seed replays the same fight
    pub seed: u64,
    /// Real seconds to simulate
    pub duration: f32,
    /// Real seconds per frame
    pub frame_delta: f32,
    pub clock: ClockConfig,
    pub arena: ArenaConfig,
    pub spawn_anchor: Vec3,
    pub waves: WaveSettings,
    pub tuning: BehaviorTuning,
    pub enemies: Vec<AgentConfig>,
    pub player: PlayerConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: 1,
            duration: 60.0,
            frame_delta: 1.0 / 60.0,
            clock: ClockConfig::default(),
            arena: ArenaConfig::default(),
            spawn_anchor: Vec3::new(0.0, 0.0, 12.0),
            waves: WaveSettings::default(),
            tuning: BehaviorTuning::default(),
            enemies: vec![AgentConfig::new("Grunt").with_prefab("enemies/grunt")],
            player: PlayerConfig::default(),
        }
    }
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let scenario = Self::from_toml(&content)?;
        log::info!("Loaded scenario from {}", path.display());
        Ok(scenario)
    }

    /// Parse and validate scenario TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ScenarioError::Invalid(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        if !(self.frame_delta.is_finite() && self.frame_delta > 0.0) {
            return Err(ScenarioError::Invalid(format!(
                "frame_delta must be positive, got {}",
                self.frame_delta
            )));
        }
        let arena = &self.arena;
        if !(arena.cell_size.is_finite() && arena.cell_size > 0.0) {
            return Err(ScenarioError::Invalid(format!(
                "cell_size must be positive, got {}",
                arena.cell_size
            )));
        }
        if !(arena.width.is_finite() && arena.depth.is_finite())
            || arena.width < arena.cell_size
            || arena.depth < arena.cell_size
        {
            return Err(ScenarioError::Invalid(format!(
                "arena {}x{} is smaller than one cell of {}",
                arena.width, arena.depth, arena.cell_size
            )));
        }
        if self.waves.min_enemies_per_wave > self.waves.max_enemies_per_wave {
            return Err(ScenarioError::Invalid(format!(
                "min_enemies_per_wave ({}) exceeds max_enemies_per_wave ({})",
                self.waves.min_enemies_per_wave, self.waves.max_enemies_per_wave
            )));
        }
        if self.enemies.is_empty() {
            log::warn!("Scenario has no enemies; waves will be empty");
        }
        self.tuning.validate()?;
        for enemy in &self.enemies {
            enemy.validate()?;
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        log::info!("Scenario:");
        log::info!("  Seed: {}", self.seed);
        log::info!("  Duration: {:.0}s at {:.0} fps", self.duration, 1.0 / self.frame_delta);
        log::info!(
            "  Arena: {}x{} (cell {})",
            self.arena.width,
            self.arena.depth,
            self.arena.cell_size
        );
        log::info!(
            "  Waves: {}-{} enemies, {}s apart",
            self.waves.min_enemies_per_wave,
            self.waves.max_enemies_per_wave,
            self.waves.time_between_waves
        );
        let names: Vec<&str> = self.enemies.iter().map(|e| e.name.as_str()).collect();
        log::info!("  Enemies: {}", names.join(", "));
        log::info!(
            "  Weapon: {} ({} dmg, {}/s)",
            self.player.weapon.name,
            self.player.weapon.damage,
            self.player.weapon.fire_rate
        );
    }
}
