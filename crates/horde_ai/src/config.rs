//! Agent data sheets and behavior tuning
//!
//! [`AgentConfig`] is the per-type data sheet designers author; it is
//! immutable at runtime and shared between agents through an `Arc`.
//! [`BehaviorTuning`] holds the timing and distance constants of the state
//! machine itself.

use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};

/// A sound clip identifier understood by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundClip(pub String);

impl SoundClip {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An effect prefab identifier understood by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectPrefab(pub String);

impl EffectPrefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Animation trigger names. `None` skips the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTriggers {
    pub idle: Option<String>,
    pub walk: Option<String>,
    pub run: Option<String>,
    pub attack: Option<String>,
    pub hurt: Option<String>,
    pub death: Option<String>,
}

impl Default for AnimationTriggers {
    fn default() -> Self {
        Self {
            idle: None,
            walk: None,
            run: None,
            attack: Some("Attack".to_string()),
            hurt: Some("Hurt".to_string()),
            death: Some("Death".to_string()),
        }
    }
}

/// Agent type data sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Display name
    pub name: String,
    pub description: String,
    /// Spawnable representation; the spawner skips configs without one
    pub prefab: Option<String>,

    /// Starting and maximum health
    pub max_health: f32,
    /// Patrol speed
    pub move_speed: f32,
    /// Chase speed
    pub chase_speed: f32,
    /// Distance at which the agent attacks
    pub attack_range: f32,
    /// Damage per attack
    pub attack_damage: f32,
    /// Minimum seconds between attacks
    pub attack_cooldown: f32,
    /// Carried for designers, not read by the state machine
    pub stun_resistance: f32,

    /// Distance at which the agent notices its target
    pub detection_radius: f32,
    pub can_patrol: bool,
    /// Carried for designers, not read by the state machine
    pub can_use_ranged_attacks: bool,

    pub animations: AnimationTriggers,
    /// One is picked at random per attack
    pub attack_sounds: Vec<SoundClip>,
    /// One is picked at random per hit
    pub hurt_sounds: Vec<SoundClip>,
    pub death_sound: Option<SoundClip>,
    /// Spawned on the target when an attack lands, and on the agent when hit
    pub hit_effect: Option<EffectPrefab>,
    pub death_effect: Option<EffectPrefab>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Enemy".to_string(),
            description: String::new(),
            prefab: None,
            max_health: 100.0,
            move_speed: 5.0,
            chase_speed: 5.0,
            attack_range: 2.0,
            attack_damage: 10.0,
            attack_cooldown: 1.5,
            stun_resistance: 0.0,
            detection_radius: 10.0,
            can_patrol: true,
            can_use_ranged_attacks: false,
            animations: AnimationTriggers::default(),
            attack_sounds: Vec::new(),
            hurt_sounds: Vec::new(),
            death_sound: None,
            hit_effect: None,
            death_effect: None,
        }
    }
}

impl AgentConfig {
    /// Create a config with default stats
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the prefab
    pub fn with_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.prefab = Some(prefab.into());
        self
    }

    /// Set max health
    pub fn with_max_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Set patrol and chase speeds
    pub fn with_speeds(mut self, move_speed: f32, chase_speed: f32) -> Self {
        self.move_speed = move_speed;
        self.chase_speed = chase_speed;
        self
    }

    /// Set attack range, damage and cooldown
    pub fn with_attack(mut self, range: f32, damage: f32, cooldown: f32) -> Self {
        self.attack_range = range;
        self.attack_damage = damage;
        self.attack_cooldown = cooldown;
        self
    }

    /// Set detection radius
    pub fn with_detection_radius(mut self, radius: f32) -> Self {
        self.detection_radius = radius;
        self
    }

    /// Enable or disable patrolling
    pub fn with_patrol(mut self, can_patrol: bool) -> Self {
        self.can_patrol = can_patrol;
        self
    }

    /// Set hurt sound alternatives
    pub fn with_hurt_sounds(mut self, clips: impl IntoIterator<Item = SoundClip>) -> Self {
        self.hurt_sounds = clips.into_iter().collect();
        self
    }

    /// Set attack sound alternatives
    pub fn with_attack_sounds(mut self, clips: impl IntoIterator<Item = SoundClip>) -> Self {
        self.attack_sounds = clips.into_iter().collect();
        self
    }

    /// Set hit and death effects
    pub fn with_effects(mut self, hit: Option<EffectPrefab>, death: Option<EffectPrefab>) -> Self {
        self.hit_effect = hit;
        self.death_effect = death;
        self
    }

    /// Navigation stopping distance for this agent type
    pub fn stopping_distance(&self, tuning: &BehaviorTuning) -> f32 {
        self.attack_range * tuning.stopping_distance_factor
    }

    /// Check that the sheet can drive an agent
    pub fn validate(&self) -> Result<()> {
        if !(self.max_health.is_finite() && self.max_health > 0.0) {
            return Err(self.invalid(format!("max_health must be positive, got {}", self.max_health)));
        }

        let non_negative = [
            ("move_speed", self.move_speed),
            ("chase_speed", self.chase_speed),
            ("attack_range", self.attack_range),
            ("attack_damage", self.attack_damage),
            ("attack_cooldown", self.attack_cooldown),
            ("detection_radius", self.detection_radius),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(self.invalid(format!("{field} must be finite and non-negative, got {value}")));
            }
        }

        if self.attack_range > self.detection_radius {
            log::warn!(
                "Agent config '{}': attack range {} exceeds detection radius {}",
                self.name,
                self.attack_range,
                self.detection_radius
            );
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> AiError {
        AiError::InvalidConfig {
            name: self.name.clone(),
            reason,
        }
    }
}

/// Timing and distance constants of the agent state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Idle duration range in seconds
    pub idle_duration_min: f32,
    pub idle_duration_max: f32,

    /// Patrol destinations are sampled within this radius
    pub patrol_radius: f32,
    pub patrol_samples: u32,

    /// How far off the mesh an agent may be when it starts chasing
    pub chase_probe_radius: f32,
    /// Search radius for putting an off-mesh agent back on the mesh
    pub chase_recovery_radius: f32,

    /// Ticks between displacement samples while chasing
    pub stuck_sample_interval: u32,
    /// Displacement below which a sample counts as stuck
    pub stuck_epsilon: f32,
    /// Stuck seconds before recovering
    pub stuck_threshold: f32,
    /// Distance toward the target of the recovery point
    pub stuck_recovery_step: f32,
    pub stuck_search_radius: f32,

    pub attack_windup: f32,
    pub attack_recovery: f32,
    /// Attack still lands within `attack_range * attack_reach_factor`
    pub attack_reach_factor: f32,

    pub hurt_stun: f32,
    /// Hurt hold when the hit alerts an unengaged agent
    pub alert_delay: f32,
    /// Hurt hold when the agent was already chasing or attacking
    pub engaged_resume_delay: f32,
    /// Seconds a corpse stays before removal
    pub death_removal_delay: f32,

    /// Knockback speed away from the hit point
    pub knockback_speed: f32,
    /// Multiplied by `attack_range`
    pub stopping_distance_factor: f32,

    pub attack_hit_effect_duration: f32,
    pub damage_hit_effect_duration: f32,
    pub death_effect_duration: f32,
    /// Height above the target or agent for attack and death effects
    pub effect_height: f32,
    /// Height above the agent for hit effects without a hit point
    pub hit_point_height: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            idle_duration_min: 2.0,
            idle_duration_max: 5.0,
            patrol_radius: 10.0,
            patrol_samples: 30,
            chase_probe_radius: 0.5,
            chase_recovery_radius: 5.0,
            stuck_sample_interval: 30,
            stuck_epsilon: 0.05,
            stuck_threshold: 2.0,
            stuck_recovery_step: 2.0,
            stuck_search_radius: 5.0,
            attack_windup: 0.3,
            attack_recovery: 0.7,
            attack_reach_factor: 1.2,
            hurt_stun: 0.5,
            alert_delay: 0.6,
            engaged_resume_delay: 0.5,
            death_removal_delay: 3.0,
            knockback_speed: 2.0,
            stopping_distance_factor: 0.5,
            attack_hit_effect_duration: 1.0,
            damage_hit_effect_duration: 0.5,
            death_effect_duration: 0.5,
            effect_height: 1.0,
            hit_point_height: 1.5,
        }
    }
}

impl BehaviorTuning {
    /// Hurt hold time for a hit that alerts an unengaged agent
    pub fn alert_hold(&self) -> f32 {
        self.hurt_stun.max(self.alert_delay)
    }

    /// Hurt hold time for a hit taken while chasing or attacking
    pub fn engaged_hold(&self) -> f32 {
        self.hurt_stun.max(self.engaged_resume_delay)
    }

    /// Check that every duration and distance is finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("idle_duration_min", self.idle_duration_min),
            ("idle_duration_max", self.idle_duration_max),
            ("patrol_radius", self.patrol_radius),
            ("chase_probe_radius", self.chase_probe_radius),
            ("chase_recovery_radius", self.chase_recovery_radius),
            ("stuck_epsilon", self.stuck_epsilon),
            ("stuck_threshold", self.stuck_threshold),
            ("stuck_recovery_step", self.stuck_recovery_step),
            ("stuck_search_radius", self.stuck_search_radius),
            ("attack_windup", self.attack_windup),
            ("attack_recovery", self.attack_recovery),
            ("attack_reach_factor", self.attack_reach_factor),
            ("hurt_stun", self.hurt_stun),
            ("alert_delay", self.alert_delay),
            ("engaged_resume_delay", self.engaged_resume_delay),
            ("death_removal_delay", self.death_removal_delay),
            ("knockback_speed", self.knockback_speed),
            ("stopping_distance_factor", self.stopping_distance_factor),
            ("attack_hit_effect_duration", self.attack_hit_effect_duration),
            ("damage_hit_effect_duration", self.damage_hit_effect_duration),
            ("death_effect_duration", self.death_effect_duration),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Self::invalid(format!(
                    "{field} must be finite and non-negative, got {value}"
                )));
            }
        }

        for (field, value) in [
            ("effect_height", self.effect_height),
            ("hit_point_height", self.hit_point_height),
        ] {
            if !value.is_finite() {
                return Err(Self::invalid(format!("{field} must be finite, got {value}")));
            }
        }

        if self.idle_duration_min > self.idle_duration_max {
            return Err(Self::invalid(format!(
                "idle_duration_min ({}) exceeds idle_duration_max ({})",
                self.idle_duration_min, self.idle_duration_max
            )));
        }

        Ok(())
    }

    fn invalid(reason: String) -> AiError {
        AiError::InvalidConfig {
            name: "tuning".to_string(),
            reason,
        }
    }
}
