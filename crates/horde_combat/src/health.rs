//! Health pools and player health

use crate::damage::{DamageInfo, DamageOutcome, Damageable};
use horde_core::EntityId;
use serde::{Deserialize, Serialize};

/// Events emitted by [`PlayerHealth`]
#[derive(Debug, Clone, PartialEq)]
pub enum HealthEvent {
    /// Damage was taken
    DamageTaken {
        entity: EntityId,
        amount: f32,
        new_health: f32,
    },
    /// Entity was healed
    Healed {
        entity: EntityId,
        amount: f32,
        new_health: f32,
    },
    /// Entity died
    Death {
        entity: EntityId,
        killer: Option<EntityId>,
    },
    /// Entity respawned
    Respawned { entity: EntityId, new_health: f32 },
}

/// A health pool that clamps at zero and latches death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health
    current: f32,
    /// Maximum health
    max: f32,
    /// Whether the pool hit zero
    #[serde(skip)]
    is_dead: bool,
}

impl Health {
    /// Create a full pool
    pub fn new(max_health: f32) -> Self {
        let max = max_health.max(0.0);
        Self {
            current: max,
            max,
            is_dead: max <= 0.0,
        }
    }

    /// Subtract damage, clamping at zero
    pub fn apply(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead {
            return DamageOutcome::IGNORED;
        }

        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let before = self.current;
        self.current = (self.current - amount).max(0.0);

        let died = self.current <= 0.0;
        if died {
            self.is_dead = true;
        }

        DamageOutcome {
            dealt: before - self.current,
            died,
        }
    }

    /// Heal, returning the amount actually restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead {
            return 0.0;
        }

        let old_health = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - old_health
    }

    /// Set health directly (clamped to 0..max)
    pub fn set_health(&mut self, health: f32) {
        self.current = health.clamp(0.0, self.max);
        self.is_dead = self.current <= 0.0;
    }

    /// Back to full health and alive
    pub fn revive(&mut self) {
        self.current = self.max;
        self.is_dead = self.max <= 0.0;
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Health as a fraction (0.0 - 1.0)
    pub fn health_percent(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// The player's health: dies at zero and respawns at full after a delay
#[derive(Debug, Clone)]
pub struct PlayerHealth {
    entity: EntityId,
    health: Health,
    respawn_delay: f32,
    respawn_timer: Option<f32>,
    events: Vec<HealthEvent>,
}

impl PlayerHealth {
    pub fn new(entity: EntityId, max_health: f32) -> Self {
        Self {
            entity,
            health: Health::new(max_health),
            respawn_delay: 3.0,
            respawn_timer: None,
            events: Vec::new(),
        }
    }

    /// Set the respawn delay in seconds
    pub fn with_respawn_delay(mut self, delay: f32) -> Self {
        self.respawn_delay = delay.max(0.0);
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    /// Heal the player
    pub fn heal(&mut self, amount: f32) -> f32 {
        let healed = self.health.heal(amount);
        if healed > 0.0 {
            self.events.push(HealthEvent::Healed {
                entity: self.entity,
                amount: healed,
                new_health: self.health.current(),
            });
        }
        healed
    }

    /// Respawn immediately at full health
    pub fn respawn(&mut self) {
        self.respawn_timer = None;
        self.health.revive();
        log::info!("Player {} respawned", self.entity);
        self.events.push(HealthEvent::Respawned {
            entity: self.entity,
            new_health: self.health.current(),
        });
    }

    /// Advance the respawn timer and collect pending events
    pub fn update(&mut self, delta_time: f32) -> Vec<HealthEvent> {
        if let Some(timer) = self.respawn_timer.as_mut() {
            *timer -= delta_time;
            if *timer <= 0.0 {
                self.respawn();
            }
        }

        std::mem::take(&mut self.events)
    }
}

impl Damageable for PlayerHealth {
    fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome {
        let outcome = self.health.apply(damage.effective_amount());
        if outcome == DamageOutcome::IGNORED {
            return outcome;
        }

        self.events.push(HealthEvent::DamageTaken {
            entity: self.entity,
            amount: outcome.dealt,
            new_health: self.health.current(),
        });

        if outcome.died {
            log::info!("Player {} died", self.entity);
            self.events.push(HealthEvent::Death {
                entity: self.entity,
                killer: damage.source,
            });
            self.respawn_timer = Some(self.respawn_delay);
        }

        outcome
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}
