//! Damage information and the damageable capability

use horde_core::EntityId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// Information about a damage instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    /// Damage amount (negative amounts deal nothing)
    pub amount: f32,
    /// Entity that caused the damage (if any)
    pub source: Option<EntityId>,
    /// World position where damage was applied
    pub hit_point: Option<Vec3>,
}

impl DamageInfo {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            source: None,
            hit_point: None,
        }
    }

    /// Set the source entity
    pub fn with_source(mut self, entity: EntityId) -> Self {
        self.source = Some(entity);
        self
    }

    /// Set the hit point
    pub fn with_hit_point(mut self, point: Vec3) -> Self {
        self.hit_point = Some(point);
        self
    }

    /// Amount that can actually be subtracted from a pool
    pub fn effective_amount(&self) -> f32 {
        if self.amount.is_finite() {
            self.amount.max(0.0)
        } else {
            0.0
        }
    }
}

/// What a damage call did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed
    pub dealt: f32,
    /// Whether this hit was the killing blow
    pub died: bool,
}

impl DamageOutcome {
    /// Damage was ignored (already dead, being destroyed, ...)
    pub const IGNORED: Self = Self {
        dealt: 0.0,
        died: false,
    };
}

/// Anything that can take damage.
///
/// Weapons and agent attacks deliver damage only through this trait.
pub trait Damageable {
    /// Apply damage and report what happened
    fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome;

    /// Whether the entity can still take damage
    fn is_alive(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_info() {
        let damage = DamageInfo::new(50.0)
            .with_source(EntityId::new(4, 0))
            .with_hit_point(Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(damage.amount, 50.0);
        assert_eq!(damage.source, Some(EntityId::new(4, 0)));
        assert_eq!(damage.hit_point, Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_effective_amount() {
        assert_eq!(DamageInfo::new(-5.0).effective_amount(), 0.0);
        assert_eq!(DamageInfo::new(f32::NAN).effective_amount(), 0.0);
        assert_eq!(DamageInfo::new(12.5).effective_amount(), 12.5);
    }
}
