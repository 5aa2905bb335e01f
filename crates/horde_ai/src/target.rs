//! The entity agents hunt
//!
//! The target (normally the player) is owned by the host and shared as a
//! [`SharedTarget`]. Agents only ever hold a weak [`TargetRef`], read its
//! position and damage it through [`Damageable`].

use horde_combat::Damageable;
use horde_core::EntityId;
use horde_math::Vec3;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Something agents can sense, chase and attack
pub trait Target: Damageable {
    fn entity(&self) -> EntityId;

    /// Ground position
    fn position(&self) -> Vec3;

    /// Point agents measure distance to and steer toward (e.g. chest height)
    fn aim_point(&self) -> Vec3 {
        self.position()
    }
}

/// Host-owned target handle
pub type SharedTarget = Arc<RwLock<dyn Target + Send + Sync>>;

/// Wrap a target for sharing with agents
pub fn share_target<T: Target + Send + Sync + 'static>(target: T) -> SharedTarget {
    Arc::new(RwLock::new(target))
}

/// Weak, possibly empty reference to the target
#[derive(Clone, Default)]
pub struct TargetRef(Option<Weak<RwLock<dyn Target + Send + Sync>>>);

impl TargetRef {
    pub fn new(target: &SharedTarget) -> Self {
        Self(Some(Arc::downgrade(target)))
    }

    /// No target
    pub fn none() -> Self {
        Self(None)
    }

    pub fn upgrade(&self) -> Option<SharedTarget> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    /// Whether the target still exists
    pub fn is_tracked(&self) -> bool {
        self.upgrade().is_some()
    }

    /// Snapshot of the target's aim point
    pub fn aim_point(&self) -> Option<Vec3> {
        self.upgrade().map(|target| target.read().aim_point())
    }

    /// Snapshot of the target's ground position
    pub fn position(&self) -> Option<Vec3> {
        self.upgrade().map(|target| target.read().position())
    }
}

impl fmt::Debug for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(target) => write!(f, "TargetRef({})", target.read().entity()),
            None => write!(f, "TargetRef(none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_combat::{DamageInfo, DamageOutcome, Health};

    struct Dummy {
        health: Health,
    }

    impl Damageable for Dummy {
        fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome {
            self.health.apply(damage.effective_amount())
        }

        fn is_alive(&self) -> bool {
            self.health.is_alive()
        }
    }

    impl Target for Dummy {
        fn entity(&self) -> EntityId {
            EntityId::new(1, 0)
        }

        fn position(&self) -> Vec3 {
            Vec3::new(1.0, 0.0, 2.0)
        }
    }

    #[test]
    fn test_weak_reference_lapses() {
        let target = share_target(Dummy {
            health: Health::new(10.0),
        });
        let reference = TargetRef::new(&target);

        assert!(reference.is_tracked());
        assert_eq!(reference.aim_point(), Some(Vec3::new(1.0, 0.0, 2.0)));

        drop(target);
        assert!(!reference.is_tracked());
        assert_eq!(reference.aim_point(), None);
        assert!(!TargetRef::none().is_tracked());
    }
}
