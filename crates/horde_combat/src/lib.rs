//! Horde Combat - Health, Damage, Hitscan and Weapons
//!
//! # Features
//!
//! - Health pools that clamp at zero and latch death
//! - The [`Damageable`] capability every damage receiver implements
//! - Player health with delayed respawn
//! - Hitscan hit detection over an abstract [`Raycaster`]
//! - Weapons with fire rate, magazines and reloads
//!
//! # Example
//!
//! ```ignore
//! use horde_combat::prelude::*;
//!
//! let mut player = PlayerHealth::new(player_id, 100.0);
//! let damage = DamageInfo::new(25.0).with_source(enemy_id);
//! let outcome = player.apply_damage(&damage);
//! assert_eq!(outcome.dealt, 25.0);
//! ```

pub mod damage;
pub mod error;
pub mod health;
pub mod hit_detection;
pub mod weapon;

pub mod prelude {
    pub use crate::damage::{DamageInfo, DamageOutcome, Damageable};
    pub use crate::error::{Result, WeaponError};
    pub use crate::health::{Health, HealthEvent, PlayerHealth};
    pub use crate::hit_detection::{
        DamageSink, HitScanSettings, HitScanner, Impact, ImpactEffect, LayerMask, RaycastHit,
        Raycaster, ShotReport,
    };
    pub use crate::weapon::{Shot, Weapon, WeaponEvent, WeaponStats};
}

pub use prelude::*;
