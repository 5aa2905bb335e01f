//! Error types for the combat system

use thiserror::Error;

/// Reasons a weapon refuses to fire or reload
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeaponError {
    /// Fire rate cooldown still running
    #[error("Weapon cooling down for {remaining:.2}s")]
    Cooldown { remaining: f32 },

    /// A reload is in progress
    #[error("Weapon is reloading")]
    Reloading,

    /// Magazine is empty
    #[error("Out of ammo")]
    OutOfAmmo,

    /// Reload requested with a full magazine
    #[error("Magazine already full")]
    MagazineFull,
}

/// Result type for weapon operations
pub type Result<T> = std::result::Result<T, WeaponError>;
