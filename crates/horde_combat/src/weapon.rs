//! Weapon ammo, fire rate and reloading

use crate::error::{Result, WeaponError};
use serde::{Deserialize, Serialize};

/// Weapon statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStats {
    /// Display name
    pub name: String,
    /// Base damage per hit
    pub damage: f32,
    /// Fire rate (shots per second)
    pub fire_rate: f32,
    /// Range in world units
    pub range: f32,
    /// Magazine size (0 = infinite)
    pub magazine_size: u32,
    /// Reload time in seconds
    pub reload_time: f32,
    /// Keep firing while the trigger is held
    pub automatic: bool,
    /// Spread angle in degrees
    pub spread: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            name: "Rifle".to_string(),
            damage: 10.0,
            fire_rate: 2.0,
            range: 100.0,
            magazine_size: 30,
            reload_time: 2.0,
            automatic: false,
            spread: 0.0,
        }
    }
}

/// A shot the weapon allowed; the caller casts the ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub damage: f32,
    pub range: f32,
    pub spread: f32,
    /// Ammo left in the magazine after this shot
    pub ammo_remaining: u32,
}

/// State changes reported by [`Weapon::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponEvent {
    /// A reload finished and the magazine is full
    Reloaded { ammo: u32 },
}

/// A weapon with a magazine, fire-rate cooldown and reload timer
#[derive(Debug, Clone)]
pub struct Weapon {
    stats: WeaponStats,
    current_ammo: u32,
    /// Time until can fire again
    cooldown: f32,
    /// Seconds left on the reload, when reloading
    reload_remaining: Option<f32>,
}

impl Weapon {
    pub fn new(stats: WeaponStats) -> Self {
        let current_ammo = stats.magazine_size;
        Self {
            stats,
            current_ammo,
            cooldown: 0.0,
            reload_remaining: None,
        }
    }

    /// Set damage
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.stats.damage = damage;
        self
    }

    /// Set fire rate
    pub fn with_fire_rate(mut self, rate: f32) -> Self {
        self.stats.fire_rate = rate;
        self
    }

    /// Set magazine size and refill
    pub fn with_magazine(mut self, size: u32) -> Self {
        self.stats.magazine_size = size;
        self.current_ammo = size;
        self
    }

    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    pub fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }

    /// Check if can fire
    pub fn can_fire(&self) -> bool {
        self.check_fire().is_ok()
    }

    fn check_fire(&self) -> Result<()> {
        if self.reload_remaining.is_some() {
            return Err(WeaponError::Reloading);
        }
        if self.cooldown > 0.0 {
            return Err(WeaponError::Cooldown {
                remaining: self.cooldown,
            });
        }
        if self.stats.magazine_size > 0 && self.current_ammo == 0 {
            return Err(WeaponError::OutOfAmmo);
        }
        Ok(())
    }

    /// Attempt to fire, consuming ammo and starting the cooldown
    pub fn try_fire(&mut self) -> Result<Shot> {
        self.check_fire()?;

        if self.stats.magazine_size > 0 {
            self.current_ammo -= 1;
        }
        if self.stats.fire_rate > 0.0 {
            self.cooldown = 1.0 / self.stats.fire_rate;
        }

        Ok(Shot {
            damage: self.stats.damage,
            range: self.stats.range,
            spread: self.stats.spread,
            ammo_remaining: self.current_ammo,
        })
    }

    /// Start reloading
    pub fn start_reload(&mut self) -> Result<()> {
        if self.reload_remaining.is_some() {
            return Err(WeaponError::Reloading);
        }
        if self.current_ammo >= self.stats.magazine_size {
            return Err(WeaponError::MagazineFull);
        }

        log::debug!("{} reloading", self.stats.name);
        self.reload_remaining = Some(self.stats.reload_time.max(0.0));
        Ok(())
    }

    /// Cancel reload
    pub fn cancel_reload(&mut self) {
        self.reload_remaining = None;
    }

    /// Update weapon state
    pub fn update(&mut self, delta_time: f32) -> Option<WeaponEvent> {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - delta_time).max(0.0);
        }

        let remaining = self.reload_remaining.as_mut()?;
        *remaining -= delta_time;
        if *remaining > 0.0 {
            return None;
        }

        self.reload_remaining = None;
        self.current_ammo = self.stats.magazine_size;
        Some(WeaponEvent::Reloaded {
            ammo: self.current_ammo,
        })
    }

    /// Get ammo display string
    pub fn ammo_display(&self) -> String {
        if self.stats.magazine_size == 0 {
            "inf".to_string()
        } else {
            format!("{}/{}", self.current_ammo, self.stats.magazine_size)
        }
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new(WeaponStats::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_firing() {
        let mut weapon = Weapon::default().with_fire_rate(10.0).with_magazine(5);

        let shot = weapon.try_fire().unwrap();
        assert_eq!(shot.ammo_remaining, 4);
        assert!(matches!(
            weapon.try_fire(),
            Err(WeaponError::Cooldown { .. })
        ));

        weapon.update(0.1);
        assert!(weapon.can_fire());
    }

    #[test]
    fn test_out_of_ammo() {
        let mut weapon = Weapon::default().with_fire_rate(0.0).with_magazine(2);

        weapon.try_fire().unwrap();
        weapon.try_fire().unwrap();
        assert_eq!(weapon.try_fire(), Err(WeaponError::OutOfAmmo));
    }

    #[test]
    fn test_reload() {
        let mut weapon = Weapon::default().with_magazine(3);
        assert_eq!(weapon.start_reload(), Err(WeaponError::MagazineFull));

        weapon.try_fire().unwrap();
        weapon.start_reload().unwrap();
        assert_eq!(weapon.try_fire(), Err(WeaponError::Reloading));
        assert_eq!(weapon.start_reload(), Err(WeaponError::Reloading));

        assert_eq!(weapon.update(1.0), None);
        assert_eq!(weapon.update(1.0), Some(WeaponEvent::Reloaded { ammo: 3 }));
        assert!(!weapon.is_reloading());
        assert_eq!(weapon.ammo_display(), "3/3");
    }

    #[test]
    fn test_infinite_magazine() {
        let mut weapon = Weapon::default().with_fire_rate(0.0).with_magazine(0);
        for _ in 0..100 {
            assert!(weapon.try_fire().is_ok());
        }
        assert_eq!(weapon.ammo_display(), "inf");
    }
}
