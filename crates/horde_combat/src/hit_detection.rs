//! Hitscan hit detection
//!
//! The physics world is not part of this crate. Hosts implement
//! [`Raycaster`] over their collision data and [`DamageSink`] over whatever
//! owns the damageable entities; [`HitScanner`] ties the two together.

use crate::damage::{DamageInfo, DamageOutcome};
use horde_core::EntityId;
use horde_math::{radians, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Offset applied along the surface normal so effects don't z-fight
const EFFECT_SURFACE_OFFSET: f32 = 0.01;

/// Bitmask of hittable layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    /// Player layer
    pub const PLAYER: Self = Self(1 << 1);
    /// Enemy layer
    pub const ENEMIES: Self = Self(1 << 2);
    /// Static environment layer
    pub const ENVIRONMENT: Self = Self(1 << 5);
    pub const ALL: Self = Self(u32::MAX);

    /// Combine two masks
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether any bit of `other` is in this mask
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ENEMIES.with(Self::ENVIRONMENT)
    }
}

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
    /// Entity owning the collider, if any
    pub target: Option<EntityId>,
}

/// Physics raycasting capability
pub trait Raycaster {
    /// Nearest hit along the ray within `max_distance` on the given layers
    fn raycast_nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit>;
}

/// Resolves an entity to something damageable and applies damage to it
pub trait DamageSink {
    /// `None` when the entity is not damageable (or no longer exists)
    fn deliver(&mut self, target: EntityId, damage: &DamageInfo) -> Option<DamageOutcome>;
}

/// Hitscan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitScanSettings {
    /// Maximum ray length
    pub max_distance: f32,
    /// Layers the ray can hit
    pub hit_layers: LayerMask,
    /// Effect spawned when a damageable target is hit
    pub enemy_hit_effect: Option<String>,
    /// Effect spawned on walls and props
    pub environment_hit_effect: Option<String>,
    /// Lifetime of impact effects in seconds
    pub impact_effect_duration: f32,
}

impl Default for HitScanSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            hit_layers: LayerMask::default(),
            enemy_hit_effect: None,
            environment_hit_effect: None,
            impact_effect_duration: 2.0,
        }
    }
}

/// What a shot hit
#[derive(Debug, Clone, PartialEq)]
pub enum Impact {
    /// A damageable entity
    Target {
        target: EntityId,
        point: Vec3,
        normal: Vec3,
        outcome: DamageOutcome,
    },
    /// Anything else
    Environment { point: Vec3, normal: Vec3 },
}

impl Impact {
    pub fn point(&self) -> Vec3 {
        match self {
            Impact::Target { point, .. } | Impact::Environment { point, .. } => *point,
        }
    }

    pub fn normal(&self) -> Vec3 {
        match self {
            Impact::Target { normal, .. } | Impact::Environment { normal, .. } => *normal,
        }
    }
}

/// An effect the host should spawn at an impact
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactEffect {
    pub prefab: String,
    pub position: Vec3,
    pub normal: Vec3,
    pub duration: f32,
}

/// Outcome of a single hitscan shot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotReport {
    /// Direction the ray was actually cast in
    pub direction: Vec3,
    pub impact: Option<Impact>,
    pub effect: Option<ImpactEffect>,
}

impl ShotReport {
    /// Whether the shot damaged something
    pub fn hit_target(&self) -> bool {
        matches!(self.impact, Some(Impact::Target { .. }))
    }
}

/// Casts hitscan rays and applies damage to whatever they hit
#[derive(Debug, Clone, Default)]
pub struct HitScanner {
    settings: HitScanSettings,
}

impl HitScanner {
    pub fn new(settings: HitScanSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &HitScanSettings {
        &self.settings
    }

    /// Fire a single ray straight along `direction`
    pub fn fire(
        &self,
        raycaster: &dyn Raycaster,
        sink: &mut dyn DamageSink,
        origin: Vec3,
        direction: Vec3,
        damage: DamageInfo,
    ) -> ShotReport {
        let direction = direction.normalize_or_zero();
        let mut report = ShotReport {
            direction,
            ..Default::default()
        };

        let Some(hit) = raycaster.raycast_nearest(
            origin,
            direction,
            self.settings.max_distance,
            self.settings.hit_layers,
        ) else {
            return report;
        };

        let delivered = hit.target.and_then(|target| {
            let damage = damage.clone().with_hit_point(hit.point);
            sink.deliver(target, &damage).map(|outcome| (target, outcome))
        });

        let (impact, prefab) = match delivered {
            Some((target, outcome)) => {
                log::debug!(
                    "Hitscan hit {} at {:.1}m for {:.1}",
                    target,
                    hit.distance,
                    outcome.dealt
                );
                (
                    Impact::Target {
                        target,
                        point: hit.point,
                        normal: hit.normal,
                        outcome,
                    },
                    self.settings.enemy_hit_effect.as_ref(),
                )
            }
            None => (
                Impact::Environment {
                    point: hit.point,
                    normal: hit.normal,
                },
                self.settings.environment_hit_effect.as_ref(),
            ),
        };

        report.effect = prefab.map(|prefab| ImpactEffect {
            prefab: prefab.clone(),
            position: hit.point + hit.normal * EFFECT_SURFACE_OFFSET,
            normal: hit.normal,
            duration: self.settings.impact_effect_duration,
        });
        report.impact = Some(impact);
        report
    }

    /// Fire with a random pitch and yaw offset of up to `spread_degrees`
    #[allow(clippy::too_many_arguments)]
    pub fn fire_with_spread<R: Rng + ?Sized>(
        &self,
        raycaster: &dyn Raycaster,
        sink: &mut dyn DamageSink,
        origin: Vec3,
        direction: Vec3,
        damage: DamageInfo,
        spread_degrees: f32,
        rng: &mut R,
    ) -> ShotReport {
        let spread = radians(spread_degrees.abs());
        let direction = if spread > 0.0 && spread.is_finite() {
            let pitch = rng.gen_range(-spread..=spread);
            let yaw = rng.gen_range(-spread..=spread);
            direction.normalize_or_zero().rotate_pitch(pitch).rotate_y(yaw)
        } else {
            direction
        };

        self.fire(raycaster, sink, origin, direction, damage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    /// A wall at z = 10 with one target standing in front of it at z = 5
    struct Range {
        target: EntityId,
    }

    impl Raycaster for Range {
        fn raycast_nearest(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            mask: LayerMask,
        ) -> Option<RaycastHit> {
            if direction.z <= 0.0 {
                return None;
            }
            let on_target = direction.x.abs() < 0.05 && direction.y.abs() < 0.05;
            if on_target && mask.intersects(LayerMask::ENEMIES) {
                let distance = 5.0 - origin.z;
                return (distance <= max_distance).then(|| RaycastHit {
                    point: Vec3::new(0.0, 0.0, 5.0),
                    normal: -Vec3::Z,
                    distance,
                    target: Some(self.target),
                });
            }
            let distance = (10.0 - origin.z) / direction.z;
            (distance <= max_distance && mask.intersects(LayerMask::ENVIRONMENT)).then(|| {
                RaycastHit {
                    point: origin + direction * distance,
                    normal: -Vec3::Z,
                    distance,
                    target: None,
                }
            })
        }
    }

    #[derive(Default)]
    struct Sink {
        received: HashMap<EntityId, f32>,
    }

    impl DamageSink for Sink {
        fn deliver(&mut self, target: EntityId, damage: &DamageInfo) -> Option<DamageOutcome> {
            *self.received.entry(target).or_default() += damage.amount;
            Some(DamageOutcome {
                dealt: damage.amount,
                died: false,
            })
        }
    }

    fn scanner() -> HitScanner {
        HitScanner::new(HitScanSettings {
            enemy_hit_effect: Some("Blood".into()),
            environment_hit_effect: Some("Sparks".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_hit_target_applies_damage() {
        let target = EntityId::new(3, 0);
        let range = Range { target };
        let mut sink = Sink::default();

        let report = scanner().fire(&range, &mut sink, Vec3::ZERO, Vec3::Z, DamageInfo::new(10.0));

        assert!(report.hit_target());
        assert_eq!(sink.received.get(&target), Some(&10.0));

        let effect = report.effect.unwrap();
        assert_eq!(effect.prefab, "Blood");
        assert_relative_eq!(effect.position.z, 4.99, epsilon = 1e-5);
        assert_eq!(effect.duration, 2.0);
    }

    #[test]
    fn test_environment_hit() {
        let range = Range {
            target: EntityId::new(3, 0),
        };
        let mut sink = Sink::default();
        let direction = Vec3::new(1.0, 0.0, 1.0);

        let report = scanner().fire(&range, &mut sink, Vec3::ZERO, direction, DamageInfo::new(10.0));

        assert!(matches!(report.impact, Some(Impact::Environment { .. })));
        assert_eq!(report.effect.unwrap().prefab, "Sparks");
        assert!(sink.received.is_empty());
    }

    #[test]
    fn test_miss_beyond_range() {
        let range = Range {
            target: EntityId::new(3, 0),
        };
        let mut sink = Sink::default();
        let scanner = HitScanner::new(HitScanSettings {
            max_distance: 3.0,
            ..Default::default()
        });

        let report = scanner.fire(&range, &mut sink, Vec3::ZERO, Vec3::Z, DamageInfo::new(1.0));
        assert!(report.impact.is_none());
        assert!(report.effect.is_none());
    }

    #[test]
    fn test_spread_stays_within_cone() {
        let range = Range {
            target: EntityId::new(3, 0),
        };
        let mut sink = Sink::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let report = scanner().fire_with_spread(
                &range,
                &mut sink,
                Vec3::ZERO,
                Vec3::Z,
                DamageInfo::new(1.0),
                10.0,
                &mut rng,
            );
            // Pitch and yaw each stay within 10 degrees
            assert!(report.direction.z > radians(15.0).cos());
        }
    }

    #[test]
    fn test_layer_mask() {
        let mask = LayerMask::PLAYER.with(LayerMask::ENVIRONMENT);
        assert!(mask.intersects(LayerMask::PLAYER));
        assert!(!mask.intersects(LayerMask::ENEMIES));
    }
}
