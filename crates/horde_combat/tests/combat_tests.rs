//! Weapon, hitscan and player health working together

use horde_combat::*;
use horde_core::EntityId;
use horde_math::{ray_sphere_with_normal, Ray, Vec3};
use std::collections::HashMap;

/// Players are spheres of radius 0.5
#[derive(Default)]
struct Geometry {
    spheres: Vec<(EntityId, Vec3)>,
}

impl Raycaster for Geometry {
    fn raycast_nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        if !mask.intersects(LayerMask::PLAYER) {
            return None;
        }
        let ray = Ray::new(origin, direction);
        self.spheres
            .iter()
            .filter_map(|(id, center)| {
                let (distance, normal) = ray_sphere_with_normal(&ray, *center, 0.5)?;
                (distance <= max_distance).then(|| RaycastHit {
                    point: ray.at(distance),
                    normal,
                    distance,
                    target: Some(*id),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[derive(Default)]
struct Players {
    health: HashMap<EntityId, PlayerHealth>,
}

impl DamageSink for Players {
    fn deliver(&mut self, target: EntityId, damage: &DamageInfo) -> Option<DamageOutcome> {
        let health = self.health.get_mut(&target)?;
        Some(health.apply_damage(damage))
    }
}

fn arena(players: &[(EntityId, Vec3, f32)]) -> (Geometry, Players) {
    let mut geometry = Geometry::default();
    let mut roster = Players::default();
    for &(id, position, max_health) in players {
        geometry.spheres.push((id, position));
        roster.health.insert(id, PlayerHealth::new(id, max_health));
    }
    (geometry, roster)
}

fn scanner() -> HitScanner {
    HitScanner::new(HitScanSettings {
        hit_layers: LayerMask::PLAYER,
        ..Default::default()
    })
}

#[test]
fn test_nearest_player_takes_the_hit() {
    let near = EntityId::new(1, 0);
    let far = EntityId::new(2, 0);
    let (geometry, mut players) = arena(&[
        (near, Vec3::new(0.0, 0.0, 5.0), 100.0),
        (far, Vec3::new(0.0, 0.0, 9.0), 100.0),
    ]);

    let mut weapon = Weapon::default().with_damage(25.0);
    let shot = weapon.try_fire().unwrap();
    let report = scanner().fire(
        &geometry,
        &mut players,
        Vec3::ZERO,
        Vec3::Z,
        DamageInfo::new(shot.damage),
    );

    assert!(report.hit_target());
    assert_eq!(players.health[&near].health().current(), 75.0);
    assert_eq!(players.health[&far].health().current(), 100.0);
}

#[test]
fn test_non_damageable_hit_counts_as_environment() {
    let ghost = EntityId::new(4, 0);
    let geometry = Geometry {
        spheres: vec![(ghost, Vec3::new(0.0, 0.0, 5.0))],
    };
    let mut players = Players::default();

    let report = scanner().fire(
        &geometry,
        &mut players,
        Vec3::ZERO,
        Vec3::Z,
        DamageInfo::new(10.0),
    );

    assert!(matches!(report.impact, Some(Impact::Environment { .. })));
}

#[test]
fn test_shooting_until_death_and_respawn() {
    let player = EntityId::new(1, 0);
    let shooter = EntityId::new(9, 0);
    let (geometry, mut players) = arena(&[(player, Vec3::new(0.0, 0.0, 5.0), 30.0)]);

    let mut weapon = Weapon::default().with_damage(10.0).with_fire_rate(0.0);
    let mut deaths = 0;
    for _ in 0..5 {
        let shot = weapon.try_fire().unwrap();
        let report = scanner().fire(
            &geometry,
            &mut players,
            Vec3::ZERO,
            Vec3::Z,
            DamageInfo::new(shot.damage).with_source(shooter),
        );
        if let Some(Impact::Target { outcome, .. }) = report.impact {
            if outcome.died {
                deaths += 1;
            }
        }
    }

    // Three shots kill, the rest hit a corpse
    assert_eq!(deaths, 1);

    let health = players.health.get_mut(&player).unwrap();
    assert_eq!(health.health().current(), 0.0);

    let events = health.update(3.0);
    assert!(events.contains(&HealthEvent::Death {
        entity: player,
        killer: Some(shooter),
    }));
    assert!(events
        .iter()
        .any(|e| matches!(e, HealthEvent::Respawned { .. })));
    assert_eq!(health.health().current(), 30.0);
}
