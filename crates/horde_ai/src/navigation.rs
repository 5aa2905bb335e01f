//! Navigation capability
//!
//! Agents never move themselves. They ask a [`Navigation`] implementation
//! for walkable points and paths and steer through it; the host engine's
//! navmesh agent does the actual movement. [`GridNavigation`](crate::navmesh::GridNavigation)
//! is the in-memory implementation used by tests and the simulator.

use horde_core::EntityId;
use horde_math::Vec3;
use rand::Rng;

/// Result of a path computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathQuery {
    /// Whether a complete path exists
    pub valid: bool,
    /// Corners along the path
    pub waypoint_count: usize,
}

impl PathQuery {
    pub const INVALID: Self = Self {
        valid: false,
        waypoint_count: 0,
    };
}

/// Navmesh queries and per-agent steering
pub trait Navigation {
    /// Start tracking an agent at `position`
    fn register_agent(&mut self, agent: EntityId, position: Vec3, speed: f32);

    /// Stop tracking an agent
    fn unregister_agent(&mut self, agent: EntityId);

    /// Current position of an agent
    fn position(&self, agent: EntityId) -> Option<Vec3>;

    /// Nearest walkable point within `radius` of `center`
    fn find_walkable_point_near(&self, center: Vec3, radius: f32) -> Option<Vec3>;

    /// Compute (but don't follow) a path
    fn compute_path(&self, from: Vec3, to: Vec3) -> PathQuery;

    /// Set the agent's destination. Returns false when it can't be steered there.
    fn steer_toward(&mut self, agent: EntityId, destination: Vec3) -> bool;

    /// Distance left along the current path
    fn remaining_distance(&self, agent: EntityId) -> f32;

    /// Whether a path request is still being computed
    fn path_pending(&self, agent: EntityId) -> bool;

    /// Teleport onto the mesh. Returns false when the point isn't walkable.
    fn warp(&mut self, agent: EntityId, point: Vec3) -> bool;

    fn set_speed(&mut self, agent: EntityId, speed: f32);

    /// Pause or resume path following, keeping the path
    fn set_stopped(&mut self, agent: EntityId, stopped: bool);

    /// Override the agent's velocity (knockback)
    fn set_velocity(&mut self, agent: EntityId, velocity: Vec3);

    /// Stop simulating the agent entirely
    fn disable(&mut self, agent: EntityId);
}

/// Sample up to `attempts` random points inside a sphere of `radius` around
/// `center` and return the first one that snaps to the mesh.
pub fn random_walkable_point<R: Rng + ?Sized>(
    nav: &dyn Navigation,
    center: Vec3,
    radius: f32,
    attempts: u32,
    rng: &mut R,
) -> Option<Vec3> {
    (0..attempts).find_map(|_| {
        let candidate = center + random_in_unit_sphere(rng) * radius;
        nav.find_walkable_point_near(candidate, radius)
    })
}

/// Uniform point inside the unit sphere
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// Uniform point inside the unit disc on the XZ plane
pub fn random_in_unit_disc<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let angle = rng.gen_range(0.0..horde_math::consts::TAU);
    let r = rng.gen_range(0.0f32..=1.0).sqrt();
    Vec3::new(r * angle.cos(), 0.0, r * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_points_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert!(random_in_unit_sphere(&mut rng).length() <= 1.0);
            let disc = random_in_unit_disc(&mut rng);
            assert_eq!(disc.y, 0.0);
            assert!(disc.length() <= 1.0 + 1e-6);
        }
    }
}
