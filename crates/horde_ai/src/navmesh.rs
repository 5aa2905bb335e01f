//! Grid navigation mesh and the in-memory navigation backend

use crate::navigation::{Navigation, PathQuery};
use horde_core::EntityId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Destinations further than this from the mesh can't be steered to
const DESTINATION_SNAP_RADIUS: f32 = 2.0;

/// Knockback velocity lost per second
const KNOCKBACK_DAMPING: f32 = 6.0;

/// A cell in the navigation grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavCell {
    /// Center point
    pub center: Vec3,
    /// Neighboring cell indices
    pub neighbors: Vec<usize>,
    /// Area cost multiplier (higher = harder to traverse)
    pub cost: f32,
    /// Whether this cell is walkable
    pub walkable: bool,
}

/// Navigation mesh made of square cells on the XZ plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridNavMesh {
    /// Minimum corner of the grid
    origin: Vec3,
    cols: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<NavCell>,
}

impl GridNavMesh {
    /// Create a grid covering `width` x `depth` starting at `origin`
    pub fn create_grid(origin: Vec3, width: f32, depth: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(0.01);
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (depth / cell_size).ceil().max(1.0) as usize;

        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let center = Vec3::new(
                    origin.x + (col as f32 + 0.5) * cell_size,
                    origin.y,
                    origin.z + (row as f32 + 0.5) * cell_size,
                );

                let idx = row * cols + col;
                let mut neighbors = Vec::new();
                if col > 0 {
                    neighbors.push(idx - 1);
                }
                if col + 1 < cols {
                    neighbors.push(idx + 1);
                }
                if row > 0 {
                    neighbors.push(idx - cols);
                }
                if row + 1 < rows {
                    neighbors.push(idx + cols);
                }

                cells.push(NavCell {
                    center,
                    neighbors,
                    cost: 1.0,
                    walkable: true,
                });
            }
        }

        Self {
            origin,
            cols,
            rows,
            cell_size,
            cells,
        }
    }

    /// Create a grid centered on `center`
    pub fn centered(center: Vec3, width: f32, depth: f32, cell_size: f32) -> Self {
        let origin = Vec3::new(center.x - width * 0.5, center.y, center.z - depth * 0.5);
        Self::create_grid(origin, width, depth, cell_size)
    }

    pub fn cells(&self) -> &[NavCell] {
        &self.cells
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Index of the cell containing a point (ignoring height)
    pub fn cell_at(&self, point: Vec3) -> Option<usize> {
        let local_x = (point.x - self.origin.x) / self.cell_size;
        let local_z = (point.z - self.origin.z) / self.cell_size;
        if !(local_x >= 0.0 && local_z >= 0.0) {
            return None;
        }

        let (col, row) = (local_x.floor() as usize, local_z.floor() as usize);
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    /// Cell index from grid coordinates
    pub fn cell_index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    /// Whether a point lies on a walkable cell
    pub fn is_walkable(&self, point: Vec3) -> bool {
        self.cell_at(point)
            .map(|idx| self.cells[idx].walkable)
            .unwrap_or(false)
    }

    /// Mark a cell as walkable or blocked
    pub fn set_walkable(&mut self, cell_idx: usize, walkable: bool) {
        if let Some(cell) = self.cells.get_mut(cell_idx) {
            cell.walkable = walkable;
        }
    }

    /// Set traversal cost for a cell
    pub fn set_cost(&mut self, cell_idx: usize, cost: f32) {
        if let Some(cell) = self.cells.get_mut(cell_idx) {
            cell.cost = cost.max(0.0);
        }
    }

    /// Nearest point on a walkable cell within `radius` of `point`
    pub fn nearest_walkable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if !point.is_finite() || radius < 0.0 {
            return None;
        }

        let to_col = |x: f32| ((x - self.origin.x) / self.cell_size).floor();
        let to_row = |z: f32| ((z - self.origin.z) / self.cell_size).floor();
        let max_col = self.cols as f32 - 1.0;
        let max_row = self.rows as f32 - 1.0;

        let min_col = to_col(point.x - radius).clamp(0.0, max_col) as usize;
        let max_col = to_col(point.x + radius).clamp(0.0, max_col) as usize;
        let min_row = to_row(point.z - radius).clamp(0.0, max_row) as usize;
        let max_row = to_row(point.z + radius).clamp(0.0, max_row) as usize;

        let half = self.cell_size * 0.5;
        let mut best: Option<(f32, Vec3)> = None;

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let cell = &self.cells[row * self.cols + col];
                if !cell.walkable {
                    continue;
                }

                let candidate = Vec3::new(
                    point.x.clamp(cell.center.x - half, cell.center.x + half),
                    self.origin.y,
                    point.z.clamp(cell.center.z - half, cell.center.z + half),
                );
                let distance = point.distance(candidate);
                if distance <= radius && best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, candidate));
                }
            }
        }

        best.map(|(_, p)| p)
    }

    /// Find path between two points using A*
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Option<NavPath> {
        let start_cell = self.cell_at(start).filter(|&i| self.cells[i].walkable)?;
        let end_cell = self.cell_at(end).filter(|&i| self.cells[i].walkable)?;

        let start = Vec3::new(start.x, self.origin.y, start.z);
        let end = Vec3::new(end.x, self.origin.y, end.z);

        if start_cell == end_cell {
            return Some(NavPath::new(vec![start, end]));
        }

        let cell_path = self.astar(start_cell, end_cell)?;

        // Interior cell centers only; the endpoints replace the first and last
        let mut waypoints = vec![start];
        waypoints.extend(
            cell_path[1..cell_path.len() - 1]
                .iter()
                .map(|&idx| self.cells[idx].center),
        );
        waypoints.push(end);

        Some(NavPath::new(waypoints))
    }

    /// A* over the cell graph
    fn astar(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        #[derive(Clone, Copy)]
        struct Node {
            idx: usize,
            f_score: f32,
        }

        impl PartialEq for Node {
            fn eq(&self, other: &Self) -> bool {
                self.idx == other.idx
            }
        }

        impl Eq for Node {}

        impl PartialOrd for Node {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for Node {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                other.f_score.total_cmp(&self.f_score)
            }
        }

        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<usize, usize> = HashMap::new();
        let mut g_score: HashMap<usize, f32> = HashMap::new();
        let mut closed_set: HashSet<usize> = HashSet::new();

        let goal_center = self.cells[goal].center;

        g_score.insert(start, 0.0);
        open_set.push(Node {
            idx: start,
            f_score: self.cells[start].center.distance(goal_center),
        });

        while let Some(current) = open_set.pop() {
            if current.idx == goal {
                let mut path = vec![goal];
                let mut current_idx = goal;
                while let Some(&prev) = came_from.get(&current_idx) {
                    path.push(prev);
                    current_idx = prev;
                }
                path.reverse();
                return Some(path);
            }

            if !closed_set.insert(current.idx) {
                continue;
            }

            let current_g = g_score.get(&current.idx).copied().unwrap_or(f32::MAX);
            let current_cell = &self.cells[current.idx];

            for &neighbor_idx in &current_cell.neighbors {
                let neighbor = &self.cells[neighbor_idx];
                if closed_set.contains(&neighbor_idx) || !neighbor.walkable {
                    continue;
                }

                let step = current_cell.center.distance(neighbor.center);
                let tentative_g = current_g + step * neighbor.cost;

                if tentative_g < g_score.get(&neighbor_idx).copied().unwrap_or(f32::MAX) {
                    came_from.insert(neighbor_idx, current.idx);
                    g_score.insert(neighbor_idx, tentative_g);
                    open_set.push(Node {
                        idx: neighbor_idx,
                        f_score: tentative_g + neighbor.center.distance(goal_center),
                    });
                }
            }
        }

        None
    }
}

/// A path through the navigation mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavPath {
    /// Waypoints along the path
    pub waypoints: Vec<Vec3>,
    /// Current waypoint index
    pub current_index: usize,
}

impl NavPath {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self {
            waypoints,
            current_index: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.waypoints.len()
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.current_index).copied()
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Advance to next waypoint
    pub fn advance(&mut self) {
        if self.current_index < self.waypoints.len() {
            self.current_index += 1;
        }
    }

    /// Distance still to travel from `position`
    pub fn remaining_distance_from(&self, position: Vec3) -> f32 {
        let Some(next) = self.current_waypoint() else {
            return 0.0;
        };

        let rest: f32 = self.waypoints[self.current_index..]
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum();
        position.distance(next) + rest
    }

    /// Get total path length
    pub fn total_length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

#[derive(Debug, Clone)]
struct NavAgent {
    position: Vec3,
    knockback: Vec3,
    speed: f32,
    stopped: bool,
    enabled: bool,
    path: Option<NavPath>,
}

impl NavAgent {
    fn update(&mut self, mesh: &GridNavMesh, delta_time: f32) {
        if !self.enabled {
            return;
        }

        if self.knockback.length_squared() > 1e-6 {
            let pushed = self.position + self.knockback * delta_time;
            if mesh.is_walkable(pushed) {
                self.position = pushed;
            }
            let damping = (1.0 - KNOCKBACK_DAMPING * delta_time).max(0.0);
            self.knockback *= damping;
        } else {
            self.knockback = Vec3::ZERO;
        }

        if self.stopped {
            return;
        }
        let Some(path) = self.path.as_mut() else {
            return;
        };

        let mut budget = self.speed * delta_time;
        while budget > 0.0 {
            let Some(waypoint) = path.current_waypoint() else {
                break;
            };
            let to_waypoint = waypoint - self.position;
            let distance = to_waypoint.length();
            if distance <= budget {
                self.position = waypoint;
                budget -= distance;
                path.advance();
            } else {
                self.position += to_waypoint * (budget / distance);
                budget = 0.0;
            }
        }
    }
}

/// [`Navigation`] over a [`GridNavMesh`], moving agents along their paths
/// on every [`update`](GridNavigation::update).
#[derive(Debug, Clone)]
pub struct GridNavigation {
    mesh: GridNavMesh,
    agents: HashMap<EntityId, NavAgent>,
}

impl GridNavigation {
    pub fn new(mesh: GridNavMesh) -> Self {
        Self {
            mesh,
            agents: HashMap::new(),
        }
    }

    pub fn mesh(&self) -> &GridNavMesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut GridNavMesh {
        &mut self.mesh
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Whether an agent is still being simulated
    pub fn is_enabled(&self, agent: EntityId) -> bool {
        self.agents.get(&agent).map_or(false, |a| a.enabled)
    }

    /// Move every agent along its path
    pub fn update(&mut self, delta_time: f32) {
        for agent in self.agents.values_mut() {
            agent.update(&self.mesh, delta_time);
        }
    }
}

impl Navigation for GridNavigation {
    fn register_agent(&mut self, agent: EntityId, position: Vec3, speed: f32) {
        self.agents.insert(
            agent,
            NavAgent {
                position,
                knockback: Vec3::ZERO,
                speed,
                stopped: false,
                enabled: true,
                path: None,
            },
        );
    }

    fn unregister_agent(&mut self, agent: EntityId) {
        self.agents.remove(&agent);
    }

    fn position(&self, agent: EntityId) -> Option<Vec3> {
        self.agents.get(&agent).map(|a| a.position)
    }

    fn find_walkable_point_near(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        self.mesh.nearest_walkable(center, radius)
    }

    fn compute_path(&self, from: Vec3, to: Vec3) -> PathQuery {
        let Some(to) = self.mesh.nearest_walkable(to, DESTINATION_SNAP_RADIUS) else {
            return PathQuery::INVALID;
        };
        match self.mesh.find_path(from, to) {
            Some(path) => PathQuery {
                valid: true,
                waypoint_count: path.waypoints.len(),
            },
            None => PathQuery::INVALID,
        }
    }

    fn steer_toward(&mut self, agent: EntityId, destination: Vec3) -> bool {
        let Some(nav_agent) = self.agents.get_mut(&agent) else {
            return false;
        };
        if !nav_agent.enabled {
            return false;
        }

        let path = self
            .mesh
            .nearest_walkable(destination, DESTINATION_SNAP_RADIUS)
            .and_then(|to| self.mesh.find_path(nav_agent.position, to));

        match path {
            Some(path) => {
                nav_agent.path = Some(path);
                true
            }
            None => false,
        }
    }

    fn remaining_distance(&self, agent: EntityId) -> f32 {
        self.agents
            .get(&agent)
            .and_then(|a| a.path.as_ref().map(|p| p.remaining_distance_from(a.position)))
            .unwrap_or(0.0)
    }

    fn path_pending(&self, _agent: EntityId) -> bool {
        // Paths are computed synchronously
        false
    }

    fn warp(&mut self, agent: EntityId, point: Vec3) -> bool {
        if !self.mesh.is_walkable(point) {
            return false;
        }
        let Some(nav_agent) = self.agents.get_mut(&agent) else {
            return false;
        };

        nav_agent.position = Vec3::new(point.x, self.mesh.origin.y, point.z);
        nav_agent.path = None;
        nav_agent.knockback = Vec3::ZERO;
        true
    }

    fn set_speed(&mut self, agent: EntityId, speed: f32) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.speed = speed.max(0.0);
        }
    }

    fn set_stopped(&mut self, agent: EntityId, stopped: bool) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.stopped = stopped;
        }
    }

    fn set_velocity(&mut self, agent: EntityId, velocity: Vec3) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.knockback = velocity;
        }
    }

    fn disable(&mut self, agent: EntityId) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.enabled = false;
            a.path = None;
            a.knockback = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(width: f32, depth: f32) -> GridNavMesh {
        GridNavMesh::create_grid(Vec3::ZERO, width, depth, 5.0)
    }

    #[test]
    fn test_nav_mesh_grid() {
        let mesh = grid(10.0, 10.0);
        assert_eq!(mesh.cells().len(), 4);
        assert_eq!(mesh.cell_at(Vec3::new(7.0, 0.0, 2.0)), Some(1));
        assert_eq!(mesh.cell_at(Vec3::new(-1.0, 0.0, 2.0)), None);
        assert_eq!(mesh.cell_at(Vec3::new(10.5, 0.0, 2.0)), None);
    }

    #[test]
    fn test_find_path() {
        let mesh = grid(20.0, 20.0);
        let path = mesh
            .find_path(Vec3::new(2.5, 0.0, 2.5), Vec3::new(17.5, 0.0, 17.5))
            .unwrap();

        assert!(!path.is_empty());
        assert_relative_eq!(path.total_length(), 30.0, epsilon = 1e-4);
    }

    #[test]
    fn test_path_same_cell() {
        let mesh = grid(10.0, 10.0);
        let path = mesh
            .find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 2.0))
            .unwrap();
        assert_eq!(path.waypoints.len(), 2);
    }

    #[test]
    fn test_unwalkable_cell_blocks_corridor() {
        let mut mesh = grid(15.0, 5.0);
        mesh.set_walkable(1, false);

        let path = mesh.find_path(Vec3::new(2.5, 0.0, 2.5), Vec3::new(12.5, 0.0, 2.5));
        assert!(path.is_none());
    }

    #[test]
    fn test_path_routes_around_costly_cell() {
        let mut mesh = grid(15.0, 10.0);
        mesh.set_cost(1, 10.0);

        let path = mesh
            .find_path(Vec3::new(2.5, 0.0, 2.5), Vec3::new(12.5, 0.0, 2.5))
            .unwrap();
        let through_costly = path
            .waypoints
            .iter()
            .any(|p| mesh.cell_at(*p) == Some(1));
        assert!(!through_costly);
    }

    #[test]
    fn test_nearest_walkable() {
        let mut mesh = grid(10.0, 10.0);
        mesh.set_walkable(0, false);

        // Inside a blocked cell: snaps to the closest edge of a walkable one
        let p = mesh.nearest_walkable(Vec3::new(4.0, 0.0, 1.0), 2.0).unwrap();
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.z, 1.0);

        assert!(mesh.nearest_walkable(Vec3::new(1.0, 0.0, 1.0), 0.5).is_none());
        assert!(mesh.nearest_walkable(Vec3::new(30.0, 0.0, 30.0), 5.0).is_none());
    }

    #[test]
    fn test_remaining_distance() {
        let path = NavPath {
            waypoints: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
            ],
            current_index: 1,
        };
        assert_relative_eq!(path.remaining_distance_from(Vec3::new(2.0, 0.0, 0.0)), 8.0);
    }

    #[test]
    fn test_agent_follows_path() {
        let mut nav = GridNavigation::new(grid(20.0, 20.0));
        let id = EntityId::new(0, 0);
        nav.register_agent(id, Vec3::new(2.5, 0.0, 2.5), 5.0);

        assert!(nav.steer_toward(id, Vec3::new(17.5, 1.0, 2.5)));
        assert_relative_eq!(nav.remaining_distance(id), 15.0, epsilon = 1e-4);

        for _ in 0..10 {
            nav.update(0.1);
        }
        assert_relative_eq!(nav.position(id).unwrap().x, 7.5, epsilon = 1e-4);

        for _ in 0..30 {
            nav.update(0.1);
        }
        assert_relative_eq!(nav.position(id).unwrap().x, 17.5, epsilon = 1e-4);
        assert_eq!(nav.remaining_distance(id), 0.0);
    }

    #[test]
    fn test_stopped_agent_keeps_path() {
        let mut nav = GridNavigation::new(grid(20.0, 20.0));
        let id = EntityId::new(0, 0);
        nav.register_agent(id, Vec3::new(2.5, 0.0, 2.5), 5.0);
        nav.steer_toward(id, Vec3::new(17.5, 0.0, 2.5));

        nav.set_stopped(id, true);
        nav.update(1.0);
        assert_eq!(nav.position(id), Some(Vec3::new(2.5, 0.0, 2.5)));

        nav.set_stopped(id, false);
        nav.update(1.0);
        assert_relative_eq!(nav.position(id).unwrap().x, 7.5, epsilon = 1e-4);
    }

    #[test]
    fn test_warp_and_disable() {
        let mut nav = GridNavigation::new(grid(10.0, 10.0));
        let id = EntityId::new(0, 0);
        nav.register_agent(id, Vec3::new(1.0, 0.0, 1.0), 5.0);

        assert!(!nav.warp(id, Vec3::new(50.0, 0.0, 0.0)));
        assert!(nav.warp(id, Vec3::new(8.0, 0.0, 8.0)));
        assert_eq!(nav.position(id), Some(Vec3::new(8.0, 0.0, 8.0)));

        nav.disable(id);
        assert!(!nav.is_enabled(id));
        assert!(!nav.steer_toward(id, Vec3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_knockback_decays() {
        let mut nav = GridNavigation::new(grid(20.0, 20.0));
        let id = EntityId::new(0, 0);
        nav.register_agent(id, Vec3::new(10.0, 0.0, 10.0), 5.0);

        nav.set_velocity(id, Vec3::new(2.0, 0.0, 0.0));
        for _ in 0..60 {
            nav.update(1.0 / 60.0);
        }
        let x = nav.position(id).unwrap().x;
        assert!(x > 10.0 && x < 12.0);
    }
}
