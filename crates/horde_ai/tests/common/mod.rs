//! Shared fixtures for agent integration tests

#![allow(dead_code)]

use horde_ai::prelude::*;
use horde_combat::{DamageInfo, DamageOutcome, Damageable, PlayerHealth};
use horde_core::EntityId;
use horde_math::Vec3;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

pub const DT: f32 = 1.0 / 60.0;

/// Open-field navigation that moves agents in straight lines
#[derive(Default)]
pub struct ScriptedNav {
    pub agents: HashMap<EntityId, ScriptedAgent>,
    /// Agents never move by themselves
    pub frozen: bool,
    /// No walkable ground anywhere
    pub off_mesh: bool,
    /// Paths never finish computing
    pub pending: bool,
    pub warps: Vec<(EntityId, Vec3)>,
    pub paths_computed: Cell<usize>,
}

#[derive(Debug, Clone)]
pub struct ScriptedAgent {
    pub position: Vec3,
    pub destination: Option<Vec3>,
    pub speed: f32,
    pub stopped: bool,
    pub enabled: bool,
}

impl ScriptedNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frozen() -> Self {
        Self {
            frozen: true,
            ..Self::default()
        }
    }

    pub fn place(&mut self, agent: EntityId, position: Vec3) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.position = position;
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.frozen {
            return;
        }
        for agent in self.agents.values_mut() {
            if agent.stopped || !agent.enabled {
                continue;
            }
            let Some(destination) = agent.destination else {
                continue;
            };
            let to = destination - agent.position;
            let step = agent.speed * dt;
            if to.length() <= step {
                agent.position = destination;
            } else {
                agent.position += to.normalize_or_zero() * step;
            }
        }
    }
}

impl Navigation for ScriptedNav {
    fn register_agent(&mut self, agent: EntityId, position: Vec3, speed: f32) {
        self.agents.insert(
            agent,
            ScriptedAgent {
                position,
                destination: None,
                speed,
                stopped: false,
                enabled: true,
            },
        );
    }

    fn unregister_agent(&mut self, agent: EntityId) {
        self.agents.remove(&agent);
    }

    fn position(&self, agent: EntityId) -> Option<Vec3> {
        self.agents.get(&agent).map(|a| a.position)
    }

    fn find_walkable_point_near(&self, center: Vec3, _radius: f32) -> Option<Vec3> {
        (!self.off_mesh).then(|| Vec3::new(center.x, 0.0, center.z))
    }

    fn compute_path(&self, _from: Vec3, _to: Vec3) -> PathQuery {
        self.paths_computed.set(self.paths_computed.get() + 1);
        if self.off_mesh {
            return PathQuery::INVALID;
        }
        PathQuery {
            valid: true,
            waypoint_count: 2,
        }
    }

    fn steer_toward(&mut self, agent: EntityId, destination: Vec3) -> bool {
        match self.agents.get_mut(&agent) {
            Some(a) if a.enabled && !self.off_mesh => {
                a.destination = Some(Vec3::new(destination.x, 0.0, destination.z));
                true
            }
            _ => false,
        }
    }

    fn remaining_distance(&self, agent: EntityId) -> f32 {
        self.agents
            .get(&agent)
            .and_then(|a| a.destination.map(|d| a.position.distance(d)))
            .unwrap_or(0.0)
    }

    fn path_pending(&self, _agent: EntityId) -> bool {
        self.pending
    }

    fn warp(&mut self, agent: EntityId, point: Vec3) -> bool {
        let Some(a) = self.agents.get_mut(&agent) else {
            return false;
        };
        a.position = point;
        a.destination = None;
        self.warps.push((agent, point));
        true
    }

    fn set_speed(&mut self, agent: EntityId, speed: f32) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.speed = speed;
        }
    }

    fn set_stopped(&mut self, agent: EntityId, stopped: bool) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.stopped = stopped;
        }
    }

    fn set_velocity(&mut self, _agent: EntityId, _velocity: Vec3) {}

    fn disable(&mut self, agent: EntityId) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.enabled = false;
            a.destination = None;
        }
    }
}

/// A player standing somewhere, with respawning health
pub struct TestPlayer {
    pub position: Vec3,
    pub health: PlayerHealth,
    pub hits: Vec<DamageInfo>,
}

impl Damageable for TestPlayer {
    fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome {
        self.hits.push(damage.clone());
        self.health.apply_damage(damage)
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

impl Target for TestPlayer {
    fn entity(&self) -> EntityId {
        self.health.entity()
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

pub fn player_at(position: Vec3) -> Arc<RwLock<TestPlayer>> {
    Arc::new(RwLock::new(TestPlayer {
        position,
        health: PlayerHealth::new(EntityId::new(0, 0), 100.0),
        hits: Vec::new(),
    }))
}

pub fn target_of(player: &Arc<RwLock<TestPlayer>>) -> TargetRef {
    let shared: SharedTarget = player.clone();
    TargetRef::new(&shared)
}

/// A roster over scripted navigation, stepped at 60 Hz
pub struct Arena {
    pub roster: AgentRoster,
    pub nav: ScriptedNav,
    pub presentation: RecordingPresentation,
    pub rng: StdRng,
    pub now: f64,
}

impl Arena {
    pub fn new(nav: ScriptedNav) -> Self {
        Self {
            roster: AgentRoster::new(),
            nav,
            presentation: RecordingPresentation::new(),
            rng: StdRng::seed_from_u64(7),
            now: 0.0,
        }
    }

    pub fn spawn(&mut self, config: AgentConfig, position: Vec3, target: TargetRef) -> EntityId {
        self.roster
            .spawn(
                Arc::new(config),
                Arc::new(BehaviorTuning::default()),
                position,
                target,
                &mut self.nav,
                &mut self.presentation,
            )
            .expect("spawn")
    }

    pub fn step(&mut self) -> Vec<EntityId> {
        self.now += f64::from(DT);
        let mut ctx = TickContext::new(
            self.now,
            DT,
            &mut self.nav,
            &mut self.presentation,
            &mut self.rng,
        );
        let removed = self.roster.tick_all(&mut ctx);
        self.nav.update(DT);
        removed
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until `done` holds, giving up after `max_ticks`
    pub fn run_until(&mut self, max_ticks: usize, mut done: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..max_ticks {
            if done(self) {
                return true;
            }
            self.step();
        }
        done(self)
    }

    pub fn state(&self, agent: EntityId) -> Option<AgentState> {
        self.roster.get(agent).map(Agent::state)
    }
}

pub fn grunt() -> AgentConfig {
    AgentConfig::new("Grunt").with_prefab("grunt").with_patrol(false)
}
