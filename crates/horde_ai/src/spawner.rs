//! Wave spawner
//!
//! Spawns waves of agents around an anchor. A wave picks a random size,
//! spawns one agent per `spawn_interval`, and once every agent it spawned
//! has left the roster, the next wave starts `time_between_waves` after the
//! previous one finished spawning.

use crate::config::{AgentConfig, BehaviorTuning};
use crate::navigation::{random_in_unit_disc, Navigation};
use crate::presentation::Presentation;
use crate::roster::AgentRoster;
use crate::target::TargetRef;
use horde_core::EntityId;
use horde_math::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Wave timing and size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    pub min_enemies_per_wave: u32,
    pub max_enemies_per_wave: u32,
    /// Seconds between spawns within a wave
    pub spawn_interval: f32,
    /// Seconds from one wave finishing to the next starting
    pub time_between_waves: f32,
    /// Spawn disc radius around the anchor
    pub spawn_radius: f32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            min_enemies_per_wave: 3,
            max_enemies_per_wave: 8,
            spawn_interval: 2.0,
            time_between_waves: 20.0,
            spawn_radius: 5.0,
        }
    }
}

/// Wave lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum WaveEvent {
    Started { wave: u32, size: u32 },
    Spawned { wave: u32, agent: EntityId },
    /// Every unit of the wave has been spawned (or skipped)
    Completed { wave: u32, spawned: u32 },
    /// A live agent left the roster
    EnemyRemoved { agent: EntityId, remaining: u32 },
}

/// A wave being spawned
#[derive(Debug, Clone, Copy)]
struct SpawnSchedule {
    size: u32,
    attempted: u32,
    spawned: u32,
    next_spawn_time: f64,
}

/// Spawns and tracks waves of agents
#[derive(Debug)]
pub struct WaveSpawner {
    settings: WaveSettings,
    anchor: Vec3,
    configs: Vec<Arc<AgentConfig>>,
    tuning: Arc<BehaviorTuning>,
    target: TargetRef,
    /// Agents spawned by this spawner still in the roster
    live: Vec<EntityId>,
    enemies_remaining: u32,
    current_wave: u32,
    /// `None` until the first wave, which starts immediately
    next_wave_time: Option<f64>,
    schedule: Option<SpawnSchedule>,
}

impl WaveSpawner {
    pub fn new(settings: WaveSettings, anchor: Vec3) -> Self {
        Self {
            settings,
            anchor,
            configs: Vec::new(),
            tuning: Arc::new(BehaviorTuning::default()),
            target: TargetRef::none(),
            live: Vec::new(),
            enemies_remaining: 0,
            current_wave: 0,
            next_wave_time: None,
            schedule: None,
        }
    }

    /// Register a config units may be drawn from
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.configs.push(Arc::new(config));
        self
    }

    pub fn with_configs(mut self, configs: impl IntoIterator<Item = AgentConfig>) -> Self {
        self.configs.extend(configs.into_iter().map(Arc::new));
        self
    }

    pub fn with_tuning(mut self, tuning: BehaviorTuning) -> Self {
        self.tuning = Arc::new(tuning);
        self
    }

    /// Target handed to every spawned agent
    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = target;
        self
    }

    pub fn settings(&self) -> &WaveSettings {
        &self.settings
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn enemies_remaining(&self) -> u32 {
        self.enemies_remaining
    }

    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    pub fn is_spawning(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn next_wave_time(&self) -> Option<f64> {
        self.next_wave_time
    }

    pub fn live_agents(&self) -> &[EntityId] {
        &self.live
    }

    /// Advance waves to game time `now`
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        roster: &mut AgentRoster,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
        rng: &mut R,
    ) -> Vec<WaveEvent> {
        let mut events = Vec::new();
        self.prune(roster, &mut events);

        let wave_due = self.next_wave_time.map_or(true, |time| now >= time);
        if self.schedule.is_none() && self.enemies_remaining == 0 && wave_due {
            self.start_wave(now, rng, &mut events);
        }

        self.advance_schedule(now, roster, nav, presentation, rng, &mut events);
        events
    }

    fn prune(&mut self, roster: &AgentRoster, events: &mut Vec<WaveEvent>) {
        let enemies_remaining = &mut self.enemies_remaining;
        self.live.retain(|&agent| {
            if roster.contains(agent) {
                return true;
            }
            *enemies_remaining = enemies_remaining.saturating_sub(1);
            log::info!("Enemy {} removed, {} remaining", agent, enemies_remaining);
            events.push(WaveEvent::EnemyRemoved {
                agent,
                remaining: *enemies_remaining,
            });
            false
        });
    }

    fn start_wave<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R, events: &mut Vec<WaveEvent>) {
        let min = self.settings.min_enemies_per_wave;
        let max = self.settings.max_enemies_per_wave.max(min);
        let size = rng.gen_range(min..=max);

        self.current_wave += 1;
        self.schedule = Some(SpawnSchedule {
            size,
            attempted: 0,
            spawned: 0,
            next_spawn_time: now,
        });

        log::info!("Starting wave {} with {} enemies", self.current_wave, size);
        events.push(WaveEvent::Started {
            wave: self.current_wave,
            size,
        });
    }

    fn advance_schedule<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        roster: &mut AgentRoster,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
        rng: &mut R,
        events: &mut Vec<WaveEvent>,
    ) {
        let Some(mut schedule) = self.schedule else {
            return;
        };
        let interval = f64::from(self.settings.spawn_interval.max(0.0));

        while now >= schedule.next_spawn_time {
            if schedule.attempted == schedule.size {
                log::info!(
                    "Wave {} complete: {} of {} spawned",
                    self.current_wave,
                    schedule.spawned,
                    schedule.size
                );
                events.push(WaveEvent::Completed {
                    wave: self.current_wave,
                    spawned: schedule.spawned,
                });
                self.schedule = None;
                self.next_wave_time =
                    Some(now + f64::from(self.settings.time_between_waves));
                return;
            }

            schedule.attempted += 1;
            if let Some(agent) = self.spawn_one(schedule.attempted, roster, nav, presentation, rng) {
                schedule.spawned += 1;
                events.push(WaveEvent::Spawned {
                    wave: self.current_wave,
                    agent,
                });
            }
            schedule.next_spawn_time += interval;
        }

        self.schedule = Some(schedule);
    }

    fn spawn_one<R: Rng + ?Sized>(
        &mut self,
        index: u32,
        roster: &mut AgentRoster,
        nav: &mut dyn Navigation,
        presentation: &mut dyn Presentation,
        rng: &mut R,
    ) -> Option<EntityId> {
        let Some(config) = self.configs.choose(rng).cloned() else {
            log::warn!("No enemy configs registered, skipping spawn");
            return None;
        };
        if config.prefab.is_none() {
            log::warn!("Enemy config '{}' has no prefab, skipping spawn", config.name);
            return None;
        }

        let radius = self.settings.spawn_radius;
        let raw = self.anchor + random_in_unit_disc(rng) * radius;
        let position = nav.find_walkable_point_near(raw, radius).unwrap_or_else(|| {
            log::warn!("No walkable point near {:?}, spawning there anyway", raw);
            raw
        });

        let spawned = roster.spawn(
            config.clone(),
            self.tuning.clone(),
            position,
            self.target.clone(),
            nav,
            presentation,
        );
        match spawned {
            Ok(agent) => {
                let name = format!("{}_{}_{}", config.name, self.current_wave, index);
                if let Some(a) = roster.get_mut(agent) {
                    a.set_name(name.clone());
                }
                self.live.push(agent);
                self.enemies_remaining += 1;
                log::info!("Spawned {} at {:?}", name, position);
                Some(agent)
            }
            Err(err) => {
                log::warn!("Failed to spawn '{}': {}", config.name, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navmesh::{GridNavMesh, GridNavigation};
    use crate::presentation::RecordingPresentation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct World {
        spawner: WaveSpawner,
        roster: AgentRoster,
        nav: GridNavigation,
        presentation: RecordingPresentation,
        rng: StdRng,
    }

    impl World {
        fn new(spawner: WaveSpawner) -> Self {
            Self {
                spawner,
                roster: AgentRoster::new(),
                nav: GridNavigation::new(GridNavMesh::centered(Vec3::ZERO, 40.0, 40.0, 1.0)),
                presentation: RecordingPresentation::new(),
                rng: StdRng::seed_from_u64(11),
            }
        }

        fn tick(&mut self, now: f64) -> Vec<WaveEvent> {
            self.spawner.tick(
                now,
                &mut self.roster,
                &mut self.nav,
                &mut self.presentation,
                &mut self.rng,
            )
        }
    }

    fn fixed(size: u32) -> WaveSettings {
        WaveSettings {
            min_enemies_per_wave: size,
            max_enemies_per_wave: size,
            ..WaveSettings::default()
        }
    }

    fn grunt() -> AgentConfig {
        AgentConfig::new("Grunt").with_prefab("grunt")
    }

    #[test]
    fn test_first_wave_starts_immediately() {
        let mut world = World::new(WaveSpawner::new(fixed(3), Vec3::ZERO).with_config(grunt()));

        let events = world.tick(0.0);
        assert_eq!(events[0], WaveEvent::Started { wave: 1, size: 3 });
        assert!(matches!(events[1], WaveEvent::Spawned { wave: 1, .. }));
        assert_eq!(world.roster.len(), 1);
    }

    #[test]
    fn test_spawns_are_spaced_by_interval() {
        let mut world = World::new(WaveSpawner::new(fixed(3), Vec3::ZERO).with_config(grunt()));

        world.tick(0.0);
        world.tick(1.9);
        assert_eq!(world.roster.len(), 1);
        world.tick(2.0);
        assert_eq!(world.roster.len(), 2);
        world.tick(4.0);
        assert_eq!(world.roster.len(), 3);
        assert!(world.spawner.is_spawning());

        let events = world.tick(6.0);
        assert_eq!(events, vec![WaveEvent::Completed { wave: 1, spawned: 3 }]);
        assert_eq!(world.spawner.next_wave_time(), Some(26.0));
        assert_eq!(world.spawner.enemies_remaining(), 3);
    }

    #[test]
    fn test_spawn_positions_stay_in_radius() {
        let anchor = Vec3::new(3.0, 0.0, -2.0);
        let mut world = World::new(WaveSpawner::new(fixed(5), anchor).with_config(grunt()));
        for step in 0..5 {
            world.tick(f64::from(step) * 2.0);
        }

        assert_eq!(world.roster.len(), 5);
        for agent in world.roster.iter() {
            // Snapping may move a point by up to half a cell diagonal
            assert!(agent.position().horizontal().distance(anchor) <= 5.0 + 0.75);
        }
    }

    #[test]
    fn test_agents_are_named_by_wave() {
        let mut world = World::new(WaveSpawner::new(fixed(1), Vec3::ZERO).with_config(grunt()));
        world.tick(0.0);

        let agent = world.roster.iter().next().unwrap();
        assert_eq!(agent.name(), "Grunt_1_1");
    }

    #[test]
    fn test_no_configs_skips_units() {
        let mut world = World::new(WaveSpawner::new(fixed(2), Vec3::ZERO));

        world.tick(0.0);
        world.tick(2.0);
        let events = world.tick(4.0);

        assert!(world.roster.is_empty());
        assert_eq!(world.spawner.enemies_remaining(), 0);
        assert_eq!(events, vec![WaveEvent::Completed { wave: 1, spawned: 0 }]);
    }

    #[test]
    fn test_config_without_prefab_is_skipped() {
        let mut world = World::new(
            WaveSpawner::new(fixed(1), Vec3::ZERO).with_config(AgentConfig::new("Ghost")),
        );
        world.tick(0.0);

        assert!(world.roster.is_empty());
        assert_eq!(world.spawner.enemies_remaining(), 0);
    }

    #[test]
    fn test_wave_size_within_bounds() {
        let settings = WaveSettings {
            min_enemies_per_wave: 2,
            max_enemies_per_wave: 4,
            ..WaveSettings::default()
        };
        let mut world = World::new(WaveSpawner::new(settings, Vec3::ZERO).with_config(grunt()));

        let events = world.tick(0.0);
        let WaveEvent::Started { size, .. } = events[0] else {
            panic!("expected a wave start, got {:?}", events[0]);
        };
        assert!((2..=4).contains(&size));
    }
}
