//! The simulated world
//!
//! Wires a scenario's spawner, agents, player and weapon together over the
//! grid navmesh and steps them with a game clock.

use crate::scenario::{Result, Scenario, ScenarioError};
use horde_ai::prelude::*;
use horde_combat::{
    DamageInfo, DamageOutcome, Damageable, HealthEvent, HitScanner, Impact, LayerMask,
    PlayerHealth, RaycastHit, Raycaster, Weapon, WeaponError, WeaponEvent,
};
use horde_core::{BulletTime, BulletTimeEvent, EntityId, FrameTime, GameClock};
use horde_math::{ray_plane, ray_sphere_with_normal, Ray, Vec3};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Height of an agent's torso above its feet
const AGENT_CHEST_HEIGHT: f32 = 1.0;
/// Collision sphere radius around an agent's torso
const AGENT_RADIUS: f32 = 0.5;
/// Height the player aims and is aimed at from
const PLAYER_EYE_HEIGHT: f32 = 1.0;

/// The player the agents hunt
#[derive(Debug)]
pub struct Player {
    pub position: Vec3,
    pub health: PlayerHealth,
}

impl Damageable for Player {
    fn apply_damage(&mut self, damage: &DamageInfo) -> DamageOutcome {
        self.health.apply_damage(damage)
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

impl Target for Player {
    fn entity(&self) -> EntityId {
        self.health.entity()
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn aim_point(&self) -> Vec3 {
        self.position + Vec3::UP * PLAYER_EYE_HEIGHT
    }
}

/// Torso spheres of living agents plus the ground plane, snapshotted per shot
struct Colliders {
    agents: Vec<(EntityId, Vec3)>,
}

impl Colliders {
    fn snapshot(roster: &AgentRoster) -> Self {
        let agents = roster
            .iter()
            .filter(|agent| agent.is_alive())
            .map(|agent| (agent.id(), agent.position() + Vec3::UP * AGENT_CHEST_HEIGHT))
            .collect();
        Self { agents }
    }
}

impl Raycaster for Colliders {
    fn raycast_nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(origin, direction);
        let mut nearest: Option<RaycastHit> = None;
        let mut consider = |hit: RaycastHit| {
            if hit.distance <= max_distance && nearest.map_or(true, |n| hit.distance < n.distance) {
                nearest = Some(hit);
            }
        };

        if mask.intersects(LayerMask::ENEMIES) {
            for &(id, center) in &self.agents {
                if let Some((distance, normal)) = ray_sphere_with_normal(&ray, center, AGENT_RADIUS) {
                    consider(RaycastHit {
                        point: ray.at(distance),
                        normal,
                        distance,
                        target: Some(id),
                    });
                }
            }
        }
        if mask.intersects(LayerMask::ENVIRONMENT) {
            if let Some(distance) = ray_plane(&ray, Vec3::ZERO, Vec3::UP) {
                consider(RaycastHit {
                    point: ray.at(distance),
                    normal: Vec3::UP,
                    distance,
                    target: None,
                });
            }
        }

        nearest
    }
}

/// Presentation backend that logs what a renderer would show
#[derive(Debug, Default)]
pub struct LogPresentation {
    prefabs: HashMap<EntityId, String>,
    pub effects_spawned: u64,
    pub sounds_played: u64,
}

impl LogPresentation {
    fn label(&self, agent: EntityId) -> String {
        match self.prefabs.get(&agent) {
            Some(prefab) => format!("{}#{}", prefab, agent),
            None => agent.to_string(),
        }
    }
}

impl Presentation for LogPresentation {
    fn spawn_agent(&mut self, agent: EntityId, prefab: &str, position: Vec3) -> PresentationResult {
        log::debug!("spawn {} as {} at {:?}", agent, prefab, position);
        self.prefabs.insert(agent, prefab.to_string());
        Ok(())
    }

    fn despawn_agent(&mut self, agent: EntityId) -> PresentationResult {
        let prefab = self
            .prefabs
            .remove(&agent)
            .ok_or(PresentationError::UnknownEntity(agent))?;
        log::debug!("despawn {}#{}", prefab, agent);
        Ok(())
    }

    fn play_animation_trigger(&mut self, agent: EntityId, trigger: &str) -> PresentationResult {
        log::trace!("{} animation {}", self.label(agent), trigger);
        Ok(())
    }

    fn set_locomotion(&mut self, agent: EntityId, walking: bool, running: bool) -> PresentationResult {
        log::trace!("{} walking={} running={}", self.label(agent), walking, running);
        Ok(())
    }

    fn play_sound(&mut self, agent: EntityId, clip: &SoundClip) -> PresentationResult {
        self.sounds_played += 1;
        log::trace!("{} sound {}", self.label(agent), clip.as_str());
        Ok(())
    }

    fn spawn_effect(&mut self, prefab: &EffectPrefab, position: Vec3, duration: f32) -> PresentationResult {
        self.effects_spawned += 1;
        log::trace!("effect {} at {:?} for {}s", prefab.as_str(), position, duration);
        Ok(())
    }

    fn disable_physics(&mut self, agent: EntityId) -> PresentationResult {
        log::trace!("{} physics off", self.label(agent));
        Ok(())
    }

    fn face(&mut self, agent: EntityId, yaw: f32) -> PresentationResult {
        log::trace!("{} faces {:.0} deg", self.label(agent), horde_math::degrees(yaw));
        Ok(())
    }
}

/// Running totals for a simulation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimSummary {
    pub frames: u64,
    pub game_time: f64,
    pub real_time: f64,
    pub waves_started: u32,
    pub enemies_spawned: u32,
    pub enemies_alive: usize,
    pub kills: u32,
    pub shots: u32,
    pub hits: u32,
    pub reloads: u32,
    pub player_damage_taken: f32,
    pub player_deaths: u32,
    pub bullet_time_activations: u32,
    pub effects_spawned: u64,
    pub sounds_played: u64,
}

impl fmt::Display for SimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation summary")?;
        writeln!(
            f,
            "  Frames:        {} ({:.1}s game, {:.1}s real)",
            self.frames, self.game_time, self.real_time
        )?;
        writeln!(f, "  Waves:         {}", self.waves_started)?;
        writeln!(
            f,
            "  Enemies:       {} spawned, {} killed, {} alive",
            self.enemies_spawned, self.kills, self.enemies_alive
        )?;
        writeln!(
            f,
            "  Player shots:  {} fired, {} hit, {} reloads",
            self.shots, self.hits, self.reloads
        )?;
        writeln!(
            f,
            "  Player:        {:.0} damage taken, {} deaths",
            self.player_damage_taken, self.player_deaths
        )?;
        writeln!(f, "  Bullet time:   {} activations", self.bullet_time_activations)?;
        write!(
            f,
            "  Presentation:  {} effects, {} sounds",
            self.effects_spawned, self.sounds_played
        )
    }
}

/// A running scenario
pub struct Simulation {
    scenario: Scenario,
    clock: GameClock,
    bullet_time: BulletTime,
    nav: GridNavigation,
    presentation: LogPresentation,
    roster: AgentRoster,
    spawner: WaveSpawner,
    player: Arc<RwLock<Player>>,
    player_id: EntityId,
    weapon: Weapon,
    scanner: HitScanner,
    rng: StdRng,
    summary: SimSummary,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> Result<Self> {
        scenario.validate()?;

        let arena = &scenario.arena;
        let mut mesh = GridNavMesh::centered(Vec3::ZERO, arena.width, arena.depth, arena.cell_size);
        for &[col, row] in &arena.blocked {
            let idx = mesh.cell_index(col, row).ok_or_else(|| {
                ScenarioError::Invalid(format!("blocked cell [{}, {}] is outside the arena", col, row))
            })?;
            mesh.set_walkable(idx, false);
        }

        let player_id = EntityId::new(0, 0);
        let player_config = &scenario.player;
        let player = Arc::new(RwLock::new(Player {
            position: player_config.position,
            health: PlayerHealth::new(player_id, player_config.max_health)
                .with_respawn_delay(player_config.respawn_delay),
        }));
        let target: SharedTarget = player.clone();

        let spawner = WaveSpawner::new(scenario.waves.clone(), scenario.spawn_anchor)
            .with_configs(scenario.enemies.iter().cloned())
            .with_tuning(scenario.tuning.clone())
            .with_target(TargetRef::new(&target));

        Ok(Self {
            clock: GameClock::new(scenario.clock.clone()),
            bullet_time: BulletTime::new(player_config.bullet_time.clone()),
            nav: GridNavigation::new(mesh),
            presentation: LogPresentation::default(),
            roster: AgentRoster::new(),
            spawner,
            weapon: Weapon::new(player_config.weapon.clone()),
            scanner: HitScanner::new(player_config.hitscan.clone()),
            rng: StdRng::seed_from_u64(scenario.seed),
            summary: SimSummary::default(),
            player,
            player_id,
            scenario,
        })
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    pub fn spawner(&self) -> &WaveSpawner {
        &self.spawner
    }

    pub fn player(&self) -> &Arc<RwLock<Player>> {
        &self.player
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.clock.unscaled_now() >= f64::from(self.scenario.duration)
    }

    /// Run until the scenario's duration has elapsed
    pub fn run(&mut self) -> SimSummary {
        while !self.is_finished() {
            self.step();
        }
        self.summary()
    }

    /// Advance one frame
    pub fn step(&mut self) -> FrameTime {
        let time = self.clock.advance(self.scenario.frame_delta);

        self.update_bullet_time(&time);
        self.update_player(&time);
        self.update_weapon(&time);

        let events = self.spawner.tick(
            time.now,
            &mut self.roster,
            &mut self.nav,
            &mut self.presentation,
            &mut self.rng,
        );
        for event in events {
            match event {
                WaveEvent::Started { .. } => self.summary.waves_started += 1,
                WaveEvent::Spawned { .. } => self.summary.enemies_spawned += 1,
                WaveEvent::Completed { .. } | WaveEvent::EnemyRemoved { .. } => {}
            }
        }

        let mut ctx = TickContext::new(
            time.now,
            time.delta,
            &mut self.nav,
            &mut self.presentation,
            &mut self.rng,
        );
        self.roster.tick_all(&mut ctx);
        self.nav.update(time.delta);

        self.summary.frames = time.frame;
        time
    }

    pub fn summary(&self) -> SimSummary {
        SimSummary {
            game_time: self.clock.now(),
            real_time: self.clock.unscaled_now(),
            enemies_alive: self.roster.alive_count(),
            effects_spawned: self.presentation.effects_spawned,
            sounds_played: self.presentation.sounds_played,
            ..self.summary.clone()
        }
    }

    fn update_bullet_time(&mut self, time: &FrameTime) {
        let low_health = {
            let player = self.player.read();
            let health = player.health.health();
            health.is_alive() && health.health_percent() < self.scenario.player.bullet_time_below
        };

        let mut events = Vec::new();
        if low_health && !self.bullet_time.is_active() {
            events.extend(self.bullet_time.activate(&mut self.clock));
        }
        events.extend(self.bullet_time.update(&mut self.clock, time));

        for event in events {
            match event {
                BulletTimeEvent::Started {
                    volume_scale,
                    pitch_scale,
                } => {
                    self.summary.bullet_time_activations += 1;
                    log::info!(
                        "Bullet time! (other sounds at {:.0}% volume, {:.0}% pitch)",
                        volume_scale * 100.0,
                        pitch_scale * 100.0
                    );
                }
                BulletTimeEvent::Ended => log::info!("Bullet time over"),
            }
        }
    }

    fn update_player(&mut self, time: &FrameTime) {
        let events = self.player.write().health.update(time.delta);
        for event in events {
            match event {
                HealthEvent::DamageTaken { amount, .. } => self.summary.player_damage_taken += amount,
                HealthEvent::Death { killer, .. } => {
                    self.summary.player_deaths += 1;
                    let killer = killer
                        .and_then(|id| self.roster.get(id))
                        .map_or("unknown", |agent| agent.name());
                    log::info!("Player killed by {}", killer);
                }
                HealthEvent::Respawned { .. } => log::info!("Player respawned"),
                HealthEvent::Healed { .. } => {}
            }
        }
    }

    fn update_weapon(&mut self, time: &FrameTime) {
        if let Some(WeaponEvent::Reloaded { ammo }) = self.weapon.update(time.delta) {
            log::debug!("Reloaded ({} rounds)", ammo);
        }

        let (alive, origin) = {
            let player = self.player.read();
            (player.health.is_alive(), player.aim_point())
        };
        if !alive {
            return;
        }

        let range = self.weapon.stats().range;
        let Some(aim) = self
            .roster
            .iter()
            .filter(|agent| agent.is_alive())
            .map(|agent| agent.position() + Vec3::UP * AGENT_CHEST_HEIGHT)
            .filter(|point| point.distance(origin) <= range)
            .min_by(|a, b| a.distance(origin).total_cmp(&b.distance(origin)))
        else {
            return;
        };

        let shot = match self.weapon.try_fire() {
            Ok(shot) => shot,
            Err(WeaponError::OutOfAmmo) => {
                if self.weapon.start_reload().is_ok() {
                    self.summary.reloads += 1;
                    log::debug!("Reloading");
                }
                return;
            }
            Err(_) => return,
        };
        self.summary.shots += 1;

        let colliders = Colliders::snapshot(&self.roster);
        let damage = DamageInfo::new(shot.damage).with_source(self.player_id);
        let report = self.scanner.fire_with_spread(
            &colliders,
            &mut self.roster,
            origin,
            aim - origin,
            damage,
            shot.spread,
            &mut self.rng,
        );

        if let Some(Impact::Target { target, outcome, .. }) = &report.impact {
            self.summary.hits += 1;
            if outcome.died {
                self.summary.kills += 1;
                if let Some(agent) = self.roster.get(*target) {
                    log::info!("Player killed {}", agent.name());
                }
            }
        }
        if let Some(effect) = report.effect {
            let prefab = EffectPrefab::new(effect.prefab);
            if let Err(err) = self
                .presentation
                .spawn_effect(&prefab, effect.position, effect.duration)
            {
                log::warn!("Failed to spawn impact effect: {}", err);
            }
        }
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("frame", &self.clock.frame())
            .field("agents", &self.roster.len())
            .field("wave", &self.spawner.current_wave())
            .finish()
    }
}
