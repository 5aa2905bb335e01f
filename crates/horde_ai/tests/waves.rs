//! Wave lifecycle driven together with the roster

mod common;

use common::*;
use horde_ai::prelude::*;
use horde_combat::{DamageInfo, DamageSink};
use horde_math::Vec3;

struct Battle {
    arena: Arena,
    spawner: WaveSpawner,
    events: Vec<(f64, WaveEvent)>,
}

impl Battle {
    fn new(spawner: WaveSpawner) -> Self {
        Self {
            arena: Arena::new(ScriptedNav::new()),
            spawner,
            events: Vec::new(),
        }
    }

    fn step(&mut self) {
        let now = self.arena.now;
        let events = self.spawner.tick(
            now,
            &mut self.arena.roster,
            &mut self.arena.nav,
            &mut self.arena.presentation,
            &mut self.arena.rng,
        );
        self.events.extend(events.into_iter().map(|e| (now, e)));
        self.arena.step();
    }

    fn run_for(&mut self, seconds: f64) {
        let until = self.arena.now + seconds;
        while self.arena.now < until {
            self.step();
        }
    }

    fn kill(&mut self, agent: horde_core::EntityId) {
        let outcome = self.arena.roster.deliver(agent, &DamageInfo::new(1000.0));
        assert!(outcome.is_some_and(|o| o.died));
    }

    fn first_event(&self, pred: impl Fn(&WaveEvent) -> bool) -> Option<f64> {
        self.events
            .iter()
            .find(|(_, event)| pred(event))
            .map(|(time, _)| *time)
    }
}

fn three_per_wave() -> WaveSpawner {
    let settings = WaveSettings {
        min_enemies_per_wave: 3,
        max_enemies_per_wave: 3,
        ..WaveSettings::default()
    };
    WaveSpawner::new(settings, Vec3::ZERO).with_config(grunt())
}

#[test]
fn test_wave_spawns_exactly_its_size() {
    let mut battle = Battle::new(three_per_wave());
    battle.run_for(10.0);

    assert_eq!(battle.arena.roster.len(), 3);
    assert_eq!(battle.spawner.enemies_remaining(), 3);
    assert_eq!(battle.spawner.live_agents().len(), 3);
    assert!(!battle.spawner.is_spawning());

    // No second wave while enemies remain
    battle.run_for(30.0);
    assert_eq!(battle.spawner.current_wave(), 1);
    assert_eq!(battle.arena.roster.len(), 3);
}

#[test]
fn test_remaining_drops_only_as_agents_leave() {
    let mut battle = Battle::new(three_per_wave());
    battle.run_for(7.0);

    let agents = battle.spawner.live_agents().to_vec();
    battle.kill(agents[0]);
    battle.kill(agents[1]);

    // Dead agents linger before removal
    battle.run_for(1.0);
    assert_eq!(battle.spawner.enemies_remaining(), 3);

    battle.run_for(3.0);
    assert_eq!(battle.spawner.enemies_remaining(), 1);

    battle.kill(agents[2]);
    battle.run_for(3.5);
    assert_eq!(battle.spawner.enemies_remaining(), 0);
    assert!(battle.arena.roster.is_empty());
}

#[test]
fn test_next_wave_waits_after_completion() {
    let mut battle = Battle::new(three_per_wave());
    battle.run_for(7.0);

    for agent in battle.spawner.live_agents().to_vec() {
        battle.kill(agent);
    }
    battle.run_for(30.0);

    let completed = battle
        .first_event(|e| matches!(e, WaveEvent::Completed { wave: 1, .. }))
        .expect("wave 1 completes");
    let second = battle
        .first_event(|e| matches!(e, WaveEvent::Started { wave: 2, .. }))
        .expect("wave 2 starts");

    assert!(second >= completed + 20.0);
    assert!(second < completed + 20.0 + 0.1);
    assert_eq!(battle.spawner.current_wave(), 2);
}

#[test]
fn test_spawned_agents_hunt_the_target() {
    let player = player_at(Vec3::new(0.0, 0.0, 3.0));
    let mut battle = Battle::new(three_per_wave().with_target(target_of(&player)));

    battle.run_for(8.0);
    assert!(!player.read().hits.is_empty());
    assert!(battle
        .arena
        .roster
        .iter()
        .all(|agent| agent.target().is_tracked()));
}
