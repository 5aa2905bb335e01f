//! Horde headless simulator
//!
//! Runs a scenario (waves of agents hunting a player who shoots back) over
//! the reference grid navmesh and prints a summary.
//!
//! Run with: cargo run -p horde_sim -- [scenario.toml]
//!
//! Without an argument the bundled `scenarios/default.toml` is used when
//! present, otherwise the built-in default scenario. Set `RUST_LOG=debug`
//! to follow every agent's state changes.

mod scenario;
mod world;

use scenario::Scenario;
use std::path::Path;
use world::Simulation;

const DEFAULT_SCENARIO: &str = "crates/horde_sim/scenarios/default.toml";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scenario = match load_scenario() {
        Ok(scenario) => scenario,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    scenario.print_summary();

    let mut sim = match Simulation::new(scenario) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Failed to set up simulation: {}", e);
            std::process::exit(1);
        }
    };

    let summary = sim.run();
    log::info!(
        "Stopped after {} frames in wave {} with {} agents left, player at {:.0} health",
        sim.clock().frame(),
        sim.spawner().current_wave(),
        sim.roster().len(),
        sim.player().read().health.health().current()
    );
    println!();
    println!("{}", summary);
}

/// Scenario from the first non-flag argument, the bundled file, or defaults
fn load_scenario() -> scenario::Result<Scenario> {
    let arg = std::env::args().skip(1).find(|arg| !arg.starts_with("--"));
    match arg {
        Some(path) => Scenario::load(path),
        None if Path::new(DEFAULT_SCENARIO).exists() => Scenario::load(DEFAULT_SCENARIO),
        None => {
            log::info!("No scenario given, using built-in defaults");
            Ok(Scenario::default())
        }
    }
}
