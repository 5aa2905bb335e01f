//! Horde AI - Enemy Agents, Navigation and Waves
//!
//! This crate drives enemy agents through a per-agent state machine
//! (Idle, Patrol, Chase, Attack, Hurt, Dead) against a host-owned target.
//!
//! # Features
//!
//! - Data-driven agent configs and shared behavior tuning
//! - Resumable state routines ticked once per frame
//! - Navigation and presentation as host-implemented capabilities
//! - A reference grid navmesh with A* pathfinding
//! - An agent roster and a wave spawner
//!
//! # Example
//!
//! ```ignore
//! use horde_ai::prelude::*;
//!
//! let mut roster = AgentRoster::new();
//! let mut spawner = WaveSpawner::new(WaveSettings::default(), Vec3::ZERO)
//!     .with_config(AgentConfig::new("Grunt").with_prefab("grunt"))
//!     .with_target(TargetRef::new(&player));
//!
//! // Every frame
//! spawner.tick(now, &mut roster, &mut nav, &mut presentation, &mut rng);
//! let mut ctx = TickContext::new(now, dt, &mut nav, &mut presentation, &mut rng);
//! roster.tick_all(&mut ctx);
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod navigation;
pub mod navmesh;
pub mod presentation;
pub mod roster;
pub mod spawner;
pub mod state_machine;
pub mod target;

pub mod prelude {
    pub use crate::agent::{Agent, TickContext};
    pub use crate::config::{AgentConfig, AnimationTriggers, BehaviorTuning, EffectPrefab, SoundClip};
    pub use crate::error::{AiError, PresentationError, Result};
    pub use crate::navigation::{Navigation, PathQuery};
    pub use crate::navmesh::{GridNavMesh, GridNavigation, NavPath};
    pub use crate::presentation::{
        NullPresentation, Presentation, PresentationCall, PresentationResult, RecordingPresentation,
    };
    pub use crate::roster::AgentRoster;
    pub use crate::spawner::{WaveEvent, WaveSettings, WaveSpawner};
    pub use crate::state_machine::{AgentState, StateMachine};
    pub use crate::target::{share_target, SharedTarget, Target, TargetRef};
}

pub use prelude::*;
