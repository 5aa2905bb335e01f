//! Agent states and the state machine that tracks them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavior state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Patrol,
    Chase,
    Attack,
    Hurt,
    Dead,
}

impl AgentState {
    /// Already fighting the target
    pub fn is_engaged(self) -> bool {
        matches!(self, AgentState::Chase | AgentState::Attack)
    }

    /// No transition leaves this state
    pub fn is_terminal(self) -> bool {
        self == AgentState::Dead
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentState::Idle => "Idle",
            AgentState::Patrol => "Patrol",
            AgentState::Chase => "Chase",
            AgentState::Attack => "Attack",
            AgentState::Hurt => "Hurt",
            AgentState::Dead => "Dead",
        };
        f.write_str(name)
    }
}

/// Current and previous state plus time spent in the current one.
///
/// Dead is absorbing: once entered, every transition is refused.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: AgentState,
    previous: Option<AgentState>,
    /// Seconds in the current state
    time_in_state: f32,
    /// Ticks in the current state
    ticks_in_state: u64,
    /// Number of transitions taken
    transitions: u64,
}

impl StateMachine {
    pub fn new(initial: AgentState) -> Self {
        Self {
            current: initial,
            previous: None,
            time_in_state: 0.0,
            ticks_in_state: 0,
            transitions: 0,
        }
    }

    pub fn current(&self) -> AgentState {
        self.current
    }

    pub fn previous(&self) -> Option<AgentState> {
        self.previous
    }

    /// Check if in a specific state
    pub fn is_in(&self, state: AgentState) -> bool {
        self.current == state
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn ticks_in_state(&self) -> u64 {
        self.ticks_in_state
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Move to `to`. Re-entering the current state restarts it.
    ///
    /// Returns false if the machine is dead.
    pub fn transition(&mut self, to: AgentState) -> bool {
        if self.current.is_terminal() {
            return false;
        }

        self.previous = Some(self.current);
        self.current = to;
        self.time_in_state = 0.0;
        self.ticks_in_state = 0;
        self.transitions += 1;
        true
    }

    /// Account for one tick spent in the current state
    pub fn advance(&mut self, delta_time: f32) {
        self.time_in_state += delta_time;
        self.ticks_in_state += 1;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(AgentState::Idle)
    }
}
