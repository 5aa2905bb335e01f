//! Error types for the agent system

use horde_core::EntityId;
use thiserror::Error;

/// Agent system errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    /// Config data that can't drive an agent
    #[error("Invalid agent config '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Config has no spawnable representation
    #[error("Agent config '{name}' has no prefab")]
    MissingPrefab { name: String },

    /// No agent with this id in the roster
    #[error("Unknown agent: {0}")]
    UnknownAgent(EntityId),

    /// The presentation layer refused to instantiate the agent
    #[error("Presentation error: {0}")]
    Presentation(#[from] PresentationError),
}

/// Failures reported by a [`Presentation`](crate::presentation::Presentation) backend.
///
/// These are never fatal; the agent logs them and carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PresentationError {
    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AiError>;
