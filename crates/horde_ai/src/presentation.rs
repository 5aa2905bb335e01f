//! Presentation capability: animation, audio, effects and instantiation
//!
//! Every call may fail; agents log failures and keep running.

use crate::config::{EffectPrefab, SoundClip};
use crate::error::PresentationError;
use horde_core::EntityId;
use horde_math::Vec3;
use std::collections::HashSet;

/// Result type for presentation calls
pub type PresentationResult = std::result::Result<(), PresentationError>;

/// The host engine's view of an agent
pub trait Presentation {
    /// Instantiate the agent's visual representation
    fn spawn_agent(&mut self, agent: EntityId, prefab: &str, position: Vec3) -> PresentationResult;

    /// Tear the representation down
    fn despawn_agent(&mut self, agent: EntityId) -> PresentationResult;

    fn play_animation_trigger(&mut self, agent: EntityId, trigger: &str) -> PresentationResult;

    /// Locomotion blend flags
    fn set_locomotion(&mut self, agent: EntityId, walking: bool, running: bool) -> PresentationResult;

    fn play_sound(&mut self, agent: EntityId, clip: &SoundClip) -> PresentationResult;

    /// Spawn a temporary effect that removes itself after `duration` seconds
    fn spawn_effect(&mut self, prefab: &EffectPrefab, position: Vec3, duration: f32) -> PresentationResult;

    /// Turn off colliders and physics response
    fn disable_physics(&mut self, agent: EntityId) -> PresentationResult;

    /// Rotate to a yaw (radians around +Y)
    fn face(&mut self, agent: EntityId, yaw: f32) -> PresentationResult;
}

/// Presentation that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn spawn_agent(&mut self, _agent: EntityId, _prefab: &str, _position: Vec3) -> PresentationResult {
        Ok(())
    }

    fn despawn_agent(&mut self, _agent: EntityId) -> PresentationResult {
        Ok(())
    }

    fn play_animation_trigger(&mut self, _agent: EntityId, _trigger: &str) -> PresentationResult {
        Ok(())
    }

    fn set_locomotion(&mut self, _agent: EntityId, _walking: bool, _running: bool) -> PresentationResult {
        Ok(())
    }

    fn play_sound(&mut self, _agent: EntityId, _clip: &SoundClip) -> PresentationResult {
        Ok(())
    }

    fn spawn_effect(&mut self, _prefab: &EffectPrefab, _position: Vec3, _duration: f32) -> PresentationResult {
        Ok(())
    }

    fn disable_physics(&mut self, _agent: EntityId) -> PresentationResult {
        Ok(())
    }

    fn face(&mut self, _agent: EntityId, _yaw: f32) -> PresentationResult {
        Ok(())
    }
}

/// A presentation call, as recorded by [`RecordingPresentation`]
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCall {
    Spawn {
        agent: EntityId,
        prefab: String,
        position: Vec3,
    },
    Despawn(EntityId),
    Trigger(EntityId, String),
    Locomotion {
        agent: EntityId,
        walking: bool,
        running: bool,
    },
    Sound(EntityId, SoundClip),
    Effect {
        prefab: EffectPrefab,
        position: Vec3,
        duration: f32,
    },
    DisablePhysics(EntityId),
    Face(EntityId, f32),
}

/// Records every call, optionally failing some of them
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    pub calls: Vec<PresentationCall>,
    /// Prefabs whose instantiation fails
    missing_prefabs: HashSet<String>,
    /// Fail every sound and animation call
    fail_feedback: bool,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make instantiating `prefab` fail
    pub fn with_missing_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.missing_prefabs.insert(prefab.into());
        self
    }

    /// Make every sound and animation call fail
    pub fn with_failing_feedback(mut self) -> Self {
        self.fail_feedback = true;
        self
    }

    /// Calls that concern `agent`
    pub fn calls_for(&self, agent: EntityId) -> impl Iterator<Item = &PresentationCall> {
        self.calls.iter().filter(move |call| match call {
            PresentationCall::Spawn { agent: a, .. } | PresentationCall::Locomotion { agent: a, .. } => {
                *a == agent
            }
            PresentationCall::Despawn(a)
            | PresentationCall::Trigger(a, _)
            | PresentationCall::Sound(a, _)
            | PresentationCall::DisablePhysics(a)
            | PresentationCall::Face(a, _) => *a == agent,
            PresentationCall::Effect { .. } => false,
        })
    }

    /// Animation triggers fired for `agent`, in order
    pub fn triggers(&self, agent: EntityId) -> Vec<&str> {
        self.calls_for(agent)
            .filter_map(|call| match call {
                PresentationCall::Trigger(_, trigger) => Some(trigger.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Sounds played by `agent`, in order
    pub fn sounds(&self, agent: EntityId) -> Vec<&SoundClip> {
        self.calls_for(agent)
            .filter_map(|call| match call {
                PresentationCall::Sound(_, clip) => Some(clip),
                _ => None,
            })
            .collect()
    }

    /// All effects spawned
    pub fn effects(&self) -> Vec<(&EffectPrefab, Vec3, f32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PresentationCall::Effect {
                    prefab,
                    position,
                    duration,
                } => Some((prefab, *position, *duration)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn feedback(&mut self, call: PresentationCall) -> PresentationResult {
        if self.fail_feedback {
            return Err(PresentationError::Backend("feedback disabled".to_string()));
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Presentation for RecordingPresentation {
    fn spawn_agent(&mut self, agent: EntityId, prefab: &str, position: Vec3) -> PresentationResult {
        if self.missing_prefabs.contains(prefab) {
            return Err(PresentationError::MissingAsset(prefab.to_string()));
        }
        self.calls.push(PresentationCall::Spawn {
            agent,
            prefab: prefab.to_string(),
            position,
        });
        Ok(())
    }

    fn despawn_agent(&mut self, agent: EntityId) -> PresentationResult {
        self.calls.push(PresentationCall::Despawn(agent));
        Ok(())
    }

    fn play_animation_trigger(&mut self, agent: EntityId, trigger: &str) -> PresentationResult {
        self.feedback(PresentationCall::Trigger(agent, trigger.to_string()))
    }

    fn set_locomotion(&mut self, agent: EntityId, walking: bool, running: bool) -> PresentationResult {
        self.feedback(PresentationCall::Locomotion {
            agent,
            walking,
            running,
        })
    }

    fn play_sound(&mut self, agent: EntityId, clip: &SoundClip) -> PresentationResult {
        self.feedback(PresentationCall::Sound(agent, clip.clone()))
    }

    fn spawn_effect(&mut self, prefab: &EffectPrefab, position: Vec3, duration: f32) -> PresentationResult {
        self.calls.push(PresentationCall::Effect {
            prefab: prefab.clone(),
            position,
            duration,
        });
        Ok(())
    }

    fn disable_physics(&mut self, agent: EntityId) -> PresentationResult {
        self.calls.push(PresentationCall::DisablePhysics(agent));
        Ok(())
    }

    fn face(&mut self, agent: EntityId, yaw: f32) -> PresentationResult {
        self.calls.push(PresentationCall::Face(agent, yaw));
        Ok(())
    }
}
