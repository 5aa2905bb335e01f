//! # horde_core - Horde Core
//!
//! Primitives shared by every Horde crate:
//! - **Ids**: generational entity ids for agents, players and effects
//! - **Time**: a game clock with a time scale the host advances each frame
//! - **Bullet time**: an owned slow-motion service that drives the clock's scale
//!
//! Nothing in here is global. Services are constructed by the host and passed
//! to whoever needs them.

pub mod bullet_time;
pub mod id;
pub mod time;

pub use bullet_time::*;
pub use id::*;
pub use time::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bullet_time::{BulletTime, BulletTimeEvent, BulletTimeSettings};
    pub use crate::id::{EntityId, IdGenerator};
    pub use crate::time::{ClockConfig, FrameTime, GameClock};
}
