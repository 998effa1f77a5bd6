//! # Story Engine
//!
//! Playback-side logic for interactive audio cards. This crate consumes a
//! validated `story_graph::StoryGraph`, tracks each listener's progress, and
//! decides which segment and which audio variant come next.
//!
//! ## Core Components
//!
//! - **player_state**: Per-playthrough variables, position and append-only history
//! - **resolver**: The only place where "what happens next" is decided
//! - **narrator**: Capability for turning audio references into playable media
//! - **playthrough**: Session facade binding a shared graph to one state
//!
//! ## Design Philosophy
//!
//! - **Explicit State**: Every resolution takes the player state as an argument; nothing is global
//! - **Fail Loudly**: Content defects surface as errors instead of silently defaulting
//! - **Shared Content**: Graphs are immutable and shared across playthroughs without locking

pub mod narrator;
pub mod player_state;
pub mod playthrough;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use narrator::*;
pub use player_state::*;
pub use playthrough::*;
pub use resolver::*;
