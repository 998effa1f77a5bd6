//! # Story Graph
//!
//! The content side of an interactive audio card: an immutable graph of
//! narrative segments, the choices that connect them, and the audio variants
//! each segment plays depending on what the listener has chosen so far.
//! This crate loads and validates content; it contains no playback logic.
//!
//! ## Core Components
//!
//! - **definition**: Serialized, author-facing story documents (JSON/TOML)
//! - **graph**: `StoryGraph`, the validated and immutable runtime form
//! - **selector**: Deterministic mapping from player state to audio variant keys
//! - **consistency**: Offline checker for routing and variant coverage defects

pub mod consistency;
pub mod definition;
pub mod error;
pub mod graph;
pub mod segment;
pub mod selector;
pub mod state;
pub mod validate;

pub use consistency::*;
pub use definition::*;
pub use error::*;
pub use graph::*;
pub use segment::*;
pub use selector::*;
pub use state::*;
pub use validate::*;
