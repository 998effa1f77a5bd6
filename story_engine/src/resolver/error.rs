//! Resolution errors.

use thiserror::Error;

use story_graph::{SegmentId, SegmentNotFound, StateValue};

use crate::player_state::IllegalTransitionError;

/// Everything `Resolver::resolve` can fail with.
///
/// None of these are transient. They stem from bad content or caller
/// misuse and are never retried by the resolver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    SegmentNotFound(#[from] SegmentNotFound),

    #[error("segment {segment} requires a choice")]
    MissingChoice { segment: SegmentId },

    #[error("option {choice_index} is not available at segment {segment}")]
    InvalidChoice { segment: SegmentId, choice_index: u32 },

    #[error(
        "segment {segment} option {option_index} routes on '{key}' but {}",
        describe_value(.value)
    )]
    UnresolvedVariant {
        segment: SegmentId,
        option_index: u32,
        key: String,
        /// `None` when the key was never set.
        value: Option<StateValue>,
    },

    #[error("segment {segment} has no audio variant for selector '{selector}'")]
    MissingVariant { segment: SegmentId, selector: String },

    #[error("segment {segment} has no choices and no auto_next but is not an ending")]
    DeadEnd { segment: SegmentId },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransitionError),
}

fn describe_value(value: &Option<StateValue>) -> String {
    match value {
        Some(v) => format!("no route covers '{}'", v),
        None => "it is not set".to_string(),
    }
}

impl ResolveError {
    /// Check if the caller can recover by asking the listener again.
    ///
    /// Content defects (`UnresolvedVariant`, `MissingVariant`, `DeadEnd`,
    /// `SegmentNotFound`) and `IllegalTransition` should halt playback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ResolveError::MissingChoice { .. } | ResolveError::InvalidChoice { .. }
        )
    }

    /// Check if the error points at broken content rather than caller misuse.
    pub fn is_content_defect(&self) -> bool {
        matches!(
            self,
            ResolveError::SegmentNotFound(_)
                | ResolveError::UnresolvedVariant { .. }
                | ResolveError::MissingVariant { .. }
                | ResolveError::DeadEnd { .. }
        )
    }
}
