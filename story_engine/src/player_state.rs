//! Player state - one playthrough's accumulated choices and position.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use story_graph::{SegmentId, StateValue, StoryGraph, Variables};

/// Unique identifier for a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaythroughId(pub Uuid);

impl PlaythroughId {
    /// Create a new random playthrough ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlaythroughId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlaythroughId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded move through the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Segment that was left.
    pub from: SegmentId,
    /// Segment that was entered.
    pub segment_id: SegmentId,
    /// Option taken, `None` for auto-advance.
    pub choice_index: Option<u32>,
    /// Strictly increasing position in the playthrough, starting at 1.
    pub ordinal: u64,
}

/// A transition computed by the resolver and not yet recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingTransition {
    pub from: SegmentId,
    pub target: SegmentId,
    pub choice_index: Option<u32>,
}

/// A state mutation attempted out of sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalTransitionError {
    #[error("no transition was resolved from segment {from}; refusing to move to {to}")]
    NotResolved { from: SegmentId, to: SegmentId },

    #[error(
        "transition {from} -> {to} ({}) does not match the resolved transition {from} -> {expected} ({})",
        describe_choice(.choice_index),
        describe_choice(.expected_choice)
    )]
    Mismatch {
        from: SegmentId,
        to: SegmentId,
        choice_index: Option<u32>,
        expected: SegmentId,
        expected_choice: Option<u32>,
    },
}

fn describe_choice(choice: &Option<u32>) -> String {
    match choice {
        Some(i) => format!("option {}", i),
        None => "auto-advance".to_string(),
    }
}

/// The mutable record of one playthrough.
///
/// Exclusively owned by a single playback session. Variables only ever grow
/// (keys are overwritten, never removed) and history is append-only. The
/// whole value serializes so callers can persist a playthrough; a transition
/// that was resolved but not yet recorded is not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    id: PlaythroughId,
    variables: Variables,
    current_segment: SegmentId,
    history: Vec<HistoryEntry>,
    #[serde(skip)]
    pending: Option<PendingTransition>,
}

impl PlayerState {
    /// Start a playthrough at the graph's start segment.
    pub fn create(graph: &StoryGraph) -> Self {
        Self {
            id: PlaythroughId::new(),
            variables: Variables::new(),
            current_segment: graph.start().clone(),
            history: Vec::new(),
            pending: None,
        }
    }

    pub fn id(&self) -> PlaythroughId {
        self.id
    }

    pub fn current_segment(&self) -> &SegmentId {
        &self.current_segment
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Get a single state value.
    pub fn variable(&self, key: &str) -> Option<&StateValue> {
        self.variables.get(key)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Merge an update: existing keys are overwritten, new keys added, nothing removed.
    pub fn merge(&mut self, update: &Variables) {
        for (key, value) in update {
            self.variables.insert(key.clone(), value.clone());
        }
    }

    /// Record a move to `segment_id` and make it the current segment.
    ///
    /// Only succeeds if it matches the transition the resolver staged for the
    /// current segment. The staged transition is consumed, so recording the
    /// same choice twice fails.
    pub fn record_transition(
        &mut self,
        segment_id: &SegmentId,
        choice_index: Option<u32>,
    ) -> Result<(), IllegalTransitionError> {
        let Some(pending) = &self.pending else {
            tracing::warn!(
                playthrough = %self.id,
                from = %self.current_segment,
                to = %segment_id,
                "transition recorded without a resolution"
            );
            return Err(IllegalTransitionError::NotResolved {
                from: self.current_segment.clone(),
                to: segment_id.clone(),
            });
        };

        if pending.from != self.current_segment
            || &pending.target != segment_id
            || pending.choice_index != choice_index
        {
            tracing::warn!(
                playthrough = %self.id,
                from = %self.current_segment,
                to = %segment_id,
                expected = %pending.target,
                "transition does not match resolution"
            );
            return Err(IllegalTransitionError::Mismatch {
                from: self.current_segment.clone(),
                to: segment_id.clone(),
                choice_index,
                expected: pending.target.clone(),
                expected_choice: pending.choice_index,
            });
        }

        self.pending = None;
        let ordinal = self.history.last().map_or(1, |e| e.ordinal + 1);
        self.history.push(HistoryEntry {
            from: std::mem::replace(&mut self.current_segment, segment_id.clone()),
            segment_id: segment_id.clone(),
            choice_index,
            ordinal,
        });
        Ok(())
    }

    /// Stage the transition the resolver just computed.
    pub(crate) fn stage(&mut self, pending: PendingTransition) {
        self.pending = Some(pending);
    }

    /// Check if a resolved transition is waiting to be recorded.
    pub fn has_pending_transition(&self) -> bool {
        self.pending.is_some()
    }

    /// Segment ids visited so far, starting with the first segment.
    pub fn path(&self) -> Vec<&SegmentId> {
        let first = self
            .history
            .first()
            .map(|e| &e.from)
            .unwrap_or(&self.current_segment);
        std::iter::once(first)
            .chain(self.history.iter().map(|e| &e.segment_id))
            .collect()
    }
}
