//! Errors raised while loading and validating story content.

use thiserror::Error;

use crate::segment::SegmentId;

/// The kinds of structural defect a definition can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructuralErrorKind {
    /// A choice target or `auto_next` names a segment that does not exist.
    DanglingReference,
    /// No path from `start` reaches the segment.
    UnreachableSegment,
    /// A choice sets both `target` and `targets_by_variant`, or neither,
    /// or an empty `targets_by_variant`.
    AmbiguousChoiceTarget,
    /// `start` names a segment that does not exist.
    UnknownStart,
    /// Two segments share an id.
    DuplicateSegment,
    /// Two choices on one segment share an option index.
    DuplicateOptionIndex,
    /// A choice's option index is 0; option indices start at 1.
    InvalidOptionIndex,
    /// The segment has no outgoing edges but is not flagged `is_ending`.
    UnmarkedEnding,
    /// The segment is flagged `is_ending` but still has outgoing edges.
    ContradictoryEnding,
}

impl std::fmt::Display for StructuralErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StructuralErrorKind::DanglingReference => "dangling reference",
            StructuralErrorKind::UnreachableSegment => "unreachable segment",
            StructuralErrorKind::AmbiguousChoiceTarget => "ambiguous choice target",
            StructuralErrorKind::UnknownStart => "unknown start segment",
            StructuralErrorKind::DuplicateSegment => "duplicate segment",
            StructuralErrorKind::DuplicateOptionIndex => "duplicate option index",
            StructuralErrorKind::InvalidOptionIndex => "invalid option index",
            StructuralErrorKind::UnmarkedEnding => "unmarked ending",
            StructuralErrorKind::ContradictoryEnding => "contradictory ending",
        };
        f.write_str(name)
    }
}

/// A content-authoring defect found at load time. The graph must not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at segment {segment}{}: {detail}", choice_suffix(.option_index))]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    pub segment: SegmentId,
    /// The offending choice, when the defect is on a choice.
    pub option_index: Option<u32>,
    pub detail: String,
}

fn choice_suffix(option_index: &Option<u32>) -> String {
    option_index
        .map(|i| format!(" (option {})", i))
        .unwrap_or_default()
}

impl StructuralError {
    pub fn new(kind: StructuralErrorKind, segment: impl Into<SegmentId>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            segment: segment.into(),
            option_index: None,
            detail: detail.into(),
        }
    }

    /// Attach the offending choice.
    pub fn at_option(mut self, option_index: u32) -> Self {
        self.option_index = Some(option_index);
        self
    }
}

/// Lookup of a segment id that is not in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("segment not found: {0}")]
pub struct SegmentNotFound(pub SegmentId);

/// Anything that can go wrong turning a content document into a `StoryGraph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to parse JSON story definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML story definition: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read story definition {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported story definition format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}
