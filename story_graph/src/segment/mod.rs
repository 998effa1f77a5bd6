//! Segment definitions - the nodes of a story graph.

mod choice;

pub use choice::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier of a segment, as printed on the card's track list (e.g. `"25"`, `"57W"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for SegmentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to one audio asset. The narrator turns it into something playable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioRef {
    /// Track key understood by the narrator (file name, CDN key, ...).
    pub track: String,
    #[serde(default)]
    pub duration_secs: u32,
}

impl AudioRef {
    pub fn new(track: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            track: track.into(),
            duration_secs,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration_secs))
    }
}

/// A node in the narrative graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,

    /// Optional human-readable title, for tooling only.
    pub title: Option<String>,

    /// Variant key -> audio. A single `""` key means the segment is unvaried.
    pub variants: BTreeMap<String, AudioRef>,

    /// Ordered decision points; empty for linear segments.
    pub choices: Vec<Choice>,

    /// Default successor when `choices` is empty.
    pub auto_next: Option<SegmentId>,

    /// Terminal segment: no choices and no `auto_next`.
    pub is_ending: bool,
}

impl Segment {
    /// Check if the segment has no outgoing edges at all.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty() && self.auto_next.is_none()
    }

    /// Check if the segment's audio depends on player state.
    pub fn is_varied(&self) -> bool {
        !(self.variants.is_empty() || (self.variants.len() == 1 && self.variants.contains_key("")))
    }

    /// Look up a choice by its 1-based option index, ignoring any gating.
    pub fn choice(&self, option_index: u32) -> Option<&Choice> {
        self.choices.iter().find(|c| c.option_index == option_index)
    }

    /// Every segment this one can lead to: `auto_next` plus all choice targets across variants.
    pub fn successors(&self) -> impl Iterator<Item = &SegmentId> {
        self.auto_next
            .iter()
            .chain(self.choices.iter().flat_map(|c| c.target.targets()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(id: &str, next: Option<&str>) -> Segment {
        Segment {
            id: id.into(),
            title: None,
            variants: BTreeMap::from([(String::new(), AudioRef::new(format!("{id}.mp3"), 30))]),
            choices: Vec::new(),
            auto_next: next.map(SegmentId::from),
            is_ending: next.is_none(),
        }
    }

    #[test]
    fn test_terminal_and_varied() {
        let seg = linear("99", None);
        assert!(seg.is_terminal());
        assert!(!seg.is_varied());

        let mut seg = linear("57", Some("58"));
        seg.variants = BTreeMap::from([
            ("F".to_string(), AudioRef::new("57F.mp3", 272)),
            ("W".to_string(), AudioRef::new("57W.mp3", 579)),
        ]);
        assert!(!seg.is_terminal());
        assert!(seg.is_varied());
    }

    #[test]
    fn test_successors_include_every_variant_target() {
        let mut seg = linear("04", None);
        seg.is_ending = false;
        seg.choices = vec![
            Choice::new(1, ChoiceTarget::Fixed("05".into())),
            Choice::new(
                2,
                ChoiceTarget::ByVariant(BTreeMap::from([
                    ("fighter".to_string(), SegmentId::from("09")),
                    ("wizard".to_string(), SegmentId::from("10")),
                ])),
            ),
        ];

        let ids: Vec<_> = seg.successors().map(|s| s.as_str()).collect();
        assert_eq!(ids, vec!["05", "09", "10"]);
        assert_eq!(seg.choice(2).map(|c| c.option_index), Some(2));
        assert!(seg.choice(3).is_none());
    }

    #[test]
    fn test_audio_duration() {
        let audio = AudioRef::new("57W.mp3", 579);
        assert_eq!(audio.duration(), Duration::from_secs(579));
    }
}
