//! Variant selection - turning player state into an audio variant key.
//!
//! A selector produces an ordered list of tags from the player's variables
//! (e.g. `["W", "2"]` for a wizard on path 2). The candidate keys tried
//! against a varied segment's `variants` are the full concatenation (`"W2"`),
//! then successively shorter prefixes (`"W"`). The first candidate the segment
//! defines wins. The unvaried key `""` is only a candidate while the selector
//! has no tags, so a tagged listener never lands on generic audio by accident.
//! Unvaried segments always play their `""` audio.

use crate::definition::{Conventions, VariantDimension};
use crate::segment::{AudioRef, Segment};
use crate::state::{StateValue, Variables};

/// Derives variant tags from player state. Must be a pure function of `variables`.
pub trait VariantSelector: Send + Sync {
    fn tags(&self, variables: &Variables) -> Vec<String>;

    /// State keys the selector reads, or `None` if it may read any key.
    fn keys(&self) -> Option<Vec<String>> {
        None
    }

    /// Candidate variant keys, most specific first. `""` when there are no tags.
    fn candidates(&self, variables: &Variables) -> Vec<String> {
        let tags = self.tags(variables);
        let mut candidates: Vec<String> = (1..=tags.len())
            .rev()
            .map(|n| tags[..n].concat())
            .collect();
        candidates.dedup();
        if candidates.is_empty() {
            candidates.push(String::new());
        }
        candidates
    }

    /// The most specific selector, used for reporting.
    fn selector(&self, variables: &Variables) -> String {
        self.tags(variables).concat()
    }
}

/// A matched audio variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantMatch<'a> {
    pub key: &'a str,
    pub audio: &'a AudioRef,
}

/// Pick the segment's audio for the given state, or `None` if no candidate is defined.
pub fn select_variant<'a, S: VariantSelector + ?Sized>(
    selector: &S,
    segment: &'a Segment,
    variables: &Variables,
) -> Option<VariantMatch<'a>> {
    let found = if segment.is_varied() {
        selector
            .candidates(variables)
            .iter()
            .find_map(|candidate| segment.variants.get_key_value(candidate.as_str()))
    } else {
        segment.variants.get_key_value("")
    };

    found.map(|(key, audio)| VariantMatch {
        key: key.as_str(),
        audio,
    })
}

/// The default selector, driven by a graph's [`Conventions`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSelector {
    dimensions: Vec<VariantDimension>,
}

impl KeyedSelector {
    pub fn new(dimensions: Vec<VariantDimension>) -> Self {
        Self { dimensions }
    }

    pub fn from_conventions(conventions: &Conventions) -> Self {
        Self::new(conventions.variant_dimensions.clone())
    }

    fn tag_for(dimension: &VariantDimension, value: &StateValue) -> String {
        let raw = value.to_string();
        if let Some(tag) = dimension.tags.get(&raw) {
            return tag.clone();
        }
        if dimension.abbreviate {
            raw.chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default()
        } else {
            raw
        }
    }
}

impl Default for KeyedSelector {
    fn default() -> Self {
        Self::from_conventions(&Conventions::default())
    }
}

impl VariantSelector for KeyedSelector {
    fn keys(&self) -> Option<Vec<String>> {
        Some(self.dimensions.iter().map(|d| d.key.clone()).collect())
    }

    fn tags(&self, variables: &Variables) -> Vec<String> {
        self.dimensions
            .iter()
            .filter_map(|dim| variables.get(&dim.key).map(|v| Self::tag_for(dim, v)))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}
