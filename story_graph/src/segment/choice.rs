//! Choices - the edges a player can pick at a segment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SegmentId;
use crate::state::{satisfies, StateValue, Variables};

/// Why a variant-routed choice could not pick a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    /// The route key has not been set yet.
    Unset,
    /// The route key is set to a value the choice has no route for.
    Uncovered(StateValue),
}

/// Where a choice leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceTarget {
    /// Same destination whatever the player state.
    Fixed(SegmentId),
    /// Destination keyed by the value of the graph's route key (e.g. `class`).
    ByVariant(BTreeMap<String, SegmentId>),
}

impl ChoiceTarget {
    /// All segments this target can resolve to.
    pub fn targets(&self) -> Box<dyn Iterator<Item = &SegmentId> + '_> {
        match self {
            ChoiceTarget::Fixed(id) => Box::new(std::iter::once(id)),
            ChoiceTarget::ByVariant(map) => Box::new(map.values()),
        }
    }

    /// Pick the destination for the given state.
    ///
    /// Variant routes are keyed by the text form of `variables[route_key]`.
    pub fn route(&self, route_key: &str, variables: &Variables) -> Result<&SegmentId, RouteMiss> {
        match self {
            ChoiceTarget::Fixed(id) => Ok(id),
            ChoiceTarget::ByVariant(map) => {
                let value = variables.get(route_key).ok_or(RouteMiss::Unset)?;
                map.get(&value.to_string())
                    .ok_or_else(|| RouteMiss::Uncovered(value.clone()))
            }
        }
    }
}

/// A player-facing option at a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// 1-based position announced to the listener.
    pub option_index: u32,
    pub label: Option<String>,
    pub target: ChoiceTarget,
    /// Merged into the player's variables when this choice is taken.
    pub state_update: Variables,
    /// The choice is only offered when all of these match.
    pub requires_state: Variables,
}

impl Choice {
    /// Create an ungated choice with no state effects.
    pub fn new(option_index: u32, target: ChoiceTarget) -> Self {
        Self {
            option_index,
            label: None,
            target,
            state_update: Variables::new(),
            requires_state: Variables::new(),
        }
    }

    /// Check if the choice can be offered given the current variables.
    pub fn is_presentable(&self, variables: &Variables) -> bool {
        satisfies(variables, &self.requires_state)
    }

    /// Check if this choice is gated at all.
    pub fn is_conditional(&self) -> bool {
        !self.requires_state.is_empty()
    }
}
