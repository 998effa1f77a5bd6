//! Resolver - decides what happens next in a playthrough.
//!
//! Resolution works as follows:
//! 1. **Lookup**: Find the player's current segment
//! 2. **Presentation**: Filter its choices down to the ones `requires_state` allows
//! 3. **Selection**: Validate the incoming option index against the presentable choices
//! 4. **Routing**: Pick the target, flat or by the graph's route key
//! 5. **Variant**: Pick the target's audio from the player's updated variables
//! 6. **Commit**: Merge the choice's state update and record the transition
//!
//! Steps 1-5 are pure and exposed as [`Resolver::plan`]. [`Resolver::resolve`]
//! adds step 6.

mod error;

pub use error::*;

use serde::{Deserialize, Serialize};

use story_graph::{
    select_variant, AudioRef, KeyedSelector, RouteMiss, Segment, SegmentId, StoryGraph,
    VariantSelector, Variables,
};

use crate::player_state::{PendingTransition, PlayerState};

/// A choice as shown to the listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedChoice {
    pub option_index: u32,
    pub label: Option<String>,
}

/// The outcome of resolving one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Segment the step started from.
    pub from_segment: SegmentId,
    /// Segment entered, `None` when the playthrough has ended.
    pub next_segment: Option<SegmentId>,
    /// Option taken, `None` for auto-advance.
    pub choice_index: Option<u32>,
    /// Audio to play for `next_segment`.
    pub audio: Option<AudioRef>,
    /// Variant key that selected `audio` (`""` for unvaried segments).
    pub variant_key: Option<String>,
    /// State merged by this step.
    pub state_update: Variables,
    /// Choices to offer at `next_segment`.
    pub presentable_choices: Vec<PresentedChoice>,
    /// The current segment was an ending; nothing was resolved.
    pub ended: bool,
    /// `next_segment` is an ending.
    pub at_ending: bool,
}

impl Resolution {
    fn ended(segment: &SegmentId) -> Self {
        Self {
            from_segment: segment.clone(),
            next_segment: None,
            choice_index: None,
            audio: None,
            variant_key: None,
            state_update: Variables::new(),
            presentable_choices: Vec::new(),
            ended: true,
            at_ending: false,
        }
    }
}

/// Computes transitions through a story graph.
///
/// The resolver holds no playthrough state; one instance can serve any
/// number of playthroughs of graphs that share its variant conventions.
#[derive(Debug, Clone)]
pub struct Resolver<S = KeyedSelector> {
    selector: S,
}

impl Resolver<KeyedSelector> {
    /// Create a resolver using the graph's own variant conventions.
    pub fn for_graph(graph: &StoryGraph) -> Self {
        Self::new(graph.default_selector())
    }
}

impl Default for Resolver<KeyedSelector> {
    fn default() -> Self {
        Self::new(KeyedSelector::default())
    }
}

impl<S: VariantSelector> Resolver<S> {
    /// Create a resolver with an injected variant selector.
    pub fn new(selector: S) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// Choices the listener may pick at the current segment, in authored order.
    pub fn presentable_choices(
        &self,
        graph: &StoryGraph,
        state: &PlayerState,
    ) -> Result<Vec<PresentedChoice>, ResolveError> {
        let segment = graph.segment(state.current_segment().as_str())?;
        Ok(presentable(segment, state.variables()))
    }

    /// Describe the current segment without moving: its audio and choices.
    ///
    /// Used when a playthrough starts or is restored.
    pub fn opening(
        &self,
        graph: &StoryGraph,
        state: &PlayerState,
    ) -> Result<Resolution, ResolveError> {
        let segment = graph.segment(state.current_segment().as_str())?;
        let (variant_key, audio) = self.audio_for(segment, state.variables())?;

        Ok(Resolution {
            from_segment: segment.id.clone(),
            next_segment: Some(segment.id.clone()),
            choice_index: None,
            audio,
            variant_key,
            state_update: Variables::new(),
            presentable_choices: presentable(segment, state.variables()),
            ended: false,
            at_ending: segment.is_ending,
        })
    }

    /// Compute the next step without touching the state.
    ///
    /// Calling `plan` repeatedly with the same inputs yields the same result.
    pub fn plan(
        &self,
        graph: &StoryGraph,
        state: &PlayerState,
        choice_index: Option<u32>,
    ) -> Result<Resolution, ResolveError> {
        let segment = graph.segment(state.current_segment().as_str())?;
        let variables = state.variables();

        let (target, taken, state_update) = if !segment.choices.is_empty() {
            let index = choice_index.ok_or_else(|| ResolveError::MissingChoice {
                segment: segment.id.clone(),
            })?;

            // Hidden choices are indistinguishable from missing ones.
            let choice = segment
                .choices
                .iter()
                .filter(|c| c.is_presentable(variables))
                .find(|c| c.option_index == index)
                .ok_or_else(|| {
                    tracing::debug!(segment = %segment.id, choice = index, "rejected choice");
                    ResolveError::InvalidChoice {
                        segment: segment.id.clone(),
                        choice_index: index,
                    }
                })?;

            let target = choice
                .target
                .route(graph.route_key(), variables)
                .map_err(|miss| ResolveError::UnresolvedVariant {
                    segment: segment.id.clone(),
                    option_index: choice.option_index,
                    key: graph.route_key().to_string(),
                    value: match miss {
                        RouteMiss::Unset => None,
                        RouteMiss::Uncovered(value) => Some(value),
                    },
                })?;

            (target, Some(index), choice.state_update.clone())
        } else if let Some(next) = &segment.auto_next {
            if let Some(ignored) = choice_index {
                tracing::debug!(
                    segment = %segment.id,
                    choice = ignored,
                    "choice ignored on linear segment"
                );
            }
            (next, None, Variables::new())
        } else if segment.is_ending {
            return Ok(Resolution::ended(&segment.id));
        } else {
            return Err(ResolveError::DeadEnd {
                segment: segment.id.clone(),
            });
        };

        let target_segment = graph.segment(target.as_str())?;

        let mut projected = variables.clone();
        projected.extend(state_update.iter().map(|(k, v)| (k.clone(), v.clone())));

        let (variant_key, audio) = self.audio_for(target_segment, &projected)?;

        Ok(Resolution {
            from_segment: segment.id.clone(),
            next_segment: Some(target_segment.id.clone()),
            choice_index: taken,
            audio,
            variant_key,
            state_update,
            presentable_choices: presentable(target_segment, &projected),
            ended: false,
            at_ending: target_segment.is_ending,
        })
    }

    /// Resolve one step and apply it to the state.
    ///
    /// Call exactly once per actual choice. On error the state is untouched.
    pub fn resolve(
        &self,
        graph: &StoryGraph,
        state: &mut PlayerState,
        choice_index: Option<u32>,
    ) -> Result<Resolution, ResolveError> {
        let resolution = self.plan(graph, state, choice_index)?;

        let Some(target) = resolution.next_segment.clone() else {
            tracing::debug!(playthrough = %state.id(), segment = %resolution.from_segment, "playthrough ended");
            return Ok(resolution);
        };

        state.stage(PendingTransition {
            from: resolution.from_segment.clone(),
            target: target.clone(),
            choice_index: resolution.choice_index,
        });
        state.merge(&resolution.state_update);
        state.record_transition(&target, resolution.choice_index)?;

        tracing::debug!(
            playthrough = %state.id(),
            from = %resolution.from_segment,
            to = %target,
            choice = ?resolution.choice_index,
            variant = ?resolution.variant_key,
            "resolved transition"
        );
        Ok(resolution)
    }

    fn audio_for(
        &self,
        segment: &Segment,
        variables: &Variables,
    ) -> Result<(Option<String>, Option<AudioRef>), ResolveError> {
        if segment.variants.is_empty() {
            return Ok((None, None));
        }

        match select_variant(&self.selector, segment, variables) {
            Some(found) => Ok((Some(found.key.to_string()), Some(found.audio.clone()))),
            None => Err(ResolveError::MissingVariant {
                segment: segment.id.clone(),
                selector: self.selector.selector(variables),
            }),
        }
    }
}

fn presentable(segment: &Segment, variables: &Variables) -> Vec<PresentedChoice> {
    segment
        .choices
        .iter()
        .filter(|c| c.is_presentable(variables))
        .map(|c| PresentedChoice {
            option_index: c.option_index,
            label: c.label.clone(),
        })
        .collect()
}
