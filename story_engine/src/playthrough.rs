//! Playthrough - one listening session bound to a shared story graph.

use std::sync::Arc;

use story_graph::{KeyedSelector, StoryGraph, VariantSelector};

use crate::player_state::{PlaythroughId, PlayerState};
use crate::resolver::{PresentedChoice, Resolution, ResolveError, Resolver};

/// A single playthrough: the shared graph, a resolver and the state it owns.
///
/// Each playthrough is driven by one task. Graphs are shared read-only
/// through `Arc`, so any number of playthroughs can run side by side.
pub struct Playthrough<S = KeyedSelector> {
    graph: Arc<StoryGraph>,
    resolver: Resolver<S>,
    state: PlayerState,
    finished: bool,
}

impl Playthrough<KeyedSelector> {
    /// Start a new playthrough with the graph's own variant conventions.
    pub fn start(graph: Arc<StoryGraph>) -> Self {
        let resolver = Resolver::for_graph(&graph);
        Self::with_resolver(graph, resolver)
    }
}

impl<S: VariantSelector> Playthrough<S> {
    /// Start a new playthrough with a custom resolver.
    pub fn with_resolver(graph: Arc<StoryGraph>, resolver: Resolver<S>) -> Self {
        let state = PlayerState::create(&graph);
        tracing::debug!(playthrough = %state.id(), start = %state.current_segment(), "playthrough started");
        Self {
            graph,
            resolver,
            state,
            finished: false,
        }
    }

    /// Continue a persisted playthrough.
    ///
    /// Fails if the saved position no longer exists in the graph.
    pub fn resume(
        graph: Arc<StoryGraph>,
        resolver: Resolver<S>,
        state: PlayerState,
    ) -> Result<Self, ResolveError> {
        graph.segment(state.current_segment().as_str())?;
        tracing::debug!(playthrough = %state.id(), at = %state.current_segment(), "playthrough resumed");
        Ok(Self {
            graph,
            resolver,
            state,
            finished: false,
        })
    }

    pub fn id(&self) -> PlaythroughId {
        self.state.id()
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Give up the state, e.g. to persist it.
    pub fn into_state(self) -> PlayerState {
        self.state
    }

    /// Check if an ending has been played out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Audio and choices for the current segment.
    pub fn opening(&self) -> Result<Resolution, ResolveError> {
        self.resolver.opening(&self.graph, &self.state)
    }

    pub fn presentable_choices(&self) -> Result<Vec<PresentedChoice>, ResolveError> {
        self.resolver.presentable_choices(&self.graph, &self.state)
    }

    /// Take an option at the current segment.
    pub fn choose(&mut self, option_index: u32) -> Result<Resolution, ResolveError> {
        self.step(Some(option_index))
    }

    /// Follow the current segment's `auto_next`, or finish at an ending.
    pub fn advance(&mut self) -> Result<Resolution, ResolveError> {
        self.step(None)
    }

    /// Resolve one step. See [`Resolver::resolve`].
    pub fn step(&mut self, choice_index: Option<u32>) -> Result<Resolution, ResolveError> {
        let resolution = self
            .resolver
            .resolve(&self.graph, &mut self.state, choice_index)?;
        if resolution.ended {
            self.finished = true;
        }
        Ok(resolution)
    }
}
