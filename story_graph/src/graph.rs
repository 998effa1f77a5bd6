//! Story Graph - the immutable, validated form of a story definition.

use std::collections::BTreeMap;
use std::path::Path;

use crate::definition::{ChoiceDefinition, Conventions, SegmentDefinition, StoryDefinition};
use crate::error::{GraphError, SegmentNotFound, StructuralError};
use crate::segment::{Choice, ChoiceTarget, Segment, SegmentId};
use crate::selector::KeyedSelector;
use crate::validate::structural_issues;

/// The immutable definition of all segments and choices for one interactive card.
///
/// A `StoryGraph` can only be obtained through [`StoryGraph::load`], which
/// rejects definitions with structural defects. It is never mutated after
/// that and can be shared freely between playthroughs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryGraph {
    title: Option<String>,
    start: SegmentId,
    conventions: Conventions,
    segments: BTreeMap<SegmentId, Segment>,
}

impl StoryGraph {
    /// Validate a definition and build the graph from it.
    ///
    /// Fails with the first structural defect found. Use
    /// [`structural_issues`] or the consistency checker to list all of them.
    pub fn load(definition: &StoryDefinition) -> Result<Self, StructuralError> {
        if let Some(first) = structural_issues(definition).into_iter().next() {
            tracing::warn!(error = %first, "rejected story definition");
            return Err(first);
        }

        let graph = Self::assemble(definition);
        tracing::info!(
            start = %graph.start,
            segments = graph.segments.len(),
            "story graph loaded"
        );
        Ok(graph)
    }

    /// Parse and load a JSON definition.
    pub fn from_json_str(input: &str) -> Result<Self, GraphError> {
        let definition = StoryDefinition::from_json_str(input)?;
        Ok(Self::load(&definition)?)
    }

    /// Parse and load a TOML definition.
    pub fn from_toml_str(input: &str) -> Result<Self, GraphError> {
        let definition = StoryDefinition::from_toml_str(input)?;
        Ok(Self::load(&definition)?)
    }

    /// Read, parse and load a definition file (`.json` or `.toml`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let definition = StoryDefinition::from_path(path)?;
        Ok(Self::load(&definition)?)
    }

    /// Build the graph without validating it.
    ///
    /// Ambiguous choices keep their flat `target` when one is set and are
    /// dropped when neither target is set. Later duplicates of a segment id
    /// are ignored. Only the consistency checker works on unvalidated graphs.
    pub(crate) fn assemble(definition: &StoryDefinition) -> Self {
        let mut segments = BTreeMap::new();
        for seg in &definition.segments {
            let id = SegmentId::new(seg.id.as_str());
            segments
                .entry(id)
                .or_insert_with(|| convert_segment(seg));
        }

        Self {
            title: definition.title.clone(),
            start: SegmentId::new(definition.start.as_str()),
            conventions: definition.conventions.clone(),
            segments,
        }
    }

    /// Get a segment by id.
    pub fn segment(&self, id: &str) -> Result<&Segment, SegmentNotFound> {
        self.segments
            .get(id)
            .ok_or_else(|| SegmentNotFound(SegmentId::new(id)))
    }

    /// Get a segment by id, if it exists.
    pub fn get(&self, id: &str) -> Option<&Segment> {
        self.segments.get(id)
    }

    /// Check if a segment exists.
    pub fn contains(&self, id: &str) -> bool {
        self.segments.contains_key(id)
    }

    pub fn start(&self) -> &SegmentId {
        &self.start
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// The state key `targets_by_variant` dispatches on.
    pub fn route_key(&self) -> &str {
        &self.conventions.route_key
    }

    /// The selector described by this graph's conventions.
    pub fn default_selector(&self) -> KeyedSelector {
        KeyedSelector::from_conventions(&self.conventions)
    }

    /// All segments, ordered by id.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Segments flagged as endings.
    pub fn endings(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values().filter(|s| s.is_ending)
    }

    /// Get the total number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

fn convert_segment(def: &SegmentDefinition) -> Segment {
    Segment {
        id: SegmentId::new(def.id.as_str()),
        title: def.title.clone(),
        variants: def.variants.clone(),
        choices: def
            .choices
            .iter()
            .enumerate()
            .filter_map(|(position, choice)| convert_choice(position, choice))
            .collect(),
        auto_next: def.auto_next.as_deref().map(SegmentId::from),
        is_ending: def.is_ending,
    }
}

fn convert_choice(position: usize, def: &ChoiceDefinition) -> Option<Choice> {
    let target = match (&def.target, &def.targets_by_variant) {
        (Some(target), _) => ChoiceTarget::Fixed(SegmentId::new(target.as_str())),
        (None, Some(map)) if !map.is_empty() => ChoiceTarget::ByVariant(
            map.iter()
                .map(|(value, target)| (value.clone(), SegmentId::new(target.as_str())))
                .collect(),
        ),
        _ => return None,
    };

    Some(Choice {
        option_index: def.resolved_index(position),
        label: def.label.clone(),
        target,
        state_update: def.state_update.clone(),
        requires_state: def.requires_state.clone(),
    })
}
