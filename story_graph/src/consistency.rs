//! Consistency Checker - offline detection of authoring defects.
//!
//! The checker runs in two passes:
//! 1. **Structure**: every defect [`structural_issues`] finds (not only the first)
//! 2. **State exploration**: a breadth-first walk over `(segment, variables)`
//!    pairs, honouring `requires_state` gating and applying `state_update`,
//!    that reports routes and variants the content cannot resolve
//!
//! Only state keys that influence routing, gating or variant selection are
//! tracked, which keeps the explored space small for real cards. A selector
//! that does not declare its keys gets every key tracked. The walk is
//! still bounded by [`CheckerConfig::max_states`]; a truncated report makes
//! no claim about the unexplored part of the graph. A clean report is
//! evidence, not proof.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::definition::StoryDefinition;
use crate::error::StructuralError;
use crate::graph::StoryGraph;
use crate::segment::{RouteMiss, SegmentId};
use crate::selector::{select_variant, VariantSelector};
use crate::state::{StateValue, Variables};
use crate::validate::{reachable_from_start, structural_issues};

/// Configuration for the state exploration.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Maximum number of `(segment, variables)` pairs to explore.
    pub max_states: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self { max_states: 10_000 }
    }
}

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Playback will fail if this path is taken.
    Error,
    /// Suspicious content that does not break playback.
    Warning,
}

/// A single defect found by the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsistencyIssue {
    Structural(StructuralError),

    /// A variant-routed choice is reachable before its route key is set.
    UnsetRouteKey {
        segment: SegmentId,
        option_index: u32,
        key: String,
    },

    /// A variant-routed choice has no route for a value the key can hold there.
    UncoveredRoute {
        segment: SegmentId,
        option_index: u32,
        key: String,
        value: StateValue,
    },

    /// A varied segment is reachable with a selector none of its variants match.
    MissingVariantCoverage { segment: SegmentId, selector: String },

    /// A segment with choices is reachable in a state where all of them are hidden.
    AllChoicesGated { segment: SegmentId },

    /// Structurally reachable, but no state trajectory gets there.
    StateUnreachable { segment: SegmentId },

    /// The segment defines no audio at all.
    NoAudio { segment: SegmentId },
}

impl ConsistencyIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            ConsistencyIssue::StateUnreachable { .. } | ConsistencyIssue::NoAudio { .. } => {
                IssueSeverity::Warning
            }
            _ => IssueSeverity::Error,
        }
    }

    /// The segment the issue is reported against.
    pub fn segment(&self) -> &SegmentId {
        match self {
            ConsistencyIssue::Structural(e) => &e.segment,
            ConsistencyIssue::UnsetRouteKey { segment, .. }
            | ConsistencyIssue::UncoveredRoute { segment, .. }
            | ConsistencyIssue::MissingVariantCoverage { segment, .. }
            | ConsistencyIssue::AllChoicesGated { segment }
            | ConsistencyIssue::StateUnreachable { segment }
            | ConsistencyIssue::NoAudio { segment } => segment,
        }
    }
}

impl std::fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyIssue::Structural(e) => write!(f, "{}", e),
            ConsistencyIssue::UnsetRouteKey {
                segment,
                option_index,
                key,
            } => write!(
                f,
                "segment {} option {} routes on '{}' before it is ever set",
                segment, option_index, key
            ),
            ConsistencyIssue::UncoveredRoute {
                segment,
                option_index,
                key,
                value,
            } => write!(
                f,
                "segment {} option {} has no route for {}={}",
                segment, option_index, key, value
            ),
            ConsistencyIssue::MissingVariantCoverage { segment, selector } => write!(
                f,
                "segment {} has no audio variant for selector '{}'",
                segment, selector
            ),
            ConsistencyIssue::AllChoicesGated { segment } => write!(
                f,
                "segment {} can be reached with every choice hidden",
                segment
            ),
            ConsistencyIssue::StateUnreachable { segment } => write!(
                f,
                "segment {} is linked but no reachable state leads to it",
                segment
            ),
            ConsistencyIssue::NoAudio { segment } => {
                write!(f, "segment {} has no audio", segment)
            }
        }
    }
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub issues: Vec<ConsistencyIssue>,
    /// Number of `(segment, variables)` pairs visited.
    pub explored_states: usize,
    /// The exploration hit `max_states` before finishing.
    pub truncated: bool,
}

impl ConsistencyReport {
    /// Check if no issue of any severity was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConsistencyIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConsistencyIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == IssueSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Static checker for story definitions.
pub struct ConsistencyChecker {
    config: CheckerConfig,
}

impl ConsistencyChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CheckerConfig::default())
    }

    /// Check a definition using the selector its conventions describe.
    pub fn check(&self, definition: &StoryDefinition) -> ConsistencyReport {
        let graph = StoryGraph::assemble(definition);
        let selector = graph.default_selector();
        self.run(definition, &graph, &selector)
    }

    /// Check a definition with a caller-supplied selector.
    pub fn check_with<S: VariantSelector + ?Sized>(
        &self,
        definition: &StoryDefinition,
        selector: &S,
    ) -> ConsistencyReport {
        let graph = StoryGraph::assemble(definition);
        self.run(definition, &graph, selector)
    }

    fn run<S: VariantSelector + ?Sized>(
        &self,
        definition: &StoryDefinition,
        graph: &StoryGraph,
        selector: &S,
    ) -> ConsistencyReport {
        let mut report = ConsistencyReport {
            issues: structural_issues(definition)
                .into_iter()
                .map(ConsistencyIssue::Structural)
                .collect(),
            ..Default::default()
        };

        report.issues.extend(
            graph
                .segments()
                .filter(|s| s.variants.is_empty())
                .map(|s| ConsistencyIssue::NoAudio {
                    segment: s.id.clone(),
                }),
        );

        let tracked = tracked_keys(graph, selector);
        let mut found = BTreeSet::new();
        let mut reached: HashSet<SegmentId> = HashSet::new();
        let mut visited: HashSet<(SegmentId, Variables)> = HashSet::new();
        let mut queue = VecDeque::new();

        if graph.contains(graph.start().as_str()) {
            queue.push_back((graph.start().clone(), Variables::new()));
        }

        while let Some((id, vars)) = queue.pop_front() {
            if !visited.insert((id.clone(), vars.clone())) {
                continue;
            }
            if visited.len() > self.config.max_states {
                report.truncated = true;
                tracing::warn!(
                    max_states = self.config.max_states,
                    "consistency exploration truncated"
                );
                break;
            }

            let Some(segment) = graph.get(id.as_str()) else {
                continue;
            };
            reached.insert(id.clone());

            if !segment.variants.is_empty() && select_variant(selector, segment, &vars).is_none() {
                record(
                    &mut report,
                    &mut found,
                    ConsistencyIssue::MissingVariantCoverage {
                        segment: id.clone(),
                        selector: selector.selector(&vars),
                    },
                );
            }

            if segment.choices.is_empty() {
                if let Some(next) = &segment.auto_next {
                    queue.push_back((next.clone(), vars));
                }
                continue;
            }

            let mut any_presentable = false;
            for choice in segment.choices.iter().filter(|c| c.is_presentable(&vars)) {
                any_presentable = true;

                let target = match choice.target.route(graph.route_key(), &vars) {
                    Ok(target) => target.clone(),
                    Err(RouteMiss::Unset) => {
                        record(
                            &mut report,
                            &mut found,
                            ConsistencyIssue::UnsetRouteKey {
                                segment: id.clone(),
                                option_index: choice.option_index,
                                key: graph.route_key().to_string(),
                            },
                        );
                        continue;
                    }
                    Err(RouteMiss::Uncovered(value)) => {
                        record(
                            &mut report,
                            &mut found,
                            ConsistencyIssue::UncoveredRoute {
                                segment: id.clone(),
                                option_index: choice.option_index,
                                key: graph.route_key().to_string(),
                                value,
                            },
                        );
                        continue;
                    }
                };

                let mut next_vars = vars.clone();
                next_vars.extend(
                    choice
                        .state_update
                        .iter()
                        .filter(|(k, _)| tracked.as_ref().map_or(true, |t| t.contains(k.as_str())))
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
                queue.push_back((target, next_vars));
            }

            if !any_presentable {
                record(
                    &mut report,
                    &mut found,
                    ConsistencyIssue::AllChoicesGated { segment: id.clone() },
                );
            }
        }

        report.explored_states = visited.len().min(self.config.max_states);

        if !report.truncated {
            let mut linked: Vec<_> = reachable_from_start(definition).into_iter().collect();
            linked.sort_unstable();
            for id in linked {
                if !reached.contains(id) {
                    report.issues.push(ConsistencyIssue::StateUnreachable {
                        segment: SegmentId::new(id),
                    });
                }
            }
        }

        tracing::info!(
            issues = report.issues.len(),
            explored = report.explored_states,
            truncated = report.truncated,
            "consistency check finished"
        );
        report
    }
}

/// Keys that influence routing, gating or variant selection, `None` for all keys.
fn tracked_keys<S: VariantSelector + ?Sized>(
    graph: &StoryGraph,
    selector: &S,
) -> Option<HashSet<String>> {
    let mut keys: HashSet<String> = selector.keys()?.into_iter().collect();
    keys.insert(graph.route_key().to_string());
    for segment in graph.segments() {
        for choice in &segment.choices {
            keys.extend(choice.requires_state.keys().cloned());
        }
    }
    Some(keys)
}

fn record(report: &mut ConsistencyReport, found: &mut BTreeSet<String>, issue: ConsistencyIssue) {
    if found.insert(issue.to_string()) {
        tracing::debug!(segment = %issue.segment(), "{}", issue);
        report.issues.push(issue);
    }
}
