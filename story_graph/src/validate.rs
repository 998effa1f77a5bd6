//! Structural validation of story definitions.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::definition::{ChoiceDefinition, StoryDefinition};
use crate::error::{StructuralError, StructuralErrorKind};

/// Collect every structural defect in a definition, in a stable order.
///
/// Per-segment defects come first, in definition order, followed by the
/// reachability pass. An empty result means the definition loads.
pub fn structural_issues(definition: &StoryDefinition) -> Vec<StructuralError> {
    let mut issues = Vec::new();

    let mut known: HashSet<&str> = HashSet::new();
    for seg in &definition.segments {
        if !known.insert(seg.id.as_str()) {
            issues.push(StructuralError::new(
                StructuralErrorKind::DuplicateSegment,
                seg.id.as_str(),
                "segment id is defined more than once",
            ));
        }
    }

    if !known.contains(definition.start.as_str()) {
        issues.push(StructuralError::new(
            StructuralErrorKind::UnknownStart,
            definition.start.as_str(),
            "start segment does not exist",
        ));
    }

    for seg in &definition.segments {
        if let Some(next) = &seg.auto_next {
            if !known.contains(next.as_str()) {
                issues.push(StructuralError::new(
                    StructuralErrorKind::DanglingReference,
                    seg.id.as_str(),
                    format!("auto_next {} does not exist", next),
                ));
            }
        }

        let mut seen_indices = HashSet::new();
        for (position, choice) in seg.choices.iter().enumerate() {
            let index = choice.resolved_index(position);

            if index == 0 {
                issues.push(
                    StructuralError::new(
                        StructuralErrorKind::InvalidOptionIndex,
                        seg.id.as_str(),
                        "option indices start at 1",
                    )
                    .at_option(index),
                );
            }

            if !seen_indices.insert(index) {
                issues.push(
                    StructuralError::new(
                        StructuralErrorKind::DuplicateOptionIndex,
                        seg.id.as_str(),
                        "option index is used by an earlier choice",
                    )
                    .at_option(index),
                );
            }

            if let Some(detail) = ambiguity(choice) {
                issues.push(
                    StructuralError::new(
                        StructuralErrorKind::AmbiguousChoiceTarget,
                        seg.id.as_str(),
                        detail,
                    )
                    .at_option(index),
                );
            }

            for target in choice.referenced_targets() {
                if !known.contains(target) {
                    issues.push(
                        StructuralError::new(
                            StructuralErrorKind::DanglingReference,
                            seg.id.as_str(),
                            format!("target {} does not exist", target),
                        )
                        .at_option(index),
                    );
                }
            }
        }

        let has_exits = !seg.choices.is_empty() || seg.auto_next.is_some();
        if !has_exits && !seg.is_ending {
            issues.push(StructuralError::new(
                StructuralErrorKind::UnmarkedEnding,
                seg.id.as_str(),
                "segment has no choices and no auto_next but is not flagged is_ending",
            ));
        }
        if has_exits && seg.is_ending {
            issues.push(StructuralError::new(
                StructuralErrorKind::ContradictoryEnding,
                seg.id.as_str(),
                "segment is flagged is_ending but has outgoing edges",
            ));
        }
    }

    let reachable = reachable_from_start(definition);
    let mut reported = BTreeSet::new();
    for seg in &definition.segments {
        if !reachable.contains(seg.id.as_str()) && reported.insert(seg.id.as_str()) {
            issues.push(StructuralError::new(
                StructuralErrorKind::UnreachableSegment,
                seg.id.as_str(),
                format!("no path from start segment {}", definition.start),
            ));
        }
    }

    issues
}

/// Breadth-first traversal from `start` over `auto_next` and every choice target,
/// taking the union across variants. Dangling targets are skipped.
pub fn reachable_from_start(definition: &StoryDefinition) -> HashSet<&str> {
    let by_id: HashMap<&str, _> = definition
        .segments
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    if by_id.contains_key(definition.start.as_str()) {
        visited.insert(definition.start.as_str());
        queue.push_back(definition.start.as_str());
    }

    while let Some(id) = queue.pop_front() {
        let Some(seg) = by_id.get(id) else {
            continue;
        };

        let next = seg.auto_next.as_deref().into_iter().chain(
            seg.choices
                .iter()
                .flat_map(|c| c.referenced_targets()),
        );

        for target in next {
            if by_id.contains_key(target) && visited.insert(target) {
                queue.push_back(target);
            }
        }
    }

    visited
}

fn ambiguity(choice: &ChoiceDefinition) -> Option<&'static str> {
    match (&choice.target, &choice.targets_by_variant) {
        (Some(_), Some(_)) => Some("both target and targets_by_variant are set"),
        (None, None) => Some("neither target nor targets_by_variant is set"),
        (None, Some(map)) if map.is_empty() => Some("targets_by_variant is empty"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(value: serde_json::Value) -> StoryDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn kinds(issues: &[StructuralError]) -> Vec<StructuralErrorKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_clean_definition() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "auto_next": "02"},
                {"id": "02", "choices": [{"target": "03"}, {"target": "01"}]},
                {"id": "03", "is_ending": true}
            ]
        }));

        assert!(structural_issues(&def).is_empty());
        assert_eq!(reachable_from_start(&def).len(), 3);
    }

    #[test]
    fn test_dangling_reference_names_choice() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "choices": [
                    {"target": "02"},
                    {"targets_by_variant": {"wizard": "02", "fighter": "99"}}
                ]},
                {"id": "02", "is_ending": true}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(kinds(&issues), vec![StructuralErrorKind::DanglingReference]);
        assert_eq!(issues[0].segment.as_str(), "01");
        assert_eq!(issues[0].option_index, Some(2));
    }

    #[test]
    fn test_unreachable_segment() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "is_ending": true},
                {"id": "88", "is_ending": true}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(kinds(&issues), vec![StructuralErrorKind::UnreachableSegment]);
        assert_eq!(issues[0].segment.as_str(), "88");
    }

    #[test]
    fn test_reachability_unions_variant_targets() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "choices": [{"targets_by_variant": {"wizard": "05", "fighter": "09"}}]},
                {"id": "05", "is_ending": true},
                {"id": "09", "is_ending": true}
            ]
        }));

        assert!(structural_issues(&def).is_empty());
    }

    #[test]
    fn test_ambiguous_targets() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "choices": [
                    {"target": "02", "targets_by_variant": {"wizard": "02"}},
                    {"label": "nowhere"}
                ]},
                {"id": "02", "is_ending": true}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(
            kinds(&issues),
            vec![
                StructuralErrorKind::AmbiguousChoiceTarget,
                StructuralErrorKind::AmbiguousChoiceTarget
            ]
        );
        assert_eq!(issues[1].option_index, Some(2));
    }

    #[test]
    fn test_empty_variant_map_counts_as_set() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "choices": [
                    {"target": "02", "targets_by_variant": {}},
                    {"targets_by_variant": {}}
                ]},
                {"id": "02", "is_ending": true}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(
            kinds(&issues),
            vec![
                StructuralErrorKind::AmbiguousChoiceTarget,
                StructuralErrorKind::AmbiguousChoiceTarget
            ]
        );
        assert_eq!(issues[0].detail, "both target and targets_by_variant are set");
        assert_eq!(issues[1].detail, "targets_by_variant is empty");
    }

    #[test]
    fn test_option_index_zero_is_rejected() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "choices": [
                    {"option_index": 0, "target": "02"},
                    {"option_index": 1, "target": "02"}
                ]},
                {"id": "02", "is_ending": true}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(kinds(&issues), vec![StructuralErrorKind::InvalidOptionIndex]);
        assert_eq!(issues[0].segment.as_str(), "01");
        assert_eq!(issues[0].option_index, Some(0));
    }

    #[test]
    fn test_ending_flags() {
        let def = definition(json!({
            "start": "01",
            "segments": [
                {"id": "01", "auto_next": "02", "is_ending": true},
                {"id": "02"}
            ]
        }));

        let issues = structural_issues(&def);
        assert_eq!(
            kinds(&issues),
            vec![
                StructuralErrorKind::ContradictoryEnding,
                StructuralErrorKind::UnmarkedEnding
            ]
        );
    }

    #[test]
    fn test_duplicates_and_unknown_start() {
        let def = definition(json!({
            "start": "00",
            "segments": [
                {"id": "01", "choices": [
                    {"option_index": 1, "target": "01"},
                    {"option_index": 1, "target": "01"}
                ]},
                {"id": "01", "is_ending": true}
            ]
        }));

        let found = kinds(&structural_issues(&def));
        assert!(found.contains(&StructuralErrorKind::DuplicateSegment));
        assert!(found.contains(&StructuralErrorKind::UnknownStart));
        assert!(found.contains(&StructuralErrorKind::DuplicateOptionIndex));
        assert!(found.contains(&StructuralErrorKind::UnreachableSegment));
    }
}
