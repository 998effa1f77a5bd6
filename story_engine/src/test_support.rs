//! Story fixtures shared by the unit tests.

use serde_json::json;
use story_graph::{StoryDefinition, StoryGraph};

pub(crate) fn graph_from(value: serde_json::Value) -> StoryGraph {
    let definition: StoryDefinition = serde_json::from_value(value).unwrap();
    StoryGraph::load(&definition).unwrap()
}

fn unvaried(track: &str, secs: u32) -> serde_json::Value {
    json!({"": {"track": track, "duration_secs": secs}})
}

/// A linear intro `01 -> 02 -> 03 -> 04` ending in a class choice.
pub(crate) fn dnd_graph() -> StoryGraph {
    graph_from(json!({
        "start": "01",
        "segments": [
            {"id": "01", "auto_next": "02", "variants": unvaried("01.mp3", 40)},
            {"id": "02", "auto_next": "03", "variants": unvaried("02.mp3", 35)},
            {"id": "03", "auto_next": "04", "variants": unvaried("03.mp3", 50)},
            {"id": "04", "variants": unvaried("04.mp3", 20), "choices": [
                {"label": "Wizard", "target": "05", "state_update": {"class": "wizard"}},
                {"label": "Fighter", "target": "09", "state_update": {"class": "fighter"}}
            ]},
            {"id": "05", "is_ending": true, "variants": {"W": {"track": "05W.mp3", "duration_secs": 90}}},
            {"id": "09", "is_ending": true, "variants": {"F": {"track": "09F.mp3", "duration_secs": 80}}}
        ]
    }))
}

/// Class choice, class-gated branch, companion camp, and a reunion at 63.
pub(crate) fn crypt_graph() -> StoryGraph {
    graph_from(json!({
        "start": "01",
        "title": "The Cursed Crypt",
        "segments": [
            {"id": "01", "variants": unvaried("01.mp3", 45), "choices": [
                {"label": "Fighter", "target": "30", "state_update": {"class": "fighter"}},
                {"label": "Wizard", "target": "30", "state_update": {"class": "wizard"}}
            ]},
            {"id": "30", "variants": {
                "F": {"track": "30F.mp3", "duration_secs": 120},
                "W": {"track": "30W.mp3", "duration_secs": 131}
            }, "choices": [
                {"label": "Descend into the crypt", "target": "57"},
                {"label": "Make camp", "target": "40"},
                {"label": "Read the runes", "target": "44", "requires_state": {"class": "wizard"}}
            ]},
            {"id": "40", "variants": unvaried("40.mp3", 66), "choices": [
                {"label": "Bats", "target": "63", "state_update": {"companion": "bats"}},
                {"label": "Tyradel", "target": "63", "state_update": {"companion": "tyradel"}}
            ]},
            {"id": "44", "auto_next": "63", "variants": unvaried("44.mp3", 73)},
            {"id": "57", "auto_next": "63", "variants": {
                "F": {"track": "trackA", "duration_secs": 272},
                "W": {"track": "trackB", "duration_secs": 579}
            }},
            {"id": "63", "variants": {
                "F": {"track": "63F.mp3", "duration_secs": 201},
                "W": {"track": "63W.mp3", "duration_secs": 188}
            }, "choices": [
                {"label": "Fight", "targets_by_variant": {"fighter": "70", "wizard": "71"}},
                {"label": "Flee", "target": "90"}
            ]},
            {"id": "70", "is_ending": true, "variants": unvaried("70.mp3", 95)},
            {"id": "71", "is_ending": true, "variants": unvaried("71.mp3", 102)},
            {"id": "90", "is_ending": true, "variants": unvaried("90.mp3", 30)}
        ]
    }))
}
