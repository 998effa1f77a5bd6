//! Serialized story definitions, as produced by content tooling.
//!
//! A definition is the loose, author-facing shape of a story: choices carry
//! `target` and `targets_by_variant` side by side and nothing is checked yet.
//! [`StoryGraph::load`](crate::StoryGraph::load) turns it into the strict
//! runtime form.
//!
//! ```toml
//! start = "01"
//!
//! [conventions]
//! route_key = "class"
//!
//! [[segments]]
//! id = "01"
//! auto_next = "02"
//! variants = { "" = { track = "01.mp3", duration_secs = 42 } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::GraphError;
use crate::segment::AudioRef;
use crate::state::Variables;

/// Default state key that `targets_by_variant` dispatches on.
pub const DEFAULT_ROUTE_KEY: &str = "class";

/// A complete story definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDefinition {
    pub start: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub conventions: Conventions,

    pub segments: Vec<SegmentDefinition>,
}

/// Graph-level conventions: how state turns into routes and audio variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// State key whose value selects among `targets_by_variant`.
    pub route_key: String,

    /// Ordered dimensions concatenated into the audio variant selector.
    pub variant_dimensions: Vec<VariantDimension>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            route_key: DEFAULT_ROUTE_KEY.to_string(),
            variant_dimensions: vec![VariantDimension::abbreviated(DEFAULT_ROUTE_KEY)],
        }
    }
}

/// One state key contributing a tag to the variant selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDimension {
    pub key: String,

    /// Explicit value -> tag mapping, checked first.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Unmapped values contribute their upper-cased initial instead of the whole value.
    #[serde(default)]
    pub abbreviate: bool,
}

impl VariantDimension {
    /// A dimension that uses values verbatim (`"1"`, `"2"`, ...).
    pub fn verbatim(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tags: BTreeMap::new(),
            abbreviate: false,
        }
    }

    /// A dimension that abbreviates values to their initial (`wizard` -> `W`).
    pub fn abbreviated(key: impl Into<String>) -> Self {
        Self {
            abbreviate: true,
            ..Self::verbatim(key)
        }
    }

    /// Add an explicit tag for a value.
    pub fn with_tag(mut self, value: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tags.insert(value.into(), tag.into());
        self
    }
}

/// Author-facing segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub variants: BTreeMap<String, AudioRef>,

    #[serde(default)]
    pub choices: Vec<ChoiceDefinition>,

    #[serde(default)]
    pub auto_next: Option<String>,

    #[serde(default)]
    pub is_ending: bool,
}

/// Author-facing choice. Exactly one of `target` / `targets_by_variant` must be set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoiceDefinition {
    /// Defaults to the choice's 1-based position in the list.
    #[serde(default)]
    pub option_index: Option<u32>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub targets_by_variant: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub state_update: Variables,

    #[serde(default)]
    pub requires_state: Variables,
}

impl StoryDefinition {
    /// Parse a JSON definition.
    pub fn from_json_str(input: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a TOML definition.
    pub fn from_toml_str(input: &str) -> Result<Self, GraphError> {
        Ok(toml::from_str(input)?)
    }

    /// Read a definition from disk, picking the parser from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            other => Err(GraphError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Find a segment definition by id.
    pub fn segment(&self, id: &str) -> Option<&SegmentDefinition> {
        self.segments.iter().find(|s| s.id == id)
    }
}

impl ChoiceDefinition {
    /// The option index, defaulting to `position + 1`.
    pub fn resolved_index(&self, position: usize) -> u32 {
        self.option_index
            .unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX))
    }

    /// Every target named by this choice, flat or per variant.
    pub fn referenced_targets(&self) -> impl Iterator<Item = &str> {
        self.target.as_deref().into_iter().chain(
            self.targets_by_variant
                .iter()
                .flat_map(|map| map.values().map(String::as_str)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateValue;

    const TOML_STORY: &str = r#"
start = "01"
title = "The Cursed Crypt"

[conventions]
route_key = "class"

[[conventions.variant_dimensions]]
key = "class"
abbreviate = true

[[conventions.variant_dimensions]]
key = "path"

[[segments]]
id = "01"
auto_next = "02"
variants = { "" = { track = "01.mp3", duration_secs = 42 } }

[[segments]]
id = "02"
variants = { "" = { track = "02.mp3", duration_secs = 61 } }

[[segments.choices]]
label = "Wizard"
target = "03"
state_update = { class = "wizard" }

[[segments.choices]]
label = "Fighter"
target = "03"
state_update = { class = "fighter" }

[[segments]]
id = "03"
is_ending = true
variants = { F = { track = "03F.mp3", duration_secs = 272 }, W = { track = "03W.mp3", duration_secs = 579 } }
"#;

    #[test]
    fn test_parse_toml() {
        let def = StoryDefinition::from_toml_str(TOML_STORY).unwrap();

        assert_eq!(def.start, "01");
        assert_eq!(def.segments.len(), 3);
        assert_eq!(def.conventions.variant_dimensions.len(), 2);
        assert!(def.conventions.variant_dimensions[0].abbreviate);

        let seg = def.segment("02").unwrap();
        assert_eq!(seg.choices.len(), 2);
        assert_eq!(seg.choices[1].resolved_index(1), 2);
        assert_eq!(
            seg.choices[0].state_update.get("class"),
            Some(&StateValue::text("wizard"))
        );
        assert!(def.segment("03").unwrap().is_ending);
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let def = StoryDefinition::from_json_str(
            r#"{
                "start": "01",
                "segments": [
                    {"id": "01", "is_ending": true, "variants": {"": {"track": "01.mp3"}}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(def.conventions, Conventions::default());
        assert_eq!(def.conventions.route_key, "class");
        assert_eq!(def.segments[0].variants[""].duration_secs, 0);
    }

    #[test]
    fn test_malformed_json() {
        let err = StoryDefinition::from_json_str("{\"start\": 1}").unwrap_err();
        assert!(matches!(err, GraphError::Json(_)));
    }

    #[test]
    fn test_referenced_targets() {
        let choice = ChoiceDefinition {
            target: Some("05".into()),
            targets_by_variant: Some(BTreeMap::from([
                ("fighter".to_string(), "09".to_string()),
                ("wizard".to_string(), "10".to_string()),
            ])),
            ..Default::default()
        };

        let targets: Vec<_> = choice.referenced_targets().collect();
        assert_eq!(targets, vec!["05", "09", "10"]);
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let dir = std::env::temp_dir().join(format!("story_graph_def_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("story.yaml");
        std::fs::write(&path, "start: 01").unwrap();

        let err = StoryDefinition::from_path(&path).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedFormat(ref ext) if ext == "yaml"));

        let toml_path = dir.join("story.toml");
        std::fs::write(&toml_path, TOML_STORY).unwrap();
        assert_eq!(StoryDefinition::from_path(&toml_path).unwrap().start, "01");

        std::fs::remove_dir_all(&dir).ok();
    }
}
