//! State values accumulated by a playthrough and the predicates content uses on them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value stored under a state key.
///
/// Content authors write plain JSON/TOML scalars: `"wizard"` or `true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Flag(bool),
    Text(String),
}

impl StateValue {
    /// Create a text value.
    pub fn text(value: impl Into<String>) -> Self {
        StateValue::Text(value.into())
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            StateValue::Flag(_) => None,
        }
    }

    /// Borrow the flag payload, if this is a flag value.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            StateValue::Flag(b) => Some(*b),
            StateValue::Text(_) => None,
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Flag(value)
    }
}

impl std::fmt::Display for StateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateValue::Flag(b) => write!(f, "{}", b),
            StateValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// State key -> value. Ordered so that snapshots and selectors are deterministic.
pub type Variables = BTreeMap<String, StateValue>;

/// Check that every required key is present with exactly the required value.
///
/// An empty requirement set is always satisfied.
pub fn satisfies(variables: &Variables, requirements: &Variables) -> bool {
    requirements
        .iter()
        .all(|(key, wanted)| variables.get(key) == Some(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_values() {
        let vars: Variables =
            serde_json::from_str(r#"{"class": "wizard", "met_bats": true}"#).unwrap();

        assert_eq!(vars["class"], StateValue::text("wizard"));
        assert_eq!(vars["met_bats"], StateValue::Flag(true));
        assert_eq!(vars["class"].as_text(), Some("wizard"));
        assert_eq!(vars["met_bats"].as_flag(), Some(true));
    }

    #[test]
    fn test_satisfies_exact_match() {
        let mut vars = Variables::new();
        vars.insert("class".into(), "fighter".into());
        vars.insert("met_bats".into(), true.into());

        let mut req = Variables::new();
        assert!(satisfies(&vars, &req));

        req.insert("class".into(), "fighter".into());
        assert!(satisfies(&vars, &req));

        req.insert("met_bats".into(), false.into());
        assert!(!satisfies(&vars, &req));
    }

    #[test]
    fn test_missing_key_is_unsatisfied() {
        let vars = Variables::new();
        let mut req = Variables::new();
        req.insert("companion".into(), "tyradel".into());

        assert!(!satisfies(&vars, &req));
    }

    #[test]
    fn test_flag_and_text_are_distinct() {
        let mut vars = Variables::new();
        vars.insert("lit".into(), "true".into());
        let mut req = Variables::new();
        req.insert("lit".into(), true.into());

        assert!(!satisfies(&vars, &req));
    }
}
