//! Roll data for formula evaluation.
//!
//! `RollData` is a JSON snapshot of the actor's current base and derived
//! values. Formulas read it through `@path` references. Before a change is
//! evaluated the snapshot is redacted so the change cannot observe the
//! attribute it is about to modify.

use crate::path::AttrPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of actor data visible to formulas.
///
/// # Examples
///
/// ```rust
/// use pfstat::RollData;
///
/// let mut data = RollData::new();
/// data.set("abilities.str.mod", 3);
/// data.set("attributes.hd.total", 5);
///
/// assert_eq!(data.number("abilities.str.mod"), Some(3.0));
///
/// let redacted = data.redacted(&["abilities.str"]);
/// assert_eq!(redacted.number("abilities.str.mod"), None);
/// assert_eq!(redacted.number("attributes.hd.total"), Some(5.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollData {
    root: Value,
}

impl Default for RollData {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl RollData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dotted path, creating intermediate objects.
    ///
    /// Values that cannot be serialized are silently not added.
    pub fn set(&mut self, path: &str, value: impl Serialize) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut node = &mut self.root;
        for segment in path.split('.') {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Some(map) = node.as_object_mut() else {
                return;
            };
            node = map.entry(segment.to_string()).or_insert(Value::Null);
        }
        *node = value;
    }

    /// Look up the raw value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path.split('.') {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Look up a number; `null`, missing and non-numeric values yield `None`.
    ///
    /// Booleans read as 0 or 1.
    pub fn number(&self, path: &str) -> Option<f64> {
        match self.get(path)? {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Whether a path resolves to a non-null value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some_and(|value| !value.is_null())
    }

    /// Copy of this snapshot with each listed subtree nulled out.
    pub fn redacted<S: AsRef<str>>(&self, paths: &[S]) -> RollData {
        let mut data = self.clone();
        for path in paths {
            if data.get(path.as_ref()).is_some() {
                data.set(path.as_ref(), Value::Null);
            }
        }
        data
    }

    /// Build a snapshot from flattened attribute totals.
    pub fn from_totals<'a>(totals: impl IntoIterator<Item = (&'a AttrPath, i64)>) -> Self {
        let mut data = Self::new();
        for (path, value) in totals {
            data.set(path.as_str(), value);
        }
        data
    }
}
