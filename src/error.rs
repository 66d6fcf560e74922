//! Error types for stat recomputation.
//!
//! All errors that can occur while evaluating formulas, validating a
//! ruleset or applying pending edits are represented by the `StatError`
//! enum.

use crate::target::ChangeCategory;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[ChangeCategory]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|category| category.as_ref())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur during recomputation.
///
/// Only `InvalidEdit` ever escapes [`Engine::recompute`](crate::Engine::recompute);
/// formula errors are caught per change and reported as warnings.
///
/// # Examples
///
/// ```rust
/// use pfstat::StatError;
///
/// let err = StatError::UnknownTarget("wings".to_string());
/// assert_eq!(err.to_string(), "Unknown change target: wings");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
    /// A formula could not be parsed or evaluated.
    #[error("Invalid formula `{formula}`: {reason}")]
    Formula { formula: String, reason: String },

    /// A formula referenced roll data that is missing or redacted.
    #[error("Unknown reference @{path} in formula `{formula}`")]
    UnknownReference { formula: String, path: String },

    /// The ruleset's category dependencies form a cycle.
    ///
    /// Contains the categories involved, with the first repeated at the end.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<ChangeCategory> },

    /// A pending-edit overlay did not produce a valid actor.
    #[error("Invalid pending edit: {0}")]
    InvalidEdit(String),

    /// The ruleset is structurally unusable.
    #[error("Invalid ruleset: {0}")]
    InvalidRuleset(String),

    /// A change target string did not name a known target.
    #[error("Unknown change target: {0}")]
    UnknownTarget(String),
}

impl From<serde_json::Error> for StatError {
    fn from(err: serde_json::Error) -> Self {
        StatError::InvalidEdit(err.to_string())
    }
}
