//! Source-detail reporting.
//!
//! Turns the final resolution state into a per-attribute breakdown: a
//! `Base` entry, every non-zero contribution in the order it was applied,
//! text lines for ability damage and penalties, then narrative notes.

use crate::path::AttrPath;
use crate::propagate::ResolutionState;
use crate::target::Ability;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Label of the first entry of every breakdown.
pub const BASE_LABEL: &str = "Base";

/// Value of a breakdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Number(i64),
    Text(String),
}

/// One line of an attribute breakdown.
///
/// # Examples
///
/// ```rust
/// use pfstat::report::{DetailValue, SourceDetail};
///
/// let line = SourceDetail::text("Blind", "Lose Dex to AC");
/// assert_eq!(line.value, DetailValue::Text("Lose Dex to AC".into()));
///
/// let json = serde_json::to_string(&SourceDetail::number("Base", 10)).unwrap();
/// assert_eq!(json, r#"{"name":"Base","value":10}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDetail {
    pub name: String,
    pub value: DetailValue,
}

impl SourceDetail {
    pub fn number(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: DetailValue::Number(value),
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: DetailValue::Text(text.into()),
        }
    }
}

/// Build the breakdown of every attribute in `state`.
pub fn source_details(state: &ResolutionState) -> BTreeMap<AttrPath, Vec<SourceDetail>> {
    let mut details: BTreeMap<AttrPath, Vec<SourceDetail>> = state
        .attributes()
        .iter()
        .map(|(path, attr)| {
            let mut lines = vec![SourceDetail::number(BASE_LABEL, attr.base)];
            lines.extend(
                attr.contributions
                    .iter()
                    .filter(|c| c.value != 0)
                    .map(|c| SourceDetail::number(c.label.clone(), c.value)),
            );
            (path.clone(), lines)
        })
        .collect();

    for ability in Ability::iter() {
        let Some(lines) = details.get_mut(&AttrPath::ability_total(ability)) else {
            continue;
        };
        let score = state.score(ability);
        let losses = [
            ("Ability Damage", score.damage),
            ("Ability Penalty", score.penalty),
        ];
        for (label, amount) in losses {
            let lost = amount.div_euclid(2);
            if lost != 0 {
                lines.push(SourceDetail::text(label, format!("{} (Mod only)", -lost)));
            }
        }
    }

    for note in state.notes() {
        if let Some(lines) = details.get_mut(&note.path) {
            lines.push(SourceDetail::text(note.name.clone(), note.text.clone()));
        }
    }
    details
}
