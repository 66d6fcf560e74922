//! Recompute results.
//!
//! Contains `Recomputed`, the full output of one pass: every derived
//! attribute, its breakdown, the resolved flags and the non-fatal formula
//! warnings raised along the way.

use crate::condition::ActorFlags;
use crate::path::AttrPath;
use crate::report::{DetailValue, SourceDetail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A change whose formula failed and contributed zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaWarning {
    pub formula: String,
    /// Compact key of the change's target.
    pub target: String,
    /// Name of the source that declared the change.
    pub source: String,
    pub message: String,
}

/// The result of a recompute pass.
///
/// Read-only and serializable. Every attribute has a breakdown whose
/// `Base` entry plus numeric entries add up to the attribute.
///
/// # Examples
///
/// ```rust
/// use pfstat::actor::Actor;
/// use pfstat::target::Ability;
/// use pfstat::{Engine, Ruleset};
///
/// let engine = Engine::new(Ruleset::pathfinder()).unwrap();
/// let actor = Actor::new("Valeros").with_ability(Ability::Str, 16);
/// let result = engine.recompute(&actor, None).unwrap();
///
/// assert_eq!(result.get("attributes.cmb.total"), Some(3));
/// assert_eq!(result.detail_sum("attributes.cmb.total"), Some(3));
/// assert!(result.warnings.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recomputed {
    pub attributes: BTreeMap<AttrPath, i64>,
    pub source_details: BTreeMap<AttrPath, Vec<SourceDetail>>,
    pub flags: ActorFlags,
    pub warnings: Vec<FormulaWarning>,
}

impl Recomputed {
    /// Value of a derived attribute.
    pub fn get(&self, path: &str) -> Option<i64> {
        self.attributes.get(&AttrPath::new(path)).copied()
    }

    /// Breakdown of a derived attribute.
    pub fn details(&self, path: &str) -> &[SourceDetail] {
        self.source_details
            .get(&AttrPath::new(path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of the numeric entries of an attribute's breakdown.
    pub fn detail_sum(&self, path: &str) -> Option<i64> {
        let details = self.source_details.get(&AttrPath::new(path))?;
        Some(
            details
                .iter()
                .filter_map(|detail| match detail.value {
                    DetailValue::Number(n) => Some(n),
                    DetailValue::Text(_) => None,
                })
                .sum(),
        )
    }
}
