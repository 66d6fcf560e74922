//! Change sources.
//!
//! Every change remembers where it came from. The descriptor is used both
//! as a merge key for stacking kinds and to derive the label shown in the
//! per-attribute breakdown.

use crate::item::ItemKind;
use serde::{Deserialize, Serialize};

/// What produced a change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Item(ItemKind),
    Size,
    Condition,
    /// Built-in rules such as Constitution to hit points.
    Rule,
}

/// Descriptor of a change's origin.
///
/// Two descriptors with the same `(kind, subtype)` share a merge key; for
/// stacking kinds their contributions collapse into a single source entry.
///
/// # Examples
///
/// ```rust
/// use pfstat::item::ItemKind;
/// use pfstat::source::{SourceDescriptor, SourceKind};
///
/// let haste = SourceDescriptor::item(ItemKind::Buff, Some("temp"), "Haste");
/// let bless = SourceDescriptor::item(ItemKind::Buff, Some("temp"), "Bless");
/// assert_eq!(haste.merge_key(), bless.merge_key());
///
/// let size = SourceDescriptor::new(SourceKind::Size, None, "Size");
/// assert_ne!(size.merge_key(), haste.merge_key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl SourceDescriptor {
    /// Create a descriptor.
    ///
    /// # Arguments
    ///
    /// * `kind` - What kind of thing declared the change
    /// * `subtype` - Optional refinement of the kind, part of the merge key
    /// * `name` - Display name shown when no label rule matches
    pub fn new(kind: SourceKind, subtype: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: subtype.map(str::to_string),
            name: name.into(),
        }
    }

    /// Descriptor for a change declared on an item.
    pub fn item(kind: ItemKind, subtype: Option<&str>, name: impl Into<String>) -> Self {
        Self::new(SourceKind::Item(kind), subtype, name)
    }

    /// Descriptor for a built-in rule.
    pub fn rule(name: impl Into<String>) -> Self {
        Self::new(SourceKind::Rule, None, name)
    }

    /// Key under which contributions from one source type merge.
    pub fn merge_key(&self) -> (SourceKind, Option<&str>) {
        (self.kind, self.subtype.as_deref())
    }
}

/// One row of the source classification table.
///
/// A rule with no `subtype` matches every subtype of its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabelRule {
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub label: String,
}

impl SourceLabelRule {
    pub fn new(kind: SourceKind, subtype: Option<&str>, label: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: subtype.map(str::to_string),
            label: label.into(),
        }
    }

    /// Rule labelling every buff of one subtype.
    ///
    /// # Arguments
    ///
    /// * `subtype` - Buff subtype to match (`temp`, `perm`, ...)
    /// * `label` - Label shown in place of the buff's name
    pub fn buff(subtype: &str, label: impl Into<String>) -> Self {
        Self::new(SourceKind::Item(ItemKind::Buff), Some(subtype), label)
    }

    fn matches(&self, source: &SourceDescriptor) -> bool {
        self.kind == source.kind
            && match &self.subtype {
                Some(subtype) => source.subtype.as_deref() == Some(subtype.as_str()),
                None => true,
            }
    }
}

/// Derive the display label for a source.
///
/// The first matching rule wins. Without a match the source's own name is
/// used, and a nameless source falls back to its kind.
pub fn classify(rules: &[SourceLabelRule], source: &SourceDescriptor) -> String {
    if let Some(rule) = rules.iter().find(|rule| rule.matches(source)) {
        return rule.label.clone();
    }
    if !source.name.is_empty() {
        return source.name.clone();
    }
    match source.kind {
        SourceKind::Item(kind) => kind.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<SourceLabelRule> {
        vec![
            SourceLabelRule::buff("temp", "Temporary Buffs"),
            SourceLabelRule::new(SourceKind::Size, None, "Size"),
        ]
    }

    #[test]
    fn test_classify_by_subtype() {
        let source = SourceDescriptor::item(ItemKind::Buff, Some("temp"), "Bless");
        assert_eq!(classify(&rules(), &source), "Temporary Buffs");
    }

    #[test]
    fn test_classify_falls_back_to_name() {
        let source = SourceDescriptor::item(ItemKind::Buff, Some("perm"), "Heroism");
        assert_eq!(classify(&rules(), &source), "Heroism");

        let ring = SourceDescriptor::item(ItemKind::Equipment, None, "Ring of Protection");
        assert_eq!(classify(&rules(), &ring), "Ring of Protection");
    }

    #[test]
    fn test_classify_wildcard_and_nameless() {
        let size = SourceDescriptor::new(SourceKind::Size, Some("small"), "");
        assert_eq!(classify(&rules(), &size), "Size");

        let nameless = SourceDescriptor::item(ItemKind::Feat, None, "");
        assert_eq!(classify(&rules(), &nameless), "feat");
    }
}
