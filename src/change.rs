//! Change declarations.
//!
//! A change is a single modifier declaration: a formula, the attribute it
//! targets and the bonus type governing how it stacks. Changes are declared
//! on items or synthesized by built-in rules, and are re-evaluated on every
//! recompute pass.

use crate::modifier::ModifierKind;
use crate::source::SourceDescriptor;
use crate::target::ChangeTarget;
use serde::{Deserialize, Serialize};

/// A modifier declaration.
///
/// # Examples
///
/// ```rust
/// use pfstat::change::Change;
/// use pfstat::modifier::ModifierKind;
/// use pfstat::target::ChangeTarget;
///
/// let change = Change::add("1 + floor(@attributes.hd.total / 4)")
///     .to(ChangeTarget::Ac)
///     .as_kind(ModifierKind::Deflection);
///
/// assert_eq!(change.target, ChangeTarget::Ac);
/// assert_eq!(change.priority, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub formula: String,
    pub target: ChangeTarget,
    #[serde(default, rename = "modifier")]
    pub kind: ModifierKind,
    /// Ordering hint inside one `(target, kind)` group; lower applies first.
    #[serde(default)]
    pub priority: i32,
}

/// Builder for a change with only its formula set.
pub struct ChangeBuilder {
    formula: String,
}

/// Builder for a change with formula and target set.
pub struct TargetedChangeBuilder {
    formula: String,
    target: ChangeTarget,
}

impl Change {
    /// Start a change from its formula.
    ///
    /// # Arguments
    ///
    /// * `formula` - Arithmetic formula, may reference attributes as `@path`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfstat::change::Change;
    /// use pfstat::target::ChangeTarget;
    ///
    /// let change = Change::add("@abilities.str.mod")
    ///     .to(ChangeTarget::WeaponDamage)
    ///     .untyped();
    /// assert_eq!(change.formula, "@abilities.str.mod");
    /// ```
    pub fn add(formula: impl Into<String>) -> ChangeBuilder {
        ChangeBuilder {
            formula: formula.into(),
        }
    }

    /// Start a change from a constant value.
    pub fn flat(value: i64) -> ChangeBuilder {
        Self::add(value.to_string())
    }

    /// Set the ordering hint inside the change's `(target, kind)` group.
    ///
    /// # Arguments
    ///
    /// * `priority` - Lower values apply first; ties keep declaration order
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfstat::change::Change;
    /// use pfstat::target::ChangeTarget;
    ///
    /// let late = Change::flat(2).to(ChangeTarget::Init).untyped().with_priority(5);
    /// assert_eq!(late.priority, 5);
    /// ```
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ChangeBuilder {
    /// Choose the attribute family the change modifies.
    ///
    /// # Arguments
    ///
    /// * `target` - The change target, e.g. `ChangeTarget::Ac`
    ///
    /// # Returns
    ///
    /// A builder that still needs a bonus type.
    pub fn to(self, target: ChangeTarget) -> TargetedChangeBuilder {
        TargetedChangeBuilder {
            formula: self.formula,
            target,
        }
    }
}

impl TargetedChangeBuilder {
    /// Finish the change with a bonus type.
    ///
    /// # Arguments
    ///
    /// * `kind` - Bonus type deciding how the change stacks
    ///
    /// # Returns
    ///
    /// The finished `Change` with priority 0.
    pub fn as_kind(self, kind: ModifierKind) -> Change {
        Change {
            formula: self.formula,
            target: self.target,
            kind,
            priority: 0,
        }
    }

    /// Finish the change as an untyped bonus, which always stacks.
    pub fn untyped(self) -> Change {
        self.as_kind(ModifierKind::Untyped)
    }
}

/// A change paired with the source that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedChange {
    pub change: Change,
    pub source: SourceDescriptor,
}

impl CollectedChange {
    pub fn new(change: Change, source: SourceDescriptor) -> Self {
        Self { change, source }
    }
}

/// A change whose formula has been evaluated for the current pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChange {
    pub source: SourceDescriptor,
    pub value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Ability;

    #[test]
    fn test_builder() {
        let change = Change::flat(-2)
            .to(ChangeTarget::Ability(Ability::Dex))
            .as_kind(ModifierKind::Penalty)
            .with_priority(5);

        assert_eq!(change.formula, "-2");
        assert_eq!(change.kind, ModifierKind::Penalty);
        assert_eq!(change.priority, 5);
    }

    #[test]
    fn test_change_from_host_json() {
        let change: Change =
            serde_json::from_str(r#"{ "formula": "2", "target": "aac", "modifier": "enh" }"#)
                .unwrap();
        assert_eq!(change.target, ChangeTarget::ArmorAc);
        assert_eq!(change.kind, ModifierKind::Enh);

        let untyped: Change =
            serde_json::from_str(r#"{ "formula": "1", "target": "init" }"#).unwrap();
        assert_eq!(untyped.kind, ModifierKind::Untyped);
    }

    #[test]
    fn test_change_with_unknown_target_fails_to_load() {
        let result: Result<Change, _> =
            serde_json::from_str(r#"{ "formula": "1", "target": "wings" }"#);
        assert!(result.is_err());
    }
}
