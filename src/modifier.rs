//! Modifier kinds and their stacking rules.
//!
//! Every change carries a bonus type ("kind"). The kind alone decides how
//! contributions to the same target combine: a handful of kinds sum, all
//! others keep only the strongest bonus and the strongest penalty.

use serde::{Deserialize, Serialize};

/// Stack rule for how contributions of one kind to one target combine.
///
/// # Examples
///
/// ```rust
/// use pfstat::modifier::{ModifierKind, StackRule};
///
/// assert_eq!(ModifierKind::Dodge.stack_rule(), StackRule::Sum);
/// assert_eq!(ModifierKind::Enh.stack_rule(), StackRule::Extremum);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRule {
    /// Same-sign contributions add up; sources sharing a merge key merge.
    Sum,
    /// Only the highest bonus and the lowest penalty survive.
    Extremum,
}

/// Bonus type of a change.
///
/// Declaration order is the default kind priority used to order source
/// lists; a ruleset may supply its own order.
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
    Default,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModifierKind {
    #[default]
    Untyped,
    Base,
    Enh,
    Dodge,
    Inherent,
    Deflection,
    Morale,
    Luck,
    Sacred,
    Insight,
    Resist,
    Profane,
    Trait,
    Racial,
    Size,
    Competence,
    Circumstance,
    Alchemical,
    Penalty,
}

impl ModifierKind {
    /// The stacking rule for this kind.
    pub fn stack_rule(self) -> StackRule {
        match self {
            ModifierKind::Untyped | ModifierKind::Dodge | ModifierKind::Penalty => StackRule::Sum,
            _ => StackRule::Extremum,
        }
    }

    /// Whether contributions of this kind accumulate.
    pub fn stacks(self) -> bool {
        self.stack_rule() == StackRule::Sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_only_three_kinds_stack() {
        let stacking: Vec<_> = ModifierKind::iter().filter(|k| k.stacks()).collect();
        assert_eq!(
            stacking,
            vec![ModifierKind::Untyped, ModifierKind::Dodge, ModifierKind::Penalty]
        );
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("ENH".parse::<ModifierKind>().unwrap(), ModifierKind::Enh);
        assert_eq!(ModifierKind::Circumstance.to_string(), "circumstance");
        assert!("bogus".parse::<ModifierKind>().is_err());
    }
}
