//! Attribute path module.
//!
//! Provides the `AttrPath` type, a flattened, dot-separated identifier
//! for a derived attribute (e.g. `attributes.ac.normal.total`). Uses
//! `Arc<str>` for cheap cloning and fast comparison.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Flattened attribute path.
///
/// Paths mirror the layout of the roll data, so the same string that keys
/// a resolved attribute can be referenced from a formula as `@path`.
///
/// # Examples
///
/// ```rust
/// use pfstat::AttrPath;
///
/// let ac = AttrPath::new("attributes.ac.normal.total");
/// let same: AttrPath = "attributes.ac.normal.total".into();
///
/// assert_eq!(ac, same);
/// assert_eq!(ac.as_str(), "attributes.ac.normal.total");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttrPath(Arc<str>);

impl Serialize for AttrPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AttrPath::from(s))
    }
}

impl AttrPath {
    /// Create a new `AttrPath` from a string slice.
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Well-known attribute paths.
pub mod known {
    pub const AC_NORMAL: &str = "attributes.ac.normal.total";
    pub const AC_TOUCH: &str = "attributes.ac.touch.total";
    pub const AC_FLAT_FOOTED: &str = "attributes.ac.flatFooted.total";
    pub const CMB: &str = "attributes.cmb.total";
    pub const CMD: &str = "attributes.cmd.total";
    pub const CMD_FLAT_FOOTED: &str = "attributes.cmd.flatFootedTotal";
    pub const INIT: &str = "attributes.init.total";
    pub const BAB: &str = "attributes.bab.total";
    pub const HD: &str = "attributes.hd.total";
    pub const HP_MAX: &str = "attributes.hp.max";
    pub const ENERGY_DRAIN: &str = "attributes.energyDrain";
    pub const ATTACK_GENERAL: &str = "attributes.attack.general";
    pub const ATTACK_MELEE: &str = "attributes.attack.melee";
    pub const ATTACK_RANGED: &str = "attributes.attack.ranged";
    pub const DAMAGE_GENERAL: &str = "attributes.damage.general";
    pub const DAMAGE_WEAPON: &str = "attributes.damage.weapon";
    pub const DAMAGE_SPELL: &str = "attributes.damage.spell";
    pub const SIZE: &str = "traits.size";
}

impl AttrPath {
    pub fn ability_total(ability: crate::target::Ability) -> Self {
        format!("abilities.{}.total", ability).into()
    }

    pub fn ability_mod(ability: crate::target::Ability) -> Self {
        format!("abilities.{}.mod", ability).into()
    }

    pub fn save(save: crate::target::Save) -> Self {
        format!("attributes.savingThrows.{}.total", save).into()
    }

    pub fn skill(key: &str) -> Self {
        format!("skills.{}.mod", key).into()
    }

    pub fn speed(kind: crate::target::SpeedKind) -> Self {
        format!("attributes.speed.{}.total", kind).into()
    }
}

impl From<&str> for AttrPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttrPath {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for AttrPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_creation() {
        let a = AttrPath::new("attributes.cmb.total");
        let b: AttrPath = String::from("attributes.cmb.total").into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "attributes.cmb.total");
    }

    #[test]
    fn test_path_ordering() {
        let abilities = AttrPath::new("abilities.str.total");
        let attributes = AttrPath::new("attributes.ac.normal.total");
        assert!(abilities < attributes);
    }
}
