//! Change targets.
//!
//! A change names the attribute it modifies with a `ChangeTarget`. Targets
//! are grouped into categories; categories are resolved in dependency order
//! so that ability scores settle before the totals derived from them.

use crate::error::StatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six ability scores.
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
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    /// Human-readable name, used as a source label.
    pub fn name(self) -> &'static str {
        match self {
            Ability::Str => "Strength",
            Ability::Dex => "Dexterity",
            Ability::Con => "Constitution",
            Ability::Int => "Intelligence",
            Ability::Wis => "Wisdom",
            Ability::Cha => "Charisma",
        }
    }
}

/// The three saving throws.
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
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Save {
    Fort,
    Ref,
    Will,
}

/// Movement modes.
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
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpeedKind {
    Land,
    Climb,
    Swim,
    Burrow,
    Fly,
}

/// Coarse grouping of targets; the unit of dependency ordering.
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
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ChangeCategory {
    Ability,
    Misc,
    Ac,
    Attack,
    Damage,
    SavingThrows,
    Skills,
    Skill,
}

/// The attribute a change modifies.
///
/// Parses from and prints as the compact target keys used in item data:
/// `str`, `ac`, `aac`, `mattack`, `wdamage`, `allSavingThrows`, `fort`,
/// `dexSkills`, `skill.ste`, `cmb`, `mhp`, `landSpeed`, ...
///
/// # Examples
///
/// ```rust
/// use pfstat::target::{Ability, ChangeCategory, ChangeTarget};
///
/// let target: ChangeTarget = "dexSkills".parse().unwrap();
/// assert_eq!(target, ChangeTarget::AbilitySkills(Ability::Dex));
/// assert_eq!(target.category(), ChangeCategory::Skills);
///
/// let stealth: ChangeTarget = "skill.ste".parse().unwrap();
/// assert_eq!(stealth.to_string(), "skill.ste");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChangeTarget {
    Ability(Ability),
    Ac,
    ArmorAc,
    ShieldAc,
    NaturalAc,
    Attack,
    MeleeAttack,
    RangedAttack,
    Damage,
    WeaponDamage,
    SpellDamage,
    AllSavingThrows,
    Save(Save),
    Skills,
    AbilitySkills(Ability),
    Skill(String),
    Cmb,
    Cmd,
    Init,
    Mhp,
    AllSpeeds,
    Speed(SpeedKind),
}

impl ChangeTarget {
    /// The category this target is resolved with.
    pub fn category(&self) -> ChangeCategory {
        match self {
            ChangeTarget::Ability(_) => ChangeCategory::Ability,
            ChangeTarget::Ac
            | ChangeTarget::ArmorAc
            | ChangeTarget::ShieldAc
            | ChangeTarget::NaturalAc => ChangeCategory::Ac,
            ChangeTarget::Attack | ChangeTarget::MeleeAttack | ChangeTarget::RangedAttack => {
                ChangeCategory::Attack
            }
            ChangeTarget::Damage | ChangeTarget::WeaponDamage | ChangeTarget::SpellDamage => {
                ChangeCategory::Damage
            }
            ChangeTarget::AllSavingThrows | ChangeTarget::Save(_) => ChangeCategory::SavingThrows,
            ChangeTarget::Skills | ChangeTarget::AbilitySkills(_) => ChangeCategory::Skills,
            ChangeTarget::Skill(_) => ChangeCategory::Skill,
            ChangeTarget::Cmb
            | ChangeTarget::Cmd
            | ChangeTarget::Init
            | ChangeTarget::Mhp
            | ChangeTarget::AllSpeeds
            | ChangeTarget::Speed(_) => ChangeCategory::Misc,
        }
    }

    /// Whether dodge bonuses to this target are lost with Dex to AC.
    pub fn is_defense(&self) -> bool {
        self.category() == ChangeCategory::Ac || *self == ChangeTarget::Cmd
    }
}

impl fmt::Display for ChangeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeTarget::Ability(ability) => write!(f, "{}", ability),
            ChangeTarget::Ac => f.write_str("ac"),
            ChangeTarget::ArmorAc => f.write_str("aac"),
            ChangeTarget::ShieldAc => f.write_str("sac"),
            ChangeTarget::NaturalAc => f.write_str("nac"),
            ChangeTarget::Attack => f.write_str("attack"),
            ChangeTarget::MeleeAttack => f.write_str("mattack"),
            ChangeTarget::RangedAttack => f.write_str("rattack"),
            ChangeTarget::Damage => f.write_str("damage"),
            ChangeTarget::WeaponDamage => f.write_str("wdamage"),
            ChangeTarget::SpellDamage => f.write_str("sdamage"),
            ChangeTarget::AllSavingThrows => f.write_str("allSavingThrows"),
            ChangeTarget::Save(save) => write!(f, "{}", save),
            ChangeTarget::Skills => f.write_str("skills"),
            ChangeTarget::AbilitySkills(ability) => write!(f, "{}Skills", ability),
            ChangeTarget::Skill(key) => write!(f, "skill.{}", key),
            ChangeTarget::Cmb => f.write_str("cmb"),
            ChangeTarget::Cmd => f.write_str("cmd"),
            ChangeTarget::Init => f.write_str("init"),
            ChangeTarget::Mhp => f.write_str("mhp"),
            ChangeTarget::AllSpeeds => f.write_str("allSpeeds"),
            ChangeTarget::Speed(kind) => write!(f, "{}Speed", kind),
        }
    }
}

impl FromStr for ChangeTarget {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let target = match s {
            "ac" => ChangeTarget::Ac,
            "aac" => ChangeTarget::ArmorAc,
            "sac" => ChangeTarget::ShieldAc,
            "nac" => ChangeTarget::NaturalAc,
            "attack" => ChangeTarget::Attack,
            "mattack" => ChangeTarget::MeleeAttack,
            "rattack" => ChangeTarget::RangedAttack,
            "damage" => ChangeTarget::Damage,
            "wdamage" => ChangeTarget::WeaponDamage,
            "sdamage" => ChangeTarget::SpellDamage,
            "allSavingThrows" => ChangeTarget::AllSavingThrows,
            "skills" => ChangeTarget::Skills,
            "cmb" => ChangeTarget::Cmb,
            "cmd" => ChangeTarget::Cmd,
            "init" => ChangeTarget::Init,
            "mhp" => ChangeTarget::Mhp,
            "allSpeeds" => ChangeTarget::AllSpeeds,
            other => {
                if let Some(key) = other.strip_prefix("skill.") {
                    if key.is_empty() {
                        return Err(StatError::UnknownTarget(s.to_string()));
                    }
                    ChangeTarget::Skill(key.to_string())
                } else if let Some(ability) = other.strip_suffix("Skills") {
                    ChangeTarget::AbilitySkills(
                        ability
                            .parse()
                            .map_err(|_| StatError::UnknownTarget(s.to_string()))?,
                    )
                } else if let Some(kind) = other.strip_suffix("Speed") {
                    ChangeTarget::Speed(
                        kind.parse()
                            .map_err(|_| StatError::UnknownTarget(s.to_string()))?,
                    )
                } else if let Ok(ability) = other.parse::<Ability>() {
                    ChangeTarget::Ability(ability)
                } else if let Ok(save) = other.parse::<Save>() {
                    ChangeTarget::Save(save)
                } else {
                    return Err(StatError::UnknownTarget(s.to_string()));
                }
            }
        };
        Ok(target)
    }
}

impl TryFrom<String> for ChangeTarget {
    type Error = StatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChangeTarget> for String {
    fn from(target: ChangeTarget) -> Self {
        target.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_print_agree() {
        for key in [
            "str", "ac", "aac", "sac", "nac", "mattack", "wdamage", "allSavingThrows", "will",
            "skills", "chaSkills", "skill.per", "cmd", "mhp", "allSpeeds", "flySpeed",
        ] {
            let target: ChangeTarget = key.parse().unwrap();
            assert_eq!(target.to_string(), key);
        }
    }

    #[test]
    fn test_unknown_targets_are_rejected() {
        assert!("wings".parse::<ChangeTarget>().is_err());
        assert!("skill.".parse::<ChangeTarget>().is_err());
        assert!("luckSkills".parse::<ChangeTarget>().is_err());
        assert!("warpSpeed".parse::<ChangeTarget>().is_err());
    }

    #[test]
    fn test_categories() {
        assert_eq!(ChangeTarget::Ability(Ability::Con).category(), ChangeCategory::Ability);
        assert_eq!(ChangeTarget::NaturalAc.category(), ChangeCategory::Ac);
        assert_eq!(ChangeTarget::Cmd.category(), ChangeCategory::Misc);
        assert_eq!(ChangeTarget::Skill("ste".into()).category(), ChangeCategory::Skill);
        assert!(ChangeTarget::Cmd.is_defense());
        assert!(!ChangeTarget::Cmb.is_defense());
    }

    #[test]
    fn test_target_serde_uses_compact_keys() {
        let json = serde_json::to_string(&ChangeTarget::Save(Save::Ref)).unwrap();
        assert_eq!(json, "\"ref\"");
        let back: ChangeTarget = serde_json::from_str("\"strSkills\"").unwrap();
        assert_eq!(back, ChangeTarget::AbilitySkills(Ability::Str));
    }
}
