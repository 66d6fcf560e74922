//! Conditions and the flags they raise.

use crate::item::Flag;
use crate::target::Ability;
use serde::{Deserialize, Serialize};

/// A condition an actor can suffer from.
///
/// Fear conditions (shaken, frightened, panicked) are modelled as buffs
/// and are deliberately absent here.
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
pub enum Condition {
    Blind,
    Dazzled,
    Deaf,
    Entangled,
    Grappled,
    Helpless,
    Paralyzed,
    Pinned,
    Fatigued,
    Exhausted,
    Sickened,
    Stunned,
}

/// Boolean switches resolved for one pass.
///
/// Sources can only raise a flag, so the order in which they are applied
/// does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorFlags {
    #[serde(rename = "loseDexToAC")]
    pub lose_dex_to_ac: bool,
    pub no_str: bool,
    pub no_dex: bool,
    pub one_int: bool,
    pub one_wis: bool,
    pub one_cha: bool,
}

impl ActorFlags {
    pub fn raise(&mut self, flag: Flag) {
        match flag {
            Flag::LoseDexToAc => self.lose_dex_to_ac = true,
            Flag::NoStr => self.no_str = true,
            Flag::NoDex => self.no_dex = true,
            Flag::OneInt => self.one_int = true,
            Flag::OneWis => self.one_wis = true,
            Flag::OneCha => self.one_cha = true,
        }
    }

    /// The fixed score an ability is forced to, if a flag nullifies it.
    ///
    /// ```rust
    /// use pfstat::condition::ActorFlags;
    /// use pfstat::item::Flag;
    /// use pfstat::target::Ability;
    ///
    /// let mut flags = ActorFlags::default();
    /// flags.raise(Flag::NoStr);
    /// flags.raise(Flag::OneWis);
    ///
    /// assert_eq!(flags.forced_score(Ability::Str), Some(0));
    /// assert_eq!(flags.forced_score(Ability::Wis), Some(1));
    /// assert_eq!(flags.forced_score(Ability::Dex), None);
    /// ```
    pub fn forced_score(&self, ability: Ability) -> Option<i64> {
        match ability {
            Ability::Str if self.no_str => Some(0),
            Ability::Dex if self.no_dex => Some(0),
            Ability::Int if self.one_int => Some(1),
            Ability::Wis if self.one_wis => Some(1),
            Ability::Cha if self.one_cha => Some(1),
            _ => None,
        }
    }
}
