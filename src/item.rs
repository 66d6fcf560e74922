//! Items owned by an actor.
//!
//! Items are the main producers of changes. Whether an item's changes apply
//! depends on its kind: buffs must be active, equipment and weapons must be
//! equipped, everything else always applies.

use crate::change::Change;
use crate::source::SourceDescriptor;
use serde::{Deserialize, Serialize};

/// Kind of an item.
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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ItemKind {
    Equipment,
    Weapon,
    Buff,
    Feat,
    Class,
    Race,
    Spell,
    Consumable,
    Loot,
    Attack,
}

/// Boolean switches an item (or condition) can raise on its owner.
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
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Flag {
    #[serde(rename = "loseDexToAC")]
    #[strum(serialize = "loseDexToAC")]
    LoseDexToAc,
    NoStr,
    NoDex,
    OneInt,
    OneWis,
    OneCha,
}

/// Armor slot, deciding which AC bucket the armor bonus lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorSlot {
    #[default]
    Armor,
    Shield,
    Natural,
}

/// Armor statistics of a wearable item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArmorData {
    pub slot: ArmorSlot,
    /// Armor bonus.
    pub value: i64,
    /// Enhancement bonus to the armor bonus.
    pub enh: i64,
    /// Maximum Dexterity bonus to AC while worn.
    pub max_dex: Option<i64>,
    /// Armor check penalty, stored as a non-negative magnitude.
    pub acp: i64,
}

/// Base attack bonus progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BabProgression {
    High,
    #[default]
    Medium,
    Low,
}

impl BabProgression {
    pub fn at_level(self, level: i64) -> i64 {
        match self {
            BabProgression::High => level,
            BabProgression::Medium => (level * 3).div_euclid(4),
            BabProgression::Low => level.div_euclid(2),
        }
    }
}

/// Base save progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveProgression {
    High,
    #[default]
    Low,
}

impl SaveProgression {
    pub fn at_level(self, level: i64) -> i64 {
        if level <= 0 {
            return 0;
        }
        match self {
            SaveProgression::High => 2 + level.div_euclid(2),
            SaveProgression::Low => level.div_euclid(3),
        }
    }
}

/// Class levels held by an actor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassData {
    pub level: i64,
    /// Hit points gained from this class's hit dice.
    pub hp: i64,
    pub bab: BabProgression,
    pub fort: SaveProgression,
    #[serde(rename = "ref")]
    pub reflex: SaveProgression,
    pub will: SaveProgression,
    pub class_skills: Vec<String>,
}

/// An item owned by an actor.
///
/// # Examples
///
/// ```rust
/// use pfstat::item::{Item, ItemKind};
///
/// let mut haste = Item::new("Haste", ItemKind::Buff).with_subtype("temp");
/// assert!(!haste.is_active());
///
/// haste.active = true;
/// assert!(haste.is_active());
///
/// // Feats always contribute.
/// assert!(Item::new("Dodge", ItemKind::Feat).is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassData>,
}

impl Item {
    /// Create an unequipped, inactive item with no changes.
    ///
    /// # Arguments
    ///
    /// * `name` - Display name, also the default source label
    /// * `kind` - Item type, which decides when the item applies
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subtype: None,
            equipped: false,
            active: false,
            changes: Vec::new(),
            flags: Vec::new(),
            armor: None,
            class: None,
        }
    }

    /// Set the subtype used to classify buffs (`temp`, `perm`, ...).
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Declare a change on the item.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfstat::change::Change;
    /// use pfstat::item::{Item, ItemKind};
    /// use pfstat::modifier::ModifierKind;
    /// use pfstat::target::ChangeTarget;
    ///
    /// let ring = Item::new("Ring of Protection +1", ItemKind::Equipment)
    ///     .with_change(Change::flat(1).to(ChangeTarget::Ac).as_kind(ModifierKind::Deflection))
    ///     .equipped();
    /// assert_eq!(ring.changes.len(), 1);
    /// assert!(ring.is_active());
    /// ```
    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Attach armor statistics; the slot decides the AC bucket.
    pub fn with_armor(mut self, armor: ArmorData) -> Self {
        self.armor = Some(armor);
        self
    }

    /// Attach class progression data.
    ///
    /// # Arguments
    ///
    /// * `class` - Level, hit points, BAB and save progressions, class skills
    pub fn with_class(mut self, class: ClassData) -> Self {
        self.class = Some(class);
        self
    }

    /// Mark the item equipped.
    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }

    /// Mark the item active.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// Whether this item's changes, flags and armor currently apply.
    pub fn is_active(&self) -> bool {
        match self.kind {
            ItemKind::Buff => self.active,
            ItemKind::Equipment | ItemKind::Weapon => self.equipped,
            _ => true,
        }
    }

    /// Descriptor attributed to every change this item declares.
    pub fn source(&self) -> SourceDescriptor {
        SourceDescriptor::item(self.kind, self.subtype.as_deref(), self.name.clone())
    }
}
