//! Actor snapshots.
//!
//! The `Actor` is the serializable input of a recompute pass: ability
//! scores, traits, conditions, skill ranks and owned items. It never holds
//! derived values; those live in [`Recomputed`](crate::Recomputed).

use crate::condition::Condition;
use crate::error::StatError;
use crate::item::Item;
use crate::target::{Ability, SpeedKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Creature size categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Size {
    Fine,
    Diminutive,
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
    Colossal,
}

/// One ability score with its damage and drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScore {
    pub value: i64,
    pub damage: i64,
    pub drain: i64,
    /// Penalty that, like damage, only reduces the modifier.
    pub penalty: i64,
}

impl AbilityScore {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

impl Default for AbilityScore {
    fn default() -> Self {
        Self {
            value: 10,
            damage: 0,
            drain: 0,
            penalty: 0,
        }
    }
}

/// Ranks invested in one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillRanks {
    pub rank: i64,
    /// Overrides class-skill status derived from class items.
    pub class_skill: Option<bool>,
}

/// Serializable snapshot of a character or creature.
///
/// # Examples
///
/// ```rust
/// use pfstat::actor::{Actor, Size};
/// use pfstat::target::Ability;
///
/// let actor = Actor::new("Valeros")
///     .with_ability(Ability::Str, 16)
///     .with_size(Size::Medium);
///
/// assert_eq!(actor.ability(Ability::Str).value, 16);
/// // Unset abilities default to 10.
/// assert_eq!(actor.ability(Ability::Cha).value, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Actor {
    pub name: String,
    pub abilities: BTreeMap<Ability, AbilityScore>,
    pub size: Size,
    pub conditions: BTreeSet<Condition>,
    /// Number of negative levels.
    pub energy_drain: i64,
    pub speeds: BTreeMap<SpeedKind, i64>,
    pub skills: BTreeMap<String, SkillRanks>,
    pub items: Vec<Item>,
}

impl Actor {
    /// Create an actor with every ability at 10, medium size and no items.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an ability's base score, keeping any damage or drain.
    ///
    /// # Arguments
    ///
    /// * `ability` - The ability to set
    /// * `value` - Base score before changes
    pub fn with_ability(mut self, ability: Ability, value: i64) -> Self {
        self.abilities.entry(ability).or_default().value = value;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.insert(condition);
        self
    }

    /// Set the base speed for one movement mode.
    ///
    /// # Arguments
    ///
    /// * `kind` - Movement mode
    /// * `feet` - Base speed in feet
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pfstat::actor::Actor;
    /// use pfstat::target::SpeedKind;
    ///
    /// let actor = Actor::new("Merisiel").with_speed(SpeedKind::Land, 30);
    /// assert_eq!(actor.speeds[&SpeedKind::Land], 30);
    /// ```
    pub fn with_speed(mut self, kind: SpeedKind, feet: i64) -> Self {
        self.speeds.insert(kind, feet);
        self
    }

    /// Set the ranks invested in a skill.
    ///
    /// # Arguments
    ///
    /// * `skill` - Skill key, e.g. `clm` for Climb
    /// * `rank` - Ranks invested
    pub fn with_skill_ranks(mut self, skill: impl Into<String>, rank: i64) -> Self {
        self.skills.entry(skill.into()).or_default().rank = rank;
        self
    }

    /// Add an item; whether it applies depends on its kind and state.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Raw score of an ability, defaulting to 10.
    pub fn ability(&self, ability: Ability) -> AbilityScore {
        self.abilities.get(&ability).copied().unwrap_or_default()
    }

    /// Items whose changes currently apply.
    pub fn active_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_active())
    }

    /// Apply a partial-update overlay and return the post-edit actor.
    ///
    /// Objects merge key by key; every other value, arrays included,
    /// replaces what was there. A `null` removes the key.
    ///
    /// ```rust
    /// use pfstat::actor::Actor;
    /// use pfstat::target::Ability;
    /// use serde_json::json;
    ///
    /// let actor = Actor::new("Kyra").with_ability(Ability::Wis, 14);
    /// let edited = actor
    ///     .with_edits(&json!({ "abilities": { "wis": { "damage": 2 } } }))
    ///     .unwrap();
    ///
    /// assert_eq!(edited.ability(Ability::Wis).value, 14);
    /// assert_eq!(edited.ability(Ability::Wis).damage, 2);
    /// ```
    pub fn with_edits(&self, edits: &Value) -> Result<Actor, StatError> {
        let mut snapshot = serde_json::to_value(self)?;
        merge_overlay(&mut snapshot, edits);
        Ok(serde_json::from_value(snapshot)?)
    }
}

fn merge_overlay(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    base.remove(key);
                } else {
                    merge_overlay(base.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use serde_json::json;

    #[test]
    fn test_edits_toggle_item() {
        let actor = Actor::new("Merisiel").with_item(Item::new("Haste", ItemKind::Buff));
        let edited = actor
            .with_edits(&json!({ "items": [{ "name": "Haste", "type": "buff", "active": true }] }))
            .unwrap();
        assert!(edited.items[0].active);
        assert!(!actor.items[0].active);
    }

    #[test]
    fn test_edits_null_removes_condition_set() {
        let actor = Actor::new("Seoni").with_condition(Condition::Blind);
        let edited = actor.with_edits(&json!({ "conditions": null })).unwrap();
        assert!(edited.conditions.is_empty());
    }

    #[test]
    fn test_invalid_edit_is_rejected() {
        let actor = Actor::new("Ezren");
        let result = actor.with_edits(&json!({ "size": "enormous" }));
        assert!(matches!(result, Err(StatError::InvalidEdit(_))));
    }

    #[test]
    fn test_actor_from_partial_json() {
        let actor: Actor = serde_json::from_value(json!({
            "name": "Harsk",
            "abilities": { "con": { "value": 16 } },
            "size": "small",
            "conditions": ["fatigued"]
        }))
        .unwrap();
        assert_eq!(actor.ability(Ability::Con).value, 16);
        assert_eq!(actor.ability(Ability::Dex).value, 10);
        assert_eq!(actor.size, Size::Small);
        assert!(actor.conditions.contains(&Condition::Fatigued));
    }
}
