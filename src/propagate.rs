//! Dependency propagation.
//!
//! `ResolutionState` holds every derived attribute as a base value plus a
//! list of labelled contributions, so each total is its base plus the sum
//! of its contributions by construction. A pass threads the state through
//! its steps, each consuming the state and returning the next one:
//!
//! 1. [`ResolutionState::reset`] derives the baseline from the actor.
//! 2. [`ResolutionState::apply_abilities`] applies ability buckets,
//!    recomputes the modifiers and pushes the deltas into dependent
//!    totals.
//! 3. [`ResolutionState::apply_groups`] adds every other bucket to the
//!    attribute paths its target maps to.
//! 4. [`ResolutionState::finalize_skills`] rebuilds the skill totals from
//!    the settled modifiers.

use crate::actor::{AbilityScore, Actor, SkillRanks, Size};
use crate::collector::{Collection, Note};
use crate::condition::ActorFlags;
use crate::path::{known, AttrPath};
use crate::resolver::ResolvedGroup;
use crate::roll_data::RollData;
use crate::ruleset::{Ruleset, SkillDef};
use crate::source::classify;
use crate::target::{Ability, Save, SpeedKind};
use std::collections::{BTreeMap, BTreeSet};
use strum::IntoEnumIterator;
use tracing::debug;

const BAB_LABEL: &str = "Base Attack Bonus";
const DRAIN_LABEL: &str = "Drain";
const CLASS_SKILL_LABEL: &str = "Class Skill";
const ACP_LABEL: &str = "Armor Check Penalty";
const NEGATIVE_LEVELS_LABEL: &str = "Negative Levels";

/// Bonus for a trained class skill.
pub const CLASS_SKILL_BONUS: i64 = 3;

/// Ability modifier for a total, reduced by damage and penalty.
///
/// ```rust
/// use pfstat::propagate::ability_modifier;
///
/// assert_eq!(ability_modifier(16, 0, 0), 3);
/// assert_eq!(ability_modifier(9, 0, 0), -1);
/// assert_eq!(ability_modifier(14, 3, 0), 1);
/// // Never below -5.
/// assert_eq!(ability_modifier(0, 6, 0), -5);
/// ```
pub fn ability_modifier(total: i64, damage: i64, penalty: i64) -> i64 {
    total
        .saturating_sub(10)
        .div_euclid(2)
        .saturating_sub(damage.div_euclid(2))
        .saturating_sub(penalty.div_euclid(2))
        .max(-5)
}

/// Where a contribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// Computed from actor data: class levels, ability modifiers, penalties.
    Derived,
    /// A resolved change bucket.
    Change,
}

/// One labelled part of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub origin: Origin,
    pub label: String,
    pub value: i64,
}

/// A derived attribute in progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttrState {
    pub base: i64,
    pub contributions: Vec<Contribution>,
}

impl AttrState {
    pub fn new(base: i64) -> Self {
        Self {
            base,
            contributions: Vec::new(),
        }
    }

    pub fn total(&self) -> i64 {
        self.contributions
            .iter()
            .fold(self.base, |total, c| total.saturating_add(c.value))
    }

    fn derived(mut self, label: &str, value: i64) -> Self {
        self.add(Origin::Derived, label, value);
        self
    }

    /// Add to the contribution with the same origin and label, or append.
    fn add(&mut self, origin: Origin, label: &str, value: i64) {
        match self
            .contributions
            .iter_mut()
            .find(|c| c.origin == origin && c.label == label)
        {
            Some(existing) => existing.value = existing.value.saturating_add(value),
            None => self.contributions.push(Contribution {
                origin,
                label: label.to_string(),
                value,
            }),
        }
    }

    /// Overwrite a derived contribution, appending it if missing.
    fn set_derived(&mut self, label: &str, value: i64) {
        match self
            .contributions
            .iter_mut()
            .find(|c| c.origin == Origin::Derived && c.label == label)
        {
            Some(existing) => existing.value = value,
            None => self.contributions.push(Contribution {
                origin: Origin::Derived,
                label: label.to_string(),
                value,
            }),
        }
    }
}

/// The derived attributes of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionState {
    attributes: BTreeMap<AttrPath, AttrState>,
    scores: BTreeMap<Ability, AbilityScore>,
    flags: ActorFlags,
    notes: Vec<Note>,
    /// Lowest maximum Dex bonus of worn armor.
    max_dex: Option<i64>,
    acp: i64,
    energy_drain: i64,
    size: Size,
    skill_ranks: BTreeMap<String, SkillRanks>,
    class_skills: BTreeSet<String>,
}

impl ResolutionState {
    /// Baseline derived from the actor before any change applies.
    pub fn reset(actor: &Actor, collection: &Collection, ruleset: &Ruleset) -> Self {
        let armor: Vec<_> = actor
            .active_items()
            .filter_map(|item| item.armor.as_ref())
            .collect();
        let classes: Vec<_> = actor
            .active_items()
            .filter_map(|item| item.class.as_ref().map(|class| (item.name.as_str(), class)))
            .collect();

        let mut state = Self {
            attributes: BTreeMap::new(),
            scores: Ability::iter().map(|a| (a, actor.ability(a))).collect(),
            flags: collection.flags,
            notes: collection.notes.clone(),
            max_dex: armor.iter().filter_map(|a| a.max_dex).min(),
            acp: armor.iter().map(|a| a.acp.max(0)).sum(),
            energy_drain: actor.energy_drain.max(0),
            size: actor.size,
            skill_ranks: actor.skills.clone(),
            class_skills: classes
                .iter()
                .flat_map(|(_, class)| class.class_skills.iter().cloned())
                .collect(),
        };

        for ability in Ability::iter() {
            let score = state.score(ability);
            let total = match state.flags.forced_score(ability) {
                Some(forced) => AttrState::new(forced),
                None if score.drain != 0 => AttrState::new(score.value)
                    .derived(DRAIN_LABEL, score.drain.saturating_neg()),
                None => AttrState::new(score.value),
            };
            let modifier = ability_modifier(total.total(), score.damage, score.penalty);
            state.insert(AttrPath::ability_total(ability), total);
            state.insert(AttrPath::ability_mod(ability), AttrState::new(modifier));
        }

        let mut bab = AttrState::new(0);
        let mut hd = AttrState::new(0);
        let mut hp = AttrState::new(0);
        for (name, class) in &classes {
            bab.add(Origin::Derived, name, class.bab.at_level(class.level));
            hd.add(Origin::Derived, name, class.level);
            hp.add(Origin::Derived, name, class.hp);
        }
        let bab_total = bab.total();
        state.insert(known::BAB.into(), bab);
        state.insert(known::HD.into(), hd);
        state.insert(known::HP_MAX.into(), hp);

        for save in Save::iter() {
            let mut attr = AttrState::new(0);
            for (name, class) in &classes {
                let progression = match save {
                    Save::Fort => class.fort,
                    Save::Ref => class.reflex,
                    Save::Will => class.will,
                };
                attr.add(Origin::Derived, name, progression.at_level(class.level));
            }
            let ability = ruleset.save_ability(save);
            attr.add(Origin::Derived, ability.name(), state.modifier(ability));
            if state.energy_drain > 0 {
                attr.add(Origin::Derived, NEGATIVE_LEVELS_LABEL, -state.energy_drain);
            }
            state.insert(AttrPath::save(save), attr);
        }

        let str_mod = state.modifier(Ability::Str);
        let dex = Ability::Dex.name();
        let strength = Ability::Str.name();
        for path in [known::AC_NORMAL, known::AC_TOUCH, known::AC_FLAT_FOOTED] {
            state.insert(path.into(), AttrState::new(10).derived(dex, 0));
        }
        state.insert(
            known::CMB.into(),
            AttrState::new(0)
                .derived(BAB_LABEL, bab_total)
                .derived(strength, str_mod),
        );
        for path in [known::CMD, known::CMD_FLAT_FOOTED] {
            state.insert(
                path.into(),
                AttrState::new(10)
                    .derived(BAB_LABEL, bab_total)
                    .derived(strength, str_mod)
                    .derived(dex, 0),
            );
        }
        state.insert(
            known::INIT.into(),
            AttrState::new(0).derived(dex, state.modifier(Ability::Dex)),
        );
        state.rederive_dex();

        for path in [
            known::ATTACK_GENERAL,
            known::ATTACK_MELEE,
            known::ATTACK_RANGED,
            known::DAMAGE_GENERAL,
            known::DAMAGE_WEAPON,
            known::DAMAGE_SPELL,
        ] {
            state.insert(path.into(), AttrState::new(0));
        }
        for kind in SpeedKind::iter() {
            let base = actor.speeds.get(&kind).copied().unwrap_or(0);
            state.insert(AttrPath::speed(kind), AttrState::new(base));
        }

        for (key, def) in &ruleset.skills {
            let skill = state.skill_baseline(key, def);
            state.insert(AttrPath::skill(key), skill);
        }

        debug!(
            attributes = state.attributes.len(),
            bab = bab_total,
            "reset derived attributes"
        );
        state
    }

    /// Apply the ability buckets, then settle modifiers and their dependents.
    pub fn apply_abilities(self, groups: &[ResolvedGroup], ruleset: &Ruleset) -> Self {
        let before: BTreeMap<Ability, i64> =
            Ability::iter().map(|a| (a, self.modifier(a))).collect();
        let mut state = self.apply_groups(groups, ruleset);

        for ability in Ability::iter() {
            let score = state.score(ability);
            let total = state.total(&AttrPath::ability_total(ability));
            let modifier = ability_modifier(total, score.damage, score.penalty);
            state.insert(AttrPath::ability_mod(ability), AttrState::new(modifier));

            let delta = modifier - before.get(&ability).copied().unwrap_or(modifier);
            if delta != 0 {
                debug!(ability = %ability, delta, "ability modifier changed");
                state.propagate(ability, delta, ruleset);
            }
        }
        state.rederive_dex();
        state
    }

    /// Add each bucket's contributions to the paths its target maps to.
    ///
    /// Targets the ruleset does not map are skipped.
    pub fn apply_groups(mut self, groups: &[ResolvedGroup], ruleset: &Ruleset) -> Self {
        for group in groups {
            let paths = ruleset.paths_for(&group.target, group.bucket.kind);
            if paths.is_empty() {
                debug!(
                    change_target = %group.target,
                    kind = %group.bucket.kind,
                    "no attribute mapping, skipping"
                );
                continue;
            }
            for path in paths {
                let attr = self.attributes.entry(path).or_default();
                for (source, value) in group.bucket.contributions() {
                    attr.add(Origin::Change, &classify(&ruleset.source_labels, source), value);
                }
            }
        }
        self
    }

    /// Rebuild skill totals from the settled ability modifiers, keeping
    /// the contributions of resolved changes.
    pub fn finalize_skills(mut self, ruleset: &Ruleset) -> Self {
        for (key, def) in &ruleset.skills {
            let baseline = self.skill_baseline(key, def);
            let attr = self.attributes.entry(AttrPath::skill(key)).or_default();
            let changes = attr
                .contributions
                .drain(..)
                .filter(|c| c.origin == Origin::Change);
            let mut rebuilt = baseline.contributions;
            rebuilt.extend(changes);
            attr.base = baseline.base;
            attr.contributions = rebuilt;
        }
        self
    }

    /// Snapshot visible to formulas.
    pub fn roll_data(&self) -> RollData {
        let mut data = RollData::from_totals(
            self.attributes
                .iter()
                .map(|(path, attr)| (path, attr.total())),
        );
        for (ability, score) in &self.scores {
            data.set(&format!("abilities.{}.value", ability), score.value);
            data.set(&format!("abilities.{}.damage", ability), score.damage);
            data.set(&format!("abilities.{}.drain", ability), score.drain);
            data.set(&format!("abilities.{}.penalty", ability), score.penalty);
        }
        data.set(known::ENERGY_DRAIN, self.energy_drain);
        data.set(known::SIZE, self.size.to_string());
        data
    }

    pub fn attributes(&self) -> &BTreeMap<AttrPath, AttrState> {
        &self.attributes
    }

    /// Final value of every attribute.
    pub fn totals(&self) -> BTreeMap<AttrPath, i64> {
        self.attributes
            .iter()
            .map(|(path, attr)| (path.clone(), attr.total()))
            .collect()
    }

    pub fn total(&self, path: &AttrPath) -> i64 {
        self.attributes.get(path).map(AttrState::total).unwrap_or(0)
    }

    pub fn modifier(&self, ability: Ability) -> i64 {
        self.total(&AttrPath::ability_mod(ability))
    }

    pub fn score(&self, ability: Ability) -> AbilityScore {
        self.scores.get(&ability).copied().unwrap_or_default()
    }

    pub fn flags(&self) -> ActorFlags {
        self.flags
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn insert(&mut self, path: AttrPath, attr: AttrState) {
        self.attributes.insert(path, attr);
    }

    fn add_derived(&mut self, path: &str, label: &str, value: i64) {
        if let Some(attr) = self.attributes.get_mut(&AttrPath::new(path)) {
            attr.add(Origin::Derived, label, value);
        }
    }

    fn set_derived(&mut self, path: &str, label: &str, value: i64) {
        if let Some(attr) = self.attributes.get_mut(&AttrPath::new(path)) {
            attr.set_derived(label, value);
        }
    }

    /// Push a modifier delta into the totals that read it.
    ///
    /// Dexterity on AC and CMD is handled by [`Self::rederive_dex`].
    fn propagate(&mut self, ability: Ability, delta: i64, ruleset: &Ruleset) {
        let label = ability.name();
        match ability {
            Ability::Str => {
                for path in [known::CMB, known::CMD, known::CMD_FLAT_FOOTED] {
                    self.add_derived(path, label, delta);
                }
            }
            Ability::Dex => self.add_derived(known::INIT, label, delta),
            _ => {}
        }
        for save in Save::iter() {
            if ruleset.save_ability(save) == ability {
                self.add_derived(AttrPath::save(save).as_str(), label, delta);
            }
        }
    }

    /// Recompute the Dexterity portions of AC and CMD.
    ///
    /// The armor cap limits Dex to AC. Flat-footed values, and every
    /// defense while Dex to AC is lost, keep only a Dex penalty.
    fn rederive_dex(&mut self) {
        let dex = self.modifier(Ability::Dex);
        let capped = self.max_dex.map_or(dex, |cap| dex.min(cap));
        let penalty_only = dex.min(0);
        let lose_dex = self.flags.lose_dex_to_ac;

        let ac = if lose_dex { capped.min(0) } else { capped };
        let cmd = if lose_dex { penalty_only } else { dex };
        let label = Ability::Dex.name();
        self.set_derived(known::AC_NORMAL, label, ac);
        self.set_derived(known::AC_TOUCH, label, ac);
        self.set_derived(known::AC_FLAT_FOOTED, label, capped.min(0));
        self.set_derived(known::CMD, label, cmd);
        self.set_derived(known::CMD_FLAT_FOOTED, label, penalty_only);
    }

    fn skill_baseline(&self, key: &str, def: &SkillDef) -> AttrState {
        let ranks = self.skill_ranks.get(key).copied().unwrap_or_default();
        let class_skill = ranks
            .class_skill
            .unwrap_or_else(|| self.class_skills.contains(key));

        let mut attr = AttrState::new(ranks.rank);
        if class_skill && ranks.rank > 0 {
            attr.add(Origin::Derived, CLASS_SKILL_LABEL, CLASS_SKILL_BONUS);
        }
        attr.add(Origin::Derived, def.ability.name(), self.modifier(def.ability));
        if def.acp && self.acp > 0 {
            attr.add(Origin::Derived, ACP_LABEL, -self.acp);
        }
        if self.energy_drain > 0 {
            attr.add(Origin::Derived, NEGATIVE_LEVELS_LABEL, -self.energy_drain);
        }
        attr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect;
    use crate::item::{ArmorData, BabProgression, ClassData, Item, ItemKind, SaveProgression};
    use crate::modifier::ModifierKind;
    use crate::resolver::StackingBucket;
    use crate::source::SourceDescriptor;
    use crate::target::ChangeTarget;

    fn reset(actor: &Actor) -> ResolutionState {
        let ruleset = Ruleset::pathfinder();
        let collection = collect(actor, &ruleset);
        ResolutionState::reset(actor, &collection, &ruleset)
    }

    fn fighter(level: i64) -> Item {
        Item::new("Fighter", ItemKind::Class).with_class(ClassData {
            level,
            hp: 10 * level,
            bab: BabProgression::High,
            fort: SaveProgression::High,
            class_skills: vec!["clm".into(), "swm".into()],
            ..ClassData::default()
        })
    }

    fn bucket(target: ChangeTarget, kind: ModifierKind, value: i64) -> ResolvedGroup {
        let mut bucket = StackingBucket::new(kind);
        bucket.add(&SourceDescriptor::item(ItemKind::Buff, Some("temp"), "Test"), value);
        ResolvedGroup { target, bucket }
    }

    #[test]
    fn test_reset_baseline() {
        let actor = Actor::new("Valeros")
            .with_ability(Ability::Str, 16)
            .with_ability(Ability::Dex, 14)
            .with_ability(Ability::Con, 12)
            .with_skill_ranks("clm", 4)
            .with_item(fighter(4));
        let state = reset(&actor);

        assert_eq!(state.total(&known::BAB.into()), 4);
        assert_eq!(state.total(&known::HD.into()), 4);
        assert_eq!(state.total(&known::AC_NORMAL.into()), 12);
        assert_eq!(state.total(&known::AC_FLAT_FOOTED.into()), 10);
        assert_eq!(state.total(&known::CMB.into()), 7);
        assert_eq!(state.total(&known::CMD.into()), 19);
        assert_eq!(state.total(&known::CMD_FLAT_FOOTED.into()), 17);
        assert_eq!(state.total(&known::INIT.into()), 2);
        assert_eq!(state.total(&AttrPath::save(Save::Fort)), 5);
        assert_eq!(state.total(&AttrPath::save(Save::Ref)), 3);
        assert_eq!(state.total(&AttrPath::skill("clm")), 4 + 3 + 3);
        assert_eq!(state.total(&AttrPath::skill("swm")), 3);
    }

    #[test]
    fn test_armor_caps_dex_and_applies_acp() {
        let actor = Actor::new("Kyra").with_ability(Ability::Dex, 18).with_item(
            Item::new("Breastplate", ItemKind::Equipment)
                .with_armor(ArmorData {
                    value: 6,
                    max_dex: Some(3),
                    acp: 4,
                    ..ArmorData::default()
                })
                .equipped(),
        );
        let state = reset(&actor);
        assert_eq!(state.total(&known::AC_NORMAL.into()), 13);
        assert_eq!(state.total(&known::CMD.into()), 14);
        assert_eq!(state.total(&AttrPath::skill("acr")), 4 - 4);
        assert_eq!(state.total(&AttrPath::skill("per")), 0);
    }

    #[test]
    fn test_drain_and_forced_scores() {
        let mut actor = Actor::new("Seoni").with_ability(Ability::Cha, 18);
        actor.abilities.entry(Ability::Cha).or_default().drain = 2;
        actor.abilities.entry(Ability::Wis).or_default().damage = 3;
        let state = reset(&actor);
        assert_eq!(state.total(&AttrPath::ability_total(Ability::Cha)), 16);
        assert_eq!(state.modifier(Ability::Cha), 3);
        assert_eq!(state.total(&AttrPath::ability_total(Ability::Wis)), 10);
        assert_eq!(state.modifier(Ability::Wis), -1);

        let mut flags = ActorFlags::default();
        flags.raise(crate::item::Flag::NoDex);
        let collection = Collection {
            flags,
            ..Collection::default()
        };
        let state = ResolutionState::reset(&actor, &collection, &Ruleset::pathfinder());
        assert_eq!(state.modifier(Ability::Dex), -5);
        assert_eq!(state.total(&known::AC_NORMAL.into()), 5);
        assert_eq!(state.total(&known::AC_FLAT_FOOTED.into()), 5);
    }

    #[test]
    fn test_ability_delta_reaches_dependents() {
        let ruleset = Ruleset::pathfinder();
        let actor = Actor::new("Amiri")
            .with_ability(Ability::Str, 14)
            .with_ability(Ability::Dex, 12)
            .with_skill_ranks("clm", 1);
        let state = reset(&actor).apply_abilities(
            &[
                bucket(ChangeTarget::Ability(Ability::Str), ModifierKind::Morale, 4),
                bucket(ChangeTarget::Ability(Ability::Dex), ModifierKind::Enh, 4),
            ],
            &ruleset,
        );

        assert_eq!(state.modifier(Ability::Str), 4);
        assert_eq!(state.total(&known::CMB.into()), 4);
        assert_eq!(state.total(&known::CMD.into()), 10 + 4 + 3);
        assert_eq!(state.total(&known::INIT.into()), 3);
        assert_eq!(state.total(&known::AC_TOUCH.into()), 13);
        assert_eq!(state.total(&AttrPath::save(Save::Ref)), 3);

        let cmb = &state.attributes()[&AttrPath::new(known::CMB)];
        assert_eq!(cmb.contributions.len(), 2);

        let skills = state.finalize_skills(&ruleset);
        assert_eq!(skills.total(&AttrPath::skill("clm")), 1 + 4);
    }

    #[test]
    fn test_apply_groups_uses_kind_paths_and_labels() {
        let ruleset = Ruleset::pathfinder();
        let state = reset(&Actor::new("Lem")).apply_groups(
            &[
                bucket(ChangeTarget::Ac, ModifierKind::Deflection, 2),
                bucket(ChangeTarget::Skills, ModifierKind::Luck, 1),
            ],
            &ruleset,
        );
        assert_eq!(state.total(&known::AC_TOUCH.into()), 12);
        assert_eq!(state.total(&known::CMD_FLAT_FOOTED.into()), 12);
        let touch = &state.attributes()[&AttrPath::new(known::AC_TOUCH)];
        assert_eq!(touch.contributions.last().map(|c| c.label.as_str()), Some("Temporary Buffs"));

        let state = state.finalize_skills(&ruleset);
        assert_eq!(state.total(&AttrPath::skill("umd")), 1);
    }

    #[test]
    fn test_roll_data_includes_raw_scores() {
        let mut actor = Actor::new("Ezren").with_ability(Ability::Int, 17).with_item(fighter(2));
        actor.energy_drain = 1;
        let data = reset(&actor).roll_data();
        assert_eq!(data.number("abilities.int.mod"), Some(3.0));
        assert_eq!(data.number("abilities.int.value"), Some(17.0));
        assert_eq!(data.number("attributes.hd.total"), Some(2.0));
        assert_eq!(data.number("attributes.energyDrain"), Some(1.0));
        assert_eq!(data.get("traits.size").and_then(|v| v.as_str()), Some("medium"));
    }
}
