//! Change collection.
//!
//! Gathers every change that applies to an actor for one pass: changes
//! declared on active items, then the built-in rule changes (Constitution
//! to hit points, worn armor, size, negative levels) and finally the
//! changes of active conditions. Flags and narrative notes are collected
//! alongside.

use crate::actor::{Actor, Size};
use crate::change::{Change, CollectedChange};
use crate::condition::{ActorFlags, Condition};
use crate::item::ArmorSlot;
use crate::modifier::ModifierKind;
use crate::path::AttrPath;
use crate::ruleset::{ConditionEffect, Ruleset};
use crate::source::{SourceDescriptor, SourceKind};
use crate::target::{Ability, ChangeTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::trace;

/// Formula of the built-in Constitution to hit points change.
pub const CON_HP_FORMULA: &str = "@abilities.con.mod * @attributes.hd.total";

/// A narrative line attached to an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub path: AttrPath,
    pub name: String,
    pub text: String,
}

/// Output of the collection step.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Changes in collection order.
    pub changes: Vec<CollectedChange>,
    pub flags: ActorFlags,
    pub notes: Vec<Note>,
}

/// Conditions whose effects apply, with superseded ones removed.
///
/// ```rust
/// use pfstat::actor::Actor;
/// use pfstat::collector::active_conditions;
/// use pfstat::condition::Condition;
/// use pfstat::Ruleset;
///
/// let actor = Actor::new("Amiri")
///     .with_condition(Condition::Fatigued)
///     .with_condition(Condition::Exhausted);
///
/// let active = active_conditions(&actor, &Ruleset::pathfinder());
/// assert_eq!(active, vec![Condition::Exhausted]);
/// ```
pub fn active_conditions(actor: &Actor, ruleset: &Ruleset) -> Vec<Condition> {
    let superseded: BTreeSet<Condition> = actor
        .conditions
        .iter()
        .filter_map(|condition| ruleset.conditions.get(condition))
        .flat_map(|effect| effect.supersedes.iter().copied())
        .collect();
    actor
        .conditions
        .iter()
        .copied()
        .filter(|condition| !superseded.contains(condition))
        .collect()
}

/// Collect changes, flags and notes for one pass.
pub fn collect(actor: &Actor, ruleset: &Ruleset) -> Collection {
    let conditions: Vec<(Condition, &ConditionEffect)> = active_conditions(actor, ruleset)
        .into_iter()
        .filter_map(|condition| {
            ruleset
                .conditions
                .get(&condition)
                .map(|effect| (condition, effect))
        })
        .collect();

    let mut flags = ActorFlags::default();
    for (_, effect) in &conditions {
        for flag in &effect.flags {
            flags.raise(*flag);
        }
    }
    for item in actor.active_items() {
        for flag in &item.flags {
            flags.raise(*flag);
        }
    }

    let mut changes = Vec::new();
    for item in actor.active_items() {
        let source = item.source();
        for change in &item.changes {
            changes.push(CollectedChange::new(change.clone(), source.clone()));
        }
    }

    changes.push(CollectedChange::new(
        Change::add(CON_HP_FORMULA)
            .to(ChangeTarget::Mhp)
            .as_kind(ModifierKind::Base),
        SourceDescriptor::rule(Ability::Con.name()),
    ));

    changes.extend(armor_changes(actor));
    changes.extend(size_changes(actor.size, ruleset));
    changes.extend(energy_drain_changes(actor.energy_drain));

    let mut notes = Vec::new();
    for (condition, effect) in &conditions {
        let source = SourceDescriptor::new(
            SourceKind::Condition,
            Some(condition.as_ref()),
            effect.label.clone(),
        );
        for change in &effect.changes {
            changes.push(CollectedChange::new(change.clone(), source.clone()));
        }
        for note in &effect.notes {
            notes.push(Note {
                path: note.path.clone(),
                name: effect.label.clone(),
                text: note.text.clone(),
            });
        }
    }

    let before = changes.len();
    changes.retain(|collected| applies(&collected.change, &flags));
    trace!(
        kept = changes.len(),
        dropped = before - changes.len(),
        "collected changes"
    );

    Collection {
        changes,
        flags,
        notes,
    }
}

/// Whether a change survives the flag filters.
///
/// Dodge bonuses to defenses are lost with Dex to AC, and changes to an
/// ability forced to a fixed score have nothing to modify.
fn applies(change: &Change, flags: &ActorFlags) -> bool {
    if flags.lose_dex_to_ac && change.kind == ModifierKind::Dodge && change.target.is_defense() {
        return false;
    }
    match change.target {
        ChangeTarget::Ability(ability) => flags.forced_score(ability).is_none(),
        _ => true,
    }
}

fn armor_changes(actor: &Actor) -> Vec<CollectedChange> {
    let mut changes = Vec::new();
    for item in actor.active_items() {
        let Some(armor) = &item.armor else {
            continue;
        };
        let target = match armor.slot {
            ArmorSlot::Armor => ChangeTarget::ArmorAc,
            ArmorSlot::Shield => ChangeTarget::ShieldAc,
            ArmorSlot::Natural => ChangeTarget::NaturalAc,
        };
        for (value, kind) in [(armor.value, ModifierKind::Base), (armor.enh, ModifierKind::Enh)] {
            if value != 0 {
                changes.push(CollectedChange::new(
                    Change::flat(value).to(target.clone()).as_kind(kind),
                    item.source(),
                ));
            }
        }
    }
    changes
}

fn size_changes(size: Size, ruleset: &Ruleset) -> Vec<CollectedChange> {
    if size == Size::Medium {
        return Vec::new();
    }
    let mods = ruleset.size_modifiers(size);
    let source = SourceDescriptor::new(SourceKind::Size, Some(size.as_ref()), "Size");
    [
        (mods.ac, ChangeTarget::Ac),
        (mods.ac, ChangeTarget::Attack),
        (mods.special, ChangeTarget::Cmb),
        (mods.special, ChangeTarget::Cmd),
        (mods.stealth, ChangeTarget::Skill("ste".to_string())),
        (mods.fly, ChangeTarget::Skill("fly".to_string())),
    ]
    .into_iter()
    .filter(|(value, _)| *value != 0)
    .map(|(value, target)| {
        CollectedChange::new(
            Change::flat(value).to(target).as_kind(ModifierKind::Size),
            source.clone(),
        )
    })
    .collect()
}

fn energy_drain_changes(levels: i64) -> Vec<CollectedChange> {
    if levels <= 0 {
        return Vec::new();
    }
    let source = SourceDescriptor::rule("Negative Levels");
    let per_level = "-@attributes.energyDrain";
    [
        (per_level, ChangeTarget::Attack),
        (per_level, ChangeTarget::Cmb),
        (per_level, ChangeTarget::Cmd),
        ("-5 * @attributes.energyDrain", ChangeTarget::Mhp),
    ]
    .into_iter()
    .map(|(formula, target)| {
        CollectedChange::new(
            Change::add(formula).to(target).as_kind(ModifierKind::Penalty),
            source.clone(),
        )
    })
    .collect()
}
