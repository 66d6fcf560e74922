//! Tests for bonus stacking.
//!
//! These tests verify:
//! - Stack rules per bonus type
//! - Source merging for stacking types
//! - Priority ordering inside a group
//! - Dodge loss while denied Dex to AC
//! - Source labels in the breakdown

use pfstat::change::{Change, CollectedChange};
use pfstat::item::{Flag, Item, ItemKind};
use pfstat::modifier::{ModifierKind, StackRule};
use pfstat::report::SourceDetail;
use pfstat::resolver::{group_changes, StackingBucket};
use pfstat::source::{SourceDescriptor, SourceKind};
use pfstat::target::{Ability, ChangeCategory, ChangeTarget};
use pfstat::*;
use strum::IntoEnumIterator;

fn engine() -> Engine {
    Engine::new(Ruleset::pathfinder()).unwrap()
}

fn buff(name: &str, subtype: &str, change: Change) -> Item {
    Item::new(name, ItemKind::Buff)
        .with_subtype(subtype)
        .with_change(change)
        .activated()
}

// ============================================================================
// Unit Tests: StackingBucket
// ============================================================================

#[test]
fn test_every_typed_kind_takes_the_best() {
    let first = SourceDescriptor::item(ItemKind::Equipment, None, "First");
    let second = SourceDescriptor::item(ItemKind::Equipment, None, "Second");

    for kind in ModifierKind::iter().filter(|k| k.stack_rule() == StackRule::Extremum) {
        let mut bucket = StackingBucket::new(kind);
        bucket.add(&first, 2);
        bucket.add(&second, 3);
        bucket.add(&first, -1);
        bucket.add(&second, -4);
        assert_eq!(bucket.total(), -1, "{} should keep +3 and -4", kind);
        assert_eq!(bucket.contributions().count(), 2);
    }
}

#[test]
fn test_every_stacking_kind_sums() {
    let first = SourceDescriptor::item(ItemKind::Equipment, None, "First");
    let second = SourceDescriptor::item(ItemKind::Feat, None, "Second");

    for kind in ModifierKind::iter().filter(|k| k.stacks()) {
        let mut bucket = StackingBucket::new(kind);
        bucket.add(&first, 2);
        bucket.add(&second, 3);
        bucket.add(&first, -1);
        assert_eq!(bucket.total(), 4, "{} should sum", kind);
        assert_eq!(bucket.positive.value, 5);
        assert_eq!(bucket.negative.value, -1);
    }
}

#[test]
fn test_bucket_sides_match_their_sources() {
    let temp = SourceDescriptor::item(ItemKind::Buff, Some("temp"), "Bless");
    let perm = SourceDescriptor::item(ItemKind::Buff, Some("perm"), "Heroism");
    let size = SourceDescriptor::new(SourceKind::Size, Some("small"), "Size");

    let mut bucket = StackingBucket::new(ModifierKind::Penalty);
    for (source, value) in [(&temp, -1), (&perm, -2), (&temp, -3), (&size, -1)] {
        bucket.add(source, value);
    }

    let sum: i64 = bucket.negative.sources.iter().map(|(_, v)| v).sum();
    assert_eq!(sum, bucket.negative.value);
    assert_eq!(bucket.negative.sources.len(), 3);
    assert_eq!(bucket.negative.sources[0], (temp, -4));
}

// ============================================================================
// Unit Tests: Grouping
// ============================================================================

#[test]
fn test_priority_orders_changes_within_group() {
    let source = SourceDescriptor::item(ItemKind::Feat, None, "Feat");
    let changes: Vec<_> = [(3, "late"), (-1, "early"), (0, "middle"), (-1, "early-too")]
        .into_iter()
        .map(|(priority, formula)| {
            CollectedChange::new(
                Change::add(formula)
                    .to(ChangeTarget::Cmb)
                    .untyped()
                    .with_priority(priority),
                source.clone(),
            )
        })
        .collect();

    let groups = group_changes(&changes, &Ruleset::pathfinder());
    let misc = &groups[&ChangeCategory::Misc];
    let order: Vec<_> = misc[0].changes.iter().map(|c| c.change.formula.as_str()).collect();
    assert_eq!(order, vec!["early", "early-too", "middle", "late"]);
}

#[test]
fn test_custom_kind_order_reorders_groups() {
    let mut ruleset = Ruleset::pathfinder();
    ruleset.kind_order.retain(|k| *k != ModifierKind::Penalty);
    ruleset.kind_order.insert(0, ModifierKind::Penalty);

    let source = SourceDescriptor::rule("Test");
    let changes = vec![
        CollectedChange::new(Change::flat(1).to(ChangeTarget::Init).untyped(), source.clone()),
        CollectedChange::new(
            Change::flat(-1)
                .to(ChangeTarget::Init)
                .as_kind(ModifierKind::Penalty),
            source,
        ),
    ];
    let groups = group_changes(&changes, &ruleset);
    let kinds: Vec<_> = groups[&ChangeCategory::Misc].iter().map(|g| g.kind).collect();
    assert_eq!(kinds, vec![ModifierKind::Penalty, ModifierKind::Untyped]);
}

// ============================================================================
// Integration Tests: Stacking through the engine
// ============================================================================

#[test]
fn test_untyped_and_typed_combine() {
    let attack = |value, kind| Change::flat(value).to(ChangeTarget::Attack).as_kind(kind);
    let actor = Actor::new("Valeros")
        .with_item(buff("Bless", "temp", attack(1, ModifierKind::Morale)))
        .with_item(buff("Heroism", "temp", attack(2, ModifierKind::Morale)))
        .with_item(buff("Flanking", "misc", attack(2, ModifierKind::Untyped)))
        .with_item(buff("Prayer", "temp", attack(1, ModifierKind::Luck)));

    let result = engine().recompute(&actor, None).unwrap();
    assert_eq!(result.get("attributes.attack.general"), Some(2 + 2 + 1));
    assert_eq!(
        result.details("attributes.attack.general"),
        &[
            SourceDetail::number("Base", 0),
            SourceDetail::number("Misc Buffs", 2),
            SourceDetail::number("Temporary Buffs", 3),
        ]
    );
}

#[test]
fn test_stacking_penalties_from_one_source_type_merge() {
    let weaken = |value| {
        Change::flat(value)
            .to(ChangeTarget::Ability(Ability::Str))
            .as_kind(ModifierKind::Penalty)
    };
    let actor = Actor::new("Lem")
        .with_item(buff("Ray of Enfeeblement", "temp", weaken(-3)))
        .with_item(buff("Touch of Fatigue", "temp", weaken(-1)));

    let result = engine().recompute(&actor, None).unwrap();
    assert_eq!(result.get("abilities.str.total"), Some(6));
    assert_eq!(result.get("abilities.str.mod"), Some(-2));
    assert_eq!(
        result.details("abilities.str.total"),
        &[
            SourceDetail::number("Base", 10),
            SourceDetail::number("Temporary Buffs", -4),
        ]
    );
}

#[test]
fn test_item_flag_denies_dodge() {
    let dodge = Change::flat(2).to(ChangeTarget::Ac).as_kind(ModifierKind::Dodge);
    let actor = Actor::new("Merisiel")
        .with_ability(Ability::Dex, 16)
        .with_item(Item::new("Mobility", ItemKind::Feat).with_change(dodge));
    let unburdened = engine().recompute(&actor, None).unwrap();
    assert_eq!(unburdened.get("attributes.ac.normal.total"), Some(15));

    let burdened = actor.with_item(
        Item::new("Tanglefoot Bag", ItemKind::Buff)
            .with_flag(Flag::LoseDexToAc)
            .activated(),
    );
    let result = engine().recompute(&burdened, None).unwrap();
    assert!(result.flags.lose_dex_to_ac);
    assert_eq!(result.get("attributes.ac.normal.total"), Some(10));
    assert!(!result
        .details("attributes.ac.normal.total")
        .iter()
        .any(|d| d.name == "Mobility"));
}

#[test]
fn test_zero_valued_changes_leave_no_trace() {
    let actor = Actor::new("Kyra").with_item(
        Item::new("Unlucky Charm", ItemKind::Equipment)
            .with_change(Change::add("2 - 2").to(ChangeTarget::Init).as_kind(ModifierKind::Luck))
            .equipped(),
    );

    let result = engine().recompute(&actor, None).unwrap();
    assert_eq!(
        result.details("attributes.init.total"),
        &[SourceDetail::number("Base", 0)]
    );
}
