//! Stacking resolver.
//!
//! Groups collected changes by `(target, kind)`, evaluates their formulas
//! against redacted roll data and folds the results into a
//! `StackingBucket` per group. The kind's [`StackRule`] decides how
//! contributions combine.

use crate::change::{CollectedChange, ResolvedChange};
use crate::error::StatError;
use crate::formula::FormulaEvaluator;
use crate::modifier::{ModifierKind, StackRule};
use crate::resolved::FormulaWarning;
use crate::roll_data::RollData;
use crate::ruleset::Ruleset;
use crate::source::SourceDescriptor;
use crate::target::{ChangeCategory, ChangeTarget};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// One sign of a bucket: the running total and the sources behind it.
///
/// `value` always equals the sum of the source values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BucketSide {
    pub value: i64,
    pub sources: Vec<(SourceDescriptor, i64)>,
}

impl BucketSide {
    fn sum(&mut self, source: &SourceDescriptor, value: i64) {
        self.value = self.value.saturating_add(value);
        match self
            .sources
            .iter_mut()
            .find(|(existing, _)| existing.merge_key() == source.merge_key())
        {
            Some((_, merged)) => *merged = merged.saturating_add(value),
            None => self.sources.push((source.clone(), value)),
        }
    }

    fn replace(&mut self, source: &SourceDescriptor, value: i64) {
        self.value = value;
        self.sources = vec![(source.clone(), value)];
    }
}

/// Stacked contributions of one kind to one target.
///
/// Bonuses and penalties are tracked separately so a typed kind keeps both
/// its best bonus and its worst penalty.
///
/// # Examples
///
/// ```rust
/// use pfstat::item::ItemKind;
/// use pfstat::modifier::ModifierKind;
/// use pfstat::resolver::StackingBucket;
/// use pfstat::source::SourceDescriptor;
///
/// let cloak = SourceDescriptor::item(ItemKind::Equipment, None, "Cloak of Resistance +1");
/// let vest = SourceDescriptor::item(ItemKind::Equipment, None, "Vest of Resistance +2");
///
/// let mut resistance = StackingBucket::new(ModifierKind::Resist);
/// resistance.add(&cloak, 1);
/// resistance.add(&vest, 2);
/// assert_eq!(resistance.total(), 2);
///
/// let mut untyped = StackingBucket::new(ModifierKind::Untyped);
/// untyped.add(&cloak, 1);
/// untyped.add(&vest, 2);
/// assert_eq!(untyped.total(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackingBucket {
    pub kind: ModifierKind,
    pub positive: BucketSide,
    pub negative: BucketSide,
}

impl StackingBucket {
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            positive: BucketSide::default(),
            negative: BucketSide::default(),
        }
    }

    /// Fold one evaluated contribution into the bucket.
    ///
    /// Zero values are ignored. For extremum kinds the source list only
    /// changes on strict improvement, so ties keep the first source seen.
    pub fn add(&mut self, source: &SourceDescriptor, value: i64) {
        if value == 0 {
            return;
        }
        let side = if value > 0 {
            &mut self.positive
        } else {
            &mut self.negative
        };
        match self.kind.stack_rule() {
            StackRule::Sum => side.sum(source, value),
            StackRule::Extremum => {
                let improves = if value > 0 {
                    value > side.value
                } else {
                    value < side.value
                };
                if improves {
                    side.replace(source, value);
                }
            }
        }
    }

    pub fn total(&self) -> i64 {
        self.positive.value.saturating_add(self.negative.value)
    }

    /// Surviving contributions, bonuses first.
    pub fn contributions(&self) -> impl Iterator<Item = (&SourceDescriptor, i64)> {
        self.positive
            .sources
            .iter()
            .chain(self.negative.sources.iter())
            .map(|(source, value)| (source, *value))
    }
}

/// All changes sharing one target and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeGroup {
    pub target: ChangeTarget,
    pub kind: ModifierKind,
    /// Ordered by ascending priority, then collection order.
    pub changes: Vec<CollectedChange>,
}

/// A resolved group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroup {
    pub target: ChangeTarget,
    pub bucket: StackingBucket,
}

/// Group changes per category, ordered for resolution.
///
/// Inside a category groups follow the ruleset's kind order, then target
/// order.
pub fn group_changes(
    changes: &[CollectedChange],
    ruleset: &Ruleset,
) -> BTreeMap<ChangeCategory, Vec<ChangeGroup>> {
    type GroupKey = (ChangeCategory, usize, ChangeTarget, ModifierKind);
    let mut keyed: BTreeMap<GroupKey, Vec<CollectedChange>> = BTreeMap::new();
    for collected in changes {
        let change = &collected.change;
        keyed
            .entry((
                change.target.category(),
                ruleset.kind_rank(change.kind),
                change.target.clone(),
                change.kind,
            ))
            .or_default()
            .push(collected.clone());
    }

    let mut groups: BTreeMap<ChangeCategory, Vec<ChangeGroup>> = BTreeMap::new();
    for ((category, _, target, kind), mut changes) in keyed {
        changes.sort_by_key(|collected| collected.change.priority);
        groups.entry(category).or_default().push(ChangeGroup {
            target,
            kind,
            changes,
        });
    }
    groups
}

/// Evaluate and stack one group.
///
/// Formulas see `data` with the target's redactions applied. A failing
/// formula contributes zero and is reported in `warnings`.
pub fn resolve_group<E: FormulaEvaluator + ?Sized>(
    group: &ChangeGroup,
    data: &RollData,
    ruleset: &Ruleset,
    evaluator: &E,
    warnings: &mut Vec<FormulaWarning>,
) -> ResolvedGroup {
    let visible = data.redacted(ruleset.redactions_for(&group.target));
    let resolved: Vec<ResolvedChange> = group
        .changes
        .iter()
        .map(|collected| resolve_change(collected, &group.target, &visible, evaluator, warnings))
        .collect();

    let mut bucket = StackingBucket::new(group.kind);
    for change in &resolved {
        bucket.add(&change.source, change.value);
    }

    trace!(
        change_target = %group.target,
        kind = %group.kind,
        total = bucket.total(),
        "resolved group"
    );
    ResolvedGroup {
        target: group.target.clone(),
        bucket,
    }
}

fn resolve_change<E: FormulaEvaluator + ?Sized>(
    collected: &CollectedChange,
    target: &ChangeTarget,
    data: &RollData,
    evaluator: &E,
    warnings: &mut Vec<FormulaWarning>,
) -> ResolvedChange {
    let value = match evaluate(evaluator, &collected.change.formula, data) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                change_target = %target,
                source = %collected.source.name,
                error = %err,
                "formula failed, contributing 0"
            );
            warnings.push(FormulaWarning {
                formula: collected.change.formula.clone(),
                target: target.to_string(),
                source: collected.source.name.clone(),
                message: err.to_string(),
            });
            0
        }
    };
    ResolvedChange {
        source: collected.source.clone(),
        value,
    }
}

fn evaluate<E: FormulaEvaluator + ?Sized>(
    evaluator: &E,
    formula: &str,
    data: &RollData,
) -> Result<i64, StatError> {
    let value = evaluator.evaluate(formula, data)?.floor();
    if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(StatError::Formula {
            formula: formula.to_string(),
            reason: "result out of range".to_string(),
        });
    }
    Ok(value as i64)
}
