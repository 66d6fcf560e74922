//! Recompute engine.
//!
//! `Engine` is the single entry point of the crate. It owns a validated
//! [`Ruleset`] and a [`FormulaEvaluator`], and turns an actor snapshot
//! into a [`Recomputed`] result.

use crate::actor::Actor;
use crate::collector::collect;
use crate::error::StatError;
use crate::formula::{ArithmeticEvaluator, FormulaEvaluator};
use crate::propagate::ResolutionState;
use crate::report::source_details;
use crate::resolved::Recomputed;
use crate::resolver::{group_changes, resolve_group, ResolvedGroup};
use crate::ruleset::Ruleset;
use crate::target::ChangeCategory;
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, trace};

/// The derived-statistics engine.
///
/// Immutable once built; a single engine can serve any number of
/// recompute calls, from any thread.
///
/// # Examples
///
/// ```rust
/// use pfstat::actor::Actor;
/// use pfstat::target::Ability;
/// use pfstat::{Engine, Ruleset};
/// use serde_json::json;
///
/// let engine = Engine::new(Ruleset::pathfinder()).unwrap();
/// let actor = Actor::new("Valeros").with_ability(Ability::Str, 16);
///
/// let result = engine.recompute(&actor, None).unwrap();
/// assert_eq!(result.get("attributes.ac.normal.total"), Some(10));
/// assert_eq!(result.get("attributes.cmd.total"), Some(13));
///
/// // Pending edits are applied before resolution.
/// let blinded = engine
///     .recompute(&actor, Some(&json!({ "conditions": ["blind"] })))
///     .unwrap();
/// assert_eq!(blinded.get("attributes.ac.normal.total"), Some(8));
/// assert!(blinded.flags.lose_dex_to_ac);
/// ```
#[derive(Debug, Clone)]
pub struct Engine<E: FormulaEvaluator = ArithmeticEvaluator> {
    ruleset: Ruleset,
    order: Vec<ChangeCategory>,
    evaluator: E,
}

impl Engine<ArithmeticEvaluator> {
    /// Build an engine with the built-in arithmetic evaluator.
    ///
    /// # Errors
    ///
    /// Returns `StatError::InvalidRuleset` or `StatError::Cycle` when the
    /// ruleset fails validation.
    pub fn new(ruleset: Ruleset) -> Result<Self, StatError> {
        Self::with_evaluator(ruleset, ArithmeticEvaluator)
    }
}

impl<E: FormulaEvaluator> Engine<E> {
    /// Build an engine around a host-supplied formula evaluator.
    pub fn with_evaluator(ruleset: Ruleset, evaluator: E) -> Result<Self, StatError> {
        ruleset.validate()?;
        let order = ruleset.resolution_order()?;
        debug!(?order, "engine ready");
        Ok(Self {
            ruleset,
            order,
            evaluator,
        })
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Category resolution order.
    pub fn order(&self) -> &[ChangeCategory] {
        &self.order
    }

    /// Recompute every derived attribute of `actor`.
    ///
    /// `pending_edits` is a partial update deep-merged over the serialized
    /// actor first. Formula failures never abort the pass; they contribute
    /// zero and are listed in [`Recomputed::warnings`].
    ///
    /// # Errors
    ///
    /// Returns `StatError::InvalidEdit` when the edited snapshot is not a
    /// valid actor.
    pub fn recompute(
        &self,
        actor: &Actor,
        pending_edits: Option<&Value>,
    ) -> Result<Recomputed, StatError> {
        let actor = match pending_edits {
            Some(edits) => Cow::Owned(actor.with_edits(edits)?),
            None => Cow::Borrowed(actor),
        };
        debug!(actor = %actor.name, "recompute started");

        let collection = collect(&actor, &self.ruleset);
        let mut groups = group_changes(&collection.changes, &self.ruleset);
        let mut warnings = Vec::new();
        let mut state = ResolutionState::reset(&actor, &collection, &self.ruleset);

        for category in &self.order {
            let Some(category_groups) = groups.remove(category) else {
                continue;
            };
            trace!(category = %category, groups = category_groups.len(), "resolving category");

            let data = state.roll_data();
            let resolved: Vec<ResolvedGroup> = category_groups
                .iter()
                .map(|group| {
                    resolve_group(group, &data, &self.ruleset, &self.evaluator, &mut warnings)
                })
                .collect();

            state = match category {
                ChangeCategory::Ability => state.apply_abilities(&resolved, &self.ruleset),
                _ => state.apply_groups(&resolved, &self.ruleset),
            };
        }
        let state = state.finalize_skills(&self.ruleset);

        let result = Recomputed {
            attributes: state.totals(),
            source_details: source_details(&state),
            flags: state.flags(),
            warnings,
        };
        debug!(
            actor = %actor.name,
            attributes = result.attributes.len(),
            warnings = result.warnings.len(),
            "recompute finished"
        );
        Ok(result)
    }
}
