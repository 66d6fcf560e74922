//! # pfstat - Deterministic Pathfinder 1e Derived-Statistics Engine
//!
//! The recomputation core of a virtual-tabletop character sheet:
//! - **Deterministic** resolution (same actor and ruleset → same output)
//! - **Data-driven** rules (targets, stacking, conditions and sizes live in a `Ruleset`)
//! - **Pure** passes (every derived value is recomputed, nothing is patched)
//! - **Explainable** results (every attribute carries its source breakdown)
//!
//! ## Core Concepts
//!
//! ### Recompute Pipeline
//!
//! ```text
//! [Actor] → [collect] → [group by (target, kind)] → [stack] → [propagate] → [Recomputed]
//! ```
//!
//! 1. **Collection** gathers changes from active items, built-in rules and
//!    conditions, along with flags such as "lose Dex to AC"
//! 2. **Stacking** evaluates formulas and combines contributions per bonus type:
//!    untyped, dodge and penalties add up, typed bonuses keep only the best
//! 3. **Propagation** applies ability changes first, pushes modifier deltas into
//!    CMB, CMD, initiative, AC and saves, then applies everything else
//! 4. **Reporting** lists the contributing sources of every attribute
//!
//! ## Example
//!
//! ```rust
//! use pfstat::actor::Actor;
//! use pfstat::change::Change;
//! use pfstat::item::{Item, ItemKind};
//! use pfstat::modifier::ModifierKind;
//! use pfstat::target::{Ability, ChangeTarget};
//! use pfstat::{Engine, Ruleset};
//!
//! let engine = Engine::new(Ruleset::pathfinder()).unwrap();
//!
//! let actor = Actor::new("Valeros")
//!     .with_ability(Ability::Str, 16)
//!     .with_item(
//!         Item::new("Ring of Protection +1", ItemKind::Equipment)
//!             .with_change(Change::flat(1).to(ChangeTarget::Ac).as_kind(ModifierKind::Deflection))
//!             .equipped(),
//!     );
//!
//! let result = engine.recompute(&actor, None).unwrap();
//! assert_eq!(result.get("attributes.ac.normal.total"), Some(11));
//! assert_eq!(result.get("attributes.cmd.total"), Some(14));
//! ```
//!
//! ## Modules
//!
//! - [`actor`] - Actor snapshots and pending edits
//! - [`item`] - Items, armor and class data
//! - [`change`] - Change declarations
//! - [`target`] - Change targets and categories
//! - [`modifier`] - Bonus types and stacking rules
//! - [`condition`] - Conditions and flags
//! - [`ruleset`] - Rules configuration
//! - [`formula`] - Formula evaluation
//! - [`collector`] - Change collection
//! - [`resolver`] - Stacking buckets
//! - [`propagate`] - Resolution state and dependency propagation
//! - [`report`] - Source breakdowns
//! - [`engine`] - The recompute entry point
//! - [`graph`] - Category dependency graph
//! - [`error`] - Error types

pub mod actor;
pub mod change;
pub mod collector;
pub mod condition;
pub mod engine;
pub mod error;
pub mod formula;
pub mod graph;
pub mod item;
pub mod modifier;
pub mod path;
pub mod propagate;
pub mod report;
pub mod resolved;
pub mod resolver;
pub mod roll_data;
pub mod ruleset;
pub mod source;
pub mod target;

// Re-export main types for convenience
pub use engine::Engine;
pub use error::StatError;
pub use path::AttrPath;
pub use resolved::{FormulaWarning, Recomputed};
pub use roll_data::RollData;
pub use ruleset::Ruleset;

pub use actor::{Actor, Size};
pub use change::Change;
pub use condition::{ActorFlags, Condition};
pub use item::{Item, ItemKind};
pub use modifier::{ModifierKind, StackRule};
pub use report::{DetailValue, SourceDetail};
pub use target::{Ability, ChangeTarget};
