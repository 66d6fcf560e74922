//! Ruleset configuration.
//!
//! The `Ruleset` is the static table the engine resolves against: category
//! and kind priority, the target → attribute-path mapping, roll-data
//! redactions, the skill list, the condition effect table, size modifiers
//! and source labels. It is an explicit value passed to the engine, never a
//! global, so tests and alternate rulesets can supply their own.
//!
//! [`Ruleset::pathfinder`] ships the Pathfinder 1e defaults.

use crate::actor::Size;
use crate::change::Change;
use crate::condition::Condition;
use crate::error::StatError;
use crate::graph::CategoryGraph;
use crate::item::Flag;
use crate::modifier::ModifierKind;
use crate::path::{known, AttrPath};
use crate::source::{SourceKind, SourceLabelRule};
use crate::target::{Ability, ChangeCategory, ChangeTarget, Save, SpeedKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Attribute paths a target writes to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetMapping {
    pub paths: Vec<AttrPath>,
    /// Kind-specific path lists replacing `paths` for that kind.
    pub by_kind: BTreeMap<ModifierKind, Vec<AttrPath>>,
}

impl TargetMapping {
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        Self {
            paths: paths.iter().map(|p| AttrPath::new(p.as_ref())).collect(),
            by_kind: BTreeMap::new(),
        }
    }

    pub fn with_kind<S: AsRef<str>>(mut self, kind: ModifierKind, paths: &[S]) -> Self {
        self.by_kind
            .insert(kind, paths.iter().map(|p| AttrPath::new(p.as_ref())).collect());
        self
    }

    pub fn paths_for(&self, kind: ModifierKind) -> &[AttrPath] {
        self.by_kind.get(&kind).unwrap_or(&self.paths)
    }
}

/// A skill known to the ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub ability: Ability,
    /// Whether the armor check penalty applies.
    #[serde(default)]
    pub acp: bool,
}

/// A narrative line attached to an attribute by a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionNote {
    pub path: AttrPath,
    pub text: String,
}

/// Everything one condition does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionEffect {
    pub label: String,
    pub changes: Vec<Change>,
    pub flags: Vec<Flag>,
    pub notes: Vec<ConditionNote>,
    /// Conditions whose effects this one replaces while both are active.
    pub supersedes: Vec<Condition>,
}

impl ConditionEffect {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    fn change(mut self, value: i64, target: ChangeTarget) -> Self {
        self.changes
            .push(Change::flat(value).to(target).as_kind(ModifierKind::Penalty));
        self
    }

    fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    fn note(mut self, path: &str, text: &str) -> Self {
        self.notes.push(ConditionNote {
            path: AttrPath::new(path),
            text: text.to_string(),
        });
        self
    }

    fn supersedes(mut self, condition: Condition) -> Self {
        self.supersedes.push(condition);
        self
    }
}

/// Size-dependent modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeModifiers {
    /// Size modifier to AC (and attack).
    pub ac: i64,
    /// Special size modifier to CMB and CMD.
    pub special: i64,
    pub stealth: i64,
    pub fly: i64,
}

/// The static rules table.
///
/// # Examples
///
/// ```rust
/// use pfstat::modifier::ModifierKind;
/// use pfstat::target::ChangeTarget;
/// use pfstat::Ruleset;
///
/// let rules = Ruleset::pathfinder();
/// let dodge = rules.paths_for(&ChangeTarget::Ac, ModifierKind::Dodge);
/// assert!(dodge.iter().any(|p| p.as_str() == "attributes.cmd.total"));
///
/// let stealth = rules.paths_for(&ChangeTarget::Skill("ste".into()), ModifierKind::Size);
/// assert_eq!(stealth.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    pub category_order: Vec<ChangeCategory>,
    /// `(dependent, dependency)` pairs.
    pub category_dependencies: Vec<(ChangeCategory, ChangeCategory)>,
    pub kind_order: Vec<ModifierKind>,
    pub targets: BTreeMap<ChangeTarget, TargetMapping>,
    pub redactions: BTreeMap<ChangeTarget, Vec<String>>,
    pub skills: BTreeMap<String, SkillDef>,
    pub save_abilities: BTreeMap<Save, Ability>,
    pub conditions: BTreeMap<Condition, ConditionEffect>,
    pub sizes: BTreeMap<Size, SizeModifiers>,
    pub source_labels: Vec<SourceLabelRule>,
}

impl Ruleset {
    /// Load a ruleset from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, StatError> {
        let ruleset: Ruleset =
            serde_json::from_str(json).map_err(|e| StatError::InvalidRuleset(e.to_string()))?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Check the ruleset is usable.
    ///
    /// Every modifier kind must appear exactly once in the kind order, every
    /// save needs a governing ability, and the category dependencies must be
    /// acyclic.
    pub fn validate(&self) -> Result<(), StatError> {
        for kind in ModifierKind::iter() {
            let count = self.kind_order.iter().filter(|k| **k == kind).count();
            if count != 1 {
                return Err(StatError::InvalidRuleset(format!(
                    "modifier kind `{}` appears {} times in the kind order",
                    kind, count
                )));
            }
        }
        for save in Save::iter() {
            if !self.save_abilities.contains_key(&save) {
                return Err(StatError::InvalidRuleset(format!(
                    "no governing ability for save `{}`",
                    save
                )));
            }
        }
        self.resolution_order().map(|_| ())
    }

    /// Category graph built from the declared dependencies.
    pub fn category_graph(&self) -> CategoryGraph {
        let mut graph = CategoryGraph::new();
        for category in ChangeCategory::iter() {
            graph.add_node(category);
        }
        for (dependent, dependency) in &self.category_dependencies {
            graph.add_edge(*dependent, *dependency);
        }
        graph
    }

    /// Categories in the order the engine resolves them.
    pub fn resolution_order(&self) -> Result<Vec<ChangeCategory>, StatError> {
        self.category_graph().resolution_order(&self.category_order)
    }

    /// Position of a kind in the kind priority order.
    pub fn kind_rank(&self, kind: ModifierKind) -> usize {
        self.kind_order
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(usize::MAX)
    }

    /// Attribute paths a change of `kind` against `target` writes to.
    ///
    /// Skill targets expand over the skill table. An empty result means the
    /// target is unmapped and its changes are skipped.
    pub fn paths_for(&self, target: &ChangeTarget, kind: ModifierKind) -> Vec<AttrPath> {
        match target {
            ChangeTarget::Skills => self.skills.keys().map(|key| AttrPath::skill(key)).collect(),
            ChangeTarget::AbilitySkills(ability) => self
                .skills
                .iter()
                .filter(|(_, def)| def.ability == *ability)
                .map(|(key, _)| AttrPath::skill(key))
                .collect(),
            ChangeTarget::Skill(key) => {
                if self.skills.contains_key(key) {
                    vec![AttrPath::skill(key)]
                } else {
                    Vec::new()
                }
            }
            ChangeTarget::Ability(ability) => vec![AttrPath::ability_total(*ability)],
            other => self
                .targets
                .get(other)
                .map(|mapping| mapping.paths_for(kind).to_vec())
                .unwrap_or_default(),
        }
    }

    /// Roll-data subtrees hidden from formulas of changes against `target`.
    pub fn redactions_for(&self, target: &ChangeTarget) -> &[String] {
        let key = match target {
            ChangeTarget::Skill(_) | ChangeTarget::AbilitySkills(_) => ChangeTarget::Skills,
            other => other.clone(),
        };
        self.redactions.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn size_modifiers(&self, size: Size) -> SizeModifiers {
        self.sizes.get(&size).copied().unwrap_or_default()
    }

    pub fn save_ability(&self, save: Save) -> Ability {
        self.save_abilities.get(&save).copied().unwrap_or(match save {
            Save::Fort => Ability::Con,
            Save::Ref => Ability::Dex,
            Save::Will => Ability::Wis,
        })
    }

    /// The Pathfinder 1e ruleset.
    pub fn pathfinder() -> Self {
        Self {
            category_order: vec![
                ChangeCategory::Ability,
                ChangeCategory::Misc,
                ChangeCategory::Ac,
                ChangeCategory::Attack,
                ChangeCategory::Damage,
                ChangeCategory::SavingThrows,
                ChangeCategory::Skills,
                ChangeCategory::Skill,
            ],
            category_dependencies: ChangeCategory::iter()
                .filter(|c| *c != ChangeCategory::Ability)
                .map(|c| (c, ChangeCategory::Ability))
                .collect(),
            kind_order: ModifierKind::iter().collect(),
            targets: pathfinder_targets(),
            redactions: pathfinder_redactions(),
            skills: pathfinder_skills(),
            save_abilities: BTreeMap::from([
                (Save::Fort, Ability::Con),
                (Save::Ref, Ability::Dex),
                (Save::Will, Ability::Wis),
            ]),
            conditions: pathfinder_conditions(),
            sizes: pathfinder_sizes(),
            source_labels: vec![
                SourceLabelRule::buff("temp", "Temporary Buffs"),
                SourceLabelRule::buff("perm", "Permanent Buffs"),
                SourceLabelRule::buff("item", "Item Buffs"),
                SourceLabelRule::buff("misc", "Misc Buffs"),
                SourceLabelRule::new(SourceKind::Size, None, "Size"),
            ],
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::pathfinder()
    }
}

fn pathfinder_targets() -> BTreeMap<ChangeTarget, TargetMapping> {
    let ac_all = [known::AC_NORMAL, known::AC_TOUCH, known::AC_FLAT_FOOTED];
    let ac_and_cmd = [
        known::AC_NORMAL,
        known::AC_TOUCH,
        known::AC_FLAT_FOOTED,
        known::CMD,
        known::CMD_FLAT_FOOTED,
    ];
    let mut ac = TargetMapping::new(&ac_all)
        .with_kind(ModifierKind::Dodge, &[known::AC_NORMAL, known::AC_TOUCH, known::CMD]);
    for kind in [
        ModifierKind::Deflection,
        ModifierKind::Circumstance,
        ModifierKind::Insight,
        ModifierKind::Luck,
        ModifierKind::Morale,
        ModifierKind::Profane,
        ModifierKind::Sacred,
    ] {
        ac = ac.with_kind(kind, &ac_and_cmd);
    }
    let armor_like = [known::AC_NORMAL, known::AC_FLAT_FOOTED];

    let mut targets = BTreeMap::from([
        (ChangeTarget::Ac, ac),
        (ChangeTarget::ArmorAc, TargetMapping::new(&armor_like)),
        (ChangeTarget::ShieldAc, TargetMapping::new(&armor_like)),
        (ChangeTarget::NaturalAc, TargetMapping::new(&armor_like)),
        (ChangeTarget::Attack, TargetMapping::new(&[known::ATTACK_GENERAL])),
        (ChangeTarget::MeleeAttack, TargetMapping::new(&[known::ATTACK_MELEE])),
        (ChangeTarget::RangedAttack, TargetMapping::new(&[known::ATTACK_RANGED])),
        (ChangeTarget::Damage, TargetMapping::new(&[known::DAMAGE_GENERAL])),
        (ChangeTarget::WeaponDamage, TargetMapping::new(&[known::DAMAGE_WEAPON])),
        (ChangeTarget::SpellDamage, TargetMapping::new(&[known::DAMAGE_SPELL])),
        (ChangeTarget::Cmb, TargetMapping::new(&[known::CMB])),
        (
            ChangeTarget::Cmd,
            TargetMapping::new(&[known::CMD, known::CMD_FLAT_FOOTED]),
        ),
        (ChangeTarget::Init, TargetMapping::new(&[known::INIT])),
        (ChangeTarget::Mhp, TargetMapping::new(&[known::HP_MAX])),
    ]);

    let saves: Vec<String> = Save::iter()
        .map(|save| AttrPath::save(save).to_string())
        .collect();
    targets.insert(ChangeTarget::AllSavingThrows, TargetMapping::new(&saves));
    for save in Save::iter() {
        targets.insert(
            ChangeTarget::Save(save),
            TargetMapping::new(&[AttrPath::save(save).to_string()]),
        );
    }

    let speeds: Vec<String> = SpeedKind::iter()
        .map(|kind| AttrPath::speed(kind).to_string())
        .collect();
    targets.insert(ChangeTarget::AllSpeeds, TargetMapping::new(&speeds));
    for kind in SpeedKind::iter() {
        targets.insert(
            ChangeTarget::Speed(kind),
            TargetMapping::new(&[AttrPath::speed(kind).to_string()]),
        );
    }
    targets
}

fn pathfinder_redactions() -> BTreeMap<ChangeTarget, Vec<String>> {
    let list = |paths: &[&str]| paths.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    let mut redactions = BTreeMap::new();

    for ability in Ability::iter() {
        let mut paths = vec![
            format!("abilities.{}", ability),
            "skills".to_string(),
            "attributes.savingThrows".to_string(),
        ];
        match ability {
            Ability::Str => paths.extend(list(&["attributes.cmb", "attributes.cmd"])),
            Ability::Dex => paths.extend(list(&[
                "attributes.ac",
                "attributes.cmd",
                "attributes.init",
            ])),
            Ability::Con => paths.push("attributes.hp".to_string()),
            _ => {}
        }
        redactions.insert(ChangeTarget::Ability(ability), paths);
    }
    for target in [
        ChangeTarget::Ac,
        ChangeTarget::ArmorAc,
        ChangeTarget::ShieldAc,
        ChangeTarget::NaturalAc,
    ] {
        redactions.insert(target, list(&["attributes.ac"]));
    }
    for target in [
        ChangeTarget::Attack,
        ChangeTarget::MeleeAttack,
        ChangeTarget::RangedAttack,
    ] {
        redactions.insert(target, list(&["attributes.attack"]));
    }
    for target in [
        ChangeTarget::Damage,
        ChangeTarget::WeaponDamage,
        ChangeTarget::SpellDamage,
    ] {
        redactions.insert(target, list(&["attributes.damage"]));
    }
    redactions.insert(
        ChangeTarget::AllSavingThrows,
        list(&["attributes.savingThrows"]),
    );
    for save in Save::iter() {
        redactions.insert(ChangeTarget::Save(save), list(&["attributes.savingThrows"]));
    }
    redactions.insert(ChangeTarget::Skills, list(&["skills"]));
    redactions.insert(ChangeTarget::Cmb, list(&["attributes.cmb"]));
    redactions.insert(ChangeTarget::Cmd, list(&["attributes.cmd"]));
    redactions.insert(ChangeTarget::Init, list(&["attributes.init"]));
    redactions.insert(ChangeTarget::Mhp, list(&["attributes.hp", "skills"]));
    redactions.insert(ChangeTarget::AllSpeeds, list(&["attributes.speed"]));
    for kind in SpeedKind::iter() {
        redactions.insert(ChangeTarget::Speed(kind), list(&["attributes.speed"]));
    }
    redactions
}

fn pathfinder_skills() -> BTreeMap<String, SkillDef> {
    const TABLE: &[(&str, &str, Ability, bool)] = &[
        ("acr", "Acrobatics", Ability::Dex, true),
        ("apr", "Appraise", Ability::Int, false),
        ("blf", "Bluff", Ability::Cha, false),
        ("clm", "Climb", Ability::Str, true),
        ("crf", "Craft", Ability::Int, false),
        ("dev", "Disable Device", Ability::Dex, true),
        ("dip", "Diplomacy", Ability::Cha, false),
        ("dis", "Disguise", Ability::Cha, false),
        ("esc", "Escape Artist", Ability::Dex, true),
        ("fly", "Fly", Ability::Dex, true),
        ("han", "Handle Animal", Ability::Cha, false),
        ("hea", "Heal", Ability::Wis, false),
        ("int", "Intimidate", Ability::Cha, false),
        ("kar", "Knowledge (Arcana)", Ability::Int, false),
        ("kdu", "Knowledge (Dungeoneering)", Ability::Int, false),
        ("ken", "Knowledge (Engineering)", Ability::Int, false),
        ("kge", "Knowledge (Geography)", Ability::Int, false),
        ("khi", "Knowledge (History)", Ability::Int, false),
        ("klo", "Knowledge (Local)", Ability::Int, false),
        ("kna", "Knowledge (Nature)", Ability::Int, false),
        ("kno", "Knowledge (Nobility)", Ability::Int, false),
        ("kpl", "Knowledge (Planes)", Ability::Int, false),
        ("kre", "Knowledge (Religion)", Ability::Int, false),
        ("lin", "Linguistics", Ability::Int, false),
        ("per", "Perception", Ability::Wis, false),
        ("prf", "Perform", Ability::Cha, false),
        ("pro", "Profession", Ability::Wis, false),
        ("rid", "Ride", Ability::Dex, true),
        ("sen", "Sense Motive", Ability::Wis, false),
        ("slt", "Sleight of Hand", Ability::Dex, true),
        ("spl", "Spellcraft", Ability::Int, false),
        ("ste", "Stealth", Ability::Dex, true),
        ("sur", "Survival", Ability::Wis, false),
        ("swm", "Swim", Ability::Str, true),
        ("umd", "Use Magic Device", Ability::Cha, false),
    ];
    TABLE
        .iter()
        .map(|(key, name, ability, acp)| {
            (
                key.to_string(),
                SkillDef {
                    name: name.to_string(),
                    ability: *ability,
                    acp: *acp,
                },
            )
        })
        .collect()
}

fn pathfinder_conditions() -> BTreeMap<Condition, ConditionEffect> {
    let dex = ChangeTarget::Ability(Ability::Dex);
    let strength = ChangeTarget::Ability(Ability::Str);
    let lose_dex = "Lose Dex to AC";

    BTreeMap::from([
        (
            Condition::Blind,
            ConditionEffect::new("Blind")
                .change(-2, ChangeTarget::Ac)
                .flag(Flag::LoseDexToAc)
                .note(known::AC_NORMAL, lose_dex)
                .note(known::AC_TOUCH, lose_dex)
                .note(known::CMD, lose_dex),
        ),
        (
            Condition::Dazzled,
            ConditionEffect::new("Dazzled").change(-1, ChangeTarget::Attack),
        ),
        (
            Condition::Deaf,
            ConditionEffect::new("Deaf").change(-4, ChangeTarget::Init),
        ),
        (
            Condition::Entangled,
            ConditionEffect::new("Entangled")
                .change(-4, dex.clone())
                .change(-2, ChangeTarget::Attack),
        ),
        (
            Condition::Grappled,
            ConditionEffect::new("Grappled")
                .change(-4, dex.clone())
                .change(-2, ChangeTarget::Attack),
        ),
        (
            Condition::Helpless,
            ConditionEffect::new("Helpless")
                .flag(Flag::NoDex)
                .note("abilities.dex.total", "0 Dex"),
        ),
        (
            Condition::Paralyzed,
            ConditionEffect::new("Paralyzed")
                .flag(Flag::NoDex)
                .flag(Flag::NoStr)
                .note("abilities.dex.total", "0 Dex")
                .note("abilities.str.total", "0 Str"),
        ),
        (
            Condition::Pinned,
            ConditionEffect::new("Pinned")
                .change(-4, ChangeTarget::Ac)
                .flag(Flag::LoseDexToAc)
                .note(known::AC_NORMAL, lose_dex)
                .note(known::AC_TOUCH, lose_dex)
                .note(known::CMD, lose_dex),
        ),
        (
            Condition::Fatigued,
            ConditionEffect::new("Fatigued")
                .change(-2, strength.clone())
                .change(-2, dex.clone()),
        ),
        (
            Condition::Exhausted,
            ConditionEffect::new("Exhausted")
                .change(-6, strength)
                .change(-6, dex)
                .supersedes(Condition::Fatigued),
        ),
        (
            Condition::Sickened,
            ConditionEffect::new("Sickened")
                .change(-2, ChangeTarget::Attack)
                .change(-2, ChangeTarget::WeaponDamage)
                .change(-2, ChangeTarget::AllSavingThrows)
                .change(-2, ChangeTarget::Skills),
        ),
        (
            Condition::Stunned,
            ConditionEffect::new("Stunned")
                .change(-2, ChangeTarget::Ac)
                .flag(Flag::LoseDexToAc)
                .note(known::AC_NORMAL, lose_dex)
                .note(known::AC_TOUCH, lose_dex)
                .note(known::CMD, lose_dex),
        ),
    ])
}

fn pathfinder_sizes() -> BTreeMap<Size, SizeModifiers> {
    const TABLE: &[(Size, i64, i64, i64, i64)] = &[
        (Size::Fine, 8, -8, 16, 8),
        (Size::Diminutive, 4, -4, 12, 6),
        (Size::Tiny, 2, -2, 8, 4),
        (Size::Small, 1, -1, 4, 2),
        (Size::Medium, 0, 0, 0, 0),
        (Size::Large, -1, 1, -4, -2),
        (Size::Huge, -2, 2, -8, -4),
        (Size::Gargantuan, -4, 4, -12, -6),
        (Size::Colossal, -8, 8, -16, -8),
    ];
    TABLE
        .iter()
        .map(|&(size, ac, special, stealth, fly)| {
            (
                size,
                SizeModifiers {
                    ac,
                    special,
                    stealth,
                    fly,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathfinder_ruleset_is_valid() {
        let rules = Ruleset::pathfinder();
        assert!(rules.validate().is_ok());
        let order = rules.resolution_order().unwrap();
        assert_eq!(order.first(), Some(&ChangeCategory::Ability));
        assert_eq!(order.last(), Some(&ChangeCategory::Skill));
    }

    #[test]
    fn test_kind_specific_ac_paths() {
        let rules = Ruleset::pathfinder();
        let enh = rules.paths_for(&ChangeTarget::Ac, ModifierKind::Enh);
        assert_eq!(enh.len(), 3);
        assert!(!enh.iter().any(|p| p.as_str() == known::CMD));

        let deflection = rules.paths_for(&ChangeTarget::Ac, ModifierKind::Deflection);
        assert_eq!(deflection.len(), 5);

        let armor = rules.paths_for(&ChangeTarget::ArmorAc, ModifierKind::Base);
        assert!(!armor.iter().any(|p| p.as_str() == known::AC_TOUCH));
    }

    #[test]
    fn test_skill_targets_expand_over_table() {
        let rules = Ruleset::pathfinder();
        let str_skills =
            rules.paths_for(&ChangeTarget::AbilitySkills(Ability::Str), ModifierKind::Untyped);
        assert_eq!(
            str_skills,
            vec![AttrPath::skill("clm"), AttrPath::skill("swm")]
        );
        assert!(rules
            .paths_for(&ChangeTarget::Skill("xyz".into()), ModifierKind::Untyped)
            .is_empty());
        assert_eq!(
            rules.paths_for(&ChangeTarget::Skills, ModifierKind::Untyped).len(),
            rules.skills.len()
        );
    }

    #[test]
    fn test_unmapped_target_yields_no_paths() {
        let mut rules = Ruleset::pathfinder();
        rules.targets.remove(&ChangeTarget::Speed(SpeedKind::Burrow));
        assert!(rules
            .paths_for(&ChangeTarget::Speed(SpeedKind::Burrow), ModifierKind::Enh)
            .is_empty());
    }

    #[test]
    fn test_redactions() {
        let rules = Ruleset::pathfinder();
        let str_hidden = rules.redactions_for(&ChangeTarget::Ability(Ability::Str));
        assert!(str_hidden.contains(&"abilities.str".to_string()));
        assert!(str_hidden.contains(&"skills".to_string()));
        assert!(str_hidden.contains(&"attributes.savingThrows".to_string()));
        assert_eq!(
            rules.redactions_for(&ChangeTarget::Skill("acr".into())),
            &["skills".to_string()]
        );
    }

    #[test]
    fn test_incomplete_kind_order_is_rejected() {
        let mut rules = Ruleset::pathfinder();
        rules.kind_order.retain(|k| *k != ModifierKind::Luck);
        assert!(matches!(rules.validate(), Err(StatError::InvalidRuleset(_))));
    }

    #[test]
    fn test_cyclic_dependencies_are_rejected() {
        let mut rules = Ruleset::pathfinder();
        rules
            .category_dependencies
            .push((ChangeCategory::Ability, ChangeCategory::Skill));
        assert!(matches!(rules.validate(), Err(StatError::Cycle { .. })));
    }

    #[test]
    fn test_ruleset_json_roundtrip() {
        let rules = Ruleset::pathfinder();
        let json = serde_json::to_string(&rules).unwrap();
        let loaded = Ruleset::from_json(&json).unwrap();
        assert_eq!(loaded, rules);
    }

    #[test]
    fn test_malformed_json_is_invalid_ruleset() {
        assert!(matches!(
            Ruleset::from_json("{ \"categoryOrder\": 5 }"),
            Err(StatError::InvalidRuleset(_))
        ));
    }
}
