//! Prints the derived statistics of a sample fighter, before and after a
//! pending edit that blinds him and drops his haste.
//!
//! Run with `RUST_LOG=pfstat=debug` to see the pass log.

use pfstat::actor::{Actor, SkillRanks};
use pfstat::change::Change;
use pfstat::item::{ArmorData, BabProgression, ClassData, Item, ItemKind, SaveProgression};
use pfstat::modifier::ModifierKind;
use pfstat::report::DetailValue;
use pfstat::target::{Ability, ChangeTarget};
use pfstat::{Engine, Recomputed, Ruleset, StatError};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const SHOWN: &[&str] = &[
    "abilities.str.total",
    "abilities.dex.total",
    "attributes.ac.normal.total",
    "attributes.ac.touch.total",
    "attributes.ac.flatFooted.total",
    "attributes.cmb.total",
    "attributes.cmd.total",
    "attributes.init.total",
    "attributes.hp.max",
    "attributes.savingThrows.fort.total",
    "attributes.attack.general",
    "skills.clm.mod",
];

fn main() -> Result<(), StatError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = Engine::new(Ruleset::pathfinder())?;
    let mut actor = Actor::new("Valeros")
        .with_ability(Ability::Str, 16)
        .with_ability(Ability::Dex, 14)
        .with_ability(Ability::Con, 14)
        .with_item(
            Item::new("Fighter", ItemKind::Class).with_class(ClassData {
                level: 5,
                hp: 47,
                bab: BabProgression::High,
                fort: SaveProgression::High,
                class_skills: vec!["clm".into(), "swm".into()],
                ..ClassData::default()
            }),
        )
        .with_item(
            Item::new("Chain Shirt +1", ItemKind::Equipment)
                .with_armor(ArmorData {
                    value: 4,
                    enh: 1,
                    max_dex: Some(4),
                    acp: 2,
                    ..ArmorData::default()
                })
                .equipped(),
        )
        .with_item(
            Item::new("Haste", ItemKind::Buff)
                .with_subtype("temp")
                .with_change(Change::flat(1).to(ChangeTarget::Ac).as_kind(ModifierKind::Dodge))
                .with_change(Change::flat(1).to(ChangeTarget::Attack).untyped())
                .activated(),
        );
    actor.skills.insert(
        "clm".into(),
        SkillRanks {
            rank: 5,
            class_skill: None,
        },
    );

    let sheet = engine.recompute(&actor, None)?;
    print_sheet("As built", &sheet);

    let edits = json!({
        "conditions": ["blind"],
        "items": actor
            .items
            .iter()
            .map(|item| {
                let mut value = serde_json::to_value(item)?;
                if item.name == "Haste" {
                    value["active"] = json!(false);
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?,
    });
    let blinded = engine.recompute(&actor, Some(&edits))?;
    print_sheet("Blinded, haste expired", &blinded);
    Ok(())
}

fn print_sheet(title: &str, sheet: &Recomputed) {
    println!("== {} ==", title);
    for path in SHOWN {
        let Some(value) = sheet.get(path) else {
            continue;
        };
        let parts: Vec<String> = sheet
            .details(path)
            .iter()
            .map(|detail| match &detail.value {
                DetailValue::Number(n) => format!("{} {:+}", detail.name, n),
                DetailValue::Text(text) => format!("{}: {}", detail.name, text),
            })
            .collect();
        println!("{:<38} {:>4}   [{}]", path, value, parts.join(", "));
    }
    for warning in &sheet.warnings {
        println!("warning: {} ({})", warning.message, warning.source);
    }
    println!();
}
