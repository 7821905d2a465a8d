use crate::catalog::store::{Catalog, NewInstance, NewItem};
use crate::error::Result;
use crate::model::{InstanceKind, ItemKind, Source};

/// Counts reported after seeding the demo catalog.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SeedSummary {
    pub instances: usize,
    pub items: usize,
}

/// Populates a catalog with a small demo data set covering every kind.
///
/// The fixture is deterministic, so tests and local setups can rely on the
/// browse order. Seeding an already-seeded catalog fails on the first
/// duplicate id.
pub fn seed_demo(catalog: &mut Catalog) -> Result<SeedSummary> {
    let instances = demo_instances();
    for record in &instances {
        catalog.insert_instance(record)?;
    }
    let items = demo_items();
    catalog.insert_items(&items)?;
    Ok(SeedSummary {
        instances: instances.len(),
        items: items.len(),
    })
}

fn instance(id: &str, kind: InstanceKind, name: &str) -> NewInstance {
    NewInstance {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        image: Some(format!("/assets/duty/{id}.png")),
    }
}

fn item(
    id: &str,
    kind: ItemKind,
    name: &str,
    instance_id: Option<&str>,
    sources: &[(&str, &str)],
) -> NewItem {
    NewItem {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        image: Some(format!("/assets/item/{id}.png")),
        instance_id: instance_id.map(str::to_string),
        sources: sources
            .iter()
            .map(|(kind, text)| Source {
                kind: kind.to_string(),
                text: text.to_string(),
            })
            .collect(),
    }
}

fn demo_instances() -> Vec<NewInstance> {
    vec![
        instance("sastasha", InstanceKind::Dungeon, "Sastasha"),
        instance("the-aquapolis", InstanceKind::Dungeon, "The Aquapolis"),
        instance("the-navel-hard", InstanceKind::Trial, "The Navel (Hard)"),
        instance(
            "the-bowl-of-embers-extreme",
            InstanceKind::Trial,
            "The Bowl of Embers (Extreme)",
        ),
        instance(
            "alexander-the-burden-of-the-father",
            InstanceKind::Raid,
            "Alexander - The Burden of the Father",
        ),
        instance(
            "the-sildihn-subterrane",
            InstanceKind::VariantDungeon,
            "The Sil'dihn Subterrane",
        ),
    ]
}

fn demo_items() -> Vec<NewItem> {
    vec![
        item(
            "baby-bun",
            ItemKind::Minion,
            "Baby Bun",
            Some("sastasha"),
            &[("Dungeon", "Sastasha")],
        ),
        item(
            "wind-up-tonberry",
            ItemKind::Minion,
            "Wind-up Tonberry",
            None,
            &[("Gold Saucer", "MGP prize exchange")],
        ),
        item(
            "paissa-brat",
            ItemKind::Minion,
            "Paissa Brat",
            Some("the-aquapolis"),
            &[("Dungeon", "The Aquapolis, final chamber")],
        ),
        item(
            "wind-up-silkie",
            ItemKind::Minion,
            "Wind-up Silkie",
            Some("the-sildihn-subterrane"),
            &[("Variant Dungeon", "The Sil'dihn Subterrane")],
        ),
        item(
            "aithon",
            ItemKind::Mount,
            "Aithon",
            Some("the-bowl-of-embers-extreme"),
            &[("Trial", "The Bowl of Embers (Extreme)")],
        ),
        item(
            "magitek-avenger",
            ItemKind::Mount,
            "Magitek Avenger",
            None,
            &[("Achievement", "Complete 200 frontline campaigns")],
        ),
        item(
            "under-the-weight",
            ItemKind::Orchestrion,
            "Under the Weight",
            Some("the-navel-hard"),
            &[("Trial", "The Navel (Hard)")],
        ),
        item(
            "brute-strength",
            ItemKind::Orchestrion,
            "Brute Strength",
            Some("alexander-the-burden-of-the-father"),
            &[("Raid", "Alexander - The Burden of the Father")],
        ),
        item(
            "sands-of-amber",
            ItemKind::Orchestrion,
            "Sands of Amber",
            Some("the-sildihn-subterrane"),
            &[("Variant Dungeon", "Silkie's chamber")],
        ),
        item(
            "water-cannon",
            ItemKind::Spell,
            "Water Cannon",
            None,
            &[("Field", "Learned from wild Megalocrabs")],
        ),
        item(
            "bad-breath",
            ItemKind::Spell,
            "Bad Breath",
            None,
            &[("Field", "Learned from Morbols"), ("Duty", "Masked Carnivale")],
        ),
        item(
            "ifrit-card",
            ItemKind::Card,
            "Ifrit",
            Some("the-bowl-of-embers-extreme"),
            &[("Trial", "The Bowl of Embers (Extreme)")],
        ),
        item(
            "sabotender-card",
            ItemKind::Card,
            "Sabotender",
            None,
            &[("Shop", "Triple Triad Trader")],
        ),
        item(
            "ball-dance",
            ItemKind::Emote,
            "Ball Dance",
            None,
            &[("Quest", "Help Me, Lord of the Dance")],
        ),
        item(
            "eternal-bond",
            ItemKind::Emote,
            "Eternal Bond",
            None,
            &[("Quest", "The Ties That Bind")],
        ),
        item(
            "eastern-cherry",
            ItemKind::Hairstyle,
            "Eastern Cherry Blossom",
            None,
            &[("Shop", "Kugane scrip exchange")],
        ),
        item(
            "controlled-chaos",
            ItemKind::Hairstyle,
            "Controlled Chaos",
            None,
            &[("Gold Saucer", "MGP prize exchange")],
        ),
    ]
}
