#![allow(missing_docs)]

use dungeoneer::catalog::{seed_demo, Catalog, OpenOptions};
use dungeoneer::collection::{Collection, CollectionError, ToggleOutcome};
use dungeoneer::guest::GuestStore;
use dungeoneer::model::{ItemKind, ItemSummary};
use dungeoneer::notify::{NoticeKind, Notices};
use tempfile::TempDir;

fn seeded_catalog() -> (TempDir, Catalog) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("catalog.db");
    let mut catalog = Catalog::open(&path, &OpenOptions::default()).expect("open");
    seed_demo(&mut catalog).expect("seed");
    (dir, catalog)
}

fn signed_in(dir: &TempDir, user: &str) -> Collection {
    Collection::new(
        Some(user.to_string()),
        GuestStore::open(dir.path().join("guest")),
        Notices::new(),
    )
}

fn summary_of(catalog: &Catalog, kind: ItemKind, id: &str) -> ItemSummary {
    let found = catalog.find_item(kind, id).expect("find item");
    ItemSummary {
        id: found.id,
        name: found.name,
        kind,
    }
}

#[test]
fn server_toggle_round_trips_and_updates_the_owner_column() {
    let (dir, mut catalog) = seeded_catalog();
    let collection = signed_in(&dir, "u1");
    let target = summary_of(&catalog, ItemKind::Minion, "baby-bun");

    let outcome = collection
        .toggle(&mut catalog, &target, false)
        .expect("add");
    assert!(matches!(outcome, ToggleOutcome::Server(ref s) if s.id == "baby-bun"));

    let page = catalog
        .page_items(ItemKind::Minion, None, 10)
        .expect("page");
    let baby_bun = page
        .items
        .iter()
        .find(|item| item.id == "baby-bun")
        .expect("listed");
    assert_eq!(baby_bun.owners, vec!["u1".to_string()]);

    collection
        .toggle(&mut catalog, &target, true)
        .expect("remove");
    let page = catalog
        .page_items(ItemKind::Minion, None, 10)
        .expect("page");
    let baby_bun = page
        .items
        .iter()
        .find(|item| item.id == "baby-bun")
        .expect("listed");
    assert!(baby_bun.owners.is_empty());

    let notices = collection.notices().snapshot();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].message, "Added Baby Bun to your collection.");
    assert_eq!(notices[1].message, "Removed Baby Bun from your collection.");
}

#[test]
fn stale_view_state_cannot_double_grant() {
    let (dir, mut catalog) = seeded_catalog();
    let collection = signed_in(&dir, "u1");
    let target = summary_of(&catalog, ItemKind::Mount, "aithon");

    // Two views both believing the mount is unowned fire the same add.
    collection.toggle(&mut catalog, &target, false).expect("first");
    collection.toggle(&mut catalog, &target, false).expect("second");
    assert_eq!(catalog.ownership_count().expect("count"), 1);

    // And a remove against the already-clean state stays quiet too.
    collection.toggle(&mut catalog, &target, true).expect("remove");
    collection.toggle(&mut catalog, &target, true).expect("remove again");
    assert_eq!(catalog.ownership_count().expect("count"), 0);
}

#[test]
fn store_refusal_surfaces_as_an_error_notice() {
    let (dir, mut catalog) = seeded_catalog();
    let collection = signed_in(&dir, "u1");
    let phantom = ItemSummary {
        id: "no-such-minion".to_string(),
        name: "No Such Minion".to_string(),
        kind: ItemKind::Minion,
    };

    let err = collection
        .toggle(&mut catalog, &phantom, false)
        .expect_err("refused");
    assert!(matches!(err, CollectionError::Rejected(_)));
    assert_eq!(catalog.ownership_count().expect("count"), 0);

    let notices = collection.notices().snapshot();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Error);
    assert_eq!(notices[0].message, "minion not found");
}

#[test]
fn collecting_every_reward_completes_the_duty() {
    let (dir, mut catalog) = seeded_catalog();
    let collection = signed_in(&dir, "u1");

    let page = catalog
        .page_instances(dungeoneer::model::InstanceKind::VariantDungeon, None, 10)
        .expect("page");
    let subterrane = &page.items[0];
    assert!(!subterrane.fully_owned_by("u1"));

    for (kind, id) in [
        (ItemKind::Minion, "wind-up-silkie"),
        (ItemKind::Orchestrion, "sands-of-amber"),
    ] {
        let target = summary_of(&catalog, kind, id);
        collection.toggle(&mut catalog, &target, false).expect("add");
    }

    let page = catalog
        .page_instances(dungeoneer::model::InstanceKind::VariantDungeon, None, 10)
        .expect("page");
    assert!(page.items[0].fully_owned_by("u1"));
    assert!(!page.items[0].fully_owned_by("u2"));
}

#[test]
fn owned_ids_follow_catalog_order_not_grant_order() {
    let (dir, mut catalog) = seeded_catalog();
    let collection = signed_in(&dir, "u1");

    for id in ["paissa-brat", "baby-bun"] {
        let target = summary_of(&catalog, ItemKind::Minion, id);
        collection.toggle(&mut catalog, &target, false).expect("add");
    }

    let ids = collection
        .owned_ids(&catalog, ItemKind::Minion)
        .expect("ids");
    assert_eq!(ids, vec!["baby-bun".to_string(), "paissa-brat".to_string()]);
}

#[test]
fn first_grant_registers_the_user() {
    let (dir, mut catalog) = seeded_catalog();
    assert_eq!(catalog.user_count().expect("count"), 0);

    let collection = signed_in(&dir, "fresh-login");
    let target = summary_of(&catalog, ItemKind::Card, "ifrit-card");
    collection.toggle(&mut catalog, &target, false).expect("add");

    assert_eq!(catalog.user_count().expect("count"), 1);
}
