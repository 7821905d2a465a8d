#![allow(missing_docs)]

use std::fs;

use dungeoneer::catalog::{seed_demo, Catalog, OpenOptions};
use dungeoneer::collection::{Collection, ToggleOutcome, LOGIN_NUDGE};
use dungeoneer::guest::GuestStore;
use dungeoneer::model::ItemKind;
use dungeoneer::notify::{NoticeKind, Notices};
use tempfile::TempDir;

fn seeded_catalog(dir: &TempDir) -> Catalog {
    let path = dir.path().join("catalog.db");
    let mut catalog = Catalog::open(&path, &OpenOptions::default()).expect("open");
    seed_demo(&mut catalog).expect("seed");
    catalog
}

fn guest(dir: &TempDir) -> Collection {
    Collection::new(None, GuestStore::open(dir.path().join("guest")), Notices::new())
}

fn summary(catalog: &Catalog, kind: ItemKind, id: &str) -> dungeoneer::model::ItemSummary {
    let found = catalog.find_item(kind, id).expect("find item");
    dungeoneer::model::ItemSummary {
        id: found.id,
        name: found.name,
        kind,
    }
}

#[test]
fn guest_toggle_never_reaches_the_server_rows() {
    let dir = TempDir::new().expect("tempdir");
    let mut catalog = seeded_catalog(&dir);
    let collection = guest(&dir);
    let target = summary(&catalog, ItemKind::Minion, "baby-bun");

    let outcome = collection
        .toggle(&mut catalog, &target, false)
        .expect("add");
    assert_eq!(outcome, ToggleOutcome::Guest);
    assert_eq!(catalog.ownership_count().expect("count"), 0);
    assert_eq!(catalog.user_count().expect("count"), 0);

    assert!(collection
        .guest_store()
        .contains(ItemKind::Minion, "baby-bun")
        .expect("contains"));
}

#[test]
fn guest_files_are_plain_json_id_lists_under_fixed_keys() {
    let dir = TempDir::new().expect("tempdir");
    let mut catalog = seeded_catalog(&dir);
    let collection = guest(&dir);

    for (kind, id) in [
        (ItemKind::Minion, "baby-bun"),
        (ItemKind::Mount, "aithon"),
    ] {
        let target = summary(&catalog, kind, id);
        collection.toggle(&mut catalog, &target, false).expect("add");
    }

    let minions_file = dir.path().join("guest").join("dungeoneer_minions.json");
    let mounts_file = dir.path().join("guest").join("dungeoneer_mounts.json");
    assert!(minions_file.exists());
    assert!(mounts_file.exists());

    let raw = fs::read_to_string(&minions_file).expect("read");
    let ids: Vec<String> = serde_json::from_str(&raw).expect("plain json id list");
    assert_eq!(ids, vec!["baby-bun".to_string()]);
}

#[test]
fn racing_adds_stack_duplicates_and_one_remove_clears_them() {
    let dir = TempDir::new().expect("tempdir");
    let store = GuestStore::open(dir.path());

    // Two tabs that both read "not owned" each append the id.
    store.add(ItemKind::Minion, "baby-bun").expect("tab one");
    store.add(ItemKind::Minion, "baby-bun").expect("tab two");
    assert_eq!(store.ids(ItemKind::Minion).expect("ids").len(), 2);
    assert!(store.contains(ItemKind::Minion, "baby-bun").expect("contains"));

    store.remove(ItemKind::Minion, "baby-bun").expect("remove");
    assert!(store.ids(ItemKind::Minion).expect("ids").is_empty());
}

#[test]
fn guest_add_queues_the_login_nudge_after_the_confirmation() {
    let dir = TempDir::new().expect("tempdir");
    let mut catalog = seeded_catalog(&dir);
    let collection = guest(&dir);
    let target = summary(&catalog, ItemKind::Emote, "ball-dance");

    collection.toggle(&mut catalog, &target, false).expect("add");
    let notices = collection.notices().snapshot();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].kind, NoticeKind::Success);
    assert_eq!(notices[0].message, "Added Ball Dance to your collection.");
    assert_eq!(notices[1].kind, NoticeKind::Info);
    assert_eq!(notices[1].message, LOGIN_NUDGE);

    collection.notices().dismiss_all();
    collection.toggle(&mut catalog, &target, true).expect("remove");
    let notices = collection.notices().snapshot();
    assert_eq!(notices.len(), 1, "removes skip the nudge");
    assert_eq!(notices[0].message, "Removed Ball Dance from your collection.");
}

#[test]
fn hide_owned_reads_the_local_list_for_guests() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = seeded_catalog(&dir);
    let collection = guest(&dir);
    collection
        .guest_store()
        .add(ItemKind::Minion, "wind-up-tonberry")
        .expect("add");

    let page = catalog
        .page_items(ItemKind::Minion, None, 10)
        .expect("page");
    let visible = collection
        .hide_owned(ItemKind::Minion, &page.items)
        .expect("filter");
    assert_eq!(visible.len(), page.items.len() - 1);
    assert!(visible.iter().all(|item| item.id != "wind-up-tonberry"));
}

#[test]
fn fresh_directory_reads_as_an_empty_collection() {
    let dir = TempDir::new().expect("tempdir");
    let store = GuestStore::open(dir.path().join("never-written"));
    for kind in ItemKind::ALL {
        assert!(store.ids(kind).expect("ids").is_empty());
    }
    assert!(!store
        .contains(ItemKind::Hairstyle, "eastern-cherry")
        .expect("contains"));
}

#[test]
fn the_local_list_outlives_the_session_object() {
    let dir = TempDir::new().expect("tempdir");
    let mut catalog = seeded_catalog(&dir);

    {
        let collection = guest(&dir);
        let target = summary(&catalog, ItemKind::Spell, "water-cannon");
        collection.toggle(&mut catalog, &target, false).expect("add");
    }

    let rejoined = guest(&dir);
    assert!(rejoined
        .guest_store()
        .contains(ItemKind::Spell, "water-cannon")
        .expect("contains"));
    let ids = rejoined
        .owned_ids(&catalog, ItemKind::Spell)
        .expect("ids");
    assert_eq!(ids, vec!["water-cannon".to_string()]);
}
