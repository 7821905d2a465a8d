#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use csv::ReaderBuilder;
use dungeoneer::catalog::{seed_demo, Catalog, OpenOptions};
use dungeoneer::model::ItemKind;
use serde_json::Value;
use tempfile::TempDir;

fn setup_db(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(format!("{name}.db"));
    let mut catalog = Catalog::open(&path, &OpenOptions::default()).expect("open catalog");
    seed_demo(&mut catalog).expect("seed demo data");
    (dir, path)
}

fn kind_count(report: &Value, table: &str, kind: &str) -> u64 {
    report[table]
        .as_array()
        .expect("kind table")
        .iter()
        .find(|entry| entry["kind"] == kind)
        .unwrap_or_else(|| panic!("missing {kind} row in {table}"))["count"]
        .as_u64()
        .expect("count")
}

fn stats_json(db_path: &PathBuf) -> Value {
    let output = cargo_bin_cmd!("dungeoneer")
        .args(["--format", "json", "stats"])
        .arg(db_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn stats_emits_json() {
    let (_dir, db_path) = setup_db("stats");
    let json = stats_json(&db_path);
    assert!(json["database"]["size_bytes"].is_number());
    assert!(json["database"]["path"].is_string());
    assert_eq!(kind_count(&json, "items", "minions"), 4);
    assert_eq!(kind_count(&json, "instances", "variants"), 1);
    assert_eq!(json["users"], 0);
    assert_eq!(json["ownership_rows"], 0);
}

#[test]
fn init_creates_an_empty_catalog() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("fresh.db");
    cargo_bin_cmd!("dungeoneer")
        .arg("init")
        .arg(&db_path)
        .assert()
        .success();
    assert!(db_path.exists(), "init should create the database file");

    let catalog = Catalog::open(&db_path, &OpenOptions::existing()).expect("reopen");
    assert_eq!(catalog.item_count(ItemKind::Minion).expect("count"), 0);
}

#[test]
fn seed_demo_requires_create_for_missing_databases() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("missing.db");

    cargo_bin_cmd!("dungeoneer")
        .arg("seed-demo")
        .arg(&db_path)
        .assert()
        .failure()
        .code(1);
    assert!(!db_path.exists());

    let output = cargo_bin_cmd!("dungeoneer")
        .args(["--format", "json", "seed-demo"])
        .arg(&db_path)
        .arg("--create")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["instances"], 6);
    assert_eq!(json["items"], 17);
}

#[test]
fn toggle_and_collection_through_the_guest_store() {
    let (dir, db_path) = setup_db("guest-toggle");
    let guest_dir = dir.path().join("guest");

    let output = cargo_bin_cmd!("dungeoneer")
        .arg("toggle")
        .arg(&db_path)
        .args(["minion", "baby-bun", "--guest-dir"])
        .arg(&guest_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);
    assert!(stdout.contains("Added Baby Bun to your collection."));
    assert!(stdout.contains("Log in to make sure you never lose your collection."));

    let output = cargo_bin_cmd!("dungeoneer")
        .args(["--format", "json", "collection"])
        .arg(&db_path)
        .args(["minions", "--guest-dir"])
        .arg(&guest_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let ids: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(ids, serde_json::json!(["baby-bun"]));

    let output = cargo_bin_cmd!("dungeoneer")
        .arg("toggle")
        .arg(&db_path)
        .args(["minion", "baby-bun", "--guest-dir"])
        .arg(&guest_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);
    assert!(stdout.contains("Removed Baby Bun from your collection."));

    let output = cargo_bin_cmd!("dungeoneer")
        .args(["--format", "json", "collection"])
        .arg(&db_path)
        .args(["minions", "--guest-dir"])
        .arg(&guest_dir)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let ids: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(ids, serde_json::json!([]));
}

#[test]
fn toggle_for_a_user_writes_ownership_rows() {
    let (_dir, db_path) = setup_db("user-toggle");

    cargo_bin_cmd!("dungeoneer")
        .arg("toggle")
        .arg(&db_path)
        .args(["minion", "baby-bun", "--user", "u1"])
        .assert()
        .success();
    let json = stats_json(&db_path);
    assert_eq!(json["users"], 1);
    assert_eq!(json["ownership_rows"], 1);

    cargo_bin_cmd!("dungeoneer")
        .arg("toggle")
        .arg(&db_path)
        .args(["minion", "baby-bun", "--user", "u1"])
        .assert()
        .success();
    let json = stats_json(&db_path);
    assert_eq!(json["users"], 1, "users are registered once");
    assert_eq!(json["ownership_rows"], 0);
}

#[test]
fn toggling_an_unknown_item_fails() {
    let (_dir, db_path) = setup_db("unknown-toggle");
    let output = cargo_bin_cmd!("dungeoneer")
        .arg("toggle")
        .arg(&db_path)
        .args(["minion", "phantom", "--user", "u1"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("minion not found"));
}

#[test]
fn import_uses_the_fixture_files() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("imported.db");
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/import");

    cargo_bin_cmd!("dungeoneer")
        .arg("import")
        .arg(&db_path)
        .arg("--instances")
        .arg(fixtures.join("duties.csv"))
        .arg("--items")
        .arg(fixtures.join("collectables.csv"))
        .arg("--create")
        .assert()
        .success();

    let json = stats_json(&db_path);
    assert_eq!(kind_count(&json, "items", "minions"), 2);
    assert_eq!(kind_count(&json, "items", "mounts"), 1);
    assert_eq!(kind_count(&json, "instances", "dungeons"), 1);
    assert_eq!(kind_count(&json, "instances", "trials"), 1);

    let catalog = Catalog::open(&db_path, &OpenOptions::existing()).expect("reopen");
    let larva = catalog
        .find_item(ItemKind::Minion, "coblyn-larva")
        .expect("blank id derived from the name");
    assert_eq!(larva.name, "Coblyn Larva");
    let aithon = catalog.find_item(ItemKind::Mount, "aithon").expect("find");
    assert_eq!(aithon.sources.len(), 2);
    assert_eq!(aithon.sources[0].kind, "Trial");
    assert_eq!(aithon.sources[1].text, "Faux Hollows prize");
}

#[test]
fn import_rejects_missing_databases_without_create() {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("absent.db");
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/import");

    let output = cargo_bin_cmd!("dungeoneer")
        .arg("import")
        .arg(&db_path)
        .arg("--items")
        .arg(fixtures.join("collectables.csv"))
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("use --create to initialize"));
}

#[test]
fn export_then_import_round_trip() {
    let (dir, db_path) = setup_db("export");
    let duties_out = dir.path().join("duties_out.csv");
    let items_out = dir.path().join("items_out.csv");

    cargo_bin_cmd!("dungeoneer")
        .arg("export")
        .arg(&db_path)
        .arg("--instances")
        .arg(&duties_out)
        .arg("--items")
        .arg(&items_out)
        .assert()
        .success();

    let mut reader = ReaderBuilder::new().from_path(&items_out).expect("reader");
    assert_eq!(
        reader.headers().expect("headers"),
        &csv::StringRecord::from(vec!["id", "kind", "name", "image", "instance", "sources"])
    );
    let rows: Vec<_> = reader
        .records()
        .map(|rec| rec.expect("valid item row"))
        .collect();
    assert_eq!(rows.len(), 17);
    let baby_bun = rows
        .iter()
        .find(|record| record.get(0) == Some("baby-bun"))
        .expect("baby-bun row");
    assert_eq!(baby_bun.get(1), Some("minion"));
    assert_eq!(baby_bun.get(4), Some("sastasha"));
    assert_eq!(baby_bun.get(5), Some("Dungeon: Sastasha"));

    let mut duties_reader = ReaderBuilder::new().from_path(&duties_out).expect("reader");
    let duty_rows: Vec<_> = duties_reader
        .records()
        .map(|rec| rec.expect("valid duty row"))
        .collect();
    assert_eq!(duty_rows.len(), 6);

    let reimported = dir.path().join("reimported.db");
    cargo_bin_cmd!("dungeoneer")
        .arg("import")
        .arg(&reimported)
        .arg("--instances")
        .arg(&duties_out)
        .arg("--items")
        .arg(&items_out)
        .arg("--create")
        .assert()
        .success();
    let json = stats_json(&reimported);
    assert_eq!(kind_count(&json, "items", "minions"), 4);
    assert_eq!(kind_count(&json, "instances", "dungeons"), 2);
}

#[test]
fn completions_generate_for_bash() {
    let output = cargo_bin_cmd!("dungeoneer")
        .args(["completions", "bash"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("dungeoneer"));
}

#[test]
fn config_file_supplies_the_database_path() {
    let (dir, db_path) = setup_db("config");
    let config_path = dir.path().join("cli.toml");
    fs::write(
        &config_path,
        format!("[database]\ndefault = \"{}\"\n", db_path.display()),
    )
    .expect("write config");

    let output = cargo_bin_cmd!("dungeoneer")
        .arg("--config")
        .arg(&config_path)
        .args(["--format", "json", "stats"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    let reported = json["database"]["path"].as_str().expect("path");
    assert!(reported.ends_with("config.db"));
}
