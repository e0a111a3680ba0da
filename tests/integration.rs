use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const DB_UID: &str = "11111111111111111111111111111111";
const PAGE_UID: &str = "22222222222222222222222222222222";
const NOTES_UID: &str = "33333333333333333333333333333333";
const ROADMAP_UID: &str = "44444444444444444444444444444444";
const PERSONAL_UID: &str = "55555555555555555555555555555555";

fn pagemill_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pagemill");
    path
}

fn write(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, content).unwrap();
}

/// Two exports: "team" exercises tables, pages, nesting, and assets;
/// "personal" is a single standalone page.
fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let data_root = tmp.path().join("data");
    let output = tmp.path().join("public").join("data");

    let team = data_root.join("team");
    write(
        &team,
        &format!("Projects {}_all.csv", DB_UID),
        "\u{feff}Name,Status,Attendees\nKickoff,Open,\"Alice, Bob\"\nGhost,Done,Carol\n",
    );
    // View CSV reorders the columns; the emitted schema must follow it.
    write(
        &team,
        &format!("Projects {}.csv", DB_UID),
        "Name,Attendees,Status\nKickoff,\"Alice, Bob\",Open\n",
    );
    write(
        &team,
        &format!("Projects/Kickoff {}.md", PAGE_UID),
        "# Kickoff\nStatus: Open\n\nAgenda with ![diagram](diagram.png)\n",
    );
    write(&team, "Projects/Kickoff/diagram.png", "not-a-real-png");
    write(
        &team,
        &format!("Notes {}.md", NOTES_UID),
        "# Notes\n\nTop-level notes.\n",
    );
    write(
        &team,
        &format!("Notes/Roadmap {}.md", ROADMAP_UID),
        "# Roadmap\n\nNested under Notes.\n",
    );

    let personal = data_root.join("personal");
    write(
        &personal,
        &format!("Journal {}.md", PERSONAL_UID),
        "# Journal\n\nSolo page.\n",
    );

    (tmp, data_root, output)
}

fn run_pagemill(args: &[&str]) -> (String, String, bool) {
    let binary = pagemill_binary();
    let output = Command::new(&binary)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pagemill binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_build(data_root: &Path, output: &Path) -> (String, String, bool) {
    run_pagemill(&[
        "build",
        "--data-root",
        data_root.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--progress",
        "off",
    ])
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_build_emits_full_contract() {
    let (_tmp, data_root, output) = setup_test_env();

    let (stdout, stderr, success) = run_build(&data_root, &output);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);

    // Manifest covers both exports.
    let manifest = read_json(&output.join("manifest.json"));
    let exports = manifest["exports"].as_array().unwrap();
    assert_eq!(exports.len(), 2);
    assert!(chrono::DateTime::parse_from_rfc3339(manifest["generatedAt"].as_str().unwrap()).is_ok());

    let team = exports.iter().find(|e| e["name"] == "team").unwrap();
    assert_eq!(team["pageCount"], 3);
    let dbs = team["databases"].as_array().unwrap();
    assert_eq!(dbs.len(), 1);
    assert_eq!(dbs[0]["uid"], DB_UID);
    assert_eq!(dbs[0]["title"], "Projects");
    assert_eq!(dbs[0]["rowCount"], 2);
    assert_eq!(dbs[0]["columnCount"], 3);

    // Standalone tree: Notes is a root with Roadmap as its child.
    let standalone = team["standalonePages"].as_array().unwrap();
    assert_eq!(standalone.len(), 2);
    let notes = standalone.iter().find(|p| p["uid"] == NOTES_UID).unwrap();
    assert_eq!(notes["childPageUids"][0], ROADMAP_UID);

    // Database file: view order, inferred types, matched rows.
    let db = read_json(&output.join(format!("db-{}.json", DB_UID)));
    let columns = db["columns"].as_array().unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Name", "Attendees", "Status"]);
    assert_eq!(columns[0]["type"], "title");
    assert_eq!(columns[1]["type"], "person");
    assert_eq!(
        columns[1]["options"].as_array().unwrap(),
        &vec![
            serde_json::json!("Alice"),
            serde_json::json!("Bob"),
            serde_json::json!("Carol")
        ]
    );
    assert_eq!(columns[2]["type"], "status");

    let rows = db["rows"].as_array().unwrap();
    assert_eq!(rows[0]["uid"], PAGE_UID);
    assert_eq!(rows[1]["uid"], serde_json::Value::Null);

    // Page file: ownership, metadata, assets.
    let page = read_json(&output.join(format!("page-{}.json", PAGE_UID)));
    assert_eq!(page["databaseUid"], DB_UID);
    assert_eq!(page["metadata"]["Status"], "Open");
    assert_eq!(
        page["assets"][0],
        format!("assets/{}/diagram.png", PAGE_UID)
    );
    assert!(output.join("assets").join(PAGE_UID).join("diagram.png").exists());

    // Search index spans both exports.
    let index = read_json(&output.join("search-index.json"));
    let entries = index.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().any(|e| e["uid"] == PERSONAL_UID));

    // The run records inferred types next to the inputs.
    let meta = read_json(&data_root.join("team").join("metadata.json"));
    assert_eq!(
        meta["databases"][DB_UID]["columns"]["Status"]["_inferred"],
        "status"
    );
}

#[test]
fn test_build_is_idempotent() {
    let (_tmp, data_root, output) = setup_test_env();

    let (_, _, success1) = run_build(&data_root, &output);
    assert!(success1, "first build failed");
    let first = fs::read_to_string(output.join(format!("db-{}.json", DB_UID))).unwrap();

    let (_, _, success2) = run_build(&data_root, &output);
    assert!(success2, "second build failed (not idempotent)");
    let second = fs::read_to_string(output.join(format!("db-{}.json", DB_UID))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_type_override_survives_rebuild() {
    let (_tmp, data_root, output) = setup_test_env();

    let (_, _, success) = run_build(&data_root, &output);
    assert!(success);

    // User edits the authoritative type for the Status column.
    let meta_path = data_root.join("team").join("metadata.json");
    let mut meta = read_json(&meta_path);
    meta["databases"][DB_UID]["columns"]["Status"]["type"] = serde_json::json!("text");
    fs::write(&meta_path, serde_json::to_string_pretty(&meta).unwrap()).unwrap();

    let (stdout, stderr, success) = run_build(&data_root, &output);
    assert!(success, "rebuild failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("override"));

    // The emitted schema honors the override; the options are gone.
    let db = read_json(&output.join(format!("db-{}.json", DB_UID)));
    let status = db["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Status")
        .unwrap();
    assert_eq!(status["type"], "text");
    assert!(status.get("options").is_none());

    // The rewritten side-channel keeps the override and the fresh inference.
    let meta = read_json(&meta_path);
    assert_eq!(meta["databases"][DB_UID]["columns"]["Status"]["type"], "text");
    assert_eq!(
        meta["databases"][DB_UID]["columns"]["Status"]["_inferred"],
        "status"
    );
}

#[test]
fn test_scan_reports_counts_without_writing() {
    let (_tmp, data_root, output) = setup_test_env();

    let (stdout, stderr, success) = run_pagemill(&[
        "scan",
        "--data-root",
        data_root.to_str().unwrap(),
        "--progress",
        "off",
    ]);
    assert!(success, "scan failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("team"));
    assert!(stdout.contains("full CSVs: 1"));
    assert!(stdout.contains("documents: 3"));
    assert!(!output.exists());
}

#[test]
fn test_empty_data_root_fails() {
    let tmp = TempDir::new().unwrap();
    let data_root = tmp.path().join("data");
    fs::create_dir_all(&data_root).unwrap();
    let output = tmp.path().join("out");

    let (_, stderr, success) = run_build(&data_root, &output);
    assert!(!success);
    assert!(stderr.contains("no export directories"));
}

#[test]
fn test_colliding_identifiers_across_exports_fail() {
    let tmp = TempDir::new().unwrap();
    let data_root = tmp.path().join("data");
    let output = tmp.path().join("out");

    write(
        &data_root.join("one"),
        &format!("Dupe {}.md", PAGE_UID),
        "# Dupe\n\nFirst.\n",
    );
    write(
        &data_root.join("two"),
        &format!("Dupe {}.md", PAGE_UID),
        "# Dupe\n\nSecond.\n",
    );

    let (_, stderr, success) = run_build(&data_root, &output);
    assert!(!success);
    assert!(stderr.contains("appears in both"));
}
