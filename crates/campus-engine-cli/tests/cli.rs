use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const NOW: &str = "2025-06-01T00:00:00Z";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn campus(data: &Path) -> Command {
    let mut cmd = Command::cargo_bin("campus").unwrap();
    cmd.env_remove("CAMPUS_TIMEZONE")
        .env_remove("CAMPUS_DESCRIPTION_WORD_LIMIT")
        .env_remove("CAMPUS_MAX_OCCURRENCES")
        .arg("--data")
        .arg(data)
        .arg("--now")
        .arg(NOW);
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

/// Private copy of the fixture for commands that write.
fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "campus-cli-{}-{name}.json",
        std::process::id()
    ));
    fs::copy(fixture("campus.json"), &path).unwrap();
    path
}

// ── calendar ────────────────────────────────────────────────────────────────

#[test]
fn test_calendar_month_includes_recurring_instances() {
    let listing = json_stdout(campus(&fixture("campus.json")).args(["calendar", "--month", "2025-07"]));
    let items = listing.as_array().unwrap();
    assert_eq!(items.len(), 7);
    assert_eq!(items[0]["id"], "2@2025-07-02");
    assert_eq!(items[0]["is_recurring_instance"], true);
    assert_eq!(items[0]["parent_event_id"], 2);

    let ids: Vec<_> = items.iter().map(|i| i["id"].to_string()).collect();
    assert!(ids.contains(&"1".to_string()));
    assert!(ids.contains(&"3".to_string()));
}

#[test]
fn test_calendar_approved_only_at_venue() {
    let listing = json_stdout(campus(&fixture("campus.json")).args([
        "calendar",
        "--month",
        "2025-07",
        "--approved-only",
        "--venue",
        "2",
    ]));
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

#[test]
fn test_calendar_upcoming_skips_series() {
    let listing = json_stdout(campus(&fixture("campus.json")).arg("calendar"));
    let ids: Vec<_> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_calendar_bad_month_is_validation() {
    campus(&fixture("campus.json"))
        .args(["calendar", "--month", "2025-7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[VALIDATION]"));
}

// ── expand / conflicts ──────────────────────────────────────────────────────

#[test]
fn test_expand_lists_series_dates() {
    let out = json_stdout(campus(&fixture("campus.json")).args([
        "expand",
        "--event",
        "2",
        "--from",
        "2025-07-01",
        "--to",
        "2025-07-31",
    ]));
    assert_eq!(
        out["dates"],
        serde_json::json!(["2025-07-02", "2025-07-09", "2025-07-16", "2025-07-23", "2025-07-30"])
    );
    assert_eq!(out["truncated"], false);
}

#[test]
fn test_expand_reports_truncation() {
    let out = json_stdout(
        campus(&fixture("campus.json"))
            .env("CAMPUS_MAX_OCCURRENCES", "3")
            .args([
                "expand",
                "--event",
                "2",
                "--from",
                "2025-07-01",
                "--to",
                "2025-07-31",
            ]),
    );
    assert_eq!(
        out["dates"],
        serde_json::json!(["2025-07-02", "2025-07-09", "2025-07-16"])
    );
    assert_eq!(out["truncated"], true);
}

#[test]
fn test_check_conflict_reports_blocking_event() {
    let out = json_stdout(campus(&fixture("campus.json")).args([
        "check-conflict",
        "--venue",
        "1",
        "--date",
        "2025-07-15",
        "--start",
        "10:00",
        "--end",
        "11:00",
    ]));
    assert_eq!(out["conflict"], true);
    assert_eq!(out["conflicting_event_id"], 1);

    let out = json_stdout(campus(&fixture("campus.json")).args([
        "check-conflict",
        "--venue",
        "1",
        "--date",
        "2025-07-15",
        "--start",
        "11:00",
        "--end",
        "12:00",
    ]));
    assert_eq!(out["conflict"], false);
}

#[test]
fn test_create_event_over_capacity() {
    campus(&fixture("campus.json"))
        .args(["create-event", "--draft"])
        .arg(fixture("oversized_event.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exceeds capacity 50"));
}

#[test]
fn test_malformed_draft_is_validation() {
    campus(&fixture("campus.json"))
        .args(["create-event", "--draft"])
        .arg(fixture("malformed_event.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[VALIDATION]"))
        .stderr(predicate::str::contains("is not a valid event"));
}

#[test]
fn test_create_and_approve_event_written_back() {
    let data = scratch("create");
    let created = json_stdout(
        campus(&data)
            .args(["create-event", "--write", "--draft"])
            .arg(fixture("seminar_event.json")),
    );
    assert_eq!(created["id"], 4);
    assert_eq!(created["approved"], false);

    let approved = json_stdout(campus(&data).args(["approve-event", "--event", "4", "--write"]));
    assert_eq!(approved["approved"], true);

    let saved: Value = serde_json::from_str(&fs::read_to_string(&data).unwrap()).unwrap();
    assert_eq!(saved["events"].as_array().unwrap().len(), 4);
    fs::remove_file(data).ok();
}

// ── resources ───────────────────────────────────────────────────────────────

#[test]
fn test_availability_and_check() {
    let out = json_stdout(campus(&fixture("campus.json")).args(["availability", "--resource", "1"]));
    assert_eq!(out["total"], 5);
    assert_eq!(out["allocated"], 3);
    assert_eq!(out["available"], 2);

    let out = json_stdout(campus(&fixture("campus.json")).args([
        "availability",
        "--resource",
        "1",
        "--quantity",
        "3",
    ]));
    assert_eq!(out["allowed"], false);
}

#[test]
fn test_allocate_oversubscription_is_conflict() {
    campus(&fixture("campus.json"))
        .args(["allocate", "--event", "1", "--resource", "1", "--quantity", "3"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error[CONFLICT]"));
}

#[test]
fn test_inactive_resource_is_validation() {
    campus(&fixture("campus.json"))
        .args(["allocate", "--event", "1", "--resource", "2", "--quantity", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not active"));
}

#[test]
fn test_unknown_resource_is_not_found() {
    campus(&fixture("campus.json"))
        .args(["availability", "--resource", "99"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("resource 99 not found"));
}

#[test]
fn test_allocate_then_deny_releases_supply() {
    let data = scratch("ledger");

    let allocation = json_stdout(campus(&data).args([
        "allocate",
        "--event",
        "1",
        "--resource",
        "1",
        "--quantity",
        "2",
        "--write",
    ]));
    assert_eq!(allocation["status"], "PENDING");
    let out = json_stdout(campus(&data).args(["availability", "--resource", "1"]));
    assert_eq!(out["available"], 0);

    json_stdout(campus(&data).args([
        "set-status",
        "--allocation",
        "1",
        "--status",
        "denied",
        "--write",
    ]));
    let out = json_stdout(campus(&data).args(["availability", "--resource", "1"]));
    assert_eq!(out["available"], 3);

    campus(&data)
        .args(["set-status", "--allocation", "1", "--status", "approved"])
        .assert()
        .code(2);
    fs::remove_file(data).ok();
}

#[test]
fn test_missing_dataset_is_reported() {
    campus(Path::new("/nonexistent/campus.json"))
        .arg("calendar")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read dataset"));
}
