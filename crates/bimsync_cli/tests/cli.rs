//! End-to-end tests for the `bimsync` binary.

use bimsync_testkit::prelude::*;
use std::process::{Command, Output};

fn bimsync(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bimsync"))
        .args(args)
        .output()
        .expect("Failed to run bimsync")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn scenario_records() -> Vec<ChangeRecord> {
    vec![door_record("A1", 90.0, 100), door_record("A2", 60.0, 150)]
}

fn sync_args<'a>(command: &'a str, workspace: &'a SyncWorkspace) -> Vec<&'a str> {
    vec![
        command,
        "--document",
        workspace.document_path.to_str().unwrap(),
        "--records",
        workspace.records_path.to_str().unwrap(),
    ]
}

#[test]
fn import_applies_records_and_saves() {
    let workspace = SyncWorkspace::new(
        &door_document(PROJECT_ID, &["A1", "A2"]),
        &scenario_records(),
    );

    let output = bimsync(&sync_args("import", &workspace));

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Imported 2 record(s)"), "{out}");
    assert!(out.contains("Sync timestamp: 150"), "{out}");

    let doc = workspace.load_document();
    assert_eq!(rating_of(&doc, "A1"), Some(90.0));
    assert_eq!(label_of(&doc, "A2").as_deref(), Some("FR60"));
}

#[test]
fn import_since_skips_older_records() {
    let workspace = SyncWorkspace::new(
        &door_document(PROJECT_ID, &["A1", "A2"]),
        &scenario_records(),
    );

    let mut args = sync_args("import", &workspace);
    args.extend(["--since", "120"]);
    let output = bimsync(&args);

    assert!(output.status.success(), "{}", stderr(&output));
    let doc = workspace.load_document();
    assert_eq!(rating_of(&doc, "A1"), Some(0.0));
    assert_eq!(rating_of(&doc, "A2"), Some(60.0));
}

#[test]
fn failed_import_leaves_document_file() {
    let workspace = SyncWorkspace::new(&door_document(PROJECT_ID, &["A1"]), &scenario_records());
    let before = std::fs::read(&workspace.document_path).unwrap();

    let output = bimsync(&sync_args("import", &workspace));

    assert!(!output.status.success());
    assert!(stderr(&output).contains("entity not found: A2"));
    assert_eq!(std::fs::read(&workspace.document_path).unwrap(), before);
}

#[test]
fn import_with_missing_document_fails() {
    let workspace = SyncWorkspace::new(&door_document(PROJECT_ID, &["A1"]), &[]);
    let missing = workspace.path().join("absent.json");

    let output = bimsync(&[
        "import",
        "--document",
        missing.to_str().unwrap(),
        "--records",
        workspace.records_path.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load document"));
}

#[test]
fn subscribe_runs_cycles_then_unsubscribes() {
    let workspace = SyncWorkspace::new(
        &door_document(PROJECT_ID, &["A1", "A2"]),
        &scenario_records(),
    );

    let mut args = sync_args("subscribe", &workspace);
    args.extend(["--interval-ms", "20", "--cycles", "2", "--since", "1"]);
    let output = bimsync(&args);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Subscribed"), "{out}");
    assert!(out.contains("Unsubscribed"), "{out}");
    assert!(out.contains("Sync timestamp: 150"), "{out}");

    let doc = workspace.load_document();
    assert_eq!(rating_of(&doc, "A1"), Some(90.0));
    assert_eq!(rating_of(&doc, "A2"), Some(60.0));
}

#[test]
fn version_prints_package_version() {
    let output = bimsync(&["version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}
