use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn graphtable_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_graphtable"))
}

fn run(args: &[&str]) -> Output {
    Command::new(graphtable_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn graphtable")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn demo_prints_report() {
    let output = run(&["demo"]);
    assert!(output.status.success(), "{output:?}");

    let text = stdout(&output);
    assert!(text.contains("--- Alice owned videos ---"));
    assert!(text.contains("v-1-1, v-1-2"));
    assert!(text.contains("--- Channels that have Bob's Video 2 ---"));
    assert!(text.contains("{type: USER, pk: u-1, sk: --root--, name: Alice}"));
}

#[test]
fn demo_json_report_parses() {
    let output = run(&["demo", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let sections = report.as_array().expect("array of sections");
    let followers = sections
        .iter()
        .find(|s| s["title"] == "Users who subscribe to Alice")
        .expect("followers section");
    assert_eq!(followers["ids"], serde_json::json!(["u-2", "u-3", "u-4"]));
}

#[test]
fn dump_then_report_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("table.json");
    let snapshot_arg = snapshot.to_str().unwrap();

    let output = run(&["demo", "--json", "--dump", snapshot_arg]);
    assert!(output.status.success(), "{output:?}");
    assert!(snapshot.exists());

    let replayed = run(&["report", snapshot_arg, "--json"]);
    assert!(replayed.status.success(), "{replayed:?}");
    assert_eq!(replayed.stdout, output.stdout);
}

#[test]
fn catalog_lists_builtin_kinds() {
    let output = run(&["catalog"]);
    assert!(output.status.success(), "{output:?}");

    let text = stdout(&output);
    assert!(text.contains("VIDEO-OWNERSHIP"));
    assert!(text.contains("one-to-many"));
    assert!(text.contains("VIEWER-SUBSCRIBE-CHANNEL"));
    assert!(text.contains("11 kinds"));
}

#[test]
fn catalog_rejects_duplicate_tags() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("graphtable.json");
    fs::write(
        &config,
        r#"{ "catalog": { "kinds": [
            { "category": "entity", "tag": "USER" },
            { "category": "entity", "tag": "USER" }
        ] } }"#,
    )
    .unwrap();

    let output = run(&["catalog", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("registered more than once"));
}

#[test]
fn exported_catalog_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("graphtable.json");

    let exported = run(&["catalog", "--export"]);
    assert!(exported.status.success(), "{exported:?}");
    fs::write(&config, &exported.stdout).unwrap();

    let output = run(&["catalog", "--config", config.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");
    assert!(stdout(&output).contains("11 kinds"));
}

#[test]
fn keys_for_entity_and_edge() {
    let output = run(&["keys", "USER", "u-1"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("u-1"));
    assert!(text.contains("--root--"));

    let output = run(&["keys", "VIDEO-OWNERSHIP", "v-1", "u-1"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("v-1_VIDEO-OWNERSHIP"));
    assert!(text.contains("u-1_VIDEO-OWNERSHIP"));
}

#[test]
fn keys_rejects_bad_input() {
    assert!(!run(&["keys", "VIDEO-OWNERSHIP", "v-1"]).status.success());
    assert!(!run(&["keys", "USER", "u_1"]).status.success());
    assert!(!run(&["keys", "NOPE", "x"]).status.success());
}
