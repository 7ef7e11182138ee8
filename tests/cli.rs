mod common;

use std::fs;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use csv_mapper::config::SavedConfiguration;
use predicates::str::contains;

fn mapper() -> Command {
    Command::cargo_bin("csv-mapper").expect("binary exists")
}

fn fixture(name: &str) -> String {
    fixture_path(name).to_str().expect("utf-8 path").to_string()
}

#[test]
fn map_prints_table_with_matches() {
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
        ])
        .assert()
        .success()
        .stdout(contains("Customer Name"))
        .stdout(contains("Cust Name"))
        .stdout(contains("Zip Code"))
        .stdout(contains("6 of 6 mapped"));
}

#[test]
fn map_json_lists_every_target() {
    let output = mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--json",
            "--seed",
            "3",
        ])
        .output()
        .expect("run map");
    assert!(output.status.success());
    let document: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let mappings = document["mappings"].as_array().expect("mappings array");
    assert_eq!(mappings.len(), 6);
    let phone = mappings
        .iter()
        .find(|m| m["target"] == "Phone")
        .expect("phone mapping");
    assert_eq!(phone["source"], "Tel");
    assert_eq!(phone["basis"], "synonym");
    assert_eq!(document["quality"]["successful_mappings"], 6);
}

#[test]
fn overrides_and_unknown_targets() {
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--set",
            "Amount=notes",
            "--unset",
            "Phone",
        ])
        .assert()
        .success()
        .stdout(contains("manual"))
        .stdout(contains("5 of 6 mapped"));

    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--set",
            "Fax=Tel",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown target column 'Fax'"));
}

#[test]
fn apply_writes_template_shaped_csv() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("mapped.csv");
    mapper()
        .args([
            "apply",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read output");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "Customer Name,Email,Phone,Postal Code,Signup Date,Amount"
    );
    assert_eq!(
        lines[1],
        "Ann Lee,ann@example.com,555-0100,12345,2024-01-05,1200.5"
    );
    assert_eq!(lines[3], "Cy Dow,cy@example.com,555-0102,34567,2024-03-15,");
}

#[test]
fn apply_writes_json_records() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("mapped.json");
    mapper()
        .args([
            "apply",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(records[1]["Amount"], 35);
    assert_eq!(records[2]["Amount"], serde_json::Value::Null);
    assert_eq!(records[0]["Postal Code"], 12345);
}

#[test]
fn saved_configuration_is_reused_and_inspected() {
    let workspace = TestWorkspace::new();
    let config_path = workspace.path().join("crm.mapping.json");
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--set",
            "Amount=notes",
            "--save-config",
            config_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let saved = SavedConfiguration::load(&config_path).expect("load config");
    assert_eq!(saved.column_info.mapped_count, 6);
    assert!(
        saved
            .reusable_mappings()
            .contains(&("Amount", "notes"))
    );

    // Reuse keeps the manual choice instead of re-matching.
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--reuse",
            config_path.to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"source\": \"notes\""));

    mapper()
        .args([
            "inspect",
            "-c",
            config_path.to_str().unwrap(),
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
        ])
        .assert()
        .success()
        .stdout(contains("Mapping Summary:"))
        .stdout(contains("Perfect match! You can reuse all mappings."));
}

#[test]
fn profile_reports_patterns_and_overlaps() {
    let workspace = TestWorkspace::new();
    let mut csv = String::from("state,status,email\n");
    for row in 0..40 {
        let value = ["open", "closed", "pending"][row % 3];
        csv.push_str(&format!("{value},{value},user{row}@example.com\n"));
    }
    let input = workspace.write("orders.csv", &csv);
    mapper()
        .args(["profile", "-s", input.to_str().unwrap(), "--seed", "11"])
        .assert()
        .success()
        .stdout(contains("email"))
        .stdout(contains("overlaps with"))
        .stdout(contains("100%"));
}

#[test]
fn settings_file_is_applied_and_validated() {
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--settings",
            &fixture("matcher_settings.yaml"),
        ])
        .assert()
        .success();

    let workspace = TestWorkspace::new();
    let bad = workspace.write("bad.yaml", "threshold: 140\n");
    mapper()
        .args([
            "map",
            "-s",
            &fixture("crm_export.csv"),
            "-t",
            &fixture("customer_template.csv"),
            "--settings",
            bad.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("threshold must be between 0 and 100"));
}

#[test]
fn missing_input_reports_path() {
    mapper()
        .args(["map", "-s", "does-not-exist.csv", "-t", &fixture("customer_template.csv")])
        .assert()
        .failure()
        .stderr(contains("does-not-exist.csv"));
}
