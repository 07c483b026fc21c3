/// Process-level behaviour of both binaries: exit codes and output files.
mod common;

use std::fs;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, ExitStatus, Output, Stdio};

use basename_tools::hash::{namehash, node_hex, token_id};
use basename_tools::output::read_renewals;
use common::{read_rows, Fixture};

fn renewals(fixture: &Fixture, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_generate_batch_renewals"))
        .current_dir(fixture.path())
        .args(args)
        .output()
        .expect("run generate_batch_renewals")
}

fn converter(fixture: &Fixture, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ens_namehash_converter"))
        .current_dir(fixture.path())
        .env_remove("BASE_RPC_URL")
        .env_remove("REGISTRY_ADDR")
        .env_remove("REGISTRY_ABI_PATH")
        .args(args)
        .output()
        .expect("run ens_namehash_converter")
}

/// Wait until the child logs `marker`, send it SIGINT, and collect its exit status.
#[cfg(unix)]
fn interrupt_after(mut child: Child, marker: &str) -> ExitStatus {
    let stdout = child.stdout.take().expect("piped stdout");
    let mut lines = BufReader::new(stdout).lines();
    for line in lines.by_ref() {
        if line.expect("read stdout").contains(marker) {
            break;
        }
    }

    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("run kill");
    assert!(kill.success());

    // Keep the pipe drained until the child exits
    for line in lines {
        line.expect("read stdout");
    }
    child.wait().expect("wait for child")
}

fn many_names(count: usize) -> String {
    (0..count).map(|i| format!("name{}\n", i)).collect()
}

#[test]
fn test_renewals_missing_input_exits_one() {
    let fixture = Fixture::new();
    let out = renewals(&fixture, &["missing", "-o", "out.csv"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(!fixture.join("out.csv").exists());
}

#[test]
fn test_renewals_writes_csv() {
    let fixture = Fixture::new();
    fixture.write_lines("premint1", &["alice", "bob", "alice"]);
    let out = renewals(&fixture, &["premint1", "-o", "batch.csv", "-d", "1"]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let entries = read_renewals(&fixture.join("batch.csv")).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, token_id("alice"));
    assert_eq!(entries[1].id, token_id("bob"));
    assert!(entries.iter().all(|e| e.duration == 31_557_600));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Line 3: alice"));
    assert!(stdout.contains("No excluded names found."));
}

#[cfg(unix)]
#[test]
fn test_renewals_interrupt_writes_nothing() {
    let fixture = Fixture::new();
    fixture.write("premint1", many_names(300_000));
    let child = Command::new(env!("CARGO_BIN_EXE_generate_batch_renewals"))
        .current_dir(fixture.path())
        .args(["premint1", "-o", "batch.csv", "--no-exclusions"])
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn generate_batch_renewals");

    let status = interrupt_after(child, "Read 300000 names");

    assert_eq!(status.code(), Some(1));
    assert!(!fixture.join("batch.csv").exists());
    // Only the input remains; no temporary file was left behind
    assert_eq!(fs::read_dir(fixture.path()).unwrap().count(), 1);
}

#[test]
fn test_renewals_explicit_exclusions_and_keep_duplicates() {
    let fixture = Fixture::new();
    fixture.write_lines("premint1", &["alice", "BOB", "alice"]);
    fixture.write_lines("skip", &["bob"]);
    let out = renewals(
        &fixture,
        &["premint1", "--exclusions", "skip", "--keep-duplicates"],
    );

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let entries = read_renewals(&fixture.join("premint_hashes.csv")).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.id == token_id("alice")));
    assert!(entries.iter().all(|e| e.duration == 157_788_000));
}

#[test]
fn test_renewals_missing_exclusion_list_is_fatal() {
    let fixture = Fixture::new();
    fixture.write_lines("premint1", &["alice"]);
    let out = renewals(&fixture, &["premint1", "--exclusions", "nope"]);

    assert!(!out.status.success());
    assert!(!fixture.join("premint_hashes.csv").exists());
}

#[test]
fn test_renewals_rejects_negative_duration() {
    let fixture = Fixture::new();
    fixture.write_lines("premint1", &["alice"]);
    let out = renewals(&fixture, &["premint1", "-d", "-1"]);

    assert!(!out.status.success());
    assert!(!fixture.join("premint_hashes.csv").exists());
}

#[test]
fn test_converter_without_validation() {
    let fixture = Fixture::new();
    fixture.write("Basenames.csv", "name\njohn\nalice\n");
    let out = converter(&fixture, &["Basenames.csv", "nodes.csv", "--no-validation"]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let rows = read_rows(&fixture.join("nodes.csv"));
    assert_eq!(
        rows,
        vec![
            vec!["node".to_string()],
            vec![node_hex(&namehash("john.base.eth"))],
            vec![node_hex(&namehash("alice.base.eth"))],
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_converter_interrupt_writes_nothing() {
    let fixture = Fixture::new();
    fixture.write("Basenames.csv", format!("name\n{}", many_names(200_000)));
    let child = Command::new(env!("CARGO_BIN_EXE_ens_namehash_converter"))
        .current_dir(fixture.path())
        .args(["Basenames.csv", "nodes.csv", "--no-validation"])
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ens_namehash_converter");

    let status = interrupt_after(child, "Step 2");

    assert_eq!(status.code(), Some(1));
    assert!(!fixture.join("nodes.csv").exists());
    assert_eq!(fs::read_dir(fixture.path()).unwrap().count(), 1);
}

#[test]
fn test_converter_default_paths() {
    let fixture = Fixture::new();
    fixture.write("Basenames.csv", "name\njohn\n");
    let out = converter(&fixture, &["--no-validation"]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(fixture.join("namehashes_output.csv").exists());
}

#[test]
fn test_converter_missing_input() {
    let fixture = Fixture::new();
    let out = converter(&fixture, &["missing.csv", "nodes.csv", "--no-validation"]);

    assert!(!out.status.success());
    assert!(!fixture.join("nodes.csv").exists());
}

#[test]
fn test_converter_validation_without_config() {
    let fixture = Fixture::new();
    fixture.write("Basenames.csv", "name\njohn\n");
    let out = converter(&fixture, &["Basenames.csv", "nodes.csv"]);

    assert!(!out.status.success());
    assert!(!fixture.join("nodes.csv").exists());
}

#[test]
fn test_converter_validation_without_artifact() {
    let fixture = Fixture::new();
    fixture.write("Basenames.csv", "name\njohn\n");
    let out = Command::new(env!("CARGO_BIN_EXE_ens_namehash_converter"))
        .current_dir(fixture.path())
        .env("BASE_RPC_URL", "http://127.0.0.1:9")
        .env("REGISTRY_ADDR", "0xb94704422c2a1e396835a571837aa5ae53285a95")
        .env_remove("REGISTRY_ABI_PATH")
        .args(["Basenames.csv", "nodes.csv"])
        .output()
        .expect("run ens_namehash_converter");

    assert!(!out.status.success());
    assert!(!fixture.join("nodes.csv").exists());
}
