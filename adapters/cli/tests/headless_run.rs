use std::process::Command;

fn hive_defence(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hive-defence"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch the hive-defence binary")
}

#[test]
fn json_mode_streams_snapshots() {
    let output = hive_defence(&["--frames", "120", "--json", "--wall", "14,3"]);
    assert!(output.status.success(), "run should succeed: {output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let snapshots: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is a snapshot"))
        .collect();

    let first = snapshots.first().expect("initial snapshot");
    assert_eq!(first["run_state"], "idle");
    assert_eq!(first["scrap"], 150);

    let last = snapshots.last().expect("final snapshot");
    assert_eq!(last["run_state"], "running");
    assert_eq!(last["scrap"], 130, "the opening wall was paid for");
    assert_eq!(last["wave"], 1);
}

#[test]
fn unknown_difficulty_fails() {
    let output = hive_defence(&["--difficulty", "nightmare", "--frames", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown difficulty nightmare"), "{stderr}");
}

#[test]
fn malformed_cells_are_rejected_by_the_parser() {
    let output = hive_defence(&["--wall", "twelve"]);
    assert!(!output.status.success());
}
