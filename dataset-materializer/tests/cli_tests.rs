//! Exit codes of the `materialize` binary

mod helpers;

use helpers::Workspace;
use std::process::{Command, Output};

/// Run the binary with an empty config file and no inherited settings
fn materialize(ws: &Workspace, args: &[&str]) -> Output {
    let config = ws.root.path().join("empty.toml");
    std::fs::write(&config, "").expect("write config");

    Command::new(env!("CARGO_BIN_EXE_materialize"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .env_remove("DATASET_CONFIG")
        .env_remove("DATASET_SOURCE_DIR")
        .env_remove("DATASET_TARGET_DIR")
        .env_remove("DATASET_LABEL")
        .env_remove("RUST_LOG")
        .output()
        .expect("run materialize")
}

fn run_args(ws: &Workspace) -> Vec<String> {
    vec![
        "--source-dir".to_string(),
        ws.source.display().to_string(),
        "--target-dir".to_string(),
        ws.target.display().to_string(),
    ]
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

#[test]
fn test_full_run_exits_zero() {
    let ws = Workspace::new();
    ws.add_wav("a.wav");

    let output = materialize(&ws, &as_strs(&run_args(&ws)));

    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    assert_eq!(ws.metadata_lines().len(), 1);
}

#[test]
fn test_skipped_file_exits_two() {
    let ws = Workspace::new();
    ws.add_wav("real.wav");
    ws.add_file("fake.wav", b"not audio");
    let mut args = run_args(&ws);
    args.push("--verify-header".to_string());

    let output = materialize(&ws, &as_strs(&args));

    assert_eq!(output.status.code(), Some(2), "{:?}", output);
    assert_eq!(ws.source_files(), vec!["fake.wav"]);
}

#[test]
fn test_missing_source_exits_one_without_target() {
    let ws = Workspace::new();
    let args = [
        "run".to_string(),
        "--source-dir".to_string(),
        ws.root.path().join("absent").display().to_string(),
        "--target-dir".to_string(),
        ws.target.display().to_string(),
    ];

    let output = materialize(&ws, &as_strs(&args));

    assert_eq!(output.status.code(), Some(1), "{:?}", output);
    assert!(!ws.target.exists());
}

#[test]
fn test_inspect_and_verify() {
    let ws = Workspace::new();
    ws.add_wav("a.wav");
    let target = ws.target.display().to_string();
    assert_eq!(
        materialize(&ws, &as_strs(&run_args(&ws))).status.code(),
        Some(0)
    );

    let inspect = materialize(&ws, &["inspect", "--target-dir", &target]);
    assert_eq!(inspect.status.code(), Some(0), "{:?}", inspect);
    let stdout = String::from_utf8_lossy(&inspect.stdout);
    assert!(stdout.contains("records:               1"), "{}", stdout);

    let clean = materialize(&ws, &["verify", "--target-dir", &target]);
    assert_eq!(clean.status.code(), Some(0), "{:?}", clean);

    std::fs::write(ws.target.join("data").join("stray000.wav"), b"x").unwrap();
    let dirty = materialize(&ws, &["verify", "--target-dir", &target]);
    assert_eq!(dirty.status.code(), Some(2), "{:?}", dirty);
    assert!(String::from_utf8_lossy(&dirty.stdout).contains("stray000.wav"));
}
