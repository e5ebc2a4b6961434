//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Build command for the cubebridge binary (finds it in target/debug when run via cargo test).
fn cubebridge_cli() -> Command {
    cargo_bin_cmd!("cubebridge")
}

/// Path to cubebridge library test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("cubebridge")
        .join("tests")
        .join("fixtures")
}

fn l432_page() -> PathBuf {
    fixtures_dir().join("pages").join("stm32l432kc.txt")
}

#[test]
fn test_cli_help() {
    let mut cmd = cubebridge_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("PlatformIO"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_cli_version() {
    let mut cmd = cubebridge_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_analyze_project() {
    let mut cmd = cubebridge_cli();

    cmd.arg("analyze").arg(fixtures_dir().join("l432_blinky"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Project: blinky"))
        .stdout(predicate::str::contains("STM32L432K(B-C)Ux"))
        .stdout(predicate::str::contains("USART2_TX"));
}

#[test]
fn test_cli_analyze_json_output() {
    let mut cmd = cubebridge_cli();

    cmd.arg("analyze")
        .arg(fixtures_dir().join("rtos_f401"))
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["value"]["mcu_family"], "STM32F4");
    assert_eq!(json["value"]["uses_real_time_kernel"], true);
    assert_eq!(json["warnings"][0]["kind"], "kernel_signal_mismatch");
}

#[test]
fn test_cli_analyze_without_config() {
    let mut cmd = cubebridge_cli();

    cmd.arg("analyze").arg(fixtures_dir().join("no_config"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_generate_board_to_stdout() {
    let mut cmd = cubebridge_cli();

    cmd.arg("generate-board").arg(l432_page());

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["build"]["mcu"], "stm32l432kcu6");
    assert_eq!(json["debug"]["openocd_target"], "stm32l4x");
}

#[test]
fn test_cli_generate_board_recovered_literal() {
    let mut cmd = cubebridge_cli();

    cmd.arg("generate-board")
        .arg(l432_page())
        .arg("--hse")
        .arg("16000000");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("-DHSE_VALUE=16000000U"))
        .stderr(predicate::str::contains("warning:"));
}

#[test]
fn test_cli_generate_board_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cubebridge_cli();

    cmd.arg("generate-board")
        .arg(l432_page())
        .arg("--board-id")
        .arg("my_l432")
        .arg("-D")
        .arg("BOARD_REV=2")
        .arg("--output")
        .arg(dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Board file created"));

    let text = std::fs::read_to_string(dir.path().join("my_l432.json")).unwrap();
    assert!(text.contains("-DBOARD_REV=2"));
}

#[test]
fn test_cli_generate_board_incomplete_page() {
    let mut cmd = cubebridge_cli();

    cmd.arg("generate-board")
        .arg(fixtures_dir().join("pages").join("stm32l432kc_no_voltage.txt"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("voltage_min"));
}

#[test]
fn test_cli_migrate_project() {
    let dest = tempfile::tempdir().unwrap();
    let mut cmd = cubebridge_cli();

    cmd.arg("migrate")
        .arg(fixtures_dir().join("l432_blinky"))
        .arg(dest.path())
        .arg("--board-source")
        .arg(l432_page());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("stm32l432kc (synthesized)"));

    assert!(dest.path().join("platformio.ini").is_file());
    assert!(dest.path().join("boards").join("stm32l432kc.json").is_file());
    assert!(dest.path().join("src").join("Core").join("Src").join("main.c").is_file());
}

#[test]
fn test_cli_migrate_json_output() {
    let dest = tempfile::tempdir().unwrap();
    let mut cmd = cubebridge_cli();

    cmd.arg("migrate")
        .arg(fixtures_dir().join("rtos_f401"))
        .arg(dest.path())
        .arg("--kernel")
        .arg("framework")
        .arg("--format")
        .arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["board_id"], "nucleo_f401re");
    assert_eq!(json["board_source"], "known");
    assert_eq!(json["kernel_needs_retrieval"], false);
}

#[test]
fn test_cli_migrate_family_mismatch() {
    let dest = tempfile::tempdir().unwrap();
    let mut cmd = cubebridge_cli();

    cmd.arg("migrate")
        .arg(fixtures_dir().join("rtos_f401"))
        .arg(dest.path())
        .arg("--board-source")
        .arg(l432_page());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("STM32F4"));
    assert!(!dest.path().join("platformio.ini").exists());
}

#[test]
fn test_cli_list_boards() {
    let mut cmd = cubebridge_cli();

    cmd.arg("list-boards");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("nucleo_f401re"))
        .stdout(predicate::str::contains("STM32L4"));
}

#[cfg(unix)]
#[test]
fn test_cli_migrate_build_keeps_json_stdout() {
    use std::os::unix::fs::PermissionsExt;

    let bin = tempfile::tempdir().unwrap();
    let pio = bin.path().join("pio");
    std::fs::write(&pio, "#!/bin/sh\necho compiling-firmware\n").unwrap();
    std::fs::set_permissions(&pio, std::fs::Permissions::from_mode(0o755)).unwrap();
    let path = format!(
        "{}:{}",
        bin.path().display(),
        std::env::var("PATH").unwrap_or_default()
    );

    let dest = tempfile::tempdir().unwrap();
    let mut cmd = cubebridge_cli();
    cmd.env("PATH", path)
        .arg("migrate")
        .arg(fixtures_dir().join("rtos_f401"))
        .arg(dest.path())
        .arg("--build")
        .arg("--format")
        .arg("json");

    let assert = cmd
        .assert()
        .success()
        .stderr(predicate::str::contains("compiling-firmware"));
    let stdout = assert.get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(json["board_id"], "nucleo_f401re");
}
