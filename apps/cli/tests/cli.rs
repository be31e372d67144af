//! affprim-cli 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FAST_SETTINGS: &str = r#"
[engine]
period_ms = 5
default_exec_time_s = 0.05
"#;

const FAST_SEQUENCES: &str = r#"
[[sequence]]
key = "open_hand"

[[sequence.wp]]
poss = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
vels = [2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0]
thres = [1000.0, 1000.0, 1000.0, 1000.0, 1000.0]

[[sequence]]
key = "close_hand"

[[sequence.wp]]
poss = [40.0, 80.0, 40.0, 50.0, 70.0, 90.0, 70.0, 90.0, 180.0]
vels = [2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0]
thres = [1000.0, 1000.0, 1000.0, 1000.0, 1000.0]

[[sequence]]
key = "karate_hand"

[[sequence.wp]]
poss = [0.0, 80.0, 60.0, 60.0, 0.0, 0.0, 0.0, 0.0, 0.0]
vels = [2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0]
thres = [1000.0, 1000.0, 1000.0, 1000.0, 1000.0]
"#;

fn cli() -> Command {
    Command::cargo_bin("affprim-cli").unwrap()
}

/// 写入快速配置和序列文件，返回 (目录, 配置路径, 序列路径)
fn fast_files() -> (TempDir, String, String) {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("engine.toml");
    let sequences = dir.path().join("hands.toml");
    fs::write(&settings, FAST_SETTINGS).unwrap();
    fs::write(&sequences, FAST_SEQUENCES).unwrap();
    (
        dir,
        settings.to_string_lossy().into_owned(),
        sequences.to_string_lossy().into_owned(),
    )
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("engine.toml");
    let path_str = path.to_string_lossy().into_owned();

    cli()
        .args(["config", "init", "--file", path_str.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("engine.toml"));
    assert!(path.exists());

    cli()
        .args(["config", "show", "--file", path_str.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[engine]"))
        .stdout(predicate::str::contains("9 个关节"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let (_dir, settings, _) = fast_files();

    cli()
        .args(["config", "init", "--file", settings.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    cli()
        .args(["config", "init", "--file", settings.as_str(), "--force"])
        .assert()
        .success();
}

#[test]
fn test_seqs_lists_keys() {
    let (_dir, settings, sequences) = fast_files();

    cli()
        .args(["seqs", sequences.as_str(), "--config", settings.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 个序列"))
        .stdout(predicate::str::contains("close_hand"))
        .stdout(predicate::str::contains("karate_hand"));
}

#[test]
fn test_seqs_rejects_layout_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.toml");
    fs::write(
        &path,
        r#"
[[sequence]]
key = "short"

[[sequence.wp]]
poss = [0.0, 0.0, 0.0]
vels = [10.0, 10.0, 10.0]
thres = [1.0, 1.0, 1.0, 1.0, 1.0]
"#,
    )
    .unwrap();

    let file = path.to_string_lossy().into_owned();
    let missing = dir.path().join("missing.toml").to_string_lossy().into_owned();
    cli()
        .args(["seqs", file.as_str(), "--config", missing.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("short"));
}

#[test]
fn test_gesture_rejects_bad_target() {
    cli()
        .args(["gesture", "grasp", "--target", "0.1,0.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3 个分量"));
}

#[test]
fn test_gesture_grasp_on_sim() {
    let (_dir, settings, sequences) = fast_files();

    cli()
        .args([
            "gesture",
            "grasp",
            "--target",
            "-0.3,0.1,0.0",
            "--config",
            settings.as_str(),
            "--sequences",
            sequences.as_str(),
            "--timeout-s",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("已入队 3 个动作"))
        .stdout(predicate::str::contains("reach #1"))
        .stdout(predicate::str::contains("完成"));
}

#[test]
fn test_gesture_tap_on_sim() {
    let (_dir, settings, sequences) = fast_files();

    cli()
        .args([
            "gesture",
            "tap",
            "--from",
            "-0.3,0.1,0.1",
            "--to",
            "-0.3,0.1,0.0",
            "--exec-ms",
            "50",
            "--config",
            settings.as_str(),
            "--sequences",
            sequences.as_str(),
            "--period-ms",
            "10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("reach #2"));
}

#[test]
fn test_gesture_missing_sequence_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("only_open.toml");
    let only_open = FAST_SEQUENCES
        .split("[[sequence]]")
        .take(2)
        .collect::<Vec<_>>()
        .join("[[sequence]]");
    fs::write(&path, only_open).unwrap();
    let file = path.to_string_lossy().into_owned();
    let missing = dir.path().join("missing.toml").to_string_lossy().into_owned();

    cli()
        .args([
            "gesture",
            "grasp",
            "--target",
            "-0.3,0.1,0.0",
            "--sequences",
            file.as_str(),
            "--config",
            missing.as_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("close_hand"));
}
