//! CLI 集成测试
//!
//! 使用模拟硬件后端、较快的运动参数和临时目录中的配置文件。

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 写入快速运动配置，动画和缓存目录指向临时目录
fn fast_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    let content = format!(
        r#"[motion]
linear_speed_mps = 10.0
rotation_speed_dps = 3600.0
poll_interval_ms = 5
recovery_ms = 5

[display]
animation_dir = '{}'
cache_dir = '{}'
"#,
        dir.path().join("gifs").display(),
        dir.path().join("cache").display()
    );
    fs::write(&path, content).unwrap();
    path
}

fn rover(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rover-cli").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rover").join("config.toml");

    rover(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("已写入默认配置"));
    assert!(path.exists());

    rover(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linear_speed_mps = 0.7"))
        .stdout(predicate::str::contains("backward = \"backwards.gif\""));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    rover(&dir.path().join("missing.toml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("使用默认值"))
        .stdout(predicate::str::contains("retention_days = 7"));
}

#[test]
fn test_exec_motion_command() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    rover(&config)
        .args(["--no-display", "exec", "left", "turn", "45"])
        .assert()
        .success()
        .stdout(predicate::str::contains("left turn 45°"))
        .stdout(predicate::str::contains("完成"));
}

#[test]
fn test_exec_with_display_and_missing_animations() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    // 没有任何动画文件：显示线程无内容可播，但指令照常完成
    rover(&config)
        .args(["exec", "forward", "0.5"])
        .assert()
        .success();
}

#[test]
fn test_exec_unknown_command_fails() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    rover(&config)
        .args(["--no-display", "exec", "moonwalk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("无法识别的指令"));
}

#[test]
fn test_run_script() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    let script = dir.path().join("square.txt");
    fs::write(
        &script,
        "# 小方块\nforward 0.5\nleft turn 90\nforward 0.5\nleft turn 90\nhi\n",
    )
    .unwrap();

    rover(&config)
        .args(["--no-display", "run"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("总指令数: 5"))
        .stdout(predicate::str::contains("成功: 5"));
}

#[test]
fn test_run_rejects_unparsable_script() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    let script = dir.path().join("bad.txt");
    fs::write(&script, "forward 1\nfly 3\n").unwrap();

    rover(&config)
        .args(["--no-display", "run"])
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("第 2 行"));
}

#[test]
fn test_cache_info_and_sweep_on_empty_cache() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    rover(&config)
        .args(["cache", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("共 0 个条目"));

    rover(&config)
        .args(["cache", "sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("已删除 0 个过期条目"));
}

#[test]
fn test_cache_warm_reports_missing_animations() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);

    rover(&config)
        .args(["cache", "warm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("idle").and(predicate::str::contains("不可用")));
}
