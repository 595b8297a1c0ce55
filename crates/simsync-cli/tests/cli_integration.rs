//! CLI subprocess integration tests.
//!
//! These tests invoke the `simsync` binary against the filesystem-backed mock
//! backend and verify exit codes, stdout content, and JSON output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CPU_TYPE_X86_64: u32 = 0x0100_0007;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn installed_copy(&self, udid: &str) -> PathBuf {
        self.state_dir()
            .join("mock/devices")
            .join(udid)
            .join("apps/com.example.Demo.app")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_simsync"));
        cmd.env("SIMSYNC_SKIP_PREREQS", "1")
            .env("SIMSYNC_CONFIG", self.config_path())
            .env_remove("SIMSYNC_DEFAULT_DEVICE")
            .env("SIMSYNC_BACKEND", "mock")
            .env_remove("SIMSYNC_MOCK_FAIL")
            .env_remove("SIMSYNC_LOG")
            .arg("--state-dir")
            .arg(self.state_dir());
        cmd
    }

    fn install(&self, app: &Path, extra: &[&str]) -> Output {
        self.cmd()
            .args(["install", "--json", "--app"])
            .arg(app)
            .args(extra)
            .output()
            .unwrap()
    }

    fn write_bundle(&self, resource: &str) -> PathBuf {
        let bundle = self.dir.path().join("build/Demo.app");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(
            bundle.join("Info.plist"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict>
<key>CFBundleIdentifier</key><string>com.example.Demo</string>
<key>CFBundleExecutable</key><string>Demo</string>
</dict></plist>"#,
        )
        .unwrap();
        let mut exe = Vec::new();
        for word in [0xfeed_facf_u32, CPU_TYPE_X86_64, 3, 2, 0, 0, 0, 0] {
            exe.extend_from_slice(&word.to_le_bytes());
        }
        fs::write(bundle.join("Demo"), exe).unwrap();
        fs::write(bundle.join("resource.txt"), resource).unwrap();
        bundle
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {stdout}\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn outcome(output: &Output) -> String {
    assert!(
        output.status.success(),
        "install must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    stdout_json(output)["outcome"].as_str().unwrap().to_owned()
}

#[test]
fn cli_version_exits_zero() {
    let output = Sandbox::new().cmd().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("simsync"));
}

#[test]
fn cli_help_lists_commands() {
    let output = Sandbox::new().cmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["install", "booted", "tail", "devices", "completions"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn install_then_skip_then_reinstall_on_change() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");

    assert_eq!(outcome(&sb.install(&app, &[])), "installed_fresh");
    assert!(sb.installed_copy("MOCK-IPHONE-15").join("Info.plist").is_file());

    let second = sb.install(&app, &[]);
    assert_eq!(outcome(&second), "skipped_up_to_date");
    let report = stdout_json(&second);
    assert_eq!(report["local_digest"], report["installed_digest"]);
    assert!(report["local_digest"]
        .as_str()
        .unwrap()
        .starts_with("blake3:"));

    fs::write(app.join("resource.txt"), "v2").unwrap();
    assert_eq!(outcome(&sb.install(&app, &[])), "reinstalled_stale");
    assert_eq!(
        fs::read_to_string(sb.installed_copy("MOCK-IPHONE-15").join("resource.txt")).unwrap(),
        "v2"
    );
}

#[test]
fn force_reinstalls_identical_copy() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");
    assert_eq!(outcome(&sb.install(&app, &[])), "installed_fresh");
    assert_eq!(
        outcome(&sb.install(&app, &["--force"])),
        "reinstalled_forced"
    );
}

#[test]
fn device_selected_by_udid() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");
    let output = sb.install(&app, &["--device", "MOCK-IPAD-PRO"]);
    assert_eq!(outcome(&output), "installed_fresh");
    assert_eq!(stdout_json(&output)["device"]["udid"], "MOCK-IPAD-PRO");
    assert!(sb.installed_copy("MOCK-IPAD-PRO").is_dir());
    assert!(!sb.installed_copy("MOCK-IPHONE-15").exists());
    assert!(sb.state_dir().join("locks/MOCK-IPAD-PRO.lock").exists());
}

#[test]
fn missing_app_exits_validation_code() {
    let sb = Sandbox::new();
    let output = sb.install(&sb.dir.path().join("Nope.app"), &[]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validation error"), "stderr: {stderr}");
    assert!(stderr.contains("to exist"), "stderr: {stderr}");
}

#[test]
fn wrong_extension_exits_validation_code() {
    let sb = Sandbox::new();
    let dir = sb.dir.path().join("Demo.bundle");
    fs::create_dir_all(&dir).unwrap();
    let output = sb.install(&dir, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("to end in .app"));
}

#[test]
fn unknown_device_exits_no_device_code() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");
    let output = sb.install(&app, &["--device", "iPhone 99 (1.0)"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no matching device"));
}

#[test]
fn unknown_default_device_exits_no_device_code() {
    let sb = Sandbox::new();
    fs::write(sb.config_path(), "default_device = \"iPhone 4s (9.0)\"\n").unwrap();
    let app = sb.write_bundle("v1");
    let output = sb.install(&app, &[]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn bridge_failure_exits_bridge_code_without_touching_copy() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");
    assert_eq!(outcome(&sb.install(&app, &[])), "installed_fresh");
    fs::write(app.join("resource.txt"), "v2").unwrap();

    let output = sb
        .cmd()
        .env("SIMSYNC_MOCK_FAIL", "fetch")
        .args(["install", "--app"])
        .arg(&app)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bridge error"));
    assert_eq!(
        fs::read_to_string(sb.installed_copy("MOCK-IPHONE-15").join("resource.txt")).unwrap(),
        "v1"
    );
}

#[test]
fn bridge_failure_is_retried() {
    let sb = Sandbox::new();
    fs::write(sb.config_path(), "[retry]\ninterval_ms = 0\n").unwrap();
    let app = sb.write_bundle("v1");

    let output = sb
        .cmd()
        .env("SIMSYNC_MOCK_FAIL", "install")
        .args(["install", "--retries", "3", "--app"])
        .arg(&app)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("attempt 1/3 failed"), "stderr: {stderr}");
    assert!(stderr.contains("attempt 2/3 failed"), "stderr: {stderr}");
}

#[test]
fn retries_repeat_only_the_bridge_work() {
    let sb = Sandbox::new();
    fs::write(sb.config_path(), "[retry]\ninterval_ms = 0\n").unwrap();
    let app = sb.write_bundle("v1");

    let output = sb
        .cmd()
        .env("SIMSYNC_MOCK_FAIL", "install")
        .args(["install", "--debug", "--retries", "3", "--app"])
        .arg(&app)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("resolved device").count(), 1, "stderr: {stderr}");
    assert_eq!(stderr.matches("validated ").count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("attempt 2/3 failed"), "stderr: {stderr}");
    assert!(stderr.contains("reconcile attempt 3"), "stderr: {stderr}");
}

#[test]
fn json_report_describes_executable() {
    let sb = Sandbox::new();
    let app = sb.write_bundle("v1");
    let output = sb.install(&app, &[]);
    assert_eq!(outcome(&output), "installed_fresh");
    let report = stdout_json(&output);
    assert_eq!(report["arches"], serde_json::json!(["x86_64"]));
    assert!(report["executable"].as_str().unwrap().ends_with("Demo.app/Demo"));
}

#[test]
fn malformed_config_exits_failure() {
    let sb = Sandbox::new();
    fs::write(sb.config_path(), "default_device = [").unwrap();
    let output = sb.cmd().arg("devices").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config error"));
}

#[test]
fn unknown_backend_exits_bridge_code() {
    let sb = Sandbox::new();
    let output = sb
        .cmd()
        .args(["--backend", "adb", "devices"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn booted_prints_booted_simulator() {
    let sb = Sandbox::new();
    let output = sb.cmd().arg("booted").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("iPhone 15 (17.0)"), "stdout: {stdout}");
    assert!(stdout.contains("MOCK-IPHONE-15"), "stdout: {stdout}");

    let json = sb.cmd().args(["booted", "--json"]).output().unwrap();
    assert_eq!(stdout_json(&json)["udid"], "MOCK-IPHONE-15");
}

#[test]
fn booted_reports_when_none_booted() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.state_dir().join("mock")).unwrap();
    fs::write(
        sb.state_dir().join("mock/devices.json"),
        r#"{"devices":{"com.apple.CoreSimulator.SimRuntime.iOS-17-0":[
            {"udid":"S1","name":"iPhone 15","state":"Shutdown","isAvailable":true}]}}"#,
    )
    .unwrap();

    let output = sb.cmd().arg("booted").output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "No simulator is booted."
    );

    let tail = sb.cmd().arg("tail").output().unwrap();
    assert_eq!(tail.status.code(), Some(3));
}

#[test]
fn devices_json_lists_in_order() {
    let sb = Sandbox::new();
    let output = sb.cmd().args(["devices", "--json"]).output().unwrap();
    assert!(output.status.success());
    let devices = stdout_json(&output);
    let udids: Vec<&str> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["udid"].as_str().unwrap())
        .collect();
    assert_eq!(udids, vec!["MOCK-IPHONE-15", "MOCK-IPAD-PRO"]);
}

#[test]
fn completions_generate_for_bash() {
    let output = Sandbox::new()
        .cmd()
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("simsync"));
}
