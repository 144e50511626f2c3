//! End-to-end tests for the ywfm binary.
//!
//! These tests run the compiled binary:
//! - Argument and timer errors
//! - `status` and `completions` subcommands
//! - Attached and background runs against a stand-in `notify-send` (Linux)

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn ywfm(state_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ywfm").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("YWFM_MIN_WAIT")
        .env("YWFM_STATE_DIR", state_dir);
    cmd
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn invalid_timer_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    ywfm(dir.path())
        .args(["-t", "10x"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error:"))
        .stderr(predicate::str::contains("10x"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn misordered_timer_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    ywfm(dir.path())
        .args(["-t", "10m1h", "-b"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    // Nothing was detached.
    assert!(!dir.path().join("ywfm.pid").exists());
}

#[cfg(unix)]
#[test]
fn unwritable_state_dir_reports_cause_once() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "").unwrap();

    let output = ywfm(&blocker.join("state"))
        .args(["-t", "0s", "-b"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: Failed to access state directory"));
    assert_eq!(stderr.matches("os error").count(), 1, "stderr: {}", stderr);
}

#[test]
fn relative_state_dir_rejected() {
    ywfm(Path::new("relative/state"))
        .args(["-t", "0s"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}

// ============================================================================
// Subcommands
// ============================================================================

#[test]
fn status_without_background_reminder() {
    let dir = tempfile::tempdir().unwrap();
    ywfm(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No background reminder recorded"));
}

#[test]
fn status_reports_recorded_pid() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ywfm.pid"), std::process::id().to_string()).unwrap();

    ywfm(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "pid {} (waiting)",
            std::process::id()
        )));
}

#[test]
fn completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    ywfm(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ywfm"));
}

// ============================================================================
// Runs against a stand-in notifier
// ============================================================================

#[cfg(target_os = "linux")]
mod notifier_tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    use super::*;

    /// Installs a `notify-send` script that records its arguments (or exits
    /// with `exit_code`) and returns the directory to put on PATH.
    fn fake_notifier(root: &Path, exit_code: i32) -> PathBuf {
        let bin = root.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("notify-send");
        let record = root.join("notified");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\nexit {}\n",
                record.display(),
                exit_code
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        bin
    }

    fn path_with(bin: &Path) -> String {
        format!("{}:{}", bin.display(), std::env::var("PATH").unwrap_or_default())
    }

    /// Waits until `check` returns a value or the deadline passes.
    fn poll<T>(mut check: impl FnMut() -> Option<T>) -> T {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(value) = check() {
                return value;
            }
            assert!(Instant::now() < deadline, "timed out waiting for the daemon");
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    fn attached_run_notifies() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);

        ywfm(&root.path().join("state"))
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "0s", "-s", "Tea", "-m", "Ready"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"subject\": \"Tea\""));

        let recorded = fs::read_to_string(root.path().join("notified")).unwrap();
        assert_eq!(recorded, "Tea\nReady\n");
    }

    #[test]
    fn attached_run_survives_failing_command() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);

        ywfm(&root.path().join("state"))
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "0s", "-c", "exit 1"])
            .assert()
            .success()
            .stderr(predicate::str::contains("exit status 1"));
    }

    #[test]
    fn attached_run_fails_when_notifier_fails() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 3);
        let marker = root.path().join("command-ran");

        ywfm(&root.path().join("state"))
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "0s", "-c"])
            .arg(format!("touch '{}'", marker.display()))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("notify-send"));

        assert!(!marker.exists());
    }

    #[test]
    fn attached_run_shows_progress() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);

        ywfm(&root.path().join("state"))
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "1s", "-p"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Starting timer for 1s..."))
            .stdout(predicate::str::contains("| 1/1s"));
    }

    #[test]
    fn background_run_detaches_and_delivers() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);
        let state = root.path().join("state");

        let output = ywfm(&state)
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "0s", "-b", "-c", "echo done"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 1, "expected one status line, got {:?}", lines);

        let status: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        let pid = status["pid"].as_u64().unwrap();
        let created_at = status["info"]["created_at"].as_str().unwrap().to_string();
        assert!(pid > 0);
        assert_eq!(status["params"]["background"], true);
        assert_eq!(status["info"]["seconds"], 0);

        let recorded = poll(|| {
            fs::read_to_string(root.path().join("notified"))
                .ok()
                .filter(|content| content.lines().count() == 2)
        });
        assert_eq!(recorded, "ywfm\nYou're welcome!\n");

        let log = state.join(format!("output_{}_{}.log", created_at, pid));
        let log_content = poll(|| {
            fs::read_to_string(&log)
                .ok()
                .filter(|content| content.contains("done\n"))
        });
        assert!(log_content.starts_with(&format!("pid: {}\n", pid)));

        // The PID file and status record are written before the wait starts.
        let pid_file = fs::read_to_string(state.join("ywfm.pid")).unwrap();
        assert_eq!(pid_file, pid.to_string());

        let record =
            fs::read_to_string(state.join(format!("{}_{}.json", created_at, pid))).unwrap();
        let record: serde_json::Value = serde_json::from_str(&record).unwrap();
        assert_eq!(record["pid"].as_u64(), Some(pid));
    }

    #[test]
    fn background_runs_in_same_second_keep_separate_records() {
        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);
        let state = root.path().join("state");

        let mut pids = Vec::new();
        for message in ["first", "second"] {
            let output = ywfm(&state)
                .env("PATH", path_with(&bin))
                .args(["--min-wait", "0", "-t", "0s", "-b", "-m", message])
                .output()
                .unwrap();
            assert!(output.status.success());
            let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
            pids.push(status["pid"].as_u64().unwrap());
        }
        assert_ne!(pids[0], pids[1]);

        let count = |prefix: &str, suffix: &str| {
            fs::read_dir(&state)
                .unwrap()
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
                .count()
        };
        poll(|| (count("", ".json") == 2).then_some(()));
        assert_eq!(count("output_", ".log"), 2);
        assert_eq!(count("error_", ".log"), 2);

        for pid in pids {
            assert_eq!(count("", &format!("_{}.json", pid)), 1);
        }
    }

    #[test]
    fn unreadable_caller_stdout_cancels_daemon() {
        use std::process::{Command, Stdio};

        let root = tempfile::tempdir().unwrap();
        let bin = fake_notifier(root.path(), 0);

        // A pipe whose read end is already closed.
        let (reader, writer) = nix::unistd::pipe().unwrap();
        drop(reader);

        let output = Command::new(assert_cmd::cargo::cargo_bin("ywfm"))
            .env_remove("RUST_LOG")
            .env("YWFM_STATE_DIR", root.path().join("state"))
            .env("PATH", path_with(&bin))
            .args(["--min-wait", "0", "-t", "1s", "-b"])
            .stdout(Stdio::from(writer))
            .stderr(Stdio::piped())
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("Failed to report status"), "stderr: {}", stderr);
        assert_eq!(stderr.matches("Broken pipe").count(), 1, "stderr: {}", stderr);

        // The daemon would have notified after one second.
        std::thread::sleep(Duration::from_secs(3));
        assert!(!root.path().join("notified").exists());
    }
}
