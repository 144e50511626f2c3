//! State directory layout.
//!
//! ```text
//! <state_dir>/
//! ├── ywfm.pid                     last daemon's pid (shared, last writer wins)
//! ├── output_<created_at>_<pid>.log    daemon stdout
//! ├── error_<created_at>_<pid>.log     daemon stderr
//! └── <created_at>_<pid>.json          status record
//! ```

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

use super::error::{DaemonError, Result};
use crate::types::{DaemonStatus, ReminderConfig};

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Files belonging to one background run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
    pub status: PathBuf,
}

/// The per-user state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDir {
    root: PathBuf,
    pid_file_name: String,
}

impl StateDir {
    pub fn new(root: impl Into<PathBuf>, program_name: &str) -> Self {
        Self {
            root: root.into(),
            pid_file_name: format!("{}.pid", program_name),
        }
    }

    pub fn from_config(config: &ReminderConfig) -> Self {
        Self {
            root: config.state_dir.clone(),
            pid_file_name: config.pid_file_name(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join(&self.pid_file_name)
    }

    /// Paths of the files for the run created at `created_at` by daemon `pid`.
    ///
    /// The pid keeps runs started within the same second apart.
    pub fn run_files(&self, created_at: &str, pid: u32) -> RunFiles {
        let key = format!("{}_{}", created_at, pid);
        RunFiles {
            stdout_log: self.root.join(format!("output_{}.log", key)),
            stderr_log: self.root.join(format!("error_{}.log", key)),
            status: self.root.join(format!("{}.json", key)),
        }
    }

    /// Creates the directory if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);
        builder
            .create(&self.root)
            .map_err(|e| DaemonError::state_dir(&self.root, e))
    }

    /// Records `pid` as the tracked daemon, replacing any previous record.
    pub fn write_pid(&self, pid: u32) -> Result<()> {
        let path = self.pid_file();
        let mut file = create_file(&path, true).map_err(|e| DaemonError::state_dir(&path, e))?;
        write!(file, "{}", pid).map_err(|e| DaemonError::state_dir(&path, e))
    }

    /// Reads the tracked daemon pid, if any.
    pub fn read_pid(&self) -> Result<Option<u32>> {
        let path = self.pid_file();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.trim().parse().ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DaemonError::state_dir(&path, e)),
        }
    }

    /// Writes the status record of a run.
    pub fn write_status(&self, files: &RunFiles, status: &DaemonStatus) -> Result<()> {
        let mut document = status.to_pretty()?;
        document.push('\n');
        let mut file =
            create_file(&files.status, true).map_err(|e| DaemonError::state_dir(&files.status, e))?;
        file.write_all(document.as_bytes())
            .map_err(|e| DaemonError::state_dir(&files.status, e))
    }

    /// Opens a run's log file for appending, creating it if needed.
    pub fn open_log(&self, path: &Path) -> Result<File> {
        create_file(path, false).map_err(|e| DaemonError::state_dir(path, e))
    }
}

/// Opens `path` for writing with mode 0644, either truncating or appending.
fn create_file(path: &Path, truncate: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    #[cfg(unix)]
    options.mode(FILE_MODE);
    options.open(path)
}

/// Header written at the top of each log file section.
pub fn log_header(status: &DaemonStatus) -> String {
    format!(
        "pid: {}\ncreated_at: {}\ntrigger_at: {}\n---\n",
        status.pid, status.info.created_at, status.info.trigger_at
    )
}

/// Returns true if a process with `pid` exists.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    // Signal 0 only checks for existence.
    kill(Pid::from_raw(raw), None).is_ok()
}

/// Returns true if a process with `pid` exists.
#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HostInfo, ReminderRequest};

    fn sample_status(pid: u32) -> DaemonStatus {
        let config = ReminderConfig::default().with_state_dir("/tmp");
        let prepared = ReminderRequest {
            timer: Some("1m".to_string()),
            background: true,
            ..ReminderRequest::default()
        }
        .normalize(&config, chrono::Local::now())
        .unwrap();
        DaemonStatus::new(pid, &prepared, HostInfo::default())
    }

    #[test]
    fn test_paths() {
        let state = StateDir::new("/home/u/.local/state/ywfm", "ywfm");
        assert_eq!(
            state.pid_file(),
            PathBuf::from("/home/u/.local/state/ywfm/ywfm.pid")
        );

        let files = state.run_files("2026-10-18_09:30:00", 812);
        assert!(files.stdout_log.ends_with("output_2026-10-18_09:30:00_812.log"));
        assert!(files.stderr_log.ends_with("error_2026-10-18_09:30:00_812.log"));
        assert!(files.status.ends_with("2026-10-18_09:30:00_812.json"));
    }

    #[test]
    fn test_from_config() {
        let config = ReminderConfig::default().with_state_dir("/var/tmp/r");
        let state = StateDir::from_config(&config);
        assert_eq!(state.root(), Path::new("/var/tmp/r"));
        assert!(state.pid_file().ends_with("ywfm.pid"));
    }

    #[test]
    fn test_distinct_runs_have_distinct_files() {
        let state = StateDir::new("/s", "ywfm");
        let a = state.run_files("2026-10-18_09:30:00", 100);
        let b = state.run_files("2026-10-18_09:30:01", 100);
        assert_ne!(a.stdout_log, b.stdout_log);
        assert_ne!(a.stderr_log, b.stderr_log);
        assert_ne!(a.status, b.status);
        // Only the PID file is shared.
        assert_eq!(state.pid_file(), StateDir::new("/s", "ywfm").pid_file());
    }

    #[test]
    fn test_same_second_runs_have_distinct_files() {
        let state = StateDir::new("/s", "ywfm");
        let a = state.run_files("2026-10-18_09:30:00", 100);
        let b = state.run_files("2026-10-18_09:30:00", 101);
        assert_ne!(a.stdout_log, b.stdout_log);
        assert_ne!(a.stderr_log, b.stderr_log);
        assert_ne!(a.status, b.status);
    }

    #[test]
    fn test_same_second_status_records_both_kept() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        let first = sample_status(100);
        let second = DaemonStatus {
            pid: 101,
            ..first.clone()
        };

        for status in [&first, &second] {
            let files = state.run_files(&status.info.created_at, status.pid);
            state.write_status(&files, status).unwrap();
        }

        let records = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .count();
        assert_eq!(records, 2);
    }

    #[test]
    fn test_ensure_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path().join("a/b/ywfm"), "ywfm");
        state.ensure().unwrap();
        assert!(state.root().is_dir());
        // Idempotent.
        state.ensure().unwrap();
    }

    #[test]
    fn test_pid_round_trip_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        assert_eq!(state.read_pid().unwrap(), None);

        state.write_pid(100).unwrap();
        assert_eq!(state.read_pid().unwrap(), Some(100));

        state.write_pid(7).unwrap();
        assert_eq!(state.read_pid().unwrap(), Some(7));
        assert_eq!(fs::read_to_string(state.pid_file()).unwrap(), "7");
    }

    #[test]
    fn test_read_pid_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        fs::write(state.pid_file(), "not a pid").unwrap();
        assert_eq!(state.read_pid().unwrap(), None);
    }

    #[test]
    fn test_write_status_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        let status = sample_status(321);
        let files = state.run_files(&status.info.created_at, status.pid);

        state.write_status(&files, &status).unwrap();

        let content = fs::read_to_string(&files.status).unwrap();
        assert_eq!(DaemonStatus::from_json(&content).unwrap(), status);
    }

    #[test]
    fn test_open_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        let path = dir.path().join("output_x.log");

        writeln!(state.open_log(&path).unwrap(), "first").unwrap();
        writeln!(state.open_log(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_modes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::new(dir.path(), "ywfm");
        state.write_pid(1).unwrap();

        let mode = fs::metadata(state.pid_file()).unwrap().permissions().mode();
        // umask can only clear bits.
        assert_eq!(mode & 0o777 & !FILE_MODE, 0);
    }

    #[test]
    fn test_log_header() {
        let status = sample_status(55);
        let header = log_header(&status);
        assert!(header.starts_with("pid: 55\n"));
        assert!(header.contains(&format!("created_at: {}\n", status.info.created_at)));
        assert!(header.ends_with("---\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_process_alive() {
        assert!(is_process_alive(std::process::id()));
        assert!(!is_process_alive(u32::MAX));
    }
}
