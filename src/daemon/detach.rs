//! Double-fork daemonization.
//!
//! The sequence is:
//!
//! 1. fork; the calling process waits for the intermediate child and exits
//! 2. the intermediate child starts a new session, moves to `/` and clears
//!    its umask
//! 3. fork again; the intermediate prints the status line (with the final
//!    daemon's pid) on the caller's stdout and exits
//! 4. the daemon closes inherited descriptors, binds stdin to `/dev/null`,
//!    redirects stdout/stderr to the run's log files and records its pid and
//!    status in the state directory
//!
//! The status line goes out before any redirection, so the caller always
//! sees it.

use std::io::{self, Write};

use super::error::Result;
use super::state::{RunFiles, StateDir};
use crate::types::DaemonStatus;

/// Where the current process stands after a daemonization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detachment {
    /// This process is an ancestor of the daemon and must exit successfully.
    Ancestor,
    /// This process is the detached daemon.
    Daemon(DetachedHandle),
}

/// Identity of the detached daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedHandle {
    pub pid: u32,
    pub files: RunFiles,
}

/// Turns the current process into a background daemon.
pub trait Daemonize {
    /// Detaches, using `status` as the record reported to the caller.
    ///
    /// Returns in every process that survives a fork; see [`Detachment`].
    fn daemonize(&self, status: &DaemonStatus) -> Result<Detachment>;
}

/// Upper bound for descriptor closing when the open-file limit is unknown.
const FALLBACK_DESCRIPTOR_LIMIT: i32 = 1024;

/// Lists the open descriptors of the current process, where supported.
const PROC_FD_DIR: &str = "/proc/self/fd";

/// Null device bound to the daemon's stdin.
const DEV_NULL: &str = "/dev/null";

/// Daemonizes with `fork(2)` and `setsid(2)`.
#[derive(Debug, Clone)]
pub struct ForkDaemonizer {
    state: StateDir,
}

impl ForkDaemonizer {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }
}

#[cfg(unix)]
impl Daemonize for ForkDaemonizer {
    fn daemonize(&self, status: &DaemonStatus) -> Result<Detachment> {
        use nix::sys::stat::{umask, Mode};
        use nix::unistd::{chdir, fork, setsid, ForkResult};

        use super::error::DaemonError;

        // Create the directory while the caller can still see the error.
        self.state.ensure()?;

        flush_std_streams();
        // SAFETY: the process is single-threaded here; the async runtime is
        // only built after daemonization.
        match unsafe { fork() }.map_err(|e| fork_failed(1, e))? {
            ForkResult::Parent { child } => return wait_for_intermediate(child),
            ForkResult::Child => {}
        }

        setsid().map_err(|e| DaemonError::Session(e.into()))?;
        chdir("/").map_err(|e| DaemonError::Session(e.into()))?;
        umask(Mode::empty());

        flush_std_streams();
        // SAFETY: see above.
        match unsafe { fork() }.map_err(|e| fork_failed(2, e))? {
            ForkResult::Parent { child } => {
                let pid = u32::try_from(child.as_raw()).unwrap_or_default();
                if let Err(e) = report_status(&status.with_pid(pid)) {
                    // A caller that is told the run failed must not be notified.
                    let _ = nix::sys::signal::kill(child, nix::sys::signal::Signal::SIGTERM);
                    return Err(e);
                }
                return Ok(Detachment::Ancestor);
            }
            ForkResult::Child => {}
        }

        let pid = std::process::id();
        let status = status.with_pid(pid);
        let files = self.state.run_files(&status.info.created_at, pid);

        close_inherited_descriptors();
        redirect_streams(&self.state, &files, &status)?;

        // Last writer wins; concurrent daemons are told apart by their run files.
        self.state.write_pid(pid)?;
        self.state.write_status(&files, &status)?;

        tracing::info!("Daemon {} detached", pid);
        Ok(Detachment::Daemon(DetachedHandle { pid, files }))
    }
}

#[cfg(not(unix))]
impl Daemonize for ForkDaemonizer {
    fn daemonize(&self, _status: &DaemonStatus) -> Result<Detachment> {
        Err(super::error::DaemonError::Unsupported)
    }
}

fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

#[cfg(unix)]
fn fork_failed(stage: u8, errno: nix::errno::Errno) -> super::error::DaemonError {
    super::error::DaemonError::ForkFailed {
        stage,
        source: errno.into(),
    }
}

/// Waits for the intermediate process so its status line is out before the
/// caller exits, and so a second-fork failure reaches the caller's exit code.
#[cfg(unix)]
fn wait_for_intermediate(child: nix::unistd::Pid) -> Result<Detachment> {
    use nix::sys::wait::{waitpid, WaitStatus};

    use super::error::DaemonError;

    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, 0)) => return Ok(Detachment::Ancestor),
            Ok(WaitStatus::Exited(_, code)) => {
                return Err(DaemonError::DetachFailed { status: Some(code) })
            }
            Ok(WaitStatus::Signaled(..)) => {
                return Err(DaemonError::DetachFailed { status: None })
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(DaemonError::Session(e.into())),
        }
    }
}

/// Prints the status record as one line on stdout.
fn report_status(status: &DaemonStatus) -> Result<()> {
    let line = status.to_line()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)
        .and_then(|()| stdout.flush())
        .map_err(super::error::DaemonError::Report)
}

/// Closes every descriptor above stderr; already-closed ones are skipped.
#[cfg(unix)]
fn close_inherited_descriptors() {
    match open_descriptors() {
        Some(fds) => {
            for fd in fds {
                let _ = nix::unistd::close(fd);
            }
        }
        None => {
            for fd in 3..descriptor_limit() {
                let _ = nix::unistd::close(fd);
            }
        }
    }
}

/// Open descriptors above stderr, if the process can list them.
///
/// The list may include the descriptor used to read it, which is closed again
/// by the time the list is returned.
#[cfg(unix)]
fn open_descriptors() -> Option<Vec<i32>> {
    let entries = std::fs::read_dir(PROC_FD_DIR).ok()?;
    let fds = entries
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<i32>().ok())
        .filter(|fd| *fd > 2)
        .collect();
    Some(fds)
}

/// Soft `RLIMIT_NOFILE`: no descriptor can be numbered at or above it.
#[cfg(unix)]
fn descriptor_limit() -> i32 {
    use nix::sys::resource::{getrlimit, Resource, RLIM_INFINITY};

    match getrlimit(Resource::RLIMIT_NOFILE) {
        Ok((soft, _)) if soft != RLIM_INFINITY => i32::try_from(soft).unwrap_or(i32::MAX),
        _ => FALLBACK_DESCRIPTOR_LIMIT,
    }
}

/// Binds stdin to the null device and stdout/stderr to the run's log files.
#[cfg(unix)]
fn redirect_streams(state: &StateDir, files: &RunFiles, status: &DaemonStatus) -> Result<()> {
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    use nix::unistd::dup2;

    use super::error::DaemonError;
    use super::state::log_header;

    let null = File::open(DEV_NULL).map_err(DaemonError::Redirect)?;
    let mut stdout_log = state.open_log(&files.stdout_log)?;
    let mut stderr_log = state.open_log(&files.stderr_log)?;

    let header = log_header(status);
    stdout_log
        .write_all(header.as_bytes())
        .and_then(|()| stderr_log.write_all(header.as_bytes()))
        .map_err(DaemonError::Redirect)?;

    flush_std_streams();
    for (file, target) in [(&null, 0), (&stdout_log, 1), (&stderr_log, 2)] {
        dup2(file.as_raw_fd(), target).map_err(|e| DaemonError::Redirect(e.into()))?;
    }
    Ok(())
}

// ============================================================================
// MockDaemonizer
// ============================================================================

/// Daemonizer that never forks; reports a fixed outcome.
#[derive(Debug)]
pub struct MockDaemonizer {
    outcome: std::result::Result<Detachment, String>,
    reported: std::sync::Mutex<Vec<DaemonStatus>>,
}

impl MockDaemonizer {
    /// Behaves as if the current process became the daemon.
    #[must_use]
    pub fn daemon(handle: DetachedHandle) -> Self {
        Self::with_outcome(Ok(Detachment::Daemon(handle)))
    }

    /// Behaves as if the current process were an ancestor of the daemon.
    #[must_use]
    pub fn ancestor() -> Self {
        Self::with_outcome(Ok(Detachment::Ancestor))
    }

    /// Fails the first fork with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_outcome(Err(reason.into()))
    }

    fn with_outcome(outcome: std::result::Result<Detachment, String>) -> Self {
        Self {
            outcome,
            reported: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Status records passed to `daemonize`.
    #[must_use]
    pub fn reported(&self) -> Vec<DaemonStatus> {
        self.reported.lock().unwrap().clone()
    }
}

impl Daemonize for MockDaemonizer {
    fn daemonize(&self, status: &DaemonStatus) -> Result<Detachment> {
        self.reported.lock().unwrap().push(status.clone());
        self.outcome
            .clone()
            .map_err(|reason| super::error::DaemonError::ForkFailed {
                stage: 1,
                source: io::Error::new(io::ErrorKind::Other, reason),
            })
    }
}
