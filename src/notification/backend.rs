//! Notifier backends and the process invocations they make.

use super::error::NotificationError;

/// Program used by the macOS backend.
pub const TERMINAL_NOTIFIER: &str = "terminal-notifier";

/// Program used by the Linux backend.
pub const NOTIFY_SEND: &str = "notify-send";

/// URL opener used by the Linux backend.
pub const XDG_OPEN: &str = "xdg-open";

/// The two notification strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `terminal-notifier`: title, body and sound, with URL opening built into
    /// the same invocation.
    TerminalNotifier,
    /// `notify-send`: title and optional body; a URL is opened by a separate
    /// `xdg-open` invocation.
    NotifySend,
}

impl Backend {
    /// Selects the backend for a platform identifier.
    ///
    /// Accepts both Rust target names (`macos`, `linux`) and kernel names
    /// (`Darwin`, `Linux`), case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::UnsupportedPlatform`] for any other value.
    pub fn for_platform(platform: &str) -> Result<Self, NotificationError> {
        match platform.to_ascii_lowercase().as_str() {
            "macos" | "darwin" => Ok(Self::TerminalNotifier),
            "linux" => Ok(Self::NotifySend),
            _ => Err(NotificationError::UnsupportedPlatform(platform.to_string())),
        }
    }

    /// Default notifier program for this backend.
    pub fn default_notifier(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => TERMINAL_NOTIFIER,
            Self::NotifySend => NOTIFY_SEND,
        }
    }

    /// Default URL opener, if the backend needs a separate one.
    pub fn default_opener(&self) -> Option<&'static str> {
        match self {
            Self::TerminalNotifier => None,
            Self::NotifySend => Some(XDG_OPEN),
        }
    }
}

/// One external program run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Builds the invocations for one notification, in execution order.
pub fn plan(
    backend: Backend,
    notifier: &str,
    opener: Option<&str>,
    subject: &str,
    message: &str,
    open_url: Option<&str>,
) -> Vec<Invocation> {
    match backend {
        Backend::TerminalNotifier => {
            let mut notify = Invocation::new(notifier).args([
                "-sound", "default", "-title", subject, "-message", message,
            ]);
            if let Some(url) = open_url {
                notify = notify.arg("-open").arg(url);
            }
            vec![notify]
        }
        Backend::NotifySend => {
            let mut notify = Invocation::new(notifier).arg(subject);
            if !message.is_empty() {
                notify = notify.arg(message);
            }
            let mut invocations = vec![notify];
            if let (Some(url), Some(opener)) = (open_url, opener) {
                invocations.push(Invocation::new(opener).arg(url));
            }
            invocations
        }
    }
}
