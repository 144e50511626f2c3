//! Desktop notification dispatch.
//!
//! Notifications are sent by running a platform notifier program:
//!
//! - macOS: `terminal-notifier`, which also opens the URL when one is given
//! - Linux: `notify-send`, followed by `xdg-open` when a URL is given
//!
//! The backend is picked once, when the dispatcher is constructed. An
//! unknown platform fails construction instead of failing at send time.
//!
//! # Example
//!
//! ```no_run
//! use ywfm::notification::{NotificationDispatcher, NotificationSender};
//!
//! # async fn example() -> Result<(), ywfm::notification::NotificationError> {
//! let dispatcher = NotificationDispatcher::for_platform(std::env::consts::OS)?;
//! dispatcher
//!     .send("Break time", "10-minute break", Some("https://youtube.com/"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::process::Command;

pub use self::backend::{Backend, Invocation};
pub use self::error::NotificationError;

#[allow(async_fn_in_trait)]
pub trait NotificationSender {
    /// Sends one notification, opening `open_url` if present.
    async fn send(
        &self,
        subject: &str,
        message: &str,
        open_url: Option<&str>,
    ) -> Result<(), NotificationError>;
}

// ============================================================================
// NotificationDispatcher
// ============================================================================

/// Sends notifications through the platform notifier program.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    backend: Backend,
    notifier: String,
    opener: Option<String>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher for the given platform identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::UnsupportedPlatform`] if the platform
    /// has no notifier backend.
    pub fn for_platform(platform: &str) -> Result<Self, NotificationError> {
        let backend = Backend::for_platform(platform)?;
        tracing::debug!("Using {:?} notifier backend for '{}'", backend, platform);
        Ok(Self {
            backend,
            notifier: backend.default_notifier().to_string(),
            opener: backend.default_opener().map(String::from),
        })
    }

    /// Replaces the notifier and URL opener programs.
    ///
    /// The opener is ignored by backends that open URLs themselves.
    #[must_use]
    pub fn with_programs(mut self, notifier: impl Into<String>, opener: impl Into<String>) -> Self {
        self.notifier = notifier.into();
        if self.opener.is_some() {
            self.opener = Some(opener.into());
        }
        self
    }

    /// Returns the selected backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns the invocations a send would make, in order.
    pub fn plan(&self, subject: &str, message: &str, open_url: Option<&str>) -> Vec<Invocation> {
        backend::plan(
            self.backend,
            &self.notifier,
            self.opener.as_deref(),
            subject,
            message,
            open_url,
        )
    }
}

impl NotificationSender for NotificationDispatcher {
    async fn send(
        &self,
        subject: &str,
        message: &str,
        open_url: Option<&str>,
    ) -> Result<(), NotificationError> {
        for invocation in self.plan(subject, message, open_url) {
            run_invocation(&invocation).await?;
        }
        tracing::info!("Notification sent: {}", subject);
        Ok(())
    }
}

/// Runs one notifier program with inherited standard streams.
async fn run_invocation(invocation: &Invocation) -> Result<(), NotificationError> {
    tracing::debug!("Running {} {:?}", invocation.program, invocation.args);

    let status = Command::new(&invocation.program)
        .args(&invocation.args)
        .status()
        .await
        .map_err(|e| NotificationError::NotifierUnavailable {
            program: invocation.program.clone(),
            reason: match e.kind() {
                io::ErrorKind::NotFound => "command not found".to_string(),
                _ => e.to_string(),
            },
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(NotificationError::NotifierFailed {
            program: invocation.program.clone(),
            status: status.code(),
        })
    }
}

// ============================================================================
// MockNotificationSender
// ============================================================================

/// A recorded notification: subject, message and URL.
pub type SentNotification = (String, String, Option<String>);

#[derive(Debug, Default)]
pub struct MockNotificationSender {
    notifications: Mutex<Vec<SentNotification>>,
    should_fail: AtomicBool,
}

impl MockNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_notifications(&self) -> Vec<SentNotification> {
        self.notifications.lock().unwrap().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl NotificationSender for MockNotificationSender {
    async fn send(
        &self,
        subject: &str,
        message: &str,
        open_url: Option<&str>,
    ) -> Result<(), NotificationError> {
        // Failed attempts count as calls too.
        self.notifications.lock().unwrap().push((
            subject.to_string(),
            message.to_string(),
            open_url.map(String::from),
        ));
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::NotifierFailed {
                program: "mock".to_string(),
                status: Some(1),
            });
        }
        Ok(())
    }
}

impl<T: NotificationSender> NotificationSender for &T {
    async fn send(
        &self,
        subject: &str,
        message: &str,
        open_url: Option<&str>,
    ) -> Result<(), NotificationError> {
        (**self).send(subject, message, open_url).await
    }
}
