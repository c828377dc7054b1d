//! Logging infrastructure: a [`Log`] seam for the engine plus the
//! tracing-backed [`Logger`] used by the CLI, with per-app summary
//! collection.
use std::sync::Mutex;

/// Leveled logging interface consumed by the engine.
///
/// Implementations must not fail; logging is fire-and-forget. The engine
/// receives this as `Arc<dyn Log>` rather than reaching for process-wide
/// static state.
pub trait Log: Send + Sync {
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Record an app result for the run summary.
    fn record_app(&self, name: &str, status: AppStatus, message: Option<&str>);
}

/// Outcome of processing one app, for summary reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    /// The install script ran.
    Installed,
    /// The upgrade script ran.
    Upgraded,
    /// Already installed, nothing to do.
    UpToDate,
    /// Already installed and `prevent_upgrade` suppressed the upgrade.
    Suppressed,
    /// Processing failed.
    Failed,
}

/// One recorded summary entry.
#[derive(Debug, Clone)]
pub struct AppEntry {
    /// App id.
    pub name: String,
    /// Recorded status.
    pub status: AppStatus,
    /// Optional detail (e.g. the failure reason).
    pub message: Option<String>,
}

/// Install a console subscriber for `tracing` events.
///
/// `RUST_LOG` overrides the default level (`debug` when verbose, `info`
/// otherwise).
pub fn init_subscriber(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Tracing-backed logger with per-app summary collection.
#[derive(Debug, Default)]
pub struct Logger {
    entries: Mutex<Vec<AppEntry>>,
}

impl Logger {
    /// Create a new logger with an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a clone of all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<AppEntry> {
        self.entries
            .lock()
            .map_or_else(|_| Vec::new(), |guard| guard.clone())
    }

    /// Count the recorded failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries
            .lock()
            .map_or(0, |g| g.iter().filter(|e| e.status == AppStatus::Failed).count())
    }

    /// Print the summary of all recorded apps.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");
        let mut failed = 0usize;
        for entry in &entries {
            let (icon, label) = match entry.status {
                AppStatus::Installed => ("+", "installed"),
                AppStatus::Upgraded => ("^", "upgraded"),
                AppStatus::UpToDate => ("=", "up to date"),
                AppStatus::Suppressed => ("-", "upgrade suppressed"),
                AppStatus::Failed => {
                    failed += 1;
                    ("x", "failed")
                }
            };
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            self.info(&format!("{icon} {} {label}{suffix}", entry.name));
        }
        self.info(&format!("{} apps, {failed} failed", entries.len()));
    }
}

impl Log for Logger {
    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn stage(&self, msg: &str) {
        tracing::info!("==> {msg}");
    }

    fn record_app(&self, name: &str, status: AppStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(AppEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }
}
