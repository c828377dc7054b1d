//! Decorator that fetches an app's installer asset before delegating to the
//! plain installer.
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::apps::App;
use crate::download::DownloaderFactory;
use crate::logging::Log;

use super::{AppInstaller, InstallOutcome};

/// Wraps [`AppInstaller`] with a download step for apps carrying the
/// download capability.
///
/// Apps without it pass straight through. There is no retry: a failed
/// download fails the app.
pub struct DownloadInstaller {
    factory: DownloaderFactory,
    installer: AppInstaller,
    log: Arc<dyn Log>,
}

impl std::fmt::Debug for DownloadInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadInstaller")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl DownloadInstaller {
    /// Decorate `installer` with downloads resolved through `factory`.
    #[must_use]
    pub fn new(factory: DownloaderFactory, installer: AppInstaller, log: Arc<dyn Log>) -> Self {
        Self {
            factory,
            installer,
            log,
        }
    }

    /// Download the app's asset when one is declared, then install or
    /// upgrade.
    ///
    /// The downloaded path is recorded on the app so its action scripts can
    /// reference it through the file placeholder.
    ///
    /// # Errors
    ///
    /// Returns an error when the downloader is unknown, the download fails,
    /// or the delegated installation fails.
    pub fn install_or_upgrade(&self, app: &mut App) -> Result<InstallOutcome> {
        if let Some(download) = &mut app.download {
            self.log.info(&format!("Downloading '{}'", app.id));
            let downloader = self
                .factory
                .get(&download.downloader)
                .with_context(|| format!("resolving downloader for '{}'", app.id))?;
            let path = downloader
                .download(&download.args)
                .with_context(|| format!("downloading '{}'", app.id))?;
            self.log
                .debug(&format!("Downloaded '{}' to {}", app.id, path.display()));
            download.downloaded_file = Some(path);
        }
        self.installer.install_or_upgrade(app)
    }
}
