//! Application installation: verify, act, re-verify, clean up shortcuts.
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::apps::App;
use crate::desktop::DesktopEntries;
use crate::exec::ProcessRunner;
use crate::logging::Log;
use crate::script::{ScriptExecutor, Shell};

pub mod download;

pub use download::DownloadInstaller;

/// What [`AppInstaller::install_or_upgrade`] did for an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The app was not installed; the install script ran.
    Installed,
    /// The app was installed; the upgrade script ran.
    Upgraded,
    /// The app was installed and no upgrade applied.
    UpToDate,
    /// An upgrade script exists but `prevent_upgrade` suppressed it.
    UpgradeSuppressed,
}

/// Installs or upgrades apps through their scripts.
///
/// The flow for every app is: snapshot desktop entries, verify, run the
/// selected action script, re-verify (non-fatally), then delete any desktop
/// entries the action created.
pub struct AppInstaller {
    primary: ScriptExecutor,
    legacy: ScriptExecutor,
    desktop: Arc<dyn DesktopEntries>,
    log: Arc<dyn Log>,
}

impl std::fmt::Debug for AppInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppInstaller").finish_non_exhaustive()
    }
}

impl AppInstaller {
    /// Installer using the platform's primary and legacy interpreters.
    #[must_use]
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        desktop: Arc<dyn DesktopEntries>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self::with_shells(runner, desktop, log, Shell::primary(), Shell::legacy())
    }

    /// Installer with explicit interpreter shells.
    #[must_use]
    pub fn with_shells(
        runner: Arc<dyn ProcessRunner>,
        desktop: Arc<dyn DesktopEntries>,
        log: Arc<dyn Log>,
        primary: Shell,
        legacy: Shell,
    ) -> Self {
        Self {
            primary: ScriptExecutor::new(Arc::clone(&runner), Arc::clone(&log), primary),
            legacy: ScriptExecutor::new(runner, Arc::clone(&log), legacy),
            desktop,
            log,
        }
    }

    fn executor_for(&self, app: &App) -> &ScriptExecutor {
        if app.use_legacy_shell {
            &self.legacy
        } else {
            &self.primary
        }
    }

    /// Report whether `app` is currently installed.
    ///
    /// An absent verification script means the app cannot be verified and is
    /// treated as not installed.
    ///
    /// # Errors
    ///
    /// Returns an error when the verification script fails to run or its
    /// output is not a boolean.
    pub fn is_installed(&self, app: &App) -> Result<bool> {
        match &app.verify_script {
            None => Ok(false),
            Some(script) => {
                let script = app.resolve_script(script);
                let installed = self
                    .executor_for(app)
                    .run_typed::<bool>(&script)
                    .with_context(|| format!("verifying '{}'", app.id))?;
                Ok(installed)
            }
        }
    }

    /// Install `app`, or upgrade it when already installed.
    ///
    /// A failing action script is fatal. A failing post-action
    /// re-verification is not: the action's exit code already decided the
    /// outcome, so a re-verification problem is only logged.
    ///
    /// # Errors
    ///
    /// Returns an error when verification or the selected action script
    /// fails.
    pub fn install_or_upgrade(&self, app: &App) -> Result<InstallOutcome> {
        self.log.info(&format!("Installing '{}'", app.id));

        let before = self
            .desktop
            .load_system_entries()
            .context("snapshotting desktop entries")?;

        let installed = self.is_installed(app)?;
        let outcome = self.run_action(app, installed)?;
        if matches!(outcome, InstallOutcome::Installed | InstallOutcome::Upgraded) {
            self.recheck(app);
        }
        self.cleanup_shortcuts(app, &before)?;

        self.log.info(&format!("Installed '{}'", app.id));
        Ok(outcome)
    }

    fn run_action(&self, app: &App, installed: bool) -> Result<InstallOutcome> {
        if !installed {
            let script = app.resolve_script(&app.install_script);
            self.executor_for(app)
                .run(&script, app.run_as_admin)
                .with_context(|| format!("installing '{}'", app.id))?;
            return Ok(InstallOutcome::Installed);
        }

        match &app.upgrade_script {
            Some(script) if !app.prevent_upgrade => {
                let script = app.resolve_script(script);
                self.executor_for(app)
                    .run(&script, app.run_as_admin)
                    .with_context(|| format!("upgrading '{}'", app.id))?;
                Ok(InstallOutcome::Upgraded)
            }
            Some(_) => {
                self.log
                    .debug(&format!("Upgrade of '{}' is suppressed", app.id));
                Ok(InstallOutcome::UpgradeSuppressed)
            }
            None => Ok(InstallOutcome::UpToDate),
        }
    }

    fn recheck(&self, app: &App) {
        match self.is_installed(app) {
            Ok(true) => {}
            Ok(false) => self.log.debug(&format!(
                "'{}' does not verify as installed after its script ran",
                app.id
            )),
            Err(e) => self
                .log
                .debug(&format!("Could not re-verify '{}': {e:#}", app.id)),
        }
    }

    fn cleanup_shortcuts(&self, app: &App, before: &BTreeSet<PathBuf>) -> Result<()> {
        let after = self
            .desktop
            .load_system_entries()
            .context("snapshotting desktop entries")?;
        let created: Vec<PathBuf> = after.difference(before).cloned().collect();
        if created.is_empty() {
            return Ok(());
        }
        for path in &created {
            self.log
                .debug(&format!("Removing desktop entry {}", path.display()));
        }
        self.desktop
            .delete_paths(&created)
            .with_context(|| format!("removing desktop entries created by '{}'", app.id))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::apps::test_helpers::bare_app;
    use crate::desktop::test_helpers::MockDesktop;
    use crate::exec::test_helpers::{MockRunner, result_with_exit, result_with_output};
    use crate::logging::test_helpers::RecordingLog;

    fn installer(
        runner: MockRunner,
        desktop: MockDesktop,
    ) -> (AppInstaller, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::new());
        let installer = AppInstaller::with_shells(
            Arc::new(runner),
            Arc::new(desktop),
            Arc::clone(&log) as Arc<dyn Log>,
            Shell::custom("sh", &["-c"]),
            Shell::custom("sh", &["-c"]),
        );
        (installer, log)
    }

    fn verified_app(id: &str) -> App {
        let mut app = bare_app(id, "install");
        app.verify_script = Some("verify".to_string());
        app
    }

    #[test]
    fn app_without_verify_script_is_not_installed() {
        let (installer, _log) = installer(MockRunner::default(), MockDesktop::default());
        assert!(!installer.is_installed(&bare_app("tool", "install")).unwrap());
    }

    #[test]
    fn verify_false_runs_install_script() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["false"]), // verify
            result_with_output(&[]),        // install
            result_with_output(&["true"]),  // re-verify
        ]);
        let (installer, _log) = installer(runner, MockDesktop::default());
        let outcome = installer.install_or_upgrade(&verified_app("tool")).unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
    }

    #[test]
    fn verify_true_with_upgrade_script_runs_upgrade() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["true"]), // verify
            result_with_output(&[]),       // upgrade
            result_with_output(&["true"]), // re-verify
        ]);
        let (installer, _log) = installer(runner, MockDesktop::default());
        let mut app = verified_app("tool");
        app.upgrade_script = Some("upgrade".to_string());
        assert_eq!(
            installer.install_or_upgrade(&app).unwrap(),
            InstallOutcome::Upgraded
        );
    }

    #[test]
    fn verify_true_without_upgrade_script_is_up_to_date() {
        let runner = MockRunner::with_results(vec![result_with_output(&["true"])]);
        let (installer, _log) = installer(runner, MockDesktop::default());
        assert_eq!(
            installer.install_or_upgrade(&verified_app("tool")).unwrap(),
            InstallOutcome::UpToDate
        );
    }

    #[test]
    fn no_action_skips_reverification() {
        let runner = Arc::new(MockRunner::with_results(vec![result_with_output(&[
            "true",
        ])]));
        let log = Arc::new(RecordingLog::new());
        let installer = AppInstaller::with_shells(
            Arc::clone(&runner) as Arc<dyn ProcessRunner>,
            Arc::new(MockDesktop::default()),
            log as Arc<dyn Log>,
            Shell::custom("sh", &["-c"]),
            Shell::custom("sh", &["-c"]),
        );
        installer.install_or_upgrade(&verified_app("tool")).unwrap();
        assert_eq!(
            runner.calls().len(),
            1,
            "verification must run exactly once when no action script is selected"
        );
    }

    #[test]
    fn prevent_upgrade_suppresses_the_upgrade_script() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["true"]), // verify; upgrade must not run
        ]);
        let (installer, log) = installer(runner, MockDesktop::default());
        let mut app = verified_app("tool");
        app.upgrade_script = Some("upgrade".to_string());
        app.prevent_upgrade = true;
        assert_eq!(
            installer.install_or_upgrade(&app).unwrap(),
            InstallOutcome::UpgradeSuppressed
        );
        assert!(log.debugs().iter().any(|m| m.contains("suppressed")));
    }

    #[test]
    fn failing_install_script_is_fatal() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["false"]), // verify
            result_with_exit(7),            // install
        ]);
        let (installer, _log) = installer(runner, MockDesktop::default());
        let err = installer
            .install_or_upgrade(&verified_app("tool"))
            .unwrap_err();
        assert!(format!("{err:#}").contains('7'));
    }

    #[test]
    fn failing_reverification_is_not_fatal() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["false"]), // verify
            result_with_output(&[]),        // install
            result_with_exit(1),            // re-verify fails
        ]);
        let (installer, log) = installer(runner, MockDesktop::default());
        assert_eq!(
            installer.install_or_upgrade(&verified_app("tool")).unwrap(),
            InstallOutcome::Installed
        );
        assert!(log.debugs().iter().any(|m| m.contains("re-verify")));
    }

    #[test]
    fn reverification_returning_false_is_logged_not_fatal() {
        let runner = MockRunner::with_results(vec![
            result_with_output(&["false"]), // verify
            result_with_output(&[]),        // install
            result_with_output(&["false"]), // re-verify still false
        ]);
        let (installer, log) = installer(runner, MockDesktop::default());
        installer.install_or_upgrade(&verified_app("tool")).unwrap();
        assert!(
            log.debugs()
                .iter()
                .any(|m| m.contains("does not verify as installed"))
        );
    }

    #[test]
    fn desktop_cleanup_deletes_only_created_entries() {
        use std::collections::BTreeSet;
        use std::path::PathBuf;

        let existing = PathBuf::from("/desk/existing.lnk");
        let stray = PathBuf::from("/desk/stray.lnk");
        let before: BTreeSet<PathBuf> = [existing.clone()].into();
        let after: BTreeSet<PathBuf> = [existing, stray.clone()].into();
        let desktop = Arc::new(MockDesktop::with_snapshots(vec![before, after]));

        let runner = MockRunner::with_results(vec![
            result_with_output(&["false"]),
            result_with_output(&[]),
            result_with_output(&["true"]),
        ]);
        let log = Arc::new(RecordingLog::new());
        let installer = AppInstaller::with_shells(
            Arc::new(runner),
            Arc::clone(&desktop) as Arc<dyn DesktopEntries>,
            log as Arc<dyn Log>,
            Shell::custom("sh", &["-c"]),
            Shell::custom("sh", &["-c"]),
        );
        installer.install_or_upgrade(&verified_app("tool")).unwrap();
        assert_eq!(desktop.deleted(), vec![stray]);
    }

    #[test]
    fn install_script_substitutes_downloaded_file() {
        use crate::apps::Download;
        use std::path::PathBuf;

        let runner = MockRunner::with_results(vec![result_with_output(&[])]);
        let log = Arc::new(RecordingLog::new());
        let runner = Arc::new(runner);
        let installer = AppInstaller::with_shells(
            Arc::clone(&runner) as Arc<dyn ProcessRunner>,
            Arc::new(MockDesktop::default()),
            log as Arc<dyn Log>,
            Shell::custom("sh", &["-c"]),
            Shell::custom("sh", &["-c"]),
        );

        let mut app = bare_app("tool", "run {file}");
        app.download = Some(Download {
            downloader: "http".to_string(),
            args: String::new(),
            downloaded_file: Some(PathBuf::from("/tmp/setup.exe")),
        });
        installer.install_or_upgrade(&app).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].arguments[1], "run /tmp/setup.exe");
    }
}
