use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{GlobalOpts, InstallOpts};
use crate::desktop::SystemDesktopEntries;
use crate::download::DownloaderFactory;
use crate::exec::SystemProcessRunner;
use crate::install::{AppInstaller, DownloadInstaller, InstallOutcome};
use crate::logging::{AppStatus, Log, Logger};

/// Run the install command.
///
/// Apps are processed sequentially in manifest order. The first failing app
/// aborts the run; the summary still covers everything processed so far.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or an app fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("machina {}", crate::version()));

    log.stage("Loading manifest");
    let apps = super::load_apps(global)?;
    log.info(&format!("loaded {} apps", apps.len()));

    let apps = super::filter_apps(apps, &opts.only, &opts.skip);

    let installer = AppInstaller::new(
        Arc::new(SystemProcessRunner),
        Arc::new(SystemDesktopEntries::detect()),
        Arc::clone(log) as Arc<dyn Log>,
    );
    let installer = DownloadInstaller::new(
        DownloaderFactory::standard(),
        installer,
        Arc::clone(log) as Arc<dyn Log>,
    );

    log.stage("Installing apps");
    let result = run_apps(&installer, apps, log.as_ref());
    log.print_summary();
    result
}

fn run_apps(
    installer: &DownloadInstaller,
    apps: Vec<crate::apps::App>,
    log: &dyn Log,
) -> Result<()> {
    for mut app in apps {
        let id = app.id.clone();
        match installer.install_or_upgrade(&mut app) {
            Ok(outcome) => log.record_app(&id, status_for(outcome), None),
            Err(e) => {
                log.record_app(&id, AppStatus::Failed, Some(&format!("{e:#}")));
                return Err(e).with_context(|| format!("installing '{id}'"));
            }
        }
    }
    Ok(())
}

const fn status_for(outcome: InstallOutcome) -> AppStatus {
    match outcome {
        InstallOutcome::Installed => AppStatus::Installed,
        InstallOutcome::Upgraded => AppStatus::Upgraded,
        InstallOutcome::UpToDate => AppStatus::UpToDate,
        InstallOutcome::UpgradeSuppressed => AppStatus::Suppressed,
    }
}
