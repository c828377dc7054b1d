use std::sync::Arc;

use anyhow::Result;

use crate::apps::App;
use crate::cli::GlobalOpts;
use crate::desktop::SystemDesktopEntries;
use crate::exec::SystemProcessRunner;
use crate::install::AppInstaller;
use crate::logging::{Log, Logger};

/// Run the status command: report each app's installed state without
/// changing anything.
///
/// Verification failures are reported per app instead of aborting the scan.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    log.stage("Loading manifest");
    let apps = super::load_apps(global)?;
    log.info(&format!("loaded {} apps", apps.len()));

    let installer = AppInstaller::new(
        Arc::new(SystemProcessRunner),
        Arc::new(SystemDesktopEntries::detect()),
        Arc::clone(log) as Arc<dyn Log>,
    );

    log.stage("App status");
    for app in &apps {
        report(&installer, app, log.as_ref());
    }
    Ok(())
}

fn report(installer: &AppInstaller, app: &App, log: &dyn Log) {
    let state = match installer.is_installed(app) {
        Ok(true) => "installed".to_string(),
        Ok(false) if app.verify_script.is_none() => "unverifiable".to_string(),
        Ok(false) => "not installed".to_string(),
        Err(e) => format!("verification failed: {e:#}"),
    };
    let configured = if app.configuration.is_some() {
        " [has configuration]"
    } else {
        ""
    };
    log.info(&format!("{}: {state}{configured}", app.id));
}
