//! Declarative workstation app provisioning engine.
//!
//! Reads a TOML manifest of desired applications and converges the machine
//! to it by running external installers: winget command lines, custom
//! interpreter scripts, and downloaded setup binaries.
//!
//! The crate is organised into layers:
//!
//! - **[`exec`]** launches external processes and captures their streams
//! - **[`script`]** runs interpreter scripts with typed output mapping
//! - **[`install`]** drives the verify, act, re-verify flow per app
//! - **[`config`]** parses the manifest into installer-ready apps
//! - **[`commands`]** wires everything for the `install` and `status`
//!   subcommands

/// Version embedded at build time, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("MACHINA_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

pub mod apps;
pub mod cli;
pub mod commands;
pub mod config;
pub mod desktop;
pub mod download;
pub mod error;
pub mod exec;
pub mod install;
pub mod logging;
pub mod script;

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_never_empty() {
        assert!(!super::version().is_empty());
    }
}
