use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the machine provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "machina",
    about = "Declarative workstation app provisioning",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to the app manifest (defaults to MACHINA_MANIFEST or ./machina.toml)
    #[arg(short, long, global = true)]
    pub manifest: Option<std::path::PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install or upgrade the apps declared in the manifest
    Install(InstallOpts),
    /// Report each app's installed state without changing anything
    Status,
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Skip specific apps
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Process only specific apps
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}
