use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use machina_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = Arc::new(logging::Logger::new());

    match args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        cli::Command::Status => commands::status::run(&args.global, &log),
        cli::Command::Version => {
            println!("machina {}", machina_cli::version());
            Ok(())
        }
    }
}
