use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use siteplan_cli::cli::{Cli, Commands};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    let result = match &cli.command {
        Some(Commands::Heuristic { command }) => commands::heuristic::handle(command),
        Some(Commands::Milp { command }) => commands::milp::handle(command),
        Some(Commands::Catalog { out }) => commands::catalog::handle(out.as_deref()),
        None => {
            info!("No subcommand provided. Use `siteplan-cli --help` for more information.");
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("{err:?}");
        std::process::exit(1);
    }
}
