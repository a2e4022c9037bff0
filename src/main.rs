use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use csv_mirror::app::AppContext;
use csv_mirror::cli::{commands, Cli, Commands};
use csv_mirror::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.root, cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    let ctx = AppContext::new(cli.root, config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let today = Local::now().date_naive();
            let report = commands::mirror(&ctx, today).await?;
            Ok(commands::exit_code(&report))
        }
        Commands::List => {
            commands::list_sources(&ctx)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
