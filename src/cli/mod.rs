pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "csv-mirror")]
#[command(about = "Mirror a catalog of remote CSV files into a dated local archive", long_about = None)]
pub struct Cli {
    /// Archive root holding the catalog, metadata and station directories
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (default: <root>/csv-mirror.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel fetch workers, overriding the config file
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Fetch every catalog URL that changed since the last run (default)
    Run,
    /// List catalog URLs with their stored conditional-fetch state
    List,
}
