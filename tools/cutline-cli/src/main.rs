//! Cutline CLI — Command-line interface for project inspection and export.
//!
//! Usage:
//!   cutline init <NAME>        Create a new empty project
//!   cutline info <PROJECT>     Show project information
//!   cutline validate <PROJECT> Validate a project file
//!   cutline export <PROJECT>   Export a project to video

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cutline",
    about = "Desktop video editor engine tools",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show project information
    Info {
        /// Path to the project file
        path: PathBuf,
    },

    /// Validate a project file
    Validate {
        /// Path to the project file
        path: PathBuf,
    },

    /// Export a project to video
    Export {
        /// Path to the project file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output resolution: 360p|480p|720p|1080p|source
        #[arg(long, default_value = "720p")]
        resolution: String,

        /// Quality preset: fast|medium|slow
        #[arg(long, default_value = "medium")]
        quality: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    cutline_common::logging::init_logging(&cutline_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Init { name, output } => commands::init::run(name, output),
        Commands::Info { path } => commands::info::run(path),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Export {
            path,
            output,
            resolution,
            quality,
        } => commands::export::run(path, output, resolution, quality).await,
    }
}
