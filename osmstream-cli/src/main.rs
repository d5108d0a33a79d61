//! osmstream CLI - Command-line interface
//!
//! This binary provides a command-line interface to the osmstream library.
//!
//! # Architecture
//!
//! The CLI is organized into:
//! - `Cli` / `Commands`: Argument parsing (clap)
//! - `CliRunner`: Common setup (logging, store wiring)
//! - `CliError`: Centralized error handling with user-friendly messages

mod error;
mod runner;

use clap::{Parser, Subcommand};
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "osmstream")]
#[command(version = osmstream::VERSION)]
#[command(about = "Streaming OpenStreetMap PBF ingestion", long_about = None)]
struct Cli {
    /// Directory for log files
    #[arg(long, global = true, default_value = osmstream::logging::DEFAULT_LOG_DIR)]
    log_dir: String,

    /// Suppress console logging (the log file still receives events)
    #[arg(long, global = true)]
    quiet: bool,

    /// Rotate the log file daily instead of truncating it per run
    #[arg(long, global = true)]
    rotate_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the nodes, ways and relations in a PBF file
    Count {
        /// Path to the .osm.pbf file
        #[arg(long)]
        file: String,
    },

    /// Download a PBF extract over HTTP
    Fetch {
        /// Source URL (e.g. a Geofabrik extract)
        #[arg(long)]
        url: String,

        /// Destination file path
        #[arg(long)]
        output: String,
    },

    /// Run the complete pass: coordinate file, tagged nodes and ways
    Ingest {
        /// Path to the .osm.pbf file
        #[arg(long)]
        file: String,

        /// Coordinate file path (default: the PBF path with a .coords extension)
        #[arg(long)]
        coords: Option<String>,

        /// Sparse-index stride for the coordinate store
        #[arg(long, default_value_t = 100)]
        block_size: u64,

        /// Elements per batch flushed to the entity stores
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Per-operation store timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,

        /// Progress report interval in seconds (0 disables)
        #[arg(long, default_value_t = 2)]
        report_interval: u64,
    },

    /// Write only the coordinate file from a PBF
    Coordinates {
        /// Path to the .osm.pbf file
        #[arg(long)]
        file: String,

        /// Coordinate file path (default: the PBF path with a .coords extension)
        #[arg(long)]
        coords: Option<String>,

        /// Sparse-index stride for the coordinate store
        #[arg(long, default_value_t = 100)]
        block_size: u64,

        /// Progress report interval in seconds (0 disables)
        #[arg(long, default_value_t = 2)]
        report_interval: u64,
    },

    /// Resolve one node id against an existing coordinate file
    Lookup {
        /// Coordinate file path
        #[arg(long)]
        coords: String,

        /// Node id to resolve
        #[arg(long)]
        id: i64,
    },

    /// Rebuild the sparse index of a coordinate file with a new stride
    Resize {
        /// Coordinate file path
        #[arg(long)]
        coords: String,

        /// New sparse-index stride
        #[arg(long)]
        block_size: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let runner = match CliRunner::new(&cli.log_dir, cli.quiet, cli.rotate_logs) {
        Ok(runner) => runner,
        Err(e) => e.exit(),
    };

    let result = match cli.command {
        Commands::Count { file } => runner.count(&file),
        Commands::Fetch { url, output } => runner.fetch(&url, &output),
        Commands::Ingest {
            file,
            coords,
            block_size,
            batch_size,
            timeout,
            report_interval,
        } => runner.ingest(&file, coords, block_size, batch_size, timeout, report_interval),
        Commands::Coordinates {
            file,
            coords,
            block_size,
            report_interval,
        } => runner.coordinates(&file, coords, block_size, report_interval),
        Commands::Lookup { coords, id } => runner.lookup(&coords, id),
        Commands::Resize { coords, block_size } => runner.resize(&coords, block_size),
    };

    if let Err(e) = result {
        e.exit();
    }
}
