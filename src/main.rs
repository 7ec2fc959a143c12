// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "cardscan")]
#[command(about = "Card scanner ML worker tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the crop boxes computed for a frame
    Roi {
        /// Frame width in pixels
        width: u32,

        /// Frame height in pixels
        height: u32,

        /// Sensor orientation in degrees (clockwise)
        #[arg(short, long, default_value = "90", allow_hyphen_values = true)]
        orientation: i32,

        /// Vertical center of the region of interest (0.0 to 1.0)
        #[arg(short, long, default_value = "0.5")]
        ratio: f32,
    },

    /// Read QR-encoded card text from image files through a live worker
    Scan {
        /// Image files or directories
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Worker config file (default: <config dir>/cardscan/worker.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log stage timings (use with RUST_LOG=debug)
        #[arg(short, long)]
        timing: bool,

        /// Seconds to wait for each result
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=cardscan_worker=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roi {
            width,
            height,
            orientation,
            ratio,
        } => cli::print_roi(width, height, orientation, ratio),
        Commands::Scan {
            input,
            config,
            timing,
            timeout,
        } => cli::scan_images(input, config, timing, timeout),
    }
}
