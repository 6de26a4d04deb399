//! CLI definitions for mosaic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "mosaic",
    version,
    about = "Inspect, check and preview pixel-display layouts",
    infer_subcommands = true,
    after_help = "Examples:\n  mosaic kinds\n  mosaic check layout.json\n  mosaic frame layout.json --at \"2026-10-14 12:00:00\"\n  mosaic run --frames 10"
)]
pub struct Cli {
    /// Engine configuration file (defaults to ./mosaic.toml when present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level regardless of log.level.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered widget kinds.
    Kinds,
    /// Load a layout and report every warning and violation.
    Check {
        /// Layout document (defaults to layout.path from the config).
        layout: Option<PathBuf>,
    },
    /// Print one composed frame as JSON.
    Frame {
        /// Layout document (defaults to layout.path from the config).
        layout: Option<PathBuf>,
        /// Wall time to render at, as "YYYY-MM-DD HH:MM:SS" (defaults to now).
        #[arg(long)]
        at: Option<String>,
    },
    /// Stream frames as JSON lines on stdout.
    Run {
        /// Layout document (defaults to layout.path from the config).
        layout: Option<PathBuf>,
        /// Stop after this many frames.
        #[arg(long)]
        frames: Option<u64>,
    },
}
