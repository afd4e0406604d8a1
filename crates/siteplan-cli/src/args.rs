//! Command-line argument definitions for the siteplan CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, search overrides, and logging verbosity.

use clap::Parser;

use siteplan::config::{EngineKind, PerformanceMode};

/// Command-line arguments for the siteplan layout optimizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input site definition (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output report (JSON)
    #[arg(short, long, default_value = "solutions.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Performance mode (fast, balanced, thorough)
    #[arg(long)]
    pub mode: Option<PerformanceMode>,

    /// Search engine (baseline, improved)
    #[arg(long)]
    pub engine: Option<EngineKind>,

    /// Number of solutions to keep
    #[arg(long)]
    pub max_solutions: Option<usize>,

    /// Seed for the sampling random number generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Explore seed anchors on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Stop searching after this many seconds and keep the best so far
    #[arg(long)]
    pub time_limit: Option<f64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
