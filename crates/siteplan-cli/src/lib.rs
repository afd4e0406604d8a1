//! CLI logic for the siteplan layout optimizer.
//!
//! This module contains the core CLI logic: loading configuration and input,
//! running the optimizer with progress logging, and writing the report.

pub mod error_adapter;

mod args;
mod config;
mod input;
mod output;

pub use args::Args;
pub use config::ConfigFileError;

use std::{
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use log::{debug, info, warn};
use thiserror::Error;

use siteplan::{
    PlacementOptimizer, SiteplanError,
    constraints::ConstraintHandler,
    search::{CancellationToken, ProgressEvent, ProgressObserver},
};

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Siteplan(#[from] SiteplanError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse site definition {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error("Failed to serialize report: {0}")]
    Output(serde_json::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}

/// Logs search progress; seed completions at `info`, the rest at `debug`.
#[derive(Debug, Default)]
struct LogProgress {
    seeds_done: AtomicUsize,
}

impl ProgressObserver for LogProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let previous = self.seeds_done.fetch_max(event.seeds_done, Ordering::Relaxed);
        let eta_ms = event.estimated_remaining.map(|eta| eta.as_millis() as u64);
        if event.seeds_done > previous {
            info!(
                seeds_done = event.seeds_done,
                seed_count = event.seed_count,
                processed = event.processed,
                feasible = event.feasible,
                best:? = event.best_fitness,
                eta_ms:?;
                "Seed finished"
            );
        } else {
            debug!(
                seed = event.seed_index,
                processed = event.processed,
                pruned = event.pruned,
                feasible = event.feasible,
                best:? = event.best_fitness;
                "Search progress"
            );
        }
    }
}

/// Run the siteplan CLI application
///
/// Loads the configuration and site definition, searches for layouts and
/// writes the JSON report to the output file. An empty solution set is not an
/// error: the report is still written.
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid site definitions
/// - Internal search errors
/// - Report serialization errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Planning site"
    );

    let app_config = config::apply_overrides(config::load_config(args.config.as_ref())?, args);
    let definition = input::read_definition(&args.input)?;

    let cancellation = CancellationToken::new();
    if let Some(seconds) = args.time_limit {
        let limit = Duration::try_from_secs_f64(seconds)
            .map_err(|_| CliError::Argument(format!("time limit `{seconds}` is not a valid duration")))?;
        let token = cancellation.clone();
        thread::spawn(move || {
            thread::sleep(limit);
            token.cancel();
        });
    }

    let optimizer = PlacementOptimizer::new(app_config)
        .with_observer(Arc::new(LogProgress::default()))
        .with_cancellation(cancellation);

    let problem = optimizer.classify(&definition)?;
    let summary = problem.summary();
    info!(
        flow = summary.flow_string(),
        mains = summary.main_count,
        subs = summary.sub_count,
        fixed = summary.fixed_count,
        area_ratio = summary.area_ratio;
        "Problem summary"
    );

    let outcome = optimizer.optimize(&problem)?;
    if outcome.stats.cancelled {
        warn!("Search stopped early; reporting the best layouts found so far");
    }

    let constraints = ConstraintHandler::new(
        *problem.site(),
        problem.fixed_zones(),
        problem.hazards(),
        optimizer.config().constraints(),
    );
    let report = output::Report::new(&problem, &outcome, &constraints);
    output::write_report(&args.output, &report)?;

    match outcome.best() {
        Some(best) => info!(
            code = best.code().as_str(),
            fitness = best.fitness().total,
            anchor = best.anchor().as_str(),
            output_file = args.output;
            "Best layout written"
        ),
        None => warn!(output_file = args.output; "No feasible layout found; report has no solutions"),
    }

    Ok(())
}
