//! Siteplan - Placement optimization for factory site layouts.
//!
//! Classifies process units, enumerates placements of the ordered main
//! process chain, validates them against the site, fixed zones and hazard
//! rules, and ranks feasible layouts by a weighted fitness score.

pub mod classifier;
pub mod config;
pub mod constraints;
pub mod definition;
pub mod fitness;
pub mod generator;
pub mod search;

mod error;

pub use siteplan_core::{adjacency, geometry, hazard, identifier, placement, site};

pub use classifier::Problem;
pub use error::{ConfigError, SiteplanError};

use std::sync::Arc;

use log::{debug, info, trace, warn};

use config::AppConfig;
use definition::SiteDefinition;
use search::{CancellationToken, EngineBuilder, ProgressObserver, SearchOutcome};

/// Entry point for classifying a site and searching for layouts.
///
/// # Examples
///
/// ```
/// use siteplan::{PlacementOptimizer, config::AppConfig};
/// use siteplan::definition::{SiteDefinition, SpaceDefinition};
///
/// let definition = SiteDefinition::new(30.0, 20.0)
///     .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
///     .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
///     .with_adjacency("A", "B", 10, 0.0);
///
/// // With custom config
/// let optimizer = PlacementOptimizer::new(AppConfig::default());
/// let problem = optimizer.classify(&definition).expect("Invalid site");
/// let outcome = optimizer.optimize(&problem).expect("Search failed");
/// assert!(outcome.best().is_some());
///
/// // Or use default config
/// let optimizer = PlacementOptimizer::default();
/// ```
#[derive(Default)]
pub struct PlacementOptimizer {
    config: AppConfig,
    observers: Vec<Arc<dyn ProgressObserver>>,
    cancellation: CancellationToken,
}

impl PlacementOptimizer {
    /// Create an optimizer with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registers an observer for progress events of later searches.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Uses `token` to cancel later searches.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Validates the configuration and classifies a raw site definition.
    ///
    /// # Errors
    ///
    /// Returns [`SiteplanError::Config`] for an invalid configuration or site
    /// definition.
    pub fn classify(&self, definition: &SiteDefinition) -> Result<Problem, SiteplanError> {
        self.config.validate()?;
        info!(spaces = definition.space_count(); "Classifying site definition");

        let problem = classifier::classify(definition)?;
        trace!(problem:?; "Classified problem");
        Ok(problem)
    }

    /// Searches for the best layouts of a classified problem.
    ///
    /// An empty outcome is a valid result: no seed produced a feasible
    /// layout.
    ///
    /// # Errors
    ///
    /// Returns [`SiteplanError`] for an invalid configuration or a broken
    /// internal invariant.
    pub fn optimize(&self, problem: &Problem) -> Result<SearchOutcome, SiteplanError> {
        let engine = self
            .observers
            .iter()
            .fold(
                EngineBuilder::new().with_config(self.config.clone()),
                |builder, observer| builder.with_observer(Arc::clone(observer)),
            )
            .with_cancellation(self.cancellation.clone())
            .build();
        debug!(engine:? = engine; "Search engine built");

        let outcome = engine.search(problem)?;

        if outcome.is_empty() {
            warn!(
                generated = outcome.stats.candidates_generated,
                pruned = outcome.stats.prefixes_pruned;
                "No feasible layout found"
            );
        }
        for solution in &outcome.solutions {
            let unplaced = solution.state().unplaced();
            if !unplaced.is_empty() {
                let ids: Vec<String> = unplaced.iter().map(ToString::to_string).collect();
                warn!(rank = solution.rank(), unplaced = ids.join(", "); "Sub units could not be placed");
            }
        }

        Ok(outcome)
    }
}
