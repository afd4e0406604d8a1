//! Search over main-chain placements.
//!
//! The engine enumerates, for every seed anchor, the tree of rotation,
//! direction and gap choices of the ordered main units. Prefixes that already
//! violate a hard constraint are discarded with their whole subtree. Seeds
//! whose remaining tree is larger than the mode's threshold are sampled
//! instead of enumerated. The best layouts are kept in a bounded [`TopK`].
//!
//! # Strategies
//!
//! - [`Baseline`] - A single `Center` seed and exhaustive depth-first order.
//! - [`Improved`] - Several ranked seed anchors with adaptive sampling.
//!
//! # Example
//!
//! ```
//! use siteplan::classifier::classify;
//! use siteplan::config::AppConfig;
//! use siteplan::definition::{SiteDefinition, SpaceDefinition};
//! use siteplan::search::EngineBuilder;
//!
//! let definition = SiteDefinition::new(20.0, 10.0)
//!     .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
//!     .with_space("B", SpaceDefinition::main(4.0, 3.0, 2));
//! let problem = classify(&definition).unwrap();
//!
//! let engine = EngineBuilder::new().with_config(AppConfig::default()).build();
//! let outcome = engine.search(&problem).unwrap();
//! assert!(!outcome.is_empty());
//! assert_eq!(outcome.best().unwrap().rank(), 1);
//! ```

mod progress;
mod sampling;
mod top_k;
mod worklist;

pub use progress::{CancellationToken, ProgressEvent, ProgressObserver};
pub use top_k::{Discovery, TopK};

use std::{collections::HashSet, fmt, sync::Arc, time::Duration};

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use siteplan_core::{
    adjacency::AdjacencyTable, hazard::HazardMap, placement::PlacementState, site::FixedZone,
};

use crate::{
    classifier::{ClassifiedSpaces, Problem},
    config::{AppConfig, EngineKind, PerformanceMode, SearchConfig},
    constraints::ConstraintHandler,
    error::SiteplanError,
    fitness::{FitnessBreakdown, FitnessCalculator},
    generator::{LayoutCode, LayoutGenerator, Seed, SeedAnchor, rank_anchors},
};

use progress::ProgressTracker;
use worklist::{SearchContext, SeedExplorer, SeedResult};

/// Chooses the seed anchors a search starts from and how far it may deviate
/// from exhaustive enumeration.
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Seed anchors in exploration order, at most `limit`.
    fn seeds(&self, generator: &LayoutGenerator<'_>, zones: &[FixedZone], limit: usize) -> Vec<Seed>;

    /// Whether large seeds may be sampled instead of enumerated.
    fn allows_sampling(&self) -> bool;
}

/// Single centered seed, exhaustive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Baseline;

impl SearchStrategy for Baseline {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn seeds(&self, _generator: &LayoutGenerator<'_>, _zones: &[FixedZone], _limit: usize) -> Vec<Seed> {
        vec![Seed::new(SeedAnchor::Center, 0.0)]
    }

    fn allows_sampling(&self) -> bool {
        false
    }
}

/// Ranked seed anchors with adaptive sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Improved;

impl SearchStrategy for Improved {
    fn name(&self) -> &'static str {
        "improved"
    }

    fn seeds(&self, generator: &LayoutGenerator<'_>, zones: &[FixedZone], limit: usize) -> Vec<Seed> {
        let Some(head) = generator.spaces().mains().first() else {
            return Vec::new();
        };
        rank_anchors(
            generator.spaces().site(),
            head.size(),
            generator.rotations(),
            generator.config().seed_margin(),
            zones,
            limit,
        )
    }

    fn allows_sampling(&self) -> bool {
        true
    }
}

fn strategy_for(kind: EngineKind) -> Box<dyn SearchStrategy> {
    match kind {
        EngineKind::Baseline => Box::new(Baseline),
        EngineKind::Improved => Box::new(Improved),
    }
}

/// A ranked layout.
#[derive(Debug, Clone)]
pub struct Solution {
    rank: usize,
    code: LayoutCode,
    anchor: SeedAnchor,
    fitness: FitnessBreakdown,
    state: PlacementState,
}

impl Solution {
    pub(crate) fn new(
        code: LayoutCode,
        anchor: SeedAnchor,
        fitness: FitnessBreakdown,
        state: PlacementState,
    ) -> Self {
        Self {
            rank: 0,
            code,
            anchor,
            fitness,
            state,
        }
    }

    /// 1-based position in the result, best first.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn code(&self) -> &LayoutCode {
        &self.code
    }

    /// Seed anchor the layout was found from.
    pub fn anchor(&self) -> SeedAnchor {
        self.anchor
    }

    pub fn fitness(&self) -> &FitnessBreakdown {
        &self.fitness
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }
}

/// Best fitness found from one seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeedFitness {
    pub seed_index: usize,
    pub anchor: SeedAnchor,
    pub best: Option<f32>,
}

/// Counters describing a finished or cancelled search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    /// Seeds explored to completion.
    pub seeds_explored: usize,
    pub sampled_seeds: usize,
    /// Complete candidates reached.
    pub candidates_generated: u64,
    pub prefixes_pruned: u64,
    /// Candidates skipped through pruned prefixes.
    pub leaves_pruned: u64,
    pub feasible: u64,
    pub evaluated: u64,
    /// Candidates over all seeds, before pruning and sampling.
    pub search_space: u64,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub fitness_history: Vec<SeedFitness>,
    /// Distinct layout codes among the retained solutions, per solution.
    pub diversity: f32,
}

/// Ranked solutions and statistics of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub solutions: Vec<Solution>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&Solution> {
        self.solutions.first()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

/// Runs searches with one configuration and strategy.
pub struct SearchEngine {
    strategy: Box<dyn SearchStrategy>,
    config: AppConfig,
    observers: Vec<Arc<dyn ProgressObserver>>,
    cancellation: CancellationToken,
}

impl SearchEngine {
    /// Engine for `config`, using the strategy its search section selects.
    pub fn new(config: AppConfig) -> Self {
        EngineBuilder::new().with_config(config).build()
    }

    pub fn strategy(&self) -> &dyn SearchStrategy {
        self.strategy.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token that cancels searches run by this engine.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Searches `problem` and returns the best layouts found.
    ///
    /// A search that finds no feasible layout returns an empty outcome. A
    /// cancelled search returns what it had found, with
    /// [`SearchStats::cancelled`] set.
    ///
    /// # Errors
    ///
    /// Returns [`SiteplanError::Config`] for an invalid configuration and
    /// [`SiteplanError::Internal`] when a generated layout breaks its own
    /// main chain.
    pub fn search(&self, problem: &Problem) -> Result<SearchOutcome, SiteplanError> {
        self.config.validate()?;
        let search = self.config.search();
        let site = *problem.site();

        let generator = LayoutGenerator::new(
            problem.spaces(),
            problem.adjacency(),
            problem.fixed_zones(),
            self.config.generator(),
        );
        let constraints = ConstraintHandler::new(
            site,
            problem.fixed_zones(),
            problem.hazards(),
            self.config.constraints(),
        );
        let calculator = FitnessCalculator::new(
            site,
            problem.adjacency(),
            problem.fixed_zones(),
            constraints,
            self.config.fitness(),
        );

        let seeds = self
            .strategy
            .seeds(&generator, problem.fixed_zones(), search.seed_count());
        let tracker = ProgressTracker::new(
            self.observers.clone(),
            search.progress_interval(),
            seeds.len(),
        );
        let ctx = SearchContext {
            generator,
            constraints,
            calculator,
            fixed: generator.fixed_placements(),
            rotations: generator.rotations(),
            gaps: self.config.generator().gap_options(),
            pruning: search.prefix_pruning(),
            sampling: search.sampling() && self.strategy.allows_sampling(),
            threshold: search.mode().sampling_threshold(),
            sample_size: search.mode().sample_size(),
            rng_seed: search.rng_seed(),
            capacity: search.max_solutions(),
            tracker: &tracker,
            cancellation: &self.cancellation,
        };

        info!(
            engine = self.strategy.name(),
            mode:% = search.mode(),
            seeds = seeds.len(),
            per_seed = ctx.space(),
            parallel = search.parallel();
            "Starting search"
        );

        let explore = |(seed_index, seed): (usize, &Seed)| {
            debug!(seed = seed_index, anchor = seed.anchor().as_str(), score = seed.score(); "Exploring seed");
            let result = SeedExplorer::new(&ctx, seed_index, seed.anchor()).explore();
            tracker.seed_finished(seed_index);
            result
        };
        let results: Vec<Result<SeedResult, SiteplanError>> = if search.parallel() {
            seeds.par_iter().enumerate().map(explore).collect()
        } else {
            seeds.iter().enumerate().map(explore).collect()
        };

        let mut top = TopK::new(search.max_solutions());
        let mut stats = SearchStats {
            search_space: ctx.space().saturating_mul(seeds.len() as u64),
            ..SearchStats::default()
        };
        for (seed_index, result) in results.into_iter().enumerate() {
            let result = result?;
            let seed = result.stats;
            if result.cancelled {
                stats.cancelled = true;
            } else {
                stats.seeds_explored += 1;
            }
            stats.sampled_seeds += usize::from(seed.sampled);
            stats.candidates_generated += seed.generated;
            stats.prefixes_pruned += seed.prefixes_pruned;
            stats.leaves_pruned = stats.leaves_pruned.saturating_add(seed.leaves_pruned);
            stats.feasible += seed.feasible;
            stats.evaluated += seed.evaluated;
            stats.fitness_history.push(SeedFitness {
                seed_index,
                anchor: result.anchor,
                best: seed.best,
            });
            top.merge(result.top);
        }

        let solutions: Vec<Solution> = top
            .into_sorted_vec()
            .into_iter()
            .enumerate()
            .map(|(idx, mut solution)| {
                solution.rank = idx + 1;
                solution
            })
            .collect();

        stats.diversity = diversity(&solutions);
        stats.elapsed = tracker.elapsed();

        info!(
            solutions = solutions.len(),
            generated = stats.candidates_generated,
            pruned = stats.prefixes_pruned,
            feasible = stats.feasible,
            cancelled = stats.cancelled,
            elapsed_ms = stats.elapsed.as_millis() as u64;
            "Search finished"
        );

        Ok(SearchOutcome { solutions, stats })
    }
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("strategy", &self.strategy.name())
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

fn diversity(solutions: &[Solution]) -> f32 {
    if solutions.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&LayoutCode> = solutions.iter().map(Solution::code).collect();
    distinct.len() as f32 / solutions.len() as f32
}

/// Builder for [`SearchEngine`].
///
/// The strategy defaults to the one named by the configuration's
/// `search.engine`.
#[derive(Default)]
pub struct EngineBuilder {
    config: AppConfig,
    strategy: Option<Box<dyn SearchStrategy>>,
    observers: Vec<Arc<dyn ProgressObserver>>,
    cancellation: CancellationToken,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the configured strategy.
    pub fn with_strategy(mut self, strategy: impl SearchStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn build(self) -> SearchEngine {
        let strategy = self
            .strategy
            .unwrap_or_else(|| strategy_for(self.config.search().engine()));
        SearchEngine {
            strategy,
            config: self.config,
            observers: self.observers,
            cancellation: self.cancellation,
        }
    }
}

/// Searches with the improved engine in `mode`, keeping `max_solutions`.
///
/// # Errors
///
/// See [`SearchEngine::search`].
pub fn run(
    spaces: &ClassifiedSpaces,
    adjacency: &AdjacencyTable,
    zones: &[FixedZone],
    hazards: &HazardMap,
    mode: PerformanceMode,
    max_solutions: usize,
) -> Result<Vec<Solution>, SiteplanError> {
    let config = AppConfig::default().with_search(
        SearchConfig::default()
            .with_mode(mode)
            .with_max_solutions(max_solutions),
    );
    let problem = Problem::new(
        spaces.clone(),
        adjacency.clone(),
        zones.to_vec(),
        hazards.clone(),
    );
    SearchEngine::new(config)
        .search(&problem)
        .map(|outcome| outcome.solutions)
}
