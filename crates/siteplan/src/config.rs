//! Configuration types for the placement optimizer.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources; every field has a default, so partial documents are
//! accepted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration grouping the sections below.
//! - [`SearchConfig`] - Engine selection, performance mode and search limits.
//! - [`GeneratorConfig`] - Rotation set, gap discretization and seed margins.
//! - [`FitnessConfig`] - Fitness weights and scoring shape parameters.
//! - [`ConstraintConfig`] - Soft-constraint and reporting thresholds.
//!
//! # Example
//!
//! ```
//! # use siteplan::config::{AppConfig, EngineKind, PerformanceMode};
//! let config = AppConfig::default();
//! assert_eq!(config.search().engine(), EngineKind::Improved);
//! assert_eq!(config.search().mode(), PerformanceMode::Balanced);
//! assert_eq!(config.search().max_solutions(), 8);
//! assert!(config.validate().is_ok());
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use siteplan_core::placement::RotationSet;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    search: SearchConfig,

    #[serde(default)]
    generator: GeneratorConfig,

    #[serde(default)]
    fitness: FitnessConfig,

    #[serde(default)]
    constraints: ConstraintConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        search: SearchConfig,
        generator: GeneratorConfig,
        fitness: FitnessConfig,
        constraints: ConstraintConfig,
    ) -> Self {
        Self {
            search,
            generator,
            fitness,
            constraints,
        }
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }

    pub fn fitness(&self) -> &FitnessConfig {
        &self.fitness
    }

    pub fn constraints(&self) -> &ConstraintConfig {
        &self.constraints
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_fitness(mut self, fitness: FitnessConfig) -> Self {
        self.fitness = fitness;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintConfig) -> Self {
        self.constraints = constraints;
        self
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_solutions == 0 {
            return Err(invalid("search.max_solutions must be at least 1"));
        }
        if self.search.progress_interval == 0 {
            return Err(invalid("search.progress_interval must be at least 1"));
        }
        if self.search.max_seeds == Some(0) {
            return Err(invalid("search.max_seeds must be at least 1"));
        }
        if self.generator.gap_options.is_empty() {
            return Err(invalid("generator.gap_options must not be empty"));
        }
        if self
            .generator
            .gap_options
            .iter()
            .any(|gap| !gap.is_finite() || *gap < 0.0)
        {
            return Err(invalid("generator.gap_options must be finite and non-negative"));
        }
        if !(self.generator.seed_margin.is_finite() && self.generator.seed_margin >= 0.0) {
            return Err(invalid("generator.seed_margin must be non-negative"));
        }
        if self
            .generator
            .sub_grid_step
            .is_some_and(|step| !(step.is_finite() && step > 0.0))
        {
            return Err(invalid("generator.sub_grid_step must be positive"));
        }
        let (low, high) = self.fitness.utilization_band;
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low > high {
            return Err(invalid(
                "fitness.utilization_band must be an ordered pair within [0, 1]",
            ));
        }
        if self.fitness.utilization_falloff <= 0.0 || self.fitness.accessibility_falloff < 0.0 {
            return Err(invalid("fitness falloff values must be positive"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_string())
}

/// Search strategy variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Single center seed, exhaustive traversal, no sampling.
    Baseline,
    /// Multiple seed anchors, prefix pruning and adaptive sampling.
    #[default]
    Improved,
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "improved" => Ok(Self::Improved),
            _ => Err(ConfigError::Validation(format!(
                "unknown engine `{s}` (expected baseline or improved)"
            ))),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Improved => f.write_str("improved"),
        }
    }
}

/// Trade-off between search completeness and speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceMode {
    Fast,
    #[default]
    Balanced,
    Thorough,
}

impl PerformanceMode {
    /// Remaining branch count above which a seed switches to sampling.
    pub fn sampling_threshold(self) -> u64 {
        match self {
            Self::Fast => 1_000,
            Self::Balanced => 3_000,
            Self::Thorough => 10_000,
        }
    }

    /// Number of completions drawn per sampled seed.
    pub fn sample_size(self) -> u64 {
        match self {
            Self::Fast => 200,
            Self::Balanced => 800,
            Self::Thorough => 2_000,
        }
    }

    /// Number of seed anchors explored by the improved engine.
    pub fn seed_count(self) -> usize {
        match self {
            Self::Fast => 3,
            Self::Balanced => 5,
            Self::Thorough => 8,
        }
    }
}

impl FromStr for PerformanceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            _ => Err(ConfigError::Validation(format!(
                "unknown mode `{s}` (expected fast, balanced or thorough)"
            ))),
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Balanced => f.write_str("balanced"),
            Self::Thorough => f.write_str("thorough"),
        }
    }
}

/// Search engine settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    engine: EngineKind,
    mode: PerformanceMode,
    max_solutions: usize,
    prefix_pruning: bool,
    sampling: bool,
    rng_seed: u64,
    parallel: bool,
    progress_interval: u64,
    max_seeds: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            mode: PerformanceMode::default(),
            max_solutions: 8,
            prefix_pruning: true,
            sampling: true,
            rng_seed: 42,
            parallel: false,
            progress_interval: 100,
            max_seeds: None,
        }
    }
}

impl SearchConfig {
    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn mode(&self) -> PerformanceMode {
        self.mode
    }

    /// Capacity of the top-K solution set.
    pub fn max_solutions(&self) -> usize {
        self.max_solutions
    }

    pub fn prefix_pruning(&self) -> bool {
        self.prefix_pruning
    }

    /// Whether large seeds may switch to stratified sampling.
    pub fn sampling(&self) -> bool {
        self.sampling
    }

    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Number of candidates between progress events.
    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    /// Seed anchor count, falling back to the mode's default.
    pub fn seed_count(&self) -> usize {
        self.max_seeds.unwrap_or_else(|| self.mode.seed_count())
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_mode(mut self, mode: PerformanceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_solutions(mut self, max_solutions: usize) -> Self {
        self.max_solutions = max_solutions;
        self
    }

    pub fn with_prefix_pruning(mut self, enabled: bool) -> Self {
        self.prefix_pruning = enabled;
        self
    }

    pub fn with_sampling(mut self, enabled: bool) -> Self {
        self.sampling = enabled;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_max_seeds(mut self, max_seeds: usize) -> Self {
        self.max_seeds = Some(max_seeds);
        self
    }
}

/// Layout generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    rotations: RotationSet,
    gap_options: Vec<f32>,
    seed_margin: f32,
    sub_grid_step: Option<f32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rotations: RotationSet::default(),
            gap_options: vec![0.0],
            seed_margin: 0.0,
            sub_grid_step: None,
        }
    }
}

impl GeneratorConfig {
    pub fn rotations(&self) -> RotationSet {
        self.rotations
    }

    /// Discretized clearances tried between consecutive main units.
    pub fn gap_options(&self) -> &[f32] {
        &self.gap_options
    }

    /// Distance kept between corner seed anchors and the site edge.
    pub fn seed_margin(&self) -> f32 {
        self.seed_margin
    }

    pub fn sub_grid_step(&self) -> Option<f32> {
        self.sub_grid_step
    }

    pub fn with_rotations(mut self, rotations: RotationSet) -> Self {
        self.rotations = rotations;
        self
    }

    pub fn with_gap_options(mut self, gaps: Vec<f32>) -> Self {
        self.gap_options = gaps;
        self
    }

    pub fn with_seed_margin(mut self, margin: f32) -> Self {
        self.seed_margin = margin;
        self
    }

    pub fn with_sub_grid_step(mut self, step: f32) -> Self {
        self.sub_grid_step = Some(step);
        self
    }
}

/// Relative weight of each fitness term.
///
/// Weighted terms are added as `weight * term / 1000`; the hazard weight is
/// applied to the penalty, which is subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub adjacency: f32,
    pub sequence: f32,
    pub hazard: f32,
    pub utilization: f32,
    pub compactness: f32,
    pub accessibility: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            adjacency: 500.0,
            sequence: 300.0,
            hazard: 200.0,
            utilization: 150.0,
            compactness: 100.0,
            accessibility: 100.0,
        }
    }
}

/// Fitness calculator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    weights: FitnessWeights,
    base_score: f32,
    utilization_band: (f32, f32),
    utilization_falloff: f32,
    accessibility_falloff: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            weights: FitnessWeights::default(),
            base_score: 1000.0,
            utilization_band: (0.4, 0.7),
            utilization_falloff: 0.5,
            accessibility_falloff: 20.0,
        }
    }
}

impl FitnessConfig {
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    /// Utilization ratios that earn the full utilization score.
    pub fn utilization_band(&self) -> (f32, f32) {
        self.utilization_band
    }

    /// Distance outside the band at which the utilization score reaches zero.
    pub fn utilization_falloff(&self) -> f32 {
        self.utilization_falloff
    }

    /// Accessibility points lost per unit of distance to the nearest access zone.
    pub fn accessibility_falloff(&self) -> f32 {
        self.accessibility_falloff
    }

    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_utilization_band(mut self, low: f32, high: f32) -> Self {
        self.utilization_band = (low, high);
        self
    }

    pub fn with_utilization_falloff(mut self, falloff: f32) -> Self {
        self.utilization_falloff = falloff;
        self
    }
}

/// Constraint handler settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    boundary_clearance: f32,
    min_spacing: f32,
    access_distance: f32,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            boundary_clearance: 0.0,
            min_spacing: 0.0,
            access_distance: 5.0,
        }
    }
}

impl ConstraintConfig {
    /// Distance hazard-tagged units keep from the site edge. Zero disables the check.
    pub fn boundary_clearance(&self) -> f32 {
        self.boundary_clearance
    }

    /// Units closer than this are reported as a warning. Zero disables the check.
    pub fn min_spacing(&self) -> f32 {
        self.min_spacing
    }

    /// Main units further than this from every access zone are reported.
    pub fn access_distance(&self) -> f32 {
        self.access_distance
    }

    pub fn with_boundary_clearance(mut self, clearance: f32) -> Self {
        self.boundary_clearance = clearance;
        self
    }

    pub fn with_min_spacing(mut self, spacing: f32) -> Self {
        self.min_spacing = spacing;
        self
    }
}
