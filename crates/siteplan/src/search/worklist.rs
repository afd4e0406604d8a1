//! Per-seed exploration of the placement tree.
//!
//! A node at depth `d` holds the first `d` main units. The root branches on
//! the head's rotation; every deeper node branches on rotation, attachment
//! direction and gap for the next unit. Children are ordered rotation-major,
//! then direction, then gap, and depth-first expansion visits leaves in that
//! order.

use log::{debug, trace};

use siteplan_core::placement::{Direction, Placement, Rotation};

use super::{
    Solution,
    progress::{CancellationToken, ProgressTracker},
    sampling::{Step, StratifiedSampler},
    top_k::TopK,
};
use crate::{
    constraints::ConstraintHandler,
    error::SiteplanError,
    fitness::FitnessCalculator,
    generator::{LayoutCode, LayoutGenerator, SeedAnchor},
};

/// Everything a seed explorer reads. Shared across workers.
#[derive(Debug)]
pub(crate) struct SearchContext<'a> {
    pub generator: LayoutGenerator<'a>,
    pub constraints: ConstraintHandler<'a>,
    pub calculator: FitnessCalculator<'a>,
    pub fixed: Vec<Placement>,
    pub rotations: &'static [Rotation],
    pub gaps: &'a [f32],
    pub pruning: bool,
    pub sampling: bool,
    pub threshold: u64,
    pub sample_size: u64,
    pub rng_seed: u64,
    pub capacity: usize,
    pub tracker: &'a ProgressTracker,
    pub cancellation: &'a CancellationToken,
}

impl SearchContext<'_> {
    fn chain_len(&self) -> usize {
        self.generator.spaces().mains().len()
    }

    /// Children of a node at `depth`.
    fn branching(&self, depth: usize) -> u64 {
        let rotations = self.rotations.len() as u64;
        if depth == 0 {
            rotations
        } else {
            rotations * 4 * self.gaps.len() as u64
        }
    }

    /// Leaves below a node at `depth`.
    fn subtree(&self, depth: usize) -> u64 {
        (depth..self.chain_len()).fold(1u64, |leaves, level| {
            leaves.saturating_mul(self.branching(level))
        })
    }

    /// Leaves of one seed's full tree.
    pub fn space(&self) -> u64 {
        self.subtree(0)
    }
}

/// Counters of one seed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SeedStats {
    pub generated: u64,
    pub prefixes_pruned: u64,
    pub leaves_pruned: u64,
    pub feasible: u64,
    pub evaluated: u64,
    pub sampled: bool,
    pub best: Option<f32>,
}

/// Result of exploring one seed.
#[derive(Debug)]
pub(crate) struct SeedResult {
    pub anchor: SeedAnchor,
    pub top: TopK<Solution>,
    pub stats: SeedStats,
    pub cancelled: bool,
}

/// Walks the tree rooted at one seed anchor.
pub(crate) struct SeedExplorer<'c, 'a> {
    ctx: &'c SearchContext<'a>,
    seed_index: usize,
    anchor: SeedAnchor,
    top: TopK<Solution>,
    stats: SeedStats,
    discovered: u64,
    cancelled: bool,
}

impl<'c, 'a> SeedExplorer<'c, 'a> {
    pub fn new(ctx: &'c SearchContext<'a>, seed_index: usize, anchor: SeedAnchor) -> Self {
        Self {
            ctx,
            seed_index,
            anchor,
            top: TopK::new(ctx.capacity),
            stats: SeedStats::default(),
            discovered: 0,
            cancelled: false,
        }
    }

    /// Explores the seed exhaustively or by sampling.
    ///
    /// # Errors
    ///
    /// Returns [`SiteplanError::Internal`] when a feasible candidate has a
    /// broken main chain.
    pub fn explore(mut self) -> Result<SeedResult, SiteplanError> {
        if !self.ctx.sampling {
            self.exhaust(vec![Vec::new()])?;
            return Ok(self.finish());
        }

        let (frontier, depth) = self.expand_frontier();
        let remaining = (frontier.len() as u64).saturating_mul(self.ctx.subtree(depth));
        debug!(
            seed = self.seed_index,
            anchor = self.anchor.as_str(),
            depth,
            frontier = frontier.len(),
            remaining;
            "Seed frontier expanded"
        );

        if remaining <= self.ctx.threshold {
            self.exhaust(frontier)?;
        } else {
            self.sample(&frontier, depth)?;
        }
        Ok(self.finish())
    }

    fn finish(self) -> SeedResult {
        SeedResult {
            anchor: self.anchor,
            top: self.top,
            stats: self.stats,
            cancelled: self.cancelled,
        }
    }

    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled && self.ctx.cancellation.is_cancelled() {
            debug!(seed = self.seed_index; "Seed cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    /// Breadth-first expansion while the next level stays within the
    /// sampling threshold.
    fn expand_frontier(&mut self) -> (Vec<Vec<Placement>>, usize) {
        let mut frontier: Vec<Vec<Placement>> = vec![Vec::new()];
        let mut depth = 0;

        while depth < self.ctx.chain_len()
            && !frontier.is_empty()
            && (frontier.len() as u64).saturating_mul(self.ctx.branching(depth)) <= self.ctx.threshold
        {
            if self.is_cancelled() {
                break;
            }
            let mut next = Vec::new();
            for prefix in &frontier {
                for choice in 0..self.ctx.branching(depth) as usize {
                    if let Some(child) = self.extend(prefix, choice) {
                        next.push(child);
                    }
                }
            }
            frontier = next;
            depth += 1;
        }

        (frontier, depth)
    }

    /// Depth-first expansion of every prefix in `frontier`, in order.
    fn exhaust(&mut self, frontier: Vec<Vec<Placement>>) -> Result<(), SiteplanError> {
        let chain_len = self.ctx.chain_len();
        let mut stack: Vec<Vec<Placement>> = frontier;
        stack.reverse();

        while let Some(prefix) = stack.pop() {
            if self.is_cancelled() {
                return Ok(());
            }
            if prefix.len() == chain_len {
                self.leaf(&prefix)?;
                continue;
            }
            let children = self.ctx.branching(prefix.len()) as usize;
            for choice in (0..children).rev() {
                if let Some(child) = self.extend(&prefix, choice) {
                    stack.push(child);
                }
            }
        }
        Ok(())
    }

    /// Draws up to `sample_size` distinct completions of the frontier.
    fn sample(&mut self, frontier: &[Vec<Placement>], depth: usize) -> Result<(), SiteplanError> {
        self.stats.sampled = true;
        if frontier.is_empty() {
            return Ok(());
        }

        let ctx = self.ctx;
        let mut sampler = StratifiedSampler::new(
            ctx.rng_seed.wrapping_add(self.seed_index as u64),
            frontier.len(),
            depth,
            ctx.chain_len(),
            ctx.rotations.len(),
            ctx.gaps.len(),
        );
        let max_draws = ctx.sample_size.saturating_mul(4);
        let mut drawn = 0;

        for _ in 0..max_draws {
            if drawn >= ctx.sample_size || self.is_cancelled() {
                break;
            }
            let Some(draw) = sampler.draw_distinct() else {
                continue;
            };
            drawn += 1;

            let mut chain = frontier[draw.prefix].clone();
            let mut complete = true;
            for step in draw.steps {
                match self.place(&chain, step) {
                    Some(placement) => chain.push(placement),
                    None => {
                        // A sampled draw stands for a single leaf.
                        self.prune(1);
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                self.leaf(&chain)?;
            }
        }

        debug!(seed = self.seed_index, drawn; "Seed sampled");
        Ok(())
    }

    /// The `choice`-th child of `prefix`, or `None` when it is pruned.
    fn extend(&mut self, prefix: &[Placement], choice: usize) -> Option<Vec<Placement>> {
        let depth = prefix.len();
        let step = Step::decode(depth, choice, self.ctx.gaps.len());
        match self.place(prefix, step) {
            Some(placement) => {
                let mut child = Vec::with_capacity(depth + 1);
                child.extend_from_slice(prefix);
                child.push(placement);
                Some(child)
            }
            None => {
                self.prune(self.ctx.subtree(depth + 1));
                None
            }
        }
    }

    /// Places the next unit after `prefix`. `None` when it cannot be placed
    /// or, with pruning enabled, when it violates a hard constraint.
    fn place(&self, prefix: &[Placement], step: Step) -> Option<Placement> {
        let ctx = self.ctx;
        let rotation = ctx.rotations[step.rotation];

        let placement = match prefix.last() {
            None => match ctx.generator.place_first(self.anchor, rotation) {
                Ok(placement) => placement,
                Err(err) => {
                    trace!(seed = self.seed_index, err:%; "Head does not fit");
                    return None;
                }
            },
            Some(previous) => {
                let unit = &ctx.generator.spaces().mains()[prefix.len()];
                ctx.generator.attach(
                    previous,
                    unit,
                    rotation,
                    Direction::ALL[step.direction],
                    ctx.gaps[step.gap],
                )
            }
        };

        if ctx.pruning {
            let check = ctx
                .constraints
                .check_placement(&placement, &ctx.fixed)
                .and_then(|()| ctx.constraints.check_placement(&placement, prefix));
            if let Err(violation) = check {
                trace!(seed = self.seed_index, depth = prefix.len(), violation:%; "Prefix pruned");
                return None;
            }
        }
        Some(placement)
    }

    fn prune(&mut self, leaves: u64) {
        self.stats.prefixes_pruned += 1;
        self.stats.leaves_pruned = self.stats.leaves_pruned.saturating_add(leaves);
        self.ctx.tracker.pruned(1);
    }

    /// Completes, validates and scores one full main chain.
    fn leaf(&mut self, chain: &[Placement]) -> Result<(), SiteplanError> {
        let ctx = self.ctx;
        self.stats.generated += 1;
        let discovery = (self.seed_index, self.discovered);
        self.discovered += 1;

        let state = ctx.generator.complete(chain);
        if let Err(violation) = ctx.constraints.validate(&state) {
            trace!(seed = self.seed_index, violation:%; "Candidate rejected");
            ctx.tracker.candidate(self.seed_index, None);
            return Ok(());
        }
        self.stats.feasible += 1;
        ctx.constraints.verify_chain(&state)?;

        let shortfalls = ctx.constraints.hazard_shortfalls(&state);
        let fitness = ctx.calculator.evaluate_validated(&state, &shortfalls);
        self.stats.evaluated += 1;
        self.stats.best = Some(
            self.stats
                .best
                .map_or(fitness.total, |best| best.max(fitness.total)),
        );

        let code = LayoutCode::from_state(&state);
        trace!(seed = self.seed_index, code = code.as_str(), fitness = fitness.total; "Candidate scored");
        let solution = Solution::new(code.clone(), self.anchor, fitness, state);
        self.top.offer(code, fitness.total, discovery, solution);
        ctx.tracker.candidate(self.seed_index, Some(fitness.total));
        Ok(())
    }
}
