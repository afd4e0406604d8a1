//! Stratified sampling of chain completions.
//!
//! Every level of the tree keeps one cycler per choice kind (rotation,
//! direction, gap). A cycler walks a shuffled permutation of its categories and
//! reshuffles when it runs out, so after `k` draws each category of a kind with
//! at most `k` categories has been used at every level.

use std::collections::HashSet;

use rand::prelude::*;

/// One branching choice, as indices into the configured category lists.
///
/// The head unit only chooses a rotation; its direction and gap stay 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Step {
    pub rotation: usize,
    pub direction: usize,
    pub gap: usize,
}

impl Step {
    /// Decodes the `choice`-th child in rotation-major, direction, gap order.
    pub fn decode(depth: usize, choice: usize, gaps: usize) -> Self {
        if depth == 0 {
            return Self {
                rotation: choice,
                direction: 0,
                gap: 0,
            };
        }
        Self {
            rotation: choice / (4 * gaps),
            direction: (choice / gaps) % 4,
            gap: choice % gaps,
        }
    }
}

/// A drawn completion: a frontier prefix and the steps that finish it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Draw {
    pub prefix: usize,
    pub steps: Vec<Step>,
}

#[derive(Debug)]
struct Cycler {
    order: Vec<usize>,
    next: usize,
}

impl Cycler {
    fn new(count: usize, rng: &mut StdRng) -> Self {
        let mut order: Vec<usize> = (0..count).collect();
        order.shuffle(rng);
        Self { order, next: 0 }
    }

    fn next(&mut self, rng: &mut StdRng) -> usize {
        if self.next == self.order.len() {
            self.order.shuffle(rng);
            self.next = 0;
        }
        let value = self.order[self.next];
        self.next += 1;
        value
    }
}

#[derive(Debug)]
struct Level {
    rotation: Cycler,
    /// `None` for the head unit.
    link: Option<(Cycler, Cycler)>,
}

/// Draws distinct completions of a set of frontier prefixes.
#[derive(Debug)]
pub(crate) struct StratifiedSampler {
    rng: StdRng,
    prefix_order: Vec<usize>,
    cursor: usize,
    levels: Vec<Level>,
    seen: HashSet<Draw>,
}

impl StratifiedSampler {
    /// Sampler over `prefixes` frontier entries at `depth`, completing a chain
    /// of `chain_len` units.
    pub fn new(
        seed: u64,
        prefixes: usize,
        depth: usize,
        chain_len: usize,
        rotations: usize,
        gaps: usize,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut prefix_order: Vec<usize> = (0..prefixes).collect();
        prefix_order.shuffle(&mut rng);

        let levels = (depth..chain_len)
            .map(|level| {
                let rotation = Cycler::new(rotations, &mut rng);
                let link = (level > 0)
                    .then(|| (Cycler::new(4, &mut rng), Cycler::new(gaps, &mut rng)));
                Level { rotation, link }
            })
            .collect();

        Self {
            rng,
            prefix_order,
            cursor: 0,
            levels,
            seen: HashSet::new(),
        }
    }

    /// Next draw, whether or not it repeats an earlier one.
    pub fn draw(&mut self) -> Draw {
        let prefix = if self.prefix_order.is_empty() {
            0
        } else {
            self.prefix_order[self.cursor % self.prefix_order.len()]
        };
        self.cursor += 1;

        let rng = &mut self.rng;
        let steps = self
            .levels
            .iter_mut()
            .map(|level| {
                let rotation = level.rotation.next(rng);
                let (direction, gap) = match &mut level.link {
                    Some((direction, gap)) => (direction.next(rng), gap.next(rng)),
                    None => (0, 0),
                };
                Step {
                    rotation,
                    direction,
                    gap,
                }
            })
            .collect();

        Draw { prefix, steps }
    }

    /// Next draw, or `None` when it repeats an earlier one.
    pub fn draw_distinct(&mut self) -> Option<Draw> {
        let draw = self.draw();
        self.seen.insert(draw.clone()).then_some(draw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_order() {
        let gaps = 2;
        assert_eq!(Step::decode(0, 1, gaps), Step { rotation: 1, direction: 0, gap: 0 });
        assert_eq!(Step::decode(1, 0, gaps), Step { rotation: 0, direction: 0, gap: 0 });
        assert_eq!(Step::decode(1, 1, gaps), Step { rotation: 0, direction: 0, gap: 1 });
        assert_eq!(Step::decode(1, 2, gaps), Step { rotation: 0, direction: 1, gap: 0 });
        assert_eq!(Step::decode(1, 8, gaps), Step { rotation: 1, direction: 0, gap: 0 });
        assert_eq!(Step::decode(2, 15, gaps), Step { rotation: 1, direction: 3, gap: 1 });
    }

    #[test]
    fn test_every_category_covered() {
        let (rotations, gaps) = (4, 3);
        let mut sampler = StratifiedSampler::new(7, 5, 1, 6, rotations, gaps);
        let draws: Vec<Draw> = (0..4).map(|_| sampler.draw()).collect();

        for level in 0..5 {
            let mut seen_rotations: Vec<usize> = draws.iter().map(|d| d.steps[level].rotation).collect();
            let mut seen_directions: Vec<usize> = draws.iter().map(|d| d.steps[level].direction).collect();
            seen_rotations.sort_unstable();
            seen_directions.sort_unstable();
            assert_eq!(seen_rotations, vec![0, 1, 2, 3]);
            assert_eq!(seen_directions, vec![0, 1, 2, 3]);

            let mut seen_gaps: Vec<usize> = draws[..3].iter().map(|d| d.steps[level].gap).collect();
            seen_gaps.sort_unstable();
            assert_eq!(seen_gaps, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_prefixes_round_robin() {
        let mut sampler = StratifiedSampler::new(1, 3, 2, 3, 2, 1);
        let mut prefixes: Vec<usize> = (0..3).map(|_| sampler.draw().prefix).collect();
        prefixes.sort_unstable();
        assert_eq!(prefixes, vec![0, 1, 2]);
    }

    #[test]
    fn test_head_level_has_no_link() {
        let mut sampler = StratifiedSampler::new(3, 1, 0, 2, 2, 2);
        for _ in 0..10 {
            let draw = sampler.draw();
            assert_eq!(draw.steps.len(), 2);
            assert_eq!((draw.steps[0].direction, draw.steps[0].gap), (0, 0));
        }
    }

    #[test]
    fn test_distinct_draws_exhaust() {
        // One prefix and one remaining level: only the four directions vary.
        let mut sampler = StratifiedSampler::new(0, 1, 1, 2, 1, 1);
        for _ in 0..4 {
            assert!(sampler.draw_distinct().is_some());
        }
        assert!(sampler.draw_distinct().is_none());
    }

    #[test]
    fn test_reproducible() {
        let mut first = StratifiedSampler::new(42, 4, 1, 4, 2, 2);
        let mut second = StratifiedSampler::new(42, 4, 1, 4, 2, 2);
        for _ in 0..20 {
            assert_eq!(first.draw(), second.draw());
        }
    }
}
