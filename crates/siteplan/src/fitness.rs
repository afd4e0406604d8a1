//! Multi-criteria fitness of a placement.
//!
//! The score is `base + Σ weightᵢ · termᵢ / 1000 − weight_hazard · penalty / 1000`
//! over six raw terms:
//!
//! | term          | raw value                                                        |
//! |---------------|------------------------------------------------------------------|
//! | adjacency     | SLP score of every rated pair, see [`AdjacencyWeight::score`]    |
//! | sequence      | proximity of successive main units plus travel consistency       |
//! | utilization   | 200 inside the utilization band, falling off linearly outside    |
//! | compactness   | occupied area over bounding-box area, times 150                  |
//! | accessibility | per main unit, `max(0, 100 − falloff · d)` to the nearest access |
//! | hazard        | penalty: twice the total safety-distance shortfall               |
//!
//! [`AdjacencyWeight::score`]: siteplan_core::adjacency::AdjacencyWeight::score

use serde::Serialize;

use siteplan_core::{
    adjacency::AdjacencyTable,
    geometry::{Bounds, Point},
    placement::PlacementState,
    site::{FixedZone, Site},
};

use crate::{
    config::FitnessConfig,
    constraints::{ConstraintHandler, HazardShortfall, access_zones, nearest_distance},
};

/// Total reported for placements that fail hard validation.
pub const INFEASIBLE_SCORE: f32 = f32::MIN;

const UTILIZATION_PEAK: f32 = 200.0;
const COMPACTNESS_SCALE: f32 = 150.0;
const ACCESS_PEAK: f32 = 100.0;
const PROXIMITY_PEAK: f32 = 200.0;
const PROXIMITY_DECAY: f32 = 5.0;
const CONSISTENCY_SCALE: f32 = 50.0;
const HAZARD_FACTOR: f32 = 2.0;

/// Raw fitness terms and the weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitnessBreakdown {
    pub adjacency: f32,
    pub sequence: f32,
    pub utilization: f32,
    /// Occupied area over site area.
    pub utilization_ratio: f32,
    pub compactness: f32,
    pub accessibility: f32,
    pub hazard_penalty: f32,
    pub total: f32,
}

impl FitnessBreakdown {
    /// Breakdown of a placement that fails hard validation.
    pub fn infeasible() -> Self {
        Self {
            adjacency: 0.0,
            sequence: 0.0,
            utilization: 0.0,
            utilization_ratio: 0.0,
            compactness: 0.0,
            accessibility: 0.0,
            hazard_penalty: 0.0,
            total: INFEASIBLE_SCORE,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.total != INFEASIBLE_SCORE
    }

    /// Improvement hints for the terms that score poorly.
    pub fn suggestions(&self) -> Vec<&'static str> {
        if !self.is_feasible() {
            return vec!["resolve overlaps, boundary and fixed-zone violations first"];
        }
        let hints = [
            (
                self.hazard_penalty > 0.0,
                "increase the distance between hazard-tagged units",
            ),
            (
                self.adjacency < 100.0,
                "place strongly related units closer together",
            ),
            (
                self.sequence < 150.0,
                "keep the main process chain flowing in one direction",
            ),
            (
                self.utilization < 120.0,
                "adjust site utilization towards the 40-70% band",
            ),
            (self.compactness < 80.0, "group units more tightly"),
            (
                self.accessibility < 60.0,
                "move main units closer to roads and access zones",
            ),
        ];
        hints
            .into_iter()
            .filter_map(|(weak, hint)| weak.then_some(hint))
            .collect()
    }
}

/// Scores placements of one problem.
#[derive(Debug, Clone, Copy)]
pub struct FitnessCalculator<'a> {
    site: Site,
    adjacency: &'a AdjacencyTable,
    zones: &'a [FixedZone],
    constraints: ConstraintHandler<'a>,
    config: &'a FitnessConfig,
}

impl<'a> FitnessCalculator<'a> {
    pub fn new(
        site: Site,
        adjacency: &'a AdjacencyTable,
        zones: &'a [FixedZone],
        constraints: ConstraintHandler<'a>,
        config: &'a FitnessConfig,
    ) -> Self {
        Self {
            site,
            adjacency,
            zones,
            constraints,
            config,
        }
    }

    /// Scores a placement, running the soft checks itself.
    pub fn score(&self, state: &PlacementState) -> FitnessBreakdown {
        if self.constraints.validate(state).is_err() {
            return FitnessBreakdown::infeasible();
        }
        let shortfalls = self.constraints.hazard_shortfalls(state);
        self.weigh(state, &shortfalls)
    }

    /// Scores a placement with precomputed hazard shortfalls.
    ///
    /// Returns [`FitnessBreakdown::infeasible`] when `state` fails hard
    /// validation.
    pub fn evaluate(&self, state: &PlacementState, shortfalls: &[HazardShortfall]) -> FitnessBreakdown {
        if self.constraints.validate(state).is_err() {
            return FitnessBreakdown::infeasible();
        }
        self.weigh(state, shortfalls)
    }

    /// Scores a placement the caller has already passed through
    /// [`ConstraintHandler::validate`].
    pub(crate) fn evaluate_validated(
        &self,
        state: &PlacementState,
        shortfalls: &[HazardShortfall],
    ) -> FitnessBreakdown {
        self.weigh(state, shortfalls)
    }

    fn weigh(&self, state: &PlacementState, shortfalls: &[HazardShortfall]) -> FitnessBreakdown {
        let (utilization, utilization_ratio) = self.utilization(state);
        let mut breakdown = FitnessBreakdown {
            adjacency: self.adjacency_term(state),
            sequence: sequence_term(state),
            utilization,
            utilization_ratio,
            compactness: compactness_term(state),
            accessibility: self.accessibility_term(state),
            hazard_penalty: hazard_penalty(shortfalls),
            total: 0.0,
        };

        let weights = self.config.weights();
        let weighted = weights.adjacency * breakdown.adjacency
            + weights.sequence * breakdown.sequence
            + weights.utilization * breakdown.utilization
            + weights.compactness * breakdown.compactness
            + weights.accessibility * breakdown.accessibility
            - weights.hazard * breakdown.hazard_penalty;
        breakdown.total = self.config.base_score() + weighted / 1000.0;
        breakdown
    }

    /// SLP score summed over rated pairs that are both placed.
    pub fn adjacency_term(&self, state: &PlacementState) -> f32 {
        self.adjacency
            .iter()
            .filter_map(|(first, second, weight)| {
                let a = state.get(first)?;
                let b = state.get(second)?;
                Some(weight.score(a.bounds().edge_distance(&b.bounds())))
            })
            .sum()
    }

    /// Utilization score and raw ratio.
    pub fn utilization(&self, state: &PlacementState) -> (f32, f32) {
        let ratio = state.occupied_area() / self.site.area();
        (
            utilization_score(
                ratio,
                self.config.utilization_band(),
                self.config.utilization_falloff(),
            ),
            ratio,
        )
    }

    pub fn accessibility_term(&self, state: &PlacementState) -> f32 {
        let targets: Vec<Bounds> = access_zones(self.zones).map(FixedZone::bounds).collect();
        if targets.is_empty() {
            return 0.0;
        }
        let falloff = self.config.accessibility_falloff();
        state
            .chain()
            .map(|placement| {
                let distance = nearest_distance(placement.bounds(), &targets);
                (ACCESS_PEAK - falloff * distance).max(0.0)
            })
            .sum()
    }
}

/// Proximity of successive main units plus consistency of travel direction.
pub fn sequence_term(state: &PlacementState) -> f32 {
    let centers: Vec<Point> = state.chain().map(|p| p.bounds().center()).collect();

    let proximity: f32 = centers
        .windows(2)
        .map(|pair| (PROXIMITY_PEAK - pair[0].distance(pair[1]) / PROXIMITY_DECAY).max(0.0))
        .sum();

    let consistency: f32 = centers
        .windows(3)
        .map(|triple| {
            let incoming = triple[1].sub_point(triple[0]);
            let outgoing = triple[2].sub_point(triple[1]);
            let lengths = incoming.hypot() * outgoing.hypot();
            if lengths <= f32::EPSILON {
                return 0.0;
            }
            let cosine = (incoming.x() * outgoing.x() + incoming.y() * outgoing.y()) / lengths;
            (cosine.clamp(-1.0, 1.0) + 1.0) / 2.0 * CONSISTENCY_SCALE
        })
        .sum();

    proximity + consistency
}

/// Piecewise-linear utilization score: flat peak inside `band`, linear
/// falloff to zero `falloff` away from it on either side.
pub fn utilization_score(ratio: f32, band: (f32, f32), falloff: f32) -> f32 {
    let (low, high) = band;
    let distance = if ratio < low {
        low - ratio
    } else if ratio > high {
        ratio - high
    } else {
        0.0
    };
    if falloff <= 0.0 {
        return if distance > 0.0 { 0.0 } else { UTILIZATION_PEAK };
    }
    UTILIZATION_PEAK * (1.0 - distance / falloff).max(0.0)
}

pub fn compactness_term(state: &PlacementState) -> f32 {
    match state.bounding_box() {
        Some(bbox) if bbox.area() > 0.0 => state.occupied_area() / bbox.area() * COMPACTNESS_SCALE,
        _ => 0.0,
    }
}

pub fn hazard_penalty(shortfalls: &[HazardShortfall]) -> f32 {
    shortfalls
        .iter()
        .map(|shortfall| HAZARD_FACTOR * shortfall.shortfall())
        .sum()
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use siteplan_core::{
        adjacency::{AdjacencyWeight, SlpWeight},
        geometry::Size,
        hazard::HazardMap,
        identifier::SpaceId,
        placement::{Attachment, Direction, Placement, Rotation},
        site::BuildingType,
    };

    use super::*;
    use crate::config::{ConstraintConfig, FitnessWeights};

    fn main(name: &str, x: f32, y: f32) -> Placement {
        Placement::new(
            SpaceId::new(name),
            BuildingType::Main,
            Point::new(x, y).to_bounds(Size::new(4.0, 3.0)),
            Rotation::Deg0,
        )
        .with_attachment(Attachment::new(Direction::Right, 0.0))
    }

    fn state(placements: &[Placement]) -> PlacementState {
        let mut state = PlacementState::new();
        for placement in placements {
            state.insert(*placement);
        }
        state
    }

    fn strong_chain() -> AdjacencyTable {
        let mut table = AdjacencyTable::new();
        let weight = AdjacencyWeight::new(SlpWeight::try_from(10).unwrap(), 0.0);
        table.insert(SpaceId::new("A"), SpaceId::new("B"), weight);
        table.insert(SpaceId::new("B"), SpaceId::new("C"), weight);
        table
    }

    #[test]
    fn test_adjacency_term_of_touching_chain() {
        let adjacency = strong_chain();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let config = FitnessConfig::default();
        let site = Site::new(30.0, 20.0);
        let constraints = ConstraintHandler::new(site, &[], &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &[], constraints, &config);

        let layout = state(&[main("A", 5.0, 5.0), main("B", 9.0, 5.0), main("C", 13.0, 5.0)]);
        let breakdown = calculator.score(&layout);

        assert!(breakdown.is_feasible());
        assert_eq!(breakdown.adjacency, 600.0);
        assert_eq!(breakdown.accessibility, 0.0);
        assert_eq!(breakdown.hazard_penalty, 0.0);
        // Straight travel: full consistency.
        assert!(approx_eq!(f32, breakdown.sequence, 2.0 * (200.0 - 0.8) + 50.0, epsilon = 0.001));
        assert!(approx_eq!(f32, breakdown.compactness, 150.0, epsilon = 0.001));
    }

    #[test]
    fn test_total_formula() {
        let adjacency = strong_chain();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let config = FitnessConfig::default();
        let site = Site::new(30.0, 20.0);
        let constraints = ConstraintHandler::new(site, &[], &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &[], constraints, &config);

        let layout = state(&[main("A", 5.0, 5.0), main("B", 9.0, 5.0)]);
        let b = calculator.score(&layout);
        let expected = 1000.0
            + (500.0 * b.adjacency
                + 300.0 * b.sequence
                + 150.0 * b.utilization
                + 100.0 * b.compactness
                + 100.0 * b.accessibility
                - 200.0 * b.hazard_penalty)
                / 1000.0;
        assert!(approx_eq!(f32, b.total, expected, epsilon = 0.01));
    }

    #[test]
    fn test_custom_weights() {
        let adjacency = strong_chain();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let weights = FitnessWeights {
            adjacency: 1000.0,
            sequence: 0.0,
            hazard: 0.0,
            utilization: 0.0,
            compactness: 0.0,
            accessibility: 0.0,
        };
        let config = FitnessConfig::default().with_weights(weights);
        let site = Site::new(30.0, 20.0);
        let constraints = ConstraintHandler::new(site, &[], &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &[], constraints, &config);

        let layout = state(&[main("A", 5.0, 5.0), main("B", 9.0, 5.0)]);
        assert_eq!(calculator.score(&layout).total, 1300.0);
    }

    #[test]
    fn test_infeasible_sentinel() {
        let adjacency = strong_chain();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let config = FitnessConfig::default();
        let site = Site::new(30.0, 20.0);
        let constraints = ConstraintHandler::new(site, &[], &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &[], constraints, &config);

        let overlapping = state(&[main("A", 5.0, 5.0), main("B", 6.0, 5.0)]);
        let breakdown = calculator.score(&overlapping);
        assert!(!breakdown.is_feasible());
        assert_eq!(breakdown.total, INFEASIBLE_SCORE);

        let outside = state(&[main("A", 28.0, 5.0)]);
        assert_eq!(calculator.evaluate(&outside, &[]).total, INFEASIBLE_SCORE);
    }

    #[test]
    fn test_validated_path_matches_checked_path() {
        let adjacency = strong_chain();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let config = FitnessConfig::default();
        let site = Site::new(30.0, 20.0);
        let constraints = ConstraintHandler::new(site, &[], &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &[], constraints, &config);

        let layout = state(&[main("A", 5.0, 5.0), main("B", 9.0, 5.0)]);
        assert_eq!(
            calculator.evaluate_validated(&layout, &[]),
            calculator.evaluate(&layout, &[])
        );

        // Validation is the caller's job on this path.
        let overlapping = state(&[main("A", 5.0, 5.0), main("B", 6.0, 5.0)]);
        assert!(calculator.evaluate_validated(&overlapping, &[]).is_feasible());
        assert!(!calculator.evaluate(&overlapping, &[]).is_feasible());
    }

    #[test]
    fn test_backtracking_has_no_consistency() {
        let layout = state(&[main("A", 0.0, 0.0), main("B", 4.0, 0.0), main("C", 0.0, 0.0)]);
        let proximity = (200.0 - 0.8) * 2.0;
        assert!(approx_eq!(f32, sequence_term(&layout), proximity, epsilon = 0.001));
    }

    #[test]
    fn test_utilization_score() {
        let band = (0.4, 0.7);
        assert_eq!(utilization_score(0.5, band, 0.4), 200.0);
        assert_eq!(utilization_score(0.4, band, 0.4), 200.0);
        assert!(approx_eq!(f32, utilization_score(0.2, band, 0.4), 100.0, epsilon = 0.001));
        assert!(approx_eq!(f32, utilization_score(0.9, band, 0.4), 100.0, epsilon = 0.001));
        assert!(approx_eq!(f32, utilization_score(1.0, band, 0.4), 50.0, epsilon = 0.001));
        assert_eq!(utilization_score(0.0, band, 0.4), 0.0);
    }

    #[test]
    fn test_full_site_utilization_with_default_falloff() {
        let config = FitnessConfig::default();
        let score = utilization_score(1.0, config.utilization_band(), config.utilization_falloff());
        assert!(approx_eq!(f32, score, 80.0, epsilon = 0.001));
    }

    #[test]
    fn test_accessibility_term() {
        let adjacency = AdjacencyTable::new();
        let hazards = HazardMap::new();
        let constraints_config = ConstraintConfig::default();
        let config = FitnessConfig::default();
        let site = Site::new(30.0, 20.0);
        let zones = [
            FixedZone::new(SpaceId::new("road"), Point::new(0.0, 18.0).to_bounds(Size::new(30.0, 2.0)))
                .with_name("Main road"),
            FixedZone::new(SpaceId::new("park"), Point::new(0.0, 0.0).to_bounds(Size::new(2.0, 2.0))),
        ];
        let constraints = ConstraintHandler::new(site, &zones, &hazards, &constraints_config);
        let calculator = FitnessCalculator::new(site, &adjacency, &zones, constraints, &config);

        // Touching the road scores the peak; 2 away loses 40.
        let layout = state(&[main("A", 10.0, 15.0), main("B", 14.0, 13.0)]);
        assert!(approx_eq!(f32, calculator.accessibility_term(&layout), 160.0, epsilon = 0.001));
    }

    #[test]
    fn test_suggestions() {
        assert_eq!(FitnessBreakdown::infeasible().suggestions().len(), 1);

        let strong = FitnessBreakdown {
            adjacency: 600.0,
            sequence: 400.0,
            utilization: 200.0,
            utilization_ratio: 0.5,
            compactness: 150.0,
            accessibility: 100.0,
            hazard_penalty: 0.0,
            total: 1500.0,
        };
        assert!(strong.suggestions().is_empty());

        let scattered = FitnessBreakdown {
            compactness: 40.0,
            hazard_penalty: 12.0,
            ..strong
        };
        assert_eq!(
            scattered.suggestions(),
            vec![
                "increase the distance between hazard-tagged units",
                "group units more tightly"
            ]
        );
    }

    #[test]
    fn test_hazard_penalty() {
        let shortfalls = [HazardShortfall {
            first: SpaceId::new("F"),
            second: Some(SpaceId::new("X")),
            required: 10.0,
            actual: 4.0,
        }];
        assert_eq!(hazard_penalty(&shortfalls), 12.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn band_strategy() -> impl Strategy<Value = (f32, f32)> {
        (0.0f32..1.0, 0.0f32..1.0).prop_map(|(a, b)| (a.min(b), a.max(b)))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Utilization never goes negative nor above its peak.
    fn check_utilization_is_bounded(ratio: f32, band: (f32, f32), falloff: f32) -> Result<(), TestCaseError> {
        let score = utilization_score(ratio, band, falloff);
        prop_assert!(score >= 0.0);
        prop_assert!(score <= UTILIZATION_PEAK);
        Ok(())
    }

    /// Small ratio changes produce small score changes.
    fn check_utilization_is_continuous(ratio: f32, band: (f32, f32), falloff: f32) -> Result<(), TestCaseError> {
        let step = 1e-4;
        let a = utilization_score(ratio, band, falloff);
        let b = utilization_score(ratio + step, band, falloff);
        let slope = UTILIZATION_PEAK / falloff;
        prop_assert!((a - b).abs() <= slope * step + 0.01);
        Ok(())
    }

    /// The band edges score the peak from both sides.
    fn check_band_edges_score_peak(band: (f32, f32), falloff: f32) -> Result<(), TestCaseError> {
        prop_assert!(approx_eq!(f32, utilization_score(band.0, band, falloff), UTILIZATION_PEAK, epsilon = 0.001));
        prop_assert!(approx_eq!(f32, utilization_score(band.1, band, falloff), UTILIZATION_PEAK, epsilon = 0.001));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn utilization_is_bounded(ratio in 0.0f32..2.0, band in band_strategy(), falloff in 0.05f32..1.0) {
            check_utilization_is_bounded(ratio, band, falloff)?;
        }

        #[test]
        fn utilization_is_continuous(ratio in 0.0f32..2.0, band in band_strategy(), falloff in 0.05f32..1.0) {
            check_utilization_is_continuous(ratio, band, falloff)?;
        }

        #[test]
        fn band_edges_score_peak(band in band_strategy(), falloff in 0.05f32..1.0) {
            check_band_edges_score_peak(band, falloff)?;
        }
    }
}
