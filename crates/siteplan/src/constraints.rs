//! Hard and soft constraints on placements.
//!
//! Hard constraints are fatal: every placed rectangle must lie inside the
//! site, no two rectangles may intersect, and no rectangle may intrude into a
//! fixed zone. They are monotone: adding units never repairs a violation, so a
//! failing prefix can be discarded with its whole subtree.
//!
//! Soft constraints are penalized instead. Hazard-tagged units should keep
//! their pairwise safety distances and, when configured, a clearance from the
//! site boundary. [`ConstraintHandler::hazard_shortfalls`] reports how far
//! each tag combination of each pair falls short for the fitness hazard term.

use std::fmt;

use log::trace;
use petgraph::{algo::connected_components, graph::UnGraph};
use serde::Serialize;
use thiserror::Error;

use siteplan_core::{
    geometry::{Bounds, TOLERANCE},
    hazard::HazardMap,
    identifier::SpaceId,
    placement::{Placement, PlacementState},
    site::{BuildingType, FixedZone, Site},
};

use crate::{config::ConstraintConfig, error::SiteplanError};

/// A hard constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("`{id}` extends past the site boundary")]
    OutOfBounds { id: SpaceId },

    #[error("`{first}` overlaps `{second}`")]
    Overlap { first: SpaceId, second: SpaceId },

    #[error("`{id}` intrudes into fixed zone `{zone}`")]
    ZoneIntrusion { id: SpaceId, zone: SpaceId },
}

/// A safety distance that is not met.
///
/// `second` is `None` for a unit too close to the site boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HazardShortfall {
    pub first: SpaceId,
    pub second: Option<SpaceId>,
    pub required: f32,
    pub actual: f32,
}

impl HazardShortfall {
    /// Missing distance, always positive.
    pub fn shortfall(&self) -> f32 {
        self.required - self.actual
    }
}

impl fmt::Display for HazardShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.second {
            Some(second) => write!(
                f,
                "`{}` and `{}` are {:.2} apart, {:.2} required",
                self.first, second, self.actual, self.required
            ),
            None => write!(
                f,
                "`{}` is {:.2} from the site boundary, {:.2} required",
                self.first, self.actual, self.required
            ),
        }
    }
}

/// Everything wrong with a placement, not only the first hard violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<String>,
    /// One suggested action per violation and per hazard shortfall.
    pub suggestions: Vec<String>,
    pub statistics: ValidationStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationStatistics {
    pub placed: usize,
    pub unplaced: usize,
    pub occupied_area: f32,
    pub utilization: f32,
    /// `[x, y, width, height]` of the area enclosing every placed unit.
    pub bounding_box: Option<[f32; 4]>,
}

/// Validates placements against the site, fixed zones and hazard rules.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintHandler<'a> {
    site: Site,
    zones: &'a [FixedZone],
    hazards: &'a HazardMap,
    config: &'a ConstraintConfig,
}

impl<'a> ConstraintHandler<'a> {
    pub fn new(
        site: Site,
        zones: &'a [FixedZone],
        hazards: &'a HazardMap,
        config: &'a ConstraintConfig,
    ) -> Self {
        Self {
            site,
            zones,
            hazards,
            config,
        }
    }

    /// Checks `placement` alone: site containment and zone intrusion.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] found.
    pub fn check_single(&self, placement: &Placement) -> Result<(), Violation> {
        let bounds = placement.bounds();
        if !self.site.bounds().contains(&bounds) {
            return Err(Violation::OutOfBounds { id: placement.id() });
        }
        if let Some(zone) = self
            .zones
            .iter()
            .find(|zone| zone.bounds().intersects(&bounds))
        {
            return Err(Violation::ZoneIntrusion {
                id: placement.id(),
                zone: zone.id(),
            });
        }
        Ok(())
    }

    /// Checks a new unit against an already valid set of placements.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] involving `placement`.
    pub fn check_placement(&self, placement: &Placement, placed: &[Placement]) -> Result<(), Violation> {
        self.check_single(placement)?;
        let bounds = placement.bounds();
        if let Some(other) = placed
            .iter()
            .find(|other| other.id() != placement.id() && other.bounds().intersects(&bounds))
        {
            return Err(Violation::Overlap {
                first: other.id(),
                second: placement.id(),
            });
        }
        Ok(())
    }

    /// Checks a prefix of the main chain, together with any fixed-type spaces
    /// the caller includes.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] in slice order.
    pub fn check_prefix(&self, prefix: &[Placement]) -> Result<(), Violation> {
        for (idx, placement) in prefix.iter().enumerate() {
            self.check_placement(placement, &prefix[..idx])?;
        }
        Ok(())
    }

    /// Full hard validation of a placement state.
    ///
    /// # Errors
    ///
    /// Returns the first [`Violation`] in placement order.
    pub fn validate(&self, state: &PlacementState) -> Result<(), Violation> {
        let placements: Vec<Placement> = state.iter().copied().collect();
        self.check_prefix(&placements)
    }

    /// Every hard violation of a placement state.
    pub fn violations(&self, state: &PlacementState) -> Vec<Violation> {
        let placements: Vec<&Placement> = state.iter().collect();
        let mut violations = Vec::new();
        for (idx, placement) in placements.iter().enumerate() {
            let bounds = placement.bounds();
            if !self.site.bounds().contains(&bounds) {
                violations.push(Violation::OutOfBounds { id: placement.id() });
            }
            for zone in self.zones.iter().filter(|zone| zone.bounds().intersects(&bounds)) {
                violations.push(Violation::ZoneIntrusion {
                    id: placement.id(),
                    zone: zone.id(),
                });
            }
            for other in &placements[..idx] {
                if other.bounds().intersects(&bounds) {
                    violations.push(Violation::Overlap {
                        first: other.id(),
                        second: placement.id(),
                    });
                }
            }
        }
        violations
    }

    /// Safety distances that are not met.
    pub fn hazard_shortfalls(&self, state: &PlacementState) -> Vec<HazardShortfall> {
        let hazardous: Vec<&Placement> = state
            .iter()
            .filter(|placement| self.hazards.is_hazardous(placement.id()))
            .collect();

        let mut shortfalls = Vec::new();
        for (idx, first) in hazardous.iter().enumerate() {
            for second in &hazardous[idx + 1..] {
                let actual = first.bounds().edge_distance(&second.bounds());
                for required in self.hazards.required_distances(first.id(), second.id()) {
                    if actual < required - TOLERANCE {
                        shortfalls.push(HazardShortfall {
                            first: first.id(),
                            second: Some(second.id()),
                            required,
                            actual,
                        });
                    }
                }
            }
        }

        let clearance = self.config.boundary_clearance();
        if clearance > 0.0 {
            for placement in &hazardous {
                let actual = placement.bounds().inset_within(&self.site.bounds()).max(0.0);
                if actual < clearance - TOLERANCE {
                    shortfalls.push(HazardShortfall {
                        first: placement.id(),
                        second: None,
                        required: clearance,
                        actual,
                    });
                }
            }
        }

        trace!(count = shortfalls.len(); "Hazard shortfalls computed");
        shortfalls
    }

    /// Detailed report with violations, warnings and statistics.
    pub fn report(&self, state: &PlacementState) -> ValidationReport {
        let violations = self.violations(state);
        let shortfalls = self.hazard_shortfalls(state);
        let mut warnings: Vec<String> = shortfalls
            .iter()
            .map(|shortfall| format!("hazard: {shortfall}"))
            .collect();
        let suggestions: Vec<String> = violations
            .iter()
            .map(|violation| suggest_fix(violation, state))
            .chain(shortfalls.iter().map(suggest_clearance))
            .collect();

        let spacing = self.config.min_spacing();
        if spacing > 0.0 {
            let placements: Vec<&Placement> = state.iter().collect();
            for (idx, first) in placements.iter().enumerate() {
                for second in &placements[idx + 1..] {
                    let distance = first.bounds().edge_distance(&second.bounds());
                    if distance < spacing - TOLERANCE {
                        warnings.push(format!(
                            "spacing: `{}` and `{}` are {distance:.2} apart, {spacing:.2} expected",
                            first.id(),
                            second.id()
                        ));
                    }
                }
            }
        }

        let access: Vec<Bounds> = access_zones(self.zones).map(FixedZone::bounds).collect();
        if !access.is_empty() {
            let reach = self.config.access_distance();
            for placement in state.chain() {
                let nearest = nearest_distance(placement.bounds(), &access);
                if nearest > reach + TOLERANCE {
                    warnings.push(format!(
                        "access: `{}` is {nearest:.2} from the nearest access zone, {reach:.2} expected",
                        placement.id()
                    ));
                }
            }
        }

        for id in state.unplaced() {
            warnings.push(format!("unplaced: sub unit `{id}` has no free slot"));
        }

        let occupied_area = state.occupied_area();
        ValidationReport {
            valid: violations.is_empty(),
            violations,
            warnings,
            suggestions,
            statistics: ValidationStatistics {
                placed: state.len(),
                unplaced: state.unplaced().len(),
                occupied_area,
                utilization: occupied_area / self.site.area(),
                bounding_box: state
                    .bounding_box()
                    .map(|b| [b.min_x(), b.min_y(), b.width(), b.height()]),
            },
        }
    }

    /// Confirms that the main chain is connected as recorded.
    ///
    /// Every unit after the head must lie within its recorded gap of its
    /// predecessor, so the chain forms one connected component.
    ///
    /// # Errors
    ///
    /// Returns [`SiteplanError::Internal`] when the chain is broken.
    pub fn verify_chain(&self, state: &PlacementState) -> Result<(), SiteplanError> {
        let chain: Vec<&Placement> = state.chain().collect();
        if chain.is_empty() {
            return Err(SiteplanError::Internal("placement has no main chain".to_string()));
        }

        let mut graph = UnGraph::<SpaceId, f32>::new_undirected();
        let nodes: Vec<_> = chain.iter().map(|placement| graph.add_node(placement.id())).collect();

        for idx in 1..chain.len() {
            let (previous, current) = (chain[idx - 1], chain[idx]);
            if current.building_type() != BuildingType::Main {
                return Err(SiteplanError::Internal(format!(
                    "`{}` is in the main chain but is not a main unit",
                    current.id()
                )));
            }
            let Some(attachment) = current.attachment() else {
                return Err(SiteplanError::Internal(format!(
                    "`{}` has no attachment to `{}`",
                    current.id(),
                    previous.id()
                )));
            };
            let distance = previous.bounds().edge_distance(&current.bounds());
            let slack = chain_slack(previous.bounds(), current.bounds(), attachment.gap());
            if distance <= attachment.gap() + slack {
                graph.add_edge(nodes[idx - 1], nodes[idx], distance);
            }
        }

        match connected_components(&graph) {
            1 => Ok(()),
            components => Err(SiteplanError::Internal(format!(
                "main chain splits into {components} disconnected groups"
            ))),
        }
    }
}

fn suggest_fix(violation: &Violation, state: &PlacementState) -> String {
    match *violation {
        Violation::OutOfBounds { id } => format!("move `{id}` inside the site"),
        Violation::Overlap { first, second } => {
            let overlap = state
                .get(first)
                .zip(state.get(second))
                .map_or(0.0, |(a, b)| a.bounds().overlap_area(&b.bounds()));
            format!(
                "move `{first}` or `{second}` apart by at least {:.2}",
                overlap.sqrt()
            )
        }
        Violation::ZoneIntrusion { id, zone } => format!("move `{id}` clear of fixed zone `{zone}`"),
    }
}

fn suggest_clearance(shortfall: &HazardShortfall) -> String {
    match shortfall.second {
        Some(second) => format!(
            "add {:.2} between `{}` and `{second}`",
            shortfall.shortfall(),
            shortfall.first
        ),
        None => format!(
            "move `{}` {:.2} further from the site boundary",
            shortfall.first,
            shortfall.shortfall()
        ),
    }
}

/// Rounding slack for a recorded gap between two chain neighbours.
///
/// f32 spacing grows with magnitude, so a fixed slack rejects valid chains
/// laid out far from the origin.
fn chain_slack(previous: Bounds, current: Bounds, gap: f32) -> f32 {
    let magnitude = [
        previous.min_x(),
        previous.max_x(),
        previous.min_y(),
        previous.max_y(),
        current.min_x(),
        current.max_x(),
        current.min_y(),
        current.max_y(),
        gap,
    ]
    .into_iter()
    .map(f32::abs)
    .fold(0.0, f32::max);
    (TOLERANCE * 10.0).max(f32::EPSILON * 8.0 * magnitude)
}

/// Zones flagged as access points, or every zone when none is flagged.
pub(crate) fn access_zones(zones: &[FixedZone]) -> impl Iterator<Item = &FixedZone> {
    let any_flagged = zones.iter().any(FixedZone::is_access);
    zones
        .iter()
        .filter(move |zone| !any_flagged || zone.is_access())
}

pub(crate) fn nearest_distance(bounds: Bounds, targets: &[Bounds]) -> f32 {
    targets
        .iter()
        .map(|target| bounds.edge_distance(target))
        .fold(f32::INFINITY, f32::min)
}
