//! Candidate geometry.
//!
//! A [`Candidate`] fixes one combinatorial choice for the main chain: where
//! the head starts, how every unit is rotated, and the side and clearance each
//! later unit attaches with. [`LayoutGenerator`] turns that choice into
//! absolute geometry. It never validates; see [`crate::constraints`].
//!
//! The search engine builds chains one unit at a time through
//! [`LayoutGenerator::place_first`] and [`LayoutGenerator::attach`] so it can
//! prune prefixes, then calls [`LayoutGenerator::complete`] at the leaves.
//! [`LayoutGenerator::generate`] runs the same steps for a whole candidate.

mod anchor;
mod code;
mod sub_units;

pub use anchor::{Seed, SeedAnchor, rank_anchors};
pub use code::LayoutCode;

use thiserror::Error;

use siteplan_core::{
    adjacency::AdjacencyTable,
    placement::{Attachment, Direction, Placement, PlacementState, Rotation},
    site::{BuildingType, FixedZone, Space},
};

use crate::{classifier::ClassifiedSpaces, config::GeneratorConfig};

/// A candidate that cannot be turned into geometry.
///
/// Local to one candidate: the search engine counts these as pruned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("a {width} x {height} unit does not fit a {site_width} x {site_height} site")]
    DoesNotFit {
        width: f32,
        height: f32,
        site_width: f32,
        site_height: f32,
    },

    #[error("candidate describes {found} main units, expected {expected}")]
    ChainLength { expected: usize, found: usize },

    #[error("candidate has {rotations} rotations, {directions} directions and {gaps} gaps")]
    Malformed {
        rotations: usize,
        directions: usize,
        gaps: usize,
    },
}

/// One point of the combinatorial search space.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    anchor: SeedAnchor,
    rotations: Vec<Rotation>,
    directions: Vec<Direction>,
    gaps: Vec<f32>,
}

impl Candidate {
    /// Creates a candidate for a chain of `rotations.len()` units.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Malformed`] unless there is one direction and
    /// one gap for every unit after the first.
    pub fn new(
        anchor: SeedAnchor,
        rotations: Vec<Rotation>,
        directions: Vec<Direction>,
        gaps: Vec<f32>,
    ) -> Result<Self, GeometryError> {
        let links = rotations.len().saturating_sub(1);
        if rotations.is_empty() || directions.len() != links || gaps.len() != links {
            return Err(GeometryError::Malformed {
                rotations: rotations.len(),
                directions: directions.len(),
                gaps: gaps.len(),
            });
        }
        Ok(Self {
            anchor,
            rotations,
            directions,
            gaps,
        })
    }

    pub fn anchor(&self) -> SeedAnchor {
        self.anchor
    }

    pub fn rotations(&self) -> &[Rotation] {
        &self.rotations
    }

    /// Attachment side of unit `i + 1` relative to unit `i`.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn gaps(&self) -> &[f32] {
        &self.gaps
    }

    /// Number of main units the candidate places.
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }
}

/// Computes placement geometry for candidates of one problem.
#[derive(Debug, Clone, Copy)]
pub struct LayoutGenerator<'a> {
    spaces: &'a ClassifiedSpaces,
    adjacency: &'a AdjacencyTable,
    zones: &'a [FixedZone],
    config: &'a GeneratorConfig,
}

impl<'a> LayoutGenerator<'a> {
    pub fn new(
        spaces: &'a ClassifiedSpaces,
        adjacency: &'a AdjacencyTable,
        zones: &'a [FixedZone],
        config: &'a GeneratorConfig,
    ) -> Self {
        Self {
            spaces,
            adjacency,
            zones,
            config,
        }
    }

    pub fn spaces(&self) -> &'a ClassifiedSpaces {
        self.spaces
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    /// Rotations tried for every unit.
    pub fn rotations(&self) -> &'static [Rotation] {
        self.config.rotations().choices()
    }

    /// Places the first main unit at `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DoesNotFit`] when the rotated unit is larger
    /// than the site.
    pub fn place_first(
        &self,
        anchor: SeedAnchor,
        rotation: Rotation,
    ) -> Result<Placement, GeometryError> {
        let head = self
            .spaces
            .mains()
            .first()
            .ok_or(GeometryError::ChainLength {
                expected: 1,
                found: 0,
            })?;
        let size = rotation.apply(head.size());
        let position = anchor.resolve(self.spaces.site(), size, self.config.seed_margin())?;
        Ok(Placement::new(
            head.id(),
            BuildingType::Main,
            position.to_bounds(size),
            rotation,
        ))
    }

    /// Places `unit` against `previous`.
    pub fn attach(
        &self,
        previous: &Placement,
        unit: &Space,
        rotation: Rotation,
        direction: Direction,
        gap: f32,
    ) -> Placement {
        let size = rotation.apply(unit.size());
        let position = direction.attach(previous.bounds(), size, gap);
        Placement::new(
            unit.id(),
            unit.building_type(),
            position.to_bounds(size),
            rotation,
        )
        .with_attachment(Attachment::new(direction, gap))
    }

    /// Fixed-type spaces at their configured positions.
    pub fn fixed_placements(&self) -> Vec<Placement> {
        self.spaces
            .fixed()
            .iter()
            .filter_map(|space| {
                space.fixed_bounds().map(|bounds| {
                    Placement::new(space.id(), BuildingType::Fixed, bounds, Rotation::Deg0)
                })
            })
            .collect()
    }

    /// Full geometry for a candidate: main chain, fixed spaces, sub units.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] when the candidate does not describe every
    /// main unit or the head does not fit the site.
    pub fn generate(&self, candidate: &Candidate) -> Result<PlacementState, GeometryError> {
        let mains = self.spaces.mains();
        if candidate.len() != mains.len() {
            return Err(GeometryError::ChainLength {
                expected: mains.len(),
                found: candidate.len(),
            });
        }

        let mut chain = Vec::with_capacity(mains.len());
        chain.push(self.place_first(candidate.anchor(), candidate.rotations()[0])?);
        for (idx, unit) in mains.iter().enumerate().skip(1) {
            let placement = self.attach(
                &chain[idx - 1],
                unit,
                candidate.rotations()[idx],
                candidate.directions()[idx - 1],
                candidate.gaps()[idx - 1],
            );
            chain.push(placement);
        }

        Ok(self.complete(&chain))
    }

    /// Completes a main chain with fixed spaces and sub units.
    pub fn complete(&self, chain: &[Placement]) -> PlacementState {
        let mut state = PlacementState::new();
        for placement in chain {
            state.insert(*placement);
        }
        for placement in self.fixed_placements() {
            state.insert(placement);
        }
        self.place_sub_units(&mut state);
        state
    }

    /// Layout code of a placement state's main chain.
    pub fn code(&self, state: &PlacementState) -> LayoutCode {
        LayoutCode::from_state(state)
    }
}
