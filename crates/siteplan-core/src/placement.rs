//! Placed geometry: rotations, attachment directions and placement state.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    geometry::{Bounds, Point, Size},
    identifier::SpaceId,
    site::BuildingType,
};

/// Quarter-turn rotation applied to a footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Result<Self, ModelError> {
        match degrees % 360 {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(ModelError::UnsupportedRotation(degrees)),
        }
    }

    /// Orientation letter used in layout codes.
    pub fn letter(self) -> char {
        match self {
            Self::Deg0 => 'O',
            Self::Deg90 => 'R',
            Self::Deg180 => 'U',
            Self::Deg270 => 'L',
        }
    }

    /// Footprint after rotation. Quarter and three-quarter turns swap sides.
    pub fn apply(self, size: Size) -> Size {
        match self {
            Self::Deg0 | Self::Deg180 => size,
            Self::Deg90 | Self::Deg270 => size.transpose(),
        }
    }
}

/// Which rotations the search may try for each unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationSet {
    /// Upright and quarter-turned.
    #[default]
    TwoWay,
    /// All four quarter-turns.
    FourWay,
}

impl RotationSet {
    pub fn choices(self) -> &'static [Rotation] {
        match self {
            Self::TwoWay => &[Rotation::Deg0, Rotation::Deg90],
            Self::FourWay => &[
                Rotation::Deg0,
                Rotation::Deg90,
                Rotation::Deg180,
                Rotation::Deg270,
            ],
        }
    }
}

/// Side of the previous unit a new unit attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Bottom,
    Right,
    Top,
    Left,
}

impl Direction {
    /// All directions in enumeration order.
    pub const ALL: [Direction; 4] = [Self::Bottom, Self::Right, Self::Top, Self::Left];

    /// Direction letter used in layout codes.
    pub fn letter(self) -> char {
        match self {
            Self::Bottom => 'a',
            Self::Right => 'b',
            Self::Top => 'c',
            Self::Left => 'd',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Right => "right",
            Self::Top => "top",
            Self::Left => "left",
        }
    }

    /// Top-left position of a unit of `size` attached on this side of
    /// `previous`, separated by `gap`. The new unit aligns with the previous
    /// unit's top edge (left, right) or left edge (top, bottom).
    ///
    /// # Examples
    ///
    /// ```
    /// use siteplan_core::geometry::{Bounds, Point, Size};
    /// use siteplan_core::placement::Direction;
    ///
    /// let previous = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(4.0, 3.0));
    /// let size = Size::new(2.0, 2.0);
    ///
    /// assert_eq!(Direction::Right.attach(previous, size, 1.0), Point::new(15.0, 10.0));
    /// assert_eq!(Direction::Bottom.attach(previous, size, 0.0), Point::new(10.0, 13.0));
    /// assert_eq!(Direction::Left.attach(previous, size, 0.0), Point::new(8.0, 10.0));
    /// assert_eq!(Direction::Top.attach(previous, size, 0.0), Point::new(10.0, 8.0));
    /// ```
    pub fn attach(self, previous: Bounds, size: Size, gap: f32) -> Point {
        match self {
            Self::Bottom => Point::new(previous.min_x(), previous.max_y() + gap),
            Self::Right => Point::new(previous.max_x() + gap, previous.min_y()),
            Self::Top => Point::new(previous.min_x(), previous.min_y() - size.height() - gap),
            Self::Left => Point::new(previous.min_x() - size.width() - gap, previous.min_y()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" | "a" => Ok(Self::Bottom),
            "right" | "b" => Ok(Self::Right),
            "top" | "c" => Ok(Self::Top),
            "left" | "d" => Ok(Self::Left),
            _ => Err(ModelError::UnknownDirection(s.to_string())),
        }
    }
}

/// How a main unit is attached to its predecessor in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    direction: Direction,
    gap: f32,
}

impl Attachment {
    pub fn new(direction: Direction, gap: f32) -> Self {
        Self { direction, gap }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }
}

/// One unit at its absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    id: SpaceId,
    building_type: BuildingType,
    bounds: Bounds,
    rotation: Rotation,
    attachment: Option<Attachment>,
}

impl Placement {
    pub fn new(id: SpaceId, building_type: BuildingType, bounds: Bounds, rotation: Rotation) -> Self {
        Self {
            id,
            building_type,
            bounds,
            rotation,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn building_type(&self) -> BuildingType {
        self.building_type
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Attachment to the previous main unit; `None` for the chain head and
    /// for sub or fixed units.
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }
}

/// Every placed unit of one candidate layout.
///
/// Main units are kept in chain order. Sub units that could not be placed are
/// listed separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementState {
    placements: IndexMap<SpaceId, Placement>,
    chain: Vec<SpaceId>,
    unplaced: Vec<SpaceId>,
}

impl PlacementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a placement. Main units extend the chain in insertion order.
    pub fn insert(&mut self, placement: Placement) {
        if placement.building_type() == BuildingType::Main
            && !self.placements.contains_key(&placement.id())
        {
            self.chain.push(placement.id());
        }
        self.placements.insert(placement.id(), placement);
    }

    /// Records a sub unit that found no feasible slot.
    pub fn mark_unplaced(&mut self, id: SpaceId) {
        if !self.unplaced.contains(&id) {
            self.unplaced.push(id);
        }
    }

    pub fn get(&self, id: SpaceId) -> Option<&Placement> {
        self.placements.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    /// Main units in chain order.
    pub fn chain(&self) -> impl Iterator<Item = &Placement> {
        self.chain.iter().filter_map(|id| self.placements.get(id))
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn unplaced(&self) -> &[SpaceId] {
        &self.unplaced
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Sum of all placed footprint areas.
    pub fn occupied_area(&self) -> f32 {
        self.placements.values().map(|p| p.bounds().area()).sum()
    }

    /// Bounds enclosing every placed unit.
    pub fn bounding_box(&self) -> Option<Bounds> {
        self.placements
            .values()
            .map(Placement::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }
}
