//! Site, space and fixed-zone definitions.
//!
//! These are the validated, strongly typed forms of a site description. They
//! are created once before a search and stay read-only while it runs.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    error::ModelError,
    geometry::{Bounds, Point, Size},
    hazard::HazardTag,
    identifier::SpaceId,
};

/// The rectangular site. Its origin is always `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    size: Size,
}

impl Site {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }

    pub fn width(&self) -> f32 {
        self.size.width()
    }

    pub fn height(&self) -> f32 {
        self.size.height()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn area(&self) -> f32 {
        self.size.area()
    }

    /// Bounds of the whole site.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::default(), self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

/// How a space participates in placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    /// Part of the ordered main process chain.
    Main,
    /// Placed freely next to the chain.
    Sub,
    /// Placed at a configured position and never moved.
    Fixed,
}

impl BuildingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sub => "sub",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildingType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(Self::Main),
            "sub" => Ok(Self::Sub),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ModelError::UnknownBuildingType(s.to_string())),
        }
    }
}

/// A configured process unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Space {
    id: SpaceId,
    name: Option<String>,
    size: Size,
    building_type: BuildingType,
    sequence_index: Option<u32>,
    hazards: Vec<HazardTag>,
    position: Option<Point>,
}

impl Space {
    pub fn new(id: SpaceId, size: Size, building_type: BuildingType) -> Self {
        Self {
            id,
            name: None,
            size,
            building_type,
            sequence_index: None,
            hazards: Vec::new(),
            position: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sequence_index(mut self, index: u32) -> Self {
        self.sequence_index = Some(index);
        self
    }

    pub fn with_hazards(mut self, hazards: Vec<HazardTag>) -> Self {
        self.hazards = hazards;
        self
    }

    /// Sets the top-left position of a fixed-type space.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name when set, the identifier otherwise.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn building_type(&self) -> BuildingType {
        self.building_type
    }

    pub fn sequence_index(&self) -> Option<u32> {
        self.sequence_index
    }

    pub fn hazards(&self) -> &[HazardTag] {
        &self.hazards
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Bounds of a fixed-type space at its configured position.
    pub fn fixed_bounds(&self) -> Option<Bounds> {
        self.position.map(|position| position.to_bounds(self.size))
    }
}

/// A permanently excluded rectangle such as a road or a parking lot.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedZone {
    id: SpaceId,
    name: Option<String>,
    bounds: Bounds,
    access: bool,
}

impl FixedZone {
    /// Name fragments that mark a zone as an access point.
    const ACCESS_KEYWORDS: [&'static str; 7] =
        ["road", "gate", "entrance", "access", "도로", "게이트", "출입"];

    pub fn new(id: SpaceId, bounds: Bounds) -> Self {
        Self {
            id,
            name: None,
            bounds,
            access: false,
        }
    }

    /// Sets the zone name. Names that look like roads or gates also mark the
    /// zone as an access point.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let lower = name.to_lowercase();
        if Self::ACCESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            self.access = true;
        }
        self.name = Some(name);
        self
    }

    pub fn with_access(mut self, access: bool) -> Self {
        self.access = access;
        self
    }

    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether the zone is a road, gate or other access point.
    pub fn is_access(&self) -> bool {
        self.access
    }
}
