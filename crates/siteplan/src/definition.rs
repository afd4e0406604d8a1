//! Raw site definitions as they arrive from a configuration document.
//!
//! These types mirror the input document and are deliberately loose: spaces
//! may be given as a map or a list, site dimensions may use legacy keys, and
//! enum-like fields are plain strings. [`crate::classifier`] turns a
//! [`SiteDefinition`] into a validated [`crate::Problem`]; nothing else reads
//! these types.
//!
//! # Example
//!
//! ```
//! use siteplan::definition::{SiteDefinition, SpaceDefinition};
//!
//! let definition = SiteDefinition::new(30.0, 20.0)
//!     .with_space("A", SpaceDefinition::main(4.0, 3.0, 1))
//!     .with_space("B", SpaceDefinition::main(4.0, 3.0, 2))
//!     .with_adjacency("A", "B", 10, 0.0);
//!
//! assert_eq!(definition.site_dimensions(), Some((30.0, 20.0)));
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

/// A complete site description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteDefinition {
    #[serde(default)]
    pub(crate) site_dimensions: Option<DimensionsDefinition>,

    /// Legacy site width key.
    #[serde(default)]
    pub(crate) grid_width: Option<f32>,

    /// Legacy site height key.
    #[serde(default)]
    pub(crate) grid_height: Option<f32>,

    /// Legacy site size key: a single side length or `[width, height]`.
    #[serde(default)]
    pub(crate) grid_size: Option<GridSize>,

    #[serde(default)]
    pub(crate) spaces: SpacesDefinition,

    #[serde(default)]
    pub(crate) adjacency_weights: IndexMap<String, AdjacencyDefinition>,

    #[serde(default)]
    pub(crate) fixed_zones: Vec<FixedZoneDefinition>,

    #[serde(default)]
    pub(crate) hazard_factors: IndexMap<String, Vec<String>>,
}

impl SiteDefinition {
    /// Creates an empty definition for a site of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            site_dimensions: Some(DimensionsDefinition { width, height }),
            ..Self::default()
        }
    }

    /// Adds a space under `id`.
    pub fn with_space(mut self, id: &str, space: SpaceDefinition) -> Self {
        self.spaces.push(id, space);
        self
    }

    /// Rates a pair of spaces on the SLP scale.
    pub fn with_adjacency(mut self, first: &str, second: &str, weight: u8, preferred_gap: f32) -> Self {
        self.adjacency_weights.insert(
            format!("{first}-{second}"),
            AdjacencyDefinition {
                weight,
                preferred_gap,
            },
        );
        self
    }

    pub fn with_fixed_zone(mut self, zone: FixedZoneDefinition) -> Self {
        self.fixed_zones.push(zone);
        self
    }

    /// Adds hazard tags for a space.
    pub fn with_hazards(mut self, id: &str, tags: &[&str]) -> Self {
        self.hazard_factors
            .entry(id.to_string())
            .or_default()
            .extend(tags.iter().map(|tag| tag.to_string()));
        self
    }

    /// Site width and height, resolving legacy keys.
    ///
    /// `site_dimensions` wins over `grid_width`/`grid_height`, which win over
    /// `grid_size`.
    pub fn site_dimensions(&self) -> Option<(f32, f32)> {
        if let Some(dimensions) = &self.site_dimensions {
            return Some((dimensions.width, dimensions.height));
        }
        if let (Some(width), Some(height)) = (self.grid_width, self.grid_height) {
            return Some((width, height));
        }
        match self.grid_size {
            Some(GridSize::Square(side)) => Some((side, side)),
            Some(GridSize::Pair([width, height])) => Some((width, height)),
            None => None,
        }
    }

    /// Number of declared spaces, duplicates included.
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DimensionsDefinition {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum GridSize {
    Square(f32),
    Pair([f32; 2]),
}

/// Spaces keyed by id, or listed with an `id` field each.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpacesDefinition {
    Map(IndexMap<String, SpaceDefinition>),
    List(Vec<SpaceDefinition>),
}

impl Default for SpacesDefinition {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl SpacesDefinition {
    fn push(&mut self, id: &str, mut space: SpaceDefinition) {
        space.id = Some(id.to_string());
        match self {
            Self::Map(map) => {
                let mut list: Vec<SpaceDefinition> = map
                    .drain(..)
                    .map(|(key, mut existing)| {
                        existing.id.get_or_insert(key);
                        existing
                    })
                    .collect();
                list.push(space);
                *self = Self::List(list);
            }
            Self::List(list) => list.push(space),
        }
    }

    /// Spaces with their ids, in declaration order.
    pub(crate) fn entries(&self) -> Vec<(String, &SpaceDefinition)> {
        match self {
            Self::Map(map) => map
                .iter()
                .map(|(key, space)| (space.id.clone().unwrap_or_else(|| key.clone()), space))
                .collect(),
            Self::List(list) => list
                .iter()
                .enumerate()
                .map(|(idx, space)| {
                    (
                        space.id.clone().unwrap_or_else(|| format!("space_{}", idx + 1)),
                        space,
                    )
                })
                .collect(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Map(map) => map.len(),
            Self::List(list) => list.len(),
        }
    }
}

/// One space as written in the input document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpaceDefinition {
    #[serde(default)]
    pub id: Option<String>,

    pub width: f32,

    pub height: f32,

    #[serde(default)]
    pub building_type: Option<String>,

    #[serde(default, alias = "sequence_index")]
    pub main_process_sequence: Option<u32>,

    #[serde(default)]
    pub name: Option<String>,

    /// Top-left x of a fixed-type space.
    #[serde(default)]
    pub x: Option<f32>,

    /// Top-left y of a fixed-type space.
    #[serde(default)]
    pub y: Option<f32>,

    #[serde(default)]
    pub hazard_factors: Vec<String>,
}

impl SpaceDefinition {
    pub fn main(width: f32, height: f32, sequence: u32) -> Self {
        Self {
            width,
            height,
            building_type: Some("main".to_string()),
            main_process_sequence: Some(sequence),
            ..Self::default()
        }
    }

    pub fn sub(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            building_type: Some("sub".to_string()),
            ..Self::default()
        }
    }

    pub fn fixed(width: f32, height: f32, x: f32, y: f32) -> Self {
        Self {
            width,
            height,
            building_type: Some("fixed".to_string()),
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_hazards(mut self, tags: &[&str]) -> Self {
        self.hazard_factors = tags.iter().map(|tag| tag.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdjacencyDefinition {
    #[serde(default = "default_weight")]
    pub weight: u8,

    #[serde(default = "default_preferred_gap")]
    pub preferred_gap: f32,
}

fn default_weight() -> u8 {
    2
}

fn default_preferred_gap() -> f32 {
    100.0
}

/// A fixed exclusion zone as written in the input document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixedZoneDefinition {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    #[serde(default)]
    pub name: Option<String>,

    /// Marks the zone as a road or gate. Inferred from the name when absent.
    #[serde(default)]
    pub access: Option<bool>,
}

impl FixedZoneDefinition {
    pub fn new(id: &str, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.to_string(),
            x,
            y,
            width,
            height,
            name: None,
            access: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_access(mut self, access: bool) -> Self {
        self.access = Some(access);
        self
    }
}
