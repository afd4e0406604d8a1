//! Hazard factors and the safety distances required between them.
//!
//! Tags are matched against a fixed pairwise table. Korean tag names used by
//! plant engineering documents (`화재`, `폭발`, `독성`, `고압`, `방사능`) are
//! accepted as aliases of the English names.

use std::{convert::Infallible, fmt, str::FromStr};

use indexmap::IndexMap;
use serde::Serialize;

use crate::identifier::SpaceId;

/// A hazard category attached to a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HazardTag {
    Fire,
    Explosion,
    Toxic,
    HighPressure,
    Radiation,
    /// Any tag without a distance rule. Kept for reporting.
    Other(String),
}

impl HazardTag {
    /// Minimum distance required between units carrying these two tags.
    ///
    /// Returns `None` when the pair has no rule. The table is symmetric.
    ///
    /// # Examples
    ///
    /// ```
    /// use siteplan_core::hazard::HazardTag;
    ///
    /// assert_eq!(HazardTag::Fire.safety_distance(&HazardTag::Explosion), Some(10.0));
    /// assert_eq!(HazardTag::Explosion.safety_distance(&HazardTag::Fire), Some(10.0));
    /// assert_eq!(HazardTag::Toxic.safety_distance(&HazardTag::HighPressure), None);
    /// ```
    pub fn safety_distance(&self, other: &HazardTag) -> Option<f32> {
        use HazardTag::*;

        let distance = match (self, other) {
            (Fire, Explosion) | (Explosion, Fire) => 10.0,
            (Fire, Toxic) | (Toxic, Fire) => 8.0,
            (Explosion, Toxic) | (Toxic, Explosion) => 12.0,
            (Fire, Fire) => 6.0,
            (Explosion, Explosion) => 15.0,
            (Toxic, Toxic) => 5.0,
            (HighPressure, Fire) | (Fire, HighPressure) => 10.0,
            (HighPressure, Explosion) | (Explosion, HighPressure) => 12.0,
            (Radiation, Fire) | (Fire, Radiation) => 20.0,
            (Radiation, Explosion) | (Explosion, Radiation) => 25.0,
            (Radiation, Toxic) | (Toxic, Radiation) => 15.0,
            _ => return None,
        };
        Some(distance)
    }

    /// Returns true for tags that take part in distance rules.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for HazardTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_lowercase().as_str() {
            "fire" | "화재" => Self::Fire,
            "explosion" | "폭발" => Self::Explosion,
            "toxic" | "독성" => Self::Toxic,
            "high-pressure" | "high_pressure" | "high pressure" | "고압" => Self::HighPressure,
            "radiation" | "방사능" => Self::Radiation,
            _ => Self::Other(s.trim().to_string()),
        };
        Ok(tag)
    }
}

impl fmt::Display for HazardTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fire => f.write_str("fire"),
            Self::Explosion => f.write_str("explosion"),
            Self::Toxic => f.write_str("toxic"),
            Self::HighPressure => f.write_str("high-pressure"),
            Self::Radiation => f.write_str("radiation"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// Hazard tags per space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HazardMap {
    tags: IndexMap<SpaceId, Vec<HazardTag>>,
}

impl HazardMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tags to a space, skipping tags it already carries.
    pub fn add(&mut self, id: SpaceId, tags: impl IntoIterator<Item = HazardTag>) {
        let entry = self.tags.entry(id).or_default();
        for tag in tags {
            if !entry.contains(&tag) {
                entry.push(tag);
            }
        }
    }

    /// Tags carried by a space; empty when it has none.
    pub fn tags(&self, id: SpaceId) -> &[HazardTag] {
        self.tags.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true if the space carries at least one tag with distance rules.
    pub fn is_hazardous(&self, id: SpaceId) -> bool {
        self.tags(id).iter().any(HazardTag::is_known)
    }

    /// Safety distance of every tag combination between two spaces that has
    /// a rule, in tag order.
    ///
    /// Each combination is a separate requirement: a unit carrying several
    /// tags owes each of them its distance.
    pub fn required_distances(&self, first: SpaceId, second: SpaceId) -> impl Iterator<Item = f32> + '_ {
        let second_tags = self.tags(second);
        self.tags(first)
            .iter()
            .flat_map(move |a| second_tags.iter().filter_map(move |b| a.safety_distance(b)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpaceId, &[HazardTag])> {
        self.tags.iter().map(|(id, tags)| (*id, tags.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.values().all(Vec::is_empty)
    }
}
