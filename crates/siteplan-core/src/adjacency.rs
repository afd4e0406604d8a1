//! SLP closeness preferences between pairs of spaces.
//!
//! Systematic Layout Planning rates the desired closeness of two activities on
//! the scale 0, 2, 4, 6, 8, 10. Each rated pair also carries a preferred gap;
//! [`AdjacencyWeight::score`] turns the actual gap into a score that peaks when
//! the two agree.

use indexmap::IndexMap;

use crate::{error::ModelError, identifier::SpaceId};

/// Closeness rating on the SLP scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlpWeight(u8);

impl SlpWeight {
    /// Weight assumed for pairs without a rating.
    pub const DEFAULT: SlpWeight = SlpWeight(2);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SlpWeight {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 | 2 | 4 | 6 | 8 | 10 => Ok(Self(value)),
            _ => Err(ModelError::InvalidWeight(value)),
        }
    }
}

/// A rated pair: closeness weight and the preferred clearance between units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyWeight {
    weight: SlpWeight,
    preferred_gap: f32,
}

impl AdjacencyWeight {
    /// Preferred gap assumed for pairs without a rating.
    pub const DEFAULT_GAP: f32 = 100.0;

    pub fn new(weight: SlpWeight, preferred_gap: f32) -> Self {
        Self {
            weight,
            preferred_gap,
        }
    }

    pub fn weight(&self) -> SlpWeight {
        self.weight
    }

    pub fn preferred_gap(&self) -> f32 {
        self.preferred_gap
    }

    /// Score for two units separated by `gap`.
    ///
    /// Positive weights score highest when `gap` equals the preferred gap and
    /// decay linearly with the deviation, never going below zero. Weight 0
    /// marks an undesirable pair: being closer than the preferred gap costs
    /// five points per unit of shortfall, staying further away earns up to 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use siteplan_core::adjacency::{AdjacencyWeight, SlpWeight};
    ///
    /// let strong = AdjacencyWeight::new(SlpWeight::try_from(10).unwrap(), 0.0);
    /// assert_eq!(strong.score(0.0), 300.0);
    /// assert_eq!(strong.score(20.0), 240.0);
    ///
    /// let avoid = AdjacencyWeight::new(SlpWeight::try_from(0).unwrap(), 10.0);
    /// assert_eq!(avoid.score(4.0), -30.0);
    /// ```
    pub fn score(&self, gap: f32) -> f32 {
        let deviation = (gap - self.preferred_gap).abs();
        match self.weight.value() {
            10 => (300.0 - 3.0 * deviation).max(0.0),
            8 => (200.0 - 2.0 * deviation).max(0.0),
            6 => (150.0 - 1.5 * deviation).max(0.0),
            4 => (100.0 - deviation).max(0.0),
            2 => (50.0 - 0.5 * deviation).max(0.0),
            _ => {
                if gap < self.preferred_gap {
                    -(self.preferred_gap - gap) * 5.0
                } else {
                    (gap - self.preferred_gap).min(100.0)
                }
            }
        }
    }

    /// Highest score this pair can reach.
    pub fn peak_score(&self) -> f32 {
        match self.weight.value() {
            10 => 300.0,
            8 => 200.0,
            6 => 150.0,
            4 => 100.0,
            2 => 50.0,
            _ => 100.0,
        }
    }
}

impl Default for AdjacencyWeight {
    fn default() -> Self {
        Self::new(SlpWeight::DEFAULT, Self::DEFAULT_GAP)
    }
}

/// Rated pairs, keyed by unordered pair and kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacencyTable {
    pairs: IndexMap<(SpaceId, SpaceId), AdjacencyWeight>,
}

impl AdjacencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rates a pair, replacing an earlier rating given in either order.
    pub fn insert(&mut self, first: SpaceId, second: SpaceId, weight: AdjacencyWeight) {
        if let Some(existing) = self.pairs.get_mut(&(second, first)) {
            *existing = weight;
        } else {
            self.pairs.insert((first, second), weight);
        }
    }

    /// Rating of a pair in either order.
    pub fn get(&self, first: SpaceId, second: SpaceId) -> Option<&AdjacencyWeight> {
        self.pairs
            .get(&(first, second))
            .or_else(|| self.pairs.get(&(second, first)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpaceId, SpaceId, &AdjacencyWeight)> {
        self.pairs.iter().map(|(&(a, b), weight)| (a, b, weight))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Strongest weight between `id` and any of `others`, unrated pairs
    /// counting as [`SlpWeight::DEFAULT`].
    pub fn strongest_weight(
        &self,
        id: SpaceId,
        others: impl IntoIterator<Item = SpaceId>,
    ) -> SlpWeight {
        others
            .into_iter()
            .filter(|other| *other != id)
            .map(|other| {
                self.get(id, other)
                    .map_or(SlpWeight::DEFAULT, AdjacencyWeight::weight)
            })
            .max()
            .unwrap_or(SlpWeight::DEFAULT)
    }

    /// Sum of the peak scores of all rated pairs.
    pub fn peak_score(&self) -> f32 {
        self.pairs.values().map(AdjacencyWeight::peak_score).sum()
    }
}
