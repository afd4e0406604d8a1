//! Seed anchors: named positions for the first main unit.

use std::fmt;

use serde::Serialize;

use siteplan_core::{
    geometry::{Bounds, Point, Size, TOLERANCE},
    placement::Rotation,
    site::{FixedZone, Site},
};

use super::GeometryError;

/// A named starting position for the head of the main chain.
///
/// Anchors are resolved against the first unit's rotated footprint, so the
/// same anchor yields different top-left positions per orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedAnchor {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopMiddle,
    BottomMiddle,
    LeftMiddle,
    RightMiddle,
    UpperLeftThird,
    UpperRightThird,
    LowerLeftThird,
    LowerRightThird,
}

impl SeedAnchor {
    /// Every anchor, center first.
    pub const ALL: [SeedAnchor; 13] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::TopMiddle,
        Self::BottomMiddle,
        Self::LeftMiddle,
        Self::RightMiddle,
        Self::UpperLeftThird,
        Self::UpperRightThird,
        Self::LowerLeftThird,
        Self::LowerRightThird,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top_left",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomRight => "bottom_right",
            Self::TopMiddle => "top_middle",
            Self::BottomMiddle => "bottom_middle",
            Self::LeftMiddle => "left_middle",
            Self::RightMiddle => "right_middle",
            Self::UpperLeftThird => "upper_left_third",
            Self::UpperRightThird => "upper_right_third",
            Self::LowerLeftThird => "lower_left_third",
            Self::LowerRightThird => "lower_right_third",
        }
    }

    /// Top-left corner for a unit of `size` at this anchor.
    ///
    /// Corner and edge anchors keep `margin` from the site edge where there is
    /// room for it; every position is clamped so the unit stays inside the
    /// site.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DoesNotFit`] when `size` exceeds the site in
    /// either dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use siteplan::generator::SeedAnchor;
    /// use siteplan_core::geometry::{Point, Size};
    /// use siteplan_core::site::Site;
    ///
    /// let site = Site::new(30.0, 20.0);
    /// let size = Size::new(4.0, 2.0);
    ///
    /// assert_eq!(SeedAnchor::Center.resolve(&site, size, 0.0).unwrap(), Point::new(13.0, 9.0));
    /// assert_eq!(SeedAnchor::BottomRight.resolve(&site, size, 1.0).unwrap(), Point::new(25.0, 17.0));
    /// assert!(SeedAnchor::Center.resolve(&site, Size::new(31.0, 1.0), 0.0).is_err());
    /// ```
    pub fn resolve(self, site: &Site, size: Size, margin: f32) -> Result<Point, GeometryError> {
        if !size.fits_within(site.size()) {
            return Err(GeometryError::DoesNotFit {
                width: size.width(),
                height: size.height(),
                site_width: site.width(),
                site_height: site.height(),
            });
        }

        let (w, h) = (size.width(), size.height());
        let (sw, sh) = (site.width(), site.height());
        let (left, right) = (margin, sw - w - margin);
        let (top, bottom) = (margin, sh - h - margin);
        let mid_x = (sw - w) / 2.0;
        let mid_y = (sh - h) / 2.0;
        let third = |thirds: f32, extent: f32, side: f32| extent * thirds / 3.0 - side / 2.0;

        let (x, y) = match self {
            Self::Center => (mid_x, mid_y),
            Self::TopLeft => (left, top),
            Self::TopRight => (right, top),
            Self::BottomLeft => (left, bottom),
            Self::BottomRight => (right, bottom),
            Self::TopMiddle => (mid_x, top),
            Self::BottomMiddle => (mid_x, bottom),
            Self::LeftMiddle => (left, mid_y),
            Self::RightMiddle => (right, mid_y),
            Self::UpperLeftThird => (third(1.0, sw, w), third(1.0, sh, h)),
            Self::UpperRightThird => (third(2.0, sw, w), third(1.0, sh, h)),
            Self::LowerLeftThird => (third(1.0, sw, w), third(2.0, sh, h)),
            Self::LowerRightThird => (third(2.0, sw, w), third(2.0, sh, h)),
        };

        Ok(Point::new(x.min(sw - w).max(0.0), y.min(sh - h).max(0.0)))
    }

    /// Position heuristic used to rank anchors before the search starts.
    ///
    /// Rewards positions at a moderate distance from the site center, free
    /// room on every side, and short reach to access zones. Deterministic.
    pub fn strategic_score(bounds: Bounds, site: &Site, zones: &[FixedZone]) -> f32 {
        let mut score = 0.0;

        let half_diagonal = site.size().width().hypot(site.size().height()) / 2.0;
        let center_ratio = if half_diagonal > 0.0 {
            bounds.center().distance(site.center()) / half_diagonal
        } else {
            0.0
        };
        if (0.3..=0.7).contains(&center_ratio) {
            score += 60.0;
        } else if center_ratio < 0.2 {
            score += 30.0;
        } else if center_ratio > 0.8 {
            score -= 30.0;
        }

        let shorter_side = site.width().min(site.height());
        let room = bounds.inset_within(&site.bounds());
        if room > shorter_side * 0.1 {
            score += 40.0;
        } else if room < shorter_side * 0.03 {
            score -= 20.0;
        }

        let diagonal = half_diagonal * 2.0;
        for zone in zones.iter().filter(|zone| zone.is_access()) {
            let distance = bounds.center_distance(&zone.bounds());
            if distance < diagonal * 0.2 {
                score += 40.0;
            } else if distance > diagonal * 0.4 {
                score -= 15.0;
            }
        }

        score
    }
}

impl fmt::Display for SeedAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An anchor ranked for one search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    anchor: SeedAnchor,
    score: f32,
}

impl Seed {
    pub fn new(anchor: SeedAnchor, score: f32) -> Self {
        Self { anchor, score }
    }

    pub fn anchor(&self) -> SeedAnchor {
        self.anchor
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Ranks anchors for a first unit of `size`.
///
/// Anchors resolving to the same positions for every rotation in `rotations`
/// are merged, keeping the earlier one. The remaining anchors are sorted by
/// [`SeedAnchor::strategic_score`] (best over rotations, ties in anchor
/// order) and truncated to `limit`.
pub fn rank_anchors(
    site: &Site,
    size: Size,
    rotations: &[Rotation],
    margin: f32,
    zones: &[FixedZone],
    limit: usize,
) -> Vec<Seed> {
    let mut seen: Vec<Vec<Option<Point>>> = Vec::new();
    let mut seeds = Vec::new();

    for anchor in SeedAnchor::ALL {
        let resolved: Vec<Option<Point>> = rotations
            .iter()
            .map(|rotation| anchor.resolve(site, rotation.apply(size), margin).ok())
            .collect();

        let duplicate = seen.iter().any(|other| same_positions(other, &resolved));
        if duplicate {
            continue;
        }

        let score = rotations
            .iter()
            .zip(&resolved)
            .filter_map(|(rotation, position)| {
                position.map(|p| {
                    SeedAnchor::strategic_score(p.to_bounds(rotation.apply(size)), site, zones)
                })
            })
            .reduce(f32::max)
            .unwrap_or(0.0);

        seen.push(resolved);
        seeds.push(Seed::new(anchor, score));
    }

    seeds.sort_by(|a, b| b.score.total_cmp(&a.score));
    seeds.truncate(limit.max(1));
    seeds
}

fn same_positions(a: &[Option<Point>], b: &[Option<Point>]) -> bool {
    a.iter().zip(b).all(|(a, b)| match (a, b) {
        (Some(a), Some(b)) => a.distance(*b) <= TOLERANCE,
        (None, None) => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use siteplan_core::{geometry::Size, identifier::SpaceId};

    use super::*;

    #[test]
    fn test_resolve_corners_and_thirds() {
        let site = Site::new(30.0, 30.0);
        let size = Size::new(4.0, 2.0);

        assert_eq!(
            SeedAnchor::TopLeft.resolve(&site, size, 2.0).unwrap(),
            Point::new(2.0, 2.0)
        );
        assert_eq!(
            SeedAnchor::TopRight.resolve(&site, size, 0.0).unwrap(),
            Point::new(26.0, 0.0)
        );
        assert_eq!(
            SeedAnchor::UpperLeftThird.resolve(&site, size, 0.0).unwrap(),
            Point::new(8.0, 9.0)
        );
        assert_eq!(
            SeedAnchor::LowerRightThird.resolve(&site, size, 0.0).unwrap(),
            Point::new(18.0, 19.0)
        );
    }

    #[test]
    fn test_resolve_clamps_margin() {
        let site = Site::new(10.0, 10.0);
        let size = Size::new(9.0, 9.0);

        let position = SeedAnchor::BottomRight.resolve(&site, size, 5.0).unwrap();
        let bounds = position.to_bounds(size);
        assert!(site.bounds().contains(&bounds));
    }

    #[test]
    fn test_exact_fit_collapses_to_one_seed() {
        let site = Site::new(30.0, 20.0);
        let size = Size::new(30.0, 20.0);

        let seeds = rank_anchors(&site, size, &[Rotation::Deg0], 0.0, &[], 13);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].anchor(), SeedAnchor::Center);
    }

    #[test]
    fn test_rank_anchors_limit_and_determinism() {
        let site = Site::new(100.0, 60.0);
        let size = Size::new(10.0, 6.0);
        let rotations = [Rotation::Deg0, Rotation::Deg90];

        let first = rank_anchors(&site, size, &rotations, 1.0, &[], 5);
        let second = rank_anchors(&site, size, &rotations, 1.0, &[], 5);
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].score() >= w[1].score()));
    }

    #[test]
    fn test_access_zone_attracts_seeds() {
        let site = Site::new(100.0, 100.0);
        let size = Size::new(10.0, 10.0);
        let gate = FixedZone::new(
            SpaceId::new("gate"),
            Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(5.0, 5.0)),
        )
        .with_access(true);

        let near = SeedAnchor::UpperLeftThird
            .resolve(&site, size, 0.0)
            .unwrap()
            .to_bounds(size);
        let far = SeedAnchor::LowerRightThird
            .resolve(&site, size, 0.0)
            .unwrap()
            .to_bounds(size);

        let zones = [gate];
        assert!(
            SeedAnchor::strategic_score(near, &site, &zones)
                > SeedAnchor::strategic_score(far, &site, &zones)
        );
    }
}
