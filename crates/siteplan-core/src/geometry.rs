//! Geometric primitives for site layout and placement.
//!
//! This module provides the rectangle arithmetic the placement engine is built
//! on: positions, footprints, and axis-aligned bounds with the overlap,
//! distance and contact queries used by constraint checking and scoring.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in site space
//! - [`Size`] - Width and height of a unit footprint
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner of the site at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! # Tolerance
//!
//! Placements are computed by summing `f32` offsets, so comparisons that decide
//! feasibility ([`Bounds::intersects`], [`Bounds::contains`]) allow a slack of
//! [`TOLERANCE`]. Rectangles that merely share an edge never intersect.

/// Slack applied to feasibility comparisons.
pub const TOLERANCE: f32 = 1e-4;

/// A 2D point representing a position in site coordinate space.
///
/// # Examples
///
/// ```
/// # use siteplan_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(13.0, 24.0);
///
/// assert_eq!(p1.distance(p2), 5.0);
/// assert_eq!(p1.midpoint(p2).x(), 11.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the Euclidean length of the point taken as a vector
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Calculates the Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Creates [`Bounds`] whose top-left corner is this point.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_top_left(self, size)
    }
}

/// Width and height of a rectangular footprint.
///
/// # Examples
///
/// ```
/// # use siteplan_core::geometry::Size;
/// let size = Size::new(4.0, 3.0);
/// assert_eq!(size.area(), 12.0);
/// assert_eq!(size.transpose(), Size::new(3.0, 4.0));
/// assert!(size.fits_within(Size::new(4.0, 3.0)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height
    pub fn height(self) -> f32 {
        self.height
    }

    pub fn area(self) -> f32 {
        self.width * self.height
    }

    /// Returns the size with width and height swapped.
    pub fn transpose(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Returns true if both dimensions are finite and strictly positive.
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Returns true if this size fits inside `outer` without rotation.
    pub fn fits_within(self, outer: Size) -> bool {
        self.width <= outer.width + TOLERANCE && self.height <= outer.height + TOLERANCE
    }
}

/// An axis-aligned rectangle defined by minimum and maximum coordinates.
///
/// # Examples
///
/// ```
/// # use siteplan_core::geometry::{Bounds, Point, Size};
/// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(4.0, 3.0));
/// let b = Bounds::new_from_top_left(Point::new(4.0, 0.0), Size::new(2.0, 2.0));
///
/// // Sharing an edge is contact, not overlap.
/// assert!(!a.intersects(&b));
/// assert_eq!(a.edge_distance(&b), 0.0);
/// assert_eq!(a.contact_length(&b), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from the top-left corner and a size.
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x(),
            min_y: top_left.y(),
            max_x: top_left.x() + size.width(),
            max_y: top_left.y() + size.height(),
        }
    }

    /// Creates bounds centered on a point.
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width() / 2.0;
        let half_height = size.height() / 2.0;
        Self {
            min_x: center.x() - half_width,
            min_y: center.y() - half_height,
            max_x: center.x() + half_width,
            max_y: center.y() + half_height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn area(self) -> f32 {
        self.width() * self.height()
    }

    /// Returns the top-left corner.
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns the smallest bounds enclosing both rectangles.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x(),
            min_y: self.min_y + offset.y(),
            max_x: self.max_x + offset.x(),
            max_y: self.max_y + offset.y(),
        }
    }

    /// Returns true if the interiors of both rectangles overlap.
    ///
    /// Rectangles that only touch along an edge or a corner do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x - TOLERANCE
            && other.min_x < self.max_x - TOLERANCE
            && self.min_y < other.max_y - TOLERANCE
            && other.min_y < self.max_y - TOLERANCE
    }

    /// Returns true if `other` lies entirely inside these bounds.
    pub fn contains(&self, other: &Self) -> bool {
        other.min_x >= self.min_x - TOLERANCE
            && other.min_y >= self.min_y - TOLERANCE
            && other.max_x <= self.max_x + TOLERANCE
            && other.max_y <= self.max_y + TOLERANCE
    }

    /// Area shared by both rectangles, zero when they do not overlap.
    pub fn overlap_area(&self, other: &Self) -> f32 {
        let width = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let height = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        if width <= 0.0 || height <= 0.0 {
            return 0.0;
        }
        width * height
    }

    /// Shortest distance between the edges of both rectangles.
    ///
    /// Zero when the rectangles touch or overlap. For rectangles separated
    /// diagonally this is the distance between the nearest corners.
    pub fn edge_distance(&self, other: &Self) -> f32 {
        let dx = (self.min_x - other.max_x).max(other.min_x - self.max_x).max(0.0);
        let dy = (self.min_y - other.max_y).max(other.min_y - self.max_y).max(0.0);
        dx.hypot(dy)
    }

    /// Length of the shared edge when the rectangles touch side to side.
    pub fn contact_length(&self, other: &Self) -> f32 {
        let touch_x = (self.max_x - other.min_x).abs() <= TOLERANCE
            || (other.max_x - self.min_x).abs() <= TOLERANCE;
        let touch_y = (self.max_y - other.min_y).abs() <= TOLERANCE
            || (other.max_y - self.min_y).abs() <= TOLERANCE;

        let shared_y = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        let shared_x = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);

        let mut contact: f32 = 0.0;
        if touch_x && shared_y > 0.0 {
            contact = contact.max(shared_y);
        }
        if touch_y && shared_x > 0.0 {
            contact = contact.max(shared_x);
        }
        contact
    }

    /// Distance between the centers of both rectangles.
    pub fn center_distance(&self, other: &Self) -> f32 {
        self.center().distance(other.center())
    }

    /// Shortest distance from the rectangle to any edge of `outer`.
    ///
    /// Negative when the rectangle sticks out of `outer`.
    pub fn inset_within(&self, outer: &Self) -> f32 {
        (self.min_x - outer.min_x)
            .min(self.min_y - outer.min_y)
            .min(outer.max_x - self.max_x)
            .min(outer.max_y - self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
        assert_eq!(p2.distance(p1), 5.0);
    }

    #[test]
    fn test_point_add_sub() {
        let p1 = Point::new(5.0, 8.0);
        let p2 = Point::new(2.0, 3.0);
        assert_eq!(p1.add_point(p2), Point::new(7.0, 11.0));
        assert_eq!(p1.sub_point(p2), Point::new(3.0, 5.0));
    }

    #[test]
    fn test_size_transpose_and_area() {
        let size = Size::new(4.0, 3.0);
        assert_eq!(size.transpose(), Size::new(3.0, 4.0));
        assert_eq!(size.area(), 12.0);
        assert_eq!(size.transpose().area(), 12.0);
    }

    #[test]
    fn test_size_is_positive() {
        assert!(Size::new(1.0, 1.0).is_positive());
        assert!(!Size::new(0.0, 1.0).is_positive());
        assert!(!Size::new(1.0, -2.0).is_positive());
        assert!(!Size::new(f32::NAN, 1.0).is_positive());
        assert!(!Size::new(f32::INFINITY, 1.0).is_positive());
    }

    #[test]
    fn test_size_fits_within() {
        let site = Size::new(30.0, 20.0);
        assert!(Size::new(30.0, 20.0).fits_within(site));
        assert!(Size::new(4.0, 3.0).fits_within(site));
        assert!(!Size::new(31.0, 3.0).fits_within(site));
        assert!(!Size::new(4.0, 21.0).fits_within(site));
    }

    #[test]
    fn test_bounds_new_from_top_left() {
        let bounds = rect(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bounds.min_x(), 10.0);
        assert_eq!(bounds.min_y(), 20.0);
        assert_eq!(bounds.max_x(), 40.0);
        assert_eq!(bounds.max_y(), 60.0);
        assert_eq!(bounds.width(), 30.0);
        assert_eq!(bounds.height(), 40.0);
        assert_eq!(bounds.area(), 1200.0);
        assert_eq!(bounds.min_point(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_bounds_new_from_center() {
        let bounds = Bounds::new_from_center(Point::new(50.0, 60.0), Size::new(20.0, 30.0));
        assert_eq!(bounds.min_x(), 40.0);
        assert_eq!(bounds.min_y(), 45.0);
        assert_eq!(bounds.center(), Point::new(50.0, 60.0));
    }

    #[test]
    fn test_bounds_merge() {
        let merged = rect(1.0, 2.0, 4.0, 4.0).merge(&rect(3.0, 0.0, 5.0, 4.0));
        assert_eq!(merged, rect(1.0, 0.0, 7.0, 6.0));
    }

    #[test]
    fn test_bounds_translate() {
        let translated = rect(1.0, 2.0, 4.0, 4.0).translate(Point::new(3.0, -1.0));
        assert_eq!(translated, rect(4.0, 1.0, 4.0, 4.0));
    }

    #[test]
    fn test_intersects_overlapping() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        let b = rect(2.0, 2.0, 4.0, 4.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_touching_is_not_overlap() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        assert!(!a.intersects(&rect(4.0, 0.0, 2.0, 2.0)));
        assert!(!a.intersects(&rect(0.0, 4.0, 2.0, 2.0)));
        assert!(!a.intersects(&rect(4.0, 4.0, 2.0, 2.0)));
    }

    #[test]
    fn test_intersects_contained() {
        let outer = rect(0.0, 0.0, 10.0, 10.0);
        let inner = rect(2.0, 2.0, 1.0, 1.0);
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_contains() {
        let site = rect(0.0, 0.0, 30.0, 20.0);
        assert!(site.contains(&rect(0.0, 0.0, 30.0, 20.0)));
        assert!(site.contains(&rect(26.0, 17.0, 4.0, 3.0)));
        assert!(!site.contains(&rect(27.0, 17.0, 4.0, 3.0)));
        assert!(!site.contains(&rect(-1.0, 0.0, 4.0, 3.0)));
    }

    #[test]
    fn test_overlap_area() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(a.overlap_area(&rect(2.0, 2.0, 4.0, 4.0)), 4.0);
        assert_eq!(a.overlap_area(&rect(4.0, 0.0, 4.0, 4.0)), 0.0);
        assert_eq!(a.overlap_area(&rect(10.0, 10.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_edge_distance() {
        let a = rect(0.0, 0.0, 4.0, 3.0);
        assert_eq!(a.edge_distance(&rect(4.0, 0.0, 4.0, 3.0)), 0.0);
        assert_eq!(a.edge_distance(&rect(9.0, 0.0, 4.0, 3.0)), 5.0);
        assert_eq!(a.edge_distance(&rect(0.0, 5.0, 4.0, 3.0)), 2.0);
        // Diagonal: dx = 3, dy = 4
        assert_eq!(a.edge_distance(&rect(7.0, 7.0, 1.0, 1.0)), 5.0);
        assert_eq!(a.edge_distance(&rect(1.0, 1.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_contact_length() {
        let a = rect(0.0, 0.0, 4.0, 3.0);
        assert_eq!(a.contact_length(&rect(4.0, 1.0, 4.0, 3.0)), 2.0);
        assert_eq!(a.contact_length(&rect(1.0, 3.0, 2.0, 2.0)), 2.0);
        assert_eq!(a.contact_length(&rect(4.0, 3.0, 2.0, 2.0)), 0.0);
        assert_eq!(a.contact_length(&rect(5.0, 0.0, 2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_center_distance() {
        let a = rect(0.0, 0.0, 4.0, 4.0);
        let b = rect(3.0, 4.0, 4.0, 4.0);
        assert_eq!(a.center_distance(&b), 5.0);
    }

    #[test]
    fn test_inset_within() {
        let site = rect(0.0, 0.0, 30.0, 20.0);
        assert_eq!(rect(5.0, 2.0, 4.0, 3.0).inset_within(&site), 2.0);
        assert_eq!(rect(0.0, 2.0, 4.0, 3.0).inset_within(&site), 0.0);
        assert_eq!(rect(28.0, 2.0, 4.0, 3.0).inset_within(&site), -2.0);
    }
}
