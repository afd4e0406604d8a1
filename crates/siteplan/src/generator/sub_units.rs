//! Greedy placement of sub units around an existing layout.

use std::cmp::Reverse;

use log::{debug, trace};

use siteplan_core::{
    geometry::{Bounds, Point, Size, TOLERANCE},
    identifier::SpaceId,
    placement::{Direction, Placement, PlacementState, Rotation},
    site::{BuildingType, FixedZone, Space},
};

use super::LayoutGenerator;

/// A feasible position for one sub unit.
#[derive(Debug, Clone, Copy)]
struct Slot {
    bounds: Bounds,
    rotation: Rotation,
    score: f32,
    distance: f32,
}

impl Slot {
    fn beats(&self, other: &Slot) -> bool {
        if self.score > other.score + TOLERANCE {
            return true;
        }
        (self.score - other.score).abs() <= TOLERANCE && self.distance < other.distance - TOLERANCE
    }
}

impl LayoutGenerator<'_> {
    /// Places every sub unit into `state`.
    ///
    /// Sub units go in order of their strongest adjacency to a main unit.
    /// Each one takes the best free slot flush against something already
    /// placed or against a fixed zone; if none is free, a grid over the site is
    /// tried. Units with no free slot at all are recorded as unplaced.
    pub fn place_sub_units(&self, state: &mut PlacementState) {
        let mains: Vec<SpaceId> = self.spaces.mains().iter().map(Space::id).collect();
        let mut order: Vec<&Space> = self.spaces.subs().iter().collect();
        order.sort_by_key(|sub| {
            Reverse(
                self.adjacency
                    .strongest_weight(sub.id(), mains.iter().copied()),
            )
        });

        for sub in order {
            match self.best_slot(sub, state) {
                Some(slot) => {
                    trace!(
                        unit = sub.id().as_string(),
                        x = slot.bounds.min_x(),
                        y = slot.bounds.min_y();
                        "Sub unit placed"
                    );
                    state.insert(Placement::new(
                        sub.id(),
                        BuildingType::Sub,
                        slot.bounds,
                        slot.rotation,
                    ));
                }
                None => {
                    debug!(unit = sub.id().as_string(); "No free slot for sub unit");
                    state.mark_unplaced(sub.id());
                }
            }
        }
    }

    fn best_slot(&self, sub: &Space, state: &PlacementState) -> Option<Slot> {
        let obstacles: Vec<Bounds> = state
            .iter()
            .map(Placement::bounds)
            .chain(self.zones.iter().map(FixedZone::bounds))
            .collect();
        let target = self.open_space_center(state);

        let mut candidates: Vec<(Bounds, Rotation)> = self
            .flush_slots(sub.size(), &obstacles)
            .into_iter()
            .filter(|(bounds, _)| self.is_free(bounds, &obstacles))
            .collect();
        if candidates.is_empty() {
            candidates = self
                .grid_slots(sub.size())
                .into_iter()
                .filter(|(bounds, _)| self.is_free(bounds, &obstacles))
                .collect();
        }

        let mut best: Option<Slot> = None;
        for (bounds, rotation) in candidates {
            let slot = Slot {
                bounds,
                rotation,
                score: self.slot_score(sub.id(), bounds, state),
                distance: bounds.center().distance(target),
            };
            if best.as_ref().is_none_or(|current| slot.beats(current)) {
                best = Some(slot);
            }
        }
        best
    }

    /// Positions flush against every obstacle, aligned with either end of the
    /// shared edge.
    fn flush_slots(&self, size: Size, obstacles: &[Bounds]) -> Vec<(Bounds, Rotation)> {
        let mut slots = Vec::new();
        for reference in obstacles {
            for direction in Direction::ALL {
                for &rotation in self.rotations() {
                    let rotated = rotation.apply(size);
                    for position in flush_positions(*reference, rotated, direction) {
                        slots.push((position.to_bounds(rotated), rotation));
                    }
                }
            }
        }
        slots
    }

    fn grid_slots(&self, size: Size) -> Vec<(Bounds, Rotation)> {
        let site = self.spaces.site();
        let step = self
            .config
            .sub_grid_step()
            .unwrap_or_else(|| site.width().min(site.height()) / 10.0)
            .max(TOLERANCE * 10.0);

        let mut slots = Vec::new();
        for &rotation in self.rotations() {
            let rotated = rotation.apply(size);
            for y in grid_axis(site.height(), rotated.height(), step) {
                for x in grid_axis(site.width(), rotated.width(), step) {
                    slots.push((Point::new(x, y).to_bounds(rotated), rotation));
                }
            }
        }
        slots
    }

    fn is_free(&self, bounds: &Bounds, obstacles: &[Bounds]) -> bool {
        self.spaces.site().bounds().contains(bounds)
            && !obstacles.iter().any(|obstacle| obstacle.intersects(bounds))
    }

    /// Adjacency score of a slot against every rated, already placed unit.
    fn slot_score(&self, id: SpaceId, bounds: Bounds, state: &PlacementState) -> f32 {
        state
            .iter()
            .filter_map(|placed| {
                self.adjacency
                    .get(id, placed.id())
                    .map(|weight| weight.score(bounds.edge_distance(&placed.bounds())))
            })
            .sum()
    }

    /// Center of the site's free area, approximated by mirroring the occupied
    /// centroid halfway through the site center.
    fn open_space_center(&self, state: &PlacementState) -> Point {
        let site = self.spaces.site();
        let center = site.center();
        let occupied = state.occupied_area();
        if occupied <= 0.0 {
            return center;
        }

        let (sum_x, sum_y) = state.iter().fold((0.0, 0.0), |(x, y), placed| {
            let bounds = placed.bounds();
            let c = bounds.center();
            (x + c.x() * bounds.area(), y + c.y() * bounds.area())
        });
        let centroid = Point::new(sum_x / occupied, sum_y / occupied);
        let shifted = Point::new(
            center.x() + (center.x() - centroid.x()) / 2.0,
            center.y() + (center.y() - centroid.y()) / 2.0,
        );
        Point::new(
            shifted.x().clamp(0.0, site.width()),
            shifted.y().clamp(0.0, site.height()),
        )
    }
}

fn flush_positions(reference: Bounds, size: Size, direction: Direction) -> [Point; 2] {
    let first = direction.attach(reference, size, 0.0);
    let second = match direction {
        Direction::Bottom | Direction::Top => Point::new(reference.max_x() - size.width(), first.y()),
        Direction::Right | Direction::Left => Point::new(first.x(), reference.max_y() - size.height()),
    };
    [first, second]
}

/// Grid offsets along one axis, always including the far edge.
fn grid_axis(extent: f32, side: f32, step: f32) -> Vec<f32> {
    let last = extent - side;
    if last < -TOLERANCE {
        return Vec::new();
    }
    let last = last.max(0.0);

    let mut offsets = Vec::new();
    let mut offset = 0.0;
    while offset < last - TOLERANCE {
        offsets.push(offset);
        offset += step;
    }
    offsets.push(last);
    offsets
}
