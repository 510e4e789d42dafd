//! Spatial sampler producing layout slots.
//!
//! A [`SpatialSampler`] fills the canvas (shrunk by a margin so items never
//! clip the edge) with blue-noise points at a minimum spacing, then hands
//! out the top-most ones. Slot order is ascending `y`, so index 0 is the
//! slot nearest the top of the screen.
//!
//! Asking for more points than fit is not an error: callers get every
//! point the fill produced and must render only that many items.
//!
//! Capacity is measured, not estimated: it is the largest full fill seen
//! for a spacing, and that layout is kept so a request for exactly the
//! capacity can always be met. A layout valid at one spacing is valid at
//! every narrower one, so capacity never grows with the spacing.

mod poisson;

pub use poisson::{fill, SAMPLER_ATTEMPTS};

use crate::math::{seeded_rng, Bounds, Rect, SimRng, Vec2};
use std::collections::BTreeMap;
use tracing::debug;

/// Spacing below which sampling is refused and clamped.
pub const MIN_SAMPLE_DISTANCE: f32 = 1.0;

/// Full fills tried when measuring capacity.
pub const CAPACITY_FILLS: usize = 4;

/// Keeps capacity fills apart from the slot sequence.
const CAPACITY_SEED_SALT: u64 = 0xca9a_c17e;

pub(crate) fn sanitize_distance(min_distance: f32) -> f32 {
    if min_distance.is_finite() {
        min_distance.max(MIN_SAMPLE_DISTANCE)
    } else {
        MIN_SAMPLE_DISTANCE
    }
}

/// Sort top-to-bottom, left-to-right for equal heights.
pub fn sort_top_down(points: &mut [Vec2]) {
    points.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
}

#[derive(Debug, Clone)]
pub struct SpatialSampler {
    bounds: Bounds,
    margin: f32,
    seed: u64,
    rng: SimRng,
    /// Largest fill seen per spacing, keyed by the spacing's bits. Spacings
    /// are positive, so bit order is numeric order.
    best_fills: BTreeMap<u32, Vec<Vec2>>,
}

impl SpatialSampler {
    pub fn new(bounds: Bounds, margin: f32, seed: u64) -> Self {
        Self {
            bounds,
            margin: margin.max(0.0),
            seed,
            rng: seeded_rng(seed),
            best_fills: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Region points are drawn from.
    pub fn region(&self) -> Rect {
        self.bounds.shrink(self.margin)
    }

    /// Update the canvas size. Measured capacities are dropped only when
    /// the size actually changed.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        if bounds != self.bounds {
            self.bounds = bounds;
            self.best_fills.clear();
        }
    }

    /// Up to `count` points, pairwise at least `min_distance` apart, sorted
    /// top-down.
    pub fn generate(&mut self, count: usize, min_distance: f32) -> Vec<Vec2> {
        self.extend(&[], count, min_distance)
    }

    /// Like [`generate`](Self::generate), but new points also keep
    /// `min_distance` from every point in `occupied`.
    pub fn extend(&mut self, occupied: &[Vec2], count: usize, min_distance: f32) -> Vec<Vec2> {
        if count == 0 || !self.bounds.is_valid() {
            return Vec::new();
        }

        let min_distance = sanitize_distance(min_distance);
        let region = self.region();
        let mut points = fill(&mut self.rng, region, min_distance, occupied);
        if occupied.is_empty() {
            points = self.keep_best(min_distance, points, count);
        }
        sort_top_down(&mut points);
        if points.len() < count {
            debug!(requested = count, placed = points.len(), min_distance, "canvas full, some items left unplaced");
        }
        points.truncate(count);
        points
    }

    /// Most points a fill of the region has produced at `min_distance`.
    /// Measured once per spacing until the bounds change, and raised when
    /// a later fill does better.
    pub fn max_capacity(&mut self, min_distance: f32) -> usize {
        let min_distance = sanitize_distance(min_distance);
        self.best_fill(min_distance).len()
    }

    fn best_fill(&mut self, min_distance: f32) -> &Vec<Vec2> {
        let key = min_distance.to_bits();
        if !self.best_fills.contains_key(&key) {
            let measured = self.measure(min_distance);
            let wider = self
                .best_fills
                .range(key..)
                .map(|(_, points)| points)
                .max_by_key(|points| points.len())
                .filter(|points| points.len() > measured.len())
                .cloned();
            self.record(min_distance, wider.unwrap_or(measured));
        }
        &self.best_fills[&key]
    }

    fn measure(&self, min_distance: f32) -> Vec<Vec2> {
        if !self.bounds.is_valid() {
            return Vec::new();
        }
        let region = self.region();
        let mut rng = seeded_rng(self.seed ^ CAPACITY_SEED_SALT);
        (0..CAPACITY_FILLS)
            .map(|_| fill(&mut rng, region, min_distance, &[]))
            .max_by_key(Vec::len)
            .unwrap_or_default()
    }

    /// Store `points` as the layout for `min_distance` and for every
    /// narrower spacing it beats.
    fn record(&mut self, min_distance: f32, points: Vec<Vec2>) {
        let key = min_distance.to_bits();
        for (_, best) in self.best_fills.range_mut(..key) {
            if points.len() > best.len() {
                best.clone_from(&points);
            }
        }
        self.best_fills.insert(key, points);
    }

    /// Record a fresh fill if it beats the best one, or fall back to the
    /// best one when the fresh fill cannot cover `count`.
    fn keep_best(&mut self, min_distance: f32, fresh: Vec<Vec2>, count: usize) -> Vec<Vec2> {
        let best = self.best_fill(min_distance).len();
        if fresh.len() > best {
            self.record(min_distance, fresh.clone());
            fresh
        } else if fresh.len() < count && best > fresh.len() {
            self.best_fill(min_distance).clone()
        } else {
            fresh
        }
    }
}
