//! Bridson Poisson-disk fill.

use crate::math::{Rect, SimRng, Vec2};
use rand::Rng;
use std::f32::consts::{SQRT_2, TAU};

/// Candidates tried around each active point before it is retired.
pub const SAMPLER_ATTEMPTS: u32 = 30;

/// Background grid for O(1) neighbour rejection. Cells are `d / √2` wide so
/// each holds at most one accepted point.
struct BackgroundGrid {
    origin: Vec2,
    cell: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Option<Vec2>>,
}

impl BackgroundGrid {
    fn new(region: Rect, min_distance: f32) -> Self {
        let cell = min_distance / SQRT_2;
        let cols = (region.width() / cell).floor() as usize + 1;
        let rows = (region.height() / cell).floor() as usize + 1;
        Self {
            origin: region.min,
            cell,
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    fn coord(&self, p: Vec2) -> (usize, usize) {
        let local = (p - self.origin) / self.cell;
        let cx = (local.x.max(0.0) as usize).min(self.cols - 1);
        let cy = (local.y.max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn insert(&mut self, p: Vec2) {
        let (cx, cy) = self.coord(p);
        self.cells[cy * self.cols + cx] = Some(p);
    }

    /// True if no stored point lies within `min_distance` of `p`.
    fn is_clear(&self, p: Vec2, min_distance: f32) -> bool {
        let (cx, cy) = self.coord(p);
        let d2 = min_distance * min_distance;
        let x0 = cx.saturating_sub(2);
        let y0 = cy.saturating_sub(2);
        let x1 = (cx + 2).min(self.cols - 1);
        let y1 = (cy + 2).min(self.rows - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(q) = self.cells[y * self.cols + x] {
                    if q.distance_squared(p) < d2 {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn clear_of(occupied: &[Vec2], p: Vec2, min_distance: f32) -> bool {
    let d2 = min_distance * min_distance;
    occupied.iter().all(|q| q.distance_squared(p) >= d2)
}

fn random_in(rng: &mut SimRng, region: Rect) -> Vec2 {
    Vec2::new(
        region.min.x + rng.random::<f32>() * region.width(),
        region.min.y + rng.random::<f32>() * region.height(),
    )
}

/// Fill `region` with points at least `min_distance` apart from each other
/// and from every point in `occupied`. Occupied points inside the region
/// seed the fill so it grows around them. Output is in generation order.
pub fn fill(rng: &mut SimRng, region: Rect, min_distance: f32, occupied: &[Vec2]) -> Vec<Vec2> {
    if region.is_empty() {
        return Vec::new();
    }
    let min_distance = super::sanitize_distance(min_distance);

    let mut grid = BackgroundGrid::new(region, min_distance);
    let mut points = Vec::new();
    let mut active: Vec<Vec2> = occupied
        .iter()
        .copied()
        .filter(|p| region.contains(*p))
        .collect();

    // One free seed so an empty canvas (or one with a gap far from every
    // occupied point) still gets filled.
    for _ in 0..SAMPLER_ATTEMPTS {
        let p = random_in(rng, region);
        if clear_of(occupied, p, min_distance) {
            grid.insert(p);
            points.push(p);
            active.push(p);
            break;
        }
    }

    while !active.is_empty() {
        let pick = rng.random_range(0..active.len());
        let source = active[pick];
        let mut found = false;

        for _ in 0..SAMPLER_ATTEMPTS {
            let angle = rng.random::<f32>() * TAU;
            let radius = min_distance * (1.0 + rng.random::<f32>());
            let candidate = source + Vec2::from_angle(angle) * radius;
            if region.contains(candidate)
                && grid.is_clear(candidate, min_distance)
                && clear_of(occupied, candidate, min_distance)
            {
                grid.insert(candidate);
                points.push(candidate);
                active.push(candidate);
                found = true;
                break;
            }
        }

        if !found {
            active.swap_remove(pick);
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::seeded_rng;

    fn region() -> Rect {
        Rect::new(Vec2::new(0.0, 0.0), Vec2::new(300.0, 600.0))
    }

    #[test]
    fn fill_respects_occupied_points() {
        let mut rng = seeded_rng(3);
        let occupied = [Vec2::new(150.0, 300.0), Vec2::new(20.0, 20.0)];
        let points = fill(&mut rng, region(), 80.0, &occupied);
        assert!(!points.is_empty());
        for p in &points {
            for q in &occupied {
                assert!(p.distance(*q) >= 80.0);
            }
        }
    }

    #[test]
    fn empty_region_yields_nothing() {
        let mut rng = seeded_rng(3);
        let empty = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(5.0, 5.0));
        assert!(fill(&mut rng, empty, 10.0, &[]).is_empty());
    }

    #[test]
    fn degenerate_region_still_takes_one_point() {
        let dot = Rect::new(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        let points = fill(&mut seeded_rng(3), dot, 50.0, &[]);
        assert_eq!(points, vec![Vec2::new(5.0, 5.0)]);
    }

    #[test]
    fn fill_is_reproducible_for_a_seed() {
        let a = fill(&mut seeded_rng(11), region(), 60.0, &[]);
        let b = fill(&mut seeded_rng(11), region(), 60.0, &[]);
        assert_eq!(a, b);
    }
}
