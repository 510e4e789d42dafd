//! Layout, physics and interaction tuning.
//!
//! The constants are the source of truth. [`Tuning`] mirrors them as a
//! serde struct whose `Default` is exactly the constants, so a host can
//! ship an override file without the core reading any global state.
//!
//! Physics units follow the canvas: positions in canvas units (points),
//! time in milliseconds, forces in `mass * units / ms²`.

use serde::{Deserialize, Serialize};

/// Thickness of the static walls surrounding the canvas.
pub const WALL_THICKNESS: f32 = 50.0;
/// Radius of a bubble marker.
pub const BUBBLE_RADIUS: f32 = 32.5;
/// Nominal radius of a block body.
pub const BLOCK_RADIUS: f32 = 36.0;
/// Extra room between the largest item and the canvas edge.
pub const EDGE_PADDING: f32 = 17.5;
/// Minimum distance between two layout slots.
pub const MIN_ITEM_DISTANCE: f32 = 100.0;

/// Upward force per unit area on bubbles that have not settled.
pub const BUOYANCY: f32 = 1.5e-6;
/// Pull toward the target, per unit of distance and mass.
pub const ATTRACTION_STRENGTH: f32 = 1.0e-5;
/// Pull toward the target once within [`SETTLE_DISTANCE`].
pub const STABILIZING_STRENGTH: f32 = 2.0e-3;
/// Distance under which a body counts as arrived at its target.
pub const SETTLE_DISTANCE: f32 = 10.0;
/// Random force per unit area applied to settled bodies.
pub const JITTER_STRENGTH: f32 = 5.0e-8;
/// Downward acceleration in block mode (units / ms²).
pub const BLOCK_GRAVITY: f32 = 1.0e-3;

pub const DRAG_STIFFNESS: f32 = 0.1;
pub const DRAG_DAMPING: f32 = 0.1;

/// A press shorter than this (ms) may be a tap.
pub const TAP_MAX_DURATION_MS: f32 = 300.0;
/// A press moving less than this (units) may be a tap.
pub const TAP_MAX_DISTANCE: f32 = 10.0;

pub const TARGET_FPS: u32 = 60;
pub const DEFAULT_SEED: u64 = 0x70_79_64_6f;

/// Presentation of the uncompleted tasks on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Markers that float up to sampled target points and stay there.
    #[default]
    Bubble,
    /// Colliding rigid bodies under gravity that can be dragged around.
    Block,
}

impl LayoutMode {
    pub fn is_draggable(self) -> bool {
        matches!(self, LayoutMode::Block)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub wall_thickness: f32,
    pub bubble_radius: f32,
    pub block_radius: f32,
    pub edge_padding: f32,
    pub min_item_distance: f32,
    pub buoyancy: f32,
    pub attraction_strength: f32,
    pub stabilizing_strength: f32,
    pub settle_distance: f32,
    pub jitter_strength: f32,
    pub block_gravity: f32,
    pub drag_stiffness: f32,
    pub drag_damping: f32,
    pub tap_max_duration_ms: f32,
    pub tap_max_distance: f32,
    pub target_fps: u32,
    pub seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            wall_thickness: WALL_THICKNESS,
            bubble_radius: BUBBLE_RADIUS,
            block_radius: BLOCK_RADIUS,
            edge_padding: EDGE_PADDING,
            min_item_distance: MIN_ITEM_DISTANCE,
            buoyancy: BUOYANCY,
            attraction_strength: ATTRACTION_STRENGTH,
            stabilizing_strength: STABILIZING_STRENGTH,
            settle_distance: SETTLE_DISTANCE,
            jitter_strength: JITTER_STRENGTH,
            block_gravity: BLOCK_GRAVITY,
            drag_stiffness: DRAG_STIFFNESS,
            drag_damping: DRAG_DAMPING,
            tap_max_duration_ms: TAP_MAX_DURATION_MS,
            tap_max_distance: TAP_MAX_DISTANCE,
            target_fps: TARGET_FPS,
            seed: DEFAULT_SEED,
        }
    }
}

impl Tuning {
    /// Distance kept between slot points and the canvas edge.
    pub fn margin(&self) -> f32 {
        self.bubble_radius.max(self.block_radius) + self.edge_padding
    }

    /// Minimum time between two stepped frames.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1) as f64
    }
}
