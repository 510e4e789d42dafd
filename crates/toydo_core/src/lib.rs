//! ToyDo Canvas Core
//!
//! Turns a flat task list into a living canvas:
//! - Poisson-disk slot sampling
//! - Rigid-body physics with walls, drag and target forces
//! - Task ↔ entity reconciliation for bubble and block layouts
//! - Fixed-step time and a throttled, pausable frame loop

pub mod binder;
pub mod config;
pub mod driver;
pub mod math;
pub mod physics;
pub mod sampler;
pub mod scene;
pub mod task;
pub mod time;

pub use glam;

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
