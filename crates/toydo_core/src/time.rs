//! Fixed-step simulation time
//!
//! Fixed 60Hz tick rate with interpolation for rendering. Raw frame deltas
//! are clamped, accumulated and drained in whole ticks; the leftover is the
//! interpolation alpha.

/// Fixed simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION_MS: f32 = 1000.0 / TICK_RATE_HZ as f32;

/// Largest frame delta the world will accept in one call.
pub const MAX_FRAME_DELTA_MS: f32 = 32.0;

/// Clamp a raw frame delta into `[0, MAX_FRAME_DELTA_MS]`. Non-finite and
/// negative deltas count as zero.
pub fn clamp_delta(delta_ms: f32) -> f32 {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        0.0
    } else {
        delta_ms.min(MAX_FRAME_DELTA_MS)
    }
}

/// Simulation time tracker
#[derive(Debug, Clone)]
pub struct SimulationTime {
    tick_count: u64,
    accumulator_ms: f32,
    total_ms: f64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            accumulator_ms: 0.0,
            total_ms: 0.0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Feed a raw frame delta and return how many fixed ticks are owed.
    pub fn accumulate(&mut self, delta_ms: f32) -> u32 {
        self.accumulator_ms += clamp_delta(delta_ms);

        let mut ticks = 0;
        while self.accumulator_ms >= TICK_DURATION_MS {
            self.accumulator_ms -= TICK_DURATION_MS;
            self.advance_tick();
            ticks += 1;
        }
        ticks
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        self.total_ms += TICK_DURATION_MS as f64;
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        (self.accumulator_ms / TICK_DURATION_MS).clamp(0.0, 1.0)
    }

    pub fn total_time_ms(&self) -> f64 {
        self.total_ms
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_tick_per_tick_duration() {
        let mut time = SimulationTime::new();
        assert_eq!(time.accumulate(TICK_DURATION_MS), 1);
        assert_eq!(time.tick_count(), 1);
        assert!(time.alpha() < 1e-3);
    }

    #[test]
    fn stall_is_clamped() {
        let mut stalled = SimulationTime::new();
        let mut capped = SimulationTime::new();
        assert_eq!(stalled.accumulate(500.0), capped.accumulate(MAX_FRAME_DELTA_MS));
        assert_eq!(stalled.alpha(), capped.alpha());
    }

    #[test]
    fn leftover_becomes_alpha() {
        let mut time = SimulationTime::new();
        assert_eq!(time.accumulate(TICK_DURATION_MS * 0.5), 0);
        assert!((time.alpha() - 0.5).abs() < 1e-4);
        assert_eq!(time.accumulate(TICK_DURATION_MS * 0.5), 1);
    }

    #[test]
    fn garbage_deltas_are_ignored() {
        assert_eq!(clamp_delta(f32::NAN), 0.0);
        assert_eq!(clamp_delta(-5.0), 0.0);
        assert_eq!(clamp_delta(f32::INFINITY), 0.0);
    }
}
