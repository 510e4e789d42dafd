//! ToyDo Metrics - frame pacing instrumentation for the canvas loop
//!
//! Tracks how often the render loop actually advanced the simulation and
//! at what interval, so throttling and suspension can be observed without
//! a profiler attached.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use toydo_metrics::{FrameCounter, FrameCounters, FrameTimer};
//!
//! let mut timer = FrameTimer::new(60); // Track last 60 stepped frames
//! let mut counters = FrameCounters::new();
//! timer.record(now_ms);
//! counters.increment(FrameCounter::Stepped);
//! println!("FPS: {:.1}", timer.fps());
//! ```
//!
//! Without the `metrics` feature every type below is a zero-sized stub.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use counter::FrameCounters;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

/// Events counted by the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameCounter {
    /// Frame callback that advanced the simulation.
    Stepped,
    /// Frame callback dropped by the frame-rate cap.
    Skipped,
    /// Platform refused to schedule the next frame.
    Stalled,
    /// Body frozen after a non-finite simulation result.
    Frozen,
}

impl FrameCounter {
    pub const ALL: [FrameCounter; 4] = [
        FrameCounter::Stepped,
        FrameCounter::Skipped,
        FrameCounter::Stalled,
        FrameCounter::Frozen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FrameCounter::Stepped => "stepped",
            FrameCounter::Skipped => "skipped",
            FrameCounter::Stalled => "stalled",
            FrameCounter::Frozen => "frozen",
        }
    }

    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Default)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn record(&mut self, _now_ms: f64) {}
    pub fn reset_reference(&mut self) {}
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Clone, Default)]
pub struct FrameCounters;

#[cfg(not(feature = "metrics"))]
impl FrameCounters {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _counter: FrameCounter) {}
    pub fn get(&self, _counter: FrameCounter) -> u64 { 0 }
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_names_are_unique() {
        let mut names: Vec<_> = FrameCounter::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FrameCounter::ALL.len());
    }

    #[test]
    fn api_is_available_with_or_without_metrics() {
        let mut timer = FrameTimer::new(60);
        timer.record(0.0);
        timer.record(16.0);
        let mut counters = FrameCounters::new();
        counters.increment(FrameCounter::Stepped);
        assert!(timer.fps() >= 0.0);
    }
}
