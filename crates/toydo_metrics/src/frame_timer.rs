//! Frame interval tracking from platform timestamps

use super::ring_buffer::RingBuffer;

/// Rolling statistics over the interval between stepped frames.
///
/// Timestamps come from the platform frame callback (milliseconds, same
/// clock as `requestAnimationFrame`), not from `Instant`, so a paused
/// loop can drop its reference and avoid reporting one huge interval.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last_ms: Option<f64>,
    intervals: RingBuffer<f64>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            last_ms: None,
            intervals: RingBuffer::new(capacity),
        }
    }

    /// Record a stepped frame at `now_ms`.
    pub fn record(&mut self, now_ms: f64) {
        if let Some(last) = self.last_ms {
            let interval = now_ms - last;
            if interval.is_finite() && interval >= 0.0 {
                self.intervals.push(interval);
            }
        }
        self.last_ms = Some(now_ms);
    }

    /// Forget the previous timestamp (used when the loop resumes).
    pub fn reset_reference(&mut self) {
        self.last_ms = None;
    }

    pub fn fps(&self) -> f64 {
        let avg = self.intervals.average();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.intervals.average()
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        self.intervals.min_max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_from_steady_intervals() {
        let mut timer = FrameTimer::new(8);
        for i in 0..5 {
            timer.record(i as f64 * 20.0);
        }
        assert!((timer.frame_time_ms() - 20.0).abs() < 1e-9);
        assert!((timer.fps() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn reset_reference_skips_the_gap() {
        let mut timer = FrameTimer::new(8);
        timer.record(0.0);
        timer.record(10.0);
        timer.reset_reference();
        timer.record(5_000.0);
        timer.record(5_010.0);
        assert_eq!(timer.frame_time_range_ms(), (10.0, 10.0));
    }
}
