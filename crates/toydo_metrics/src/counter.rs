//! Per-loop frame event counters

use crate::FrameCounter;

#[derive(Debug, Clone, Default)]
pub struct FrameCounters {
    counts: [u64; FrameCounter::ALL.len()],
}

impl FrameCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, counter: FrameCounter) {
        self.counts[counter.slot()] += 1;
    }

    pub fn get(&self, counter: FrameCounter) -> u64 {
        self.counts[counter.slot()]
    }

    pub fn reset(&mut self) {
        self.counts = [0; FrameCounter::ALL.len()];
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameCounter, u64)> + '_ {
        FrameCounter::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_independent() {
        let mut counters = FrameCounters::new();
        counters.increment(FrameCounter::Stepped);
        counters.increment(FrameCounter::Stepped);
        counters.increment(FrameCounter::Skipped);
        assert_eq!(counters.get(FrameCounter::Stepped), 2);
        assert_eq!(counters.get(FrameCounter::Skipped), 1);
        assert_eq!(counters.get(FrameCounter::Stalled), 0);

        counters.reset();
        assert!(counters.iter().all(|(_, n)| n == 0));
    }
}
