/// Monotonic per-frame time source
use std::time::{Duration, Instant};

/// Measures the time between consecutive frames
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_tick: Instant,
    total: Duration,
    frames: u64,
}

impl FrameClock {
    /// The first [`tick`](Self::tick) measures from here
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            last_tick: start,
            total: Duration::ZERO,
            frames: 0,
        }
    }

    /// Time elapsed since the previous tick
    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Self::tick) with an explicit sample, never goes backwards
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = self.last_tick.max(now);
        self.total += delta;
        self.frames += 1;
        delta
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
