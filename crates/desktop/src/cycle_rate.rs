use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(2);

/// Applied detection cycles per second over a sliding window.
#[derive(Debug, Default)]
pub struct CycleRate {
    stamps: VecDeque<Instant>,
}

impl CycleRate {
    pub fn record(&mut self, now: Instant) {
        self.stamps.push_back(now);
        self.prune(now);
    }

    /// Rate over the samples still inside the window at `now`.
    pub fn per_second(&self, now: Instant) -> Option<f64> {
        let recent: Vec<Instant> = self
            .stamps
            .iter()
            .copied()
            .filter(|&s| now.duration_since(s) <= WINDOW)
            .collect();
        let (first, last) = (*recent.first()?, *recent.last()?);
        let span = last.duration_since(first).as_secs_f64();
        if recent.len() < 2 || span <= 0.0 {
            return None;
        }
        Some((recent.len() - 1) as f64 / span)
    }

    pub fn reset(&mut self) {
        self.stamps.clear();
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.duration_since(oldest) > WINDOW {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }
}
