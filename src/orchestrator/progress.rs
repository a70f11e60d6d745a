//! Progress event throttling: emit at most once per 250ms or every 64
//! new matches, whichever comes first (spec.md §4.4, §4.5).

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub matches_so_far: u64,
    pub searchers_completed: usize,
    pub searchers_total: usize,
}

pub struct ProgressThrottle {
    last_emit: Instant,
    last_count: u64,
    interval: Duration,
    count_step: u64,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self {
            last_emit: Instant::now(),
            last_count: 0,
            interval: Duration::from_millis(250),
            count_step: 64,
        }
    }

    pub fn should_emit(&mut self, current_count: u64) -> bool {
        let due = self.last_emit.elapsed() >= self.interval
            || current_count.saturating_sub(self.last_count) >= self.count_step;
        if due {
            self.last_emit = Instant::now();
            self.last_count = current_count;
        }
        due
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new()
    }
}
