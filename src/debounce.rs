use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Ticks of quiet required after the last insertion before a sort fires.
pub const SORT_TICKS: u32 = 60;
/// Period of one tick when driven by [`crate::browser::spawn_sort_timer`].
pub const TICK_PERIOD: Duration = Duration::from_millis(16);

/// Countdown that batches bursts of catalog insertions into one sort.
///
/// `arm` resets the countdown to the full budget; `tick` counts it down and
/// reports `true` exactly once, on the tick that reaches zero. At zero the
/// debouncer is idle until armed again.
#[derive(Debug)]
pub struct SortDebouncer {
    budget: u32,
    remaining: AtomicU32,
}

impl Default for SortDebouncer {
    fn default() -> Self {
        Self::new(SORT_TICKS)
    }
}

impl SortDebouncer {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: AtomicU32::new(0),
        }
    }

    pub fn arm(&self) {
        self.remaining.store(self.budget, Ordering::SeqCst);
    }

    pub fn tick(&self) -> bool {
        let prev = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        matches!(prev, Ok(1))
    }

    pub fn is_idle(&self) -> bool {
        self.remaining.load(Ordering::SeqCst) == 0
    }
}
