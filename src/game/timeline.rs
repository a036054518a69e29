//! Deterministic timer queue for one shot's resolution.
//!
//! Tasks are keyed by their due time plus an insertion counter, so tasks
//! due at the same instant run in the order they were scheduled. Nothing
//! ever sleeps: draining the queue jumps the clock from one task to the
//! next.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug)]
pub(super) struct Timeline<T> {
    queue: BTreeMap<(Duration, u64), T>,
    next_seq: u64,
    now: Duration,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
            now: Duration::ZERO,
        }
    }
}

impl<T> Timeline<T> {
    /// Time of the task currently running (or of the last one run).
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` at an absolute time. Times in the past run next.
    pub fn schedule_at(&mut self, at: Duration, task: T) {
        let at = at.max(self.now);
        self.queue.insert((at, self.next_seq), task);
        self.next_seq += 1;
    }

    pub fn schedule_after(&mut self, delay: Duration, task: T) {
        self.schedule_at(self.now + delay, task);
    }

    /// Take the earliest task and move the clock to its due time.
    pub fn pop(&mut self) -> Option<T> {
        let ((at, _), task) = self.queue.pop_first()?;
        self.now = at;
        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_in_time_then_insertion_order() {
        let mut timeline = Timeline::default();
        timeline.schedule_at(Duration::from_millis(30), "c");
        timeline.schedule_at(Duration::from_millis(10), "a");
        timeline.schedule_at(Duration::from_millis(10), "b");

        assert_eq!(timeline.pop(), Some("a"));
        assert_eq!(timeline.pop(), Some("b"));
        assert_eq!(timeline.now(), Duration::from_millis(10));
        assert_eq!(timeline.pop(), Some("c"));
        assert_eq!(timeline.now(), Duration::from_millis(30));
        assert!(timeline.pop().is_none());
    }

    #[test]
    fn test_schedule_after_is_relative_to_current_task() {
        let mut timeline = Timeline::default();
        timeline.schedule_at(Duration::from_millis(100), 1);
        assert_eq!(timeline.pop(), Some(1));

        timeline.schedule_after(Duration::from_millis(50), 2);
        timeline.schedule_at(Duration::ZERO, 3);
        assert_eq!(timeline.pop(), Some(3));
        assert_eq!(timeline.now(), Duration::from_millis(100));
        assert_eq!(timeline.pop(), Some(2));
        assert_eq!(timeline.now(), Duration::from_millis(150));
    }
}
