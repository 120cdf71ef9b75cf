use serde::{Deserialize, Serialize};

use super::todo::Todo;

/// Summary counters shown above the list.
///
/// Counters are derived locally from mutation outcomes between page loads.
/// Every transition preserves `completed + pending == total`: a step that
/// would need a bucket to go below zero means the counters are stale, and
/// is skipped rather than guessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub pending: u64,
    /// Informational, only refreshed on page load
    #[serde(default)]
    pub month_total: u64,
}

impl Stats {
    pub fn new(total: u64, completed: u64, pending: u64) -> Self {
        Self {
            total,
            completed,
            pending,
            month_total: 0,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.completed + self.pending == self.total
    }

    /// Rounded completion percentage, 0 for an empty list
    pub fn completion_rate(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let rate = (self.completed as f64 / self.total as f64 * 100.0).round();
        rate.clamp(0.0, 100.0) as u8
    }

    pub fn on_create(self, created: &Todo) -> Self {
        let mut next = self;
        next.total += 1;
        if created.is_finished {
            next.completed += 1;
        } else {
            next.pending += 1;
        }
        next
    }

    /// `deleted` is the client copy of the removed record; `None` leaves
    /// the counters untouched.
    pub fn on_delete(self, deleted: Option<&Todo>) -> Self {
        let Some(deleted) = deleted else {
            return self;
        };

        let mut next = self;
        let bucket = if deleted.is_finished {
            &mut next.completed
        } else {
            &mut next.pending
        };
        match (bucket.checked_sub(1), self.total.checked_sub(1)) {
            (Some(remaining), Some(total)) => {
                *bucket = remaining;
                next.total = total;
                next
            }
            _ => self,
        }
    }

    /// Move one unit between buckets when the finished flag changed.
    /// Without the previous copy the direction is unknown, so nothing moves.
    pub fn on_toggle_or_update(self, old: Option<&Todo>, new: &Todo) -> Self {
        let Some(old) = old else {
            return self;
        };
        if old.is_finished == new.is_finished {
            return self;
        }

        let mut next = self;
        if new.is_finished {
            match next.pending.checked_sub(1) {
                Some(pending) => {
                    next.pending = pending;
                    next.completed += 1;
                }
                None => return self,
            }
        } else {
            match next.completed.checked_sub(1) {
                Some(completed) => {
                    next.completed = completed;
                    next.pending += 1;
                }
                None => return self,
            }
        }
        next
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total {} | done {} | pending {} | this month {} | {}% complete",
            self.total,
            self.completed,
            self.pending,
            self.month_total,
            self.completion_rate()
        )
    }
}
