//! Countdown timers.
//!
//! [`TimerService`] owns the active set and keeps it sorted by end time so
//! expiry collection only ever looks at the front. All deadlines use the
//! monotonic clock from `tokio::time`, which also lets tests pause time.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::TimerError;
use crate::intent::time_parser::parse_duration;

const DEFAULT_DESCRIPTION: &str = "your task";

/// Lifecycle of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Active,
    Expired,
    Cancelled,
}

impl TimerState {
    /// Only active timers may move, and only to a terminal state.
    pub fn can_transition_to(self, next: TimerState) -> bool {
        matches!(
            (self, next),
            (TimerState::Active, TimerState::Expired) | (TimerState::Active, TimerState::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub created_at: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Human readable duration, e.g. "1 hour 30 minutes".
    pub duration_label: String,
    pub description: String,
    pub state: TimerState,
}

impl Timer {
    fn finish(mut self, state: TimerState) -> Self {
        debug_assert!(self.state.can_transition_to(state));
        self.state = state;
        self
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.end_time.saturating_duration_since(now)
    }

    /// Short form used in cancellation messages.
    pub fn summary(&self) -> String {
        format!(
            "'{}' (ID: {}, duration: {})",
            self.description, self.id, self.duration_label
        )
    }
}

struct TimerBook {
    /// Sorted by `(end_time, id)`.
    active: Vec<Timer>,
    next_id: u64,
}

/// Thread-safe owner of all active timers.
pub struct TimerService {
    book: Mutex<TimerBook>,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    pub fn new() -> Self {
        Self {
            book: Mutex::new(TimerBook {
                active: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn book(&self) -> MutexGuard<'_, TimerBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `duration_text` and start a timer.
    ///
    /// Without a description the words left over from the duration are used,
    /// falling back to "your task".
    pub fn create(
        &self,
        duration_text: &str,
        description: Option<&str>,
    ) -> Result<Timer, TimerError> {
        let parsed = parse_duration(duration_text)?;
        let description = description
            .map(|d| d.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .or_else(|| Some(parsed.remainder.clone()).filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let duration = Duration::from_secs(parsed.seconds);
        let now = Instant::now();

        let mut book = self.book();
        let id = book.next_id;
        book.next_id += 1;
        let timer = Timer {
            id,
            created_at: now,
            end_time: now + duration,
            duration,
            duration_label: parsed.label,
            description,
            state: TimerState::Active,
        };
        let pos = book
            .active
            .partition_point(|t| (t.end_time, t.id) < (timer.end_time, timer.id));
        book.active.insert(pos, timer.clone());
        drop(book);

        tracing::info!(id, seconds = parsed.seconds, "Timer set");
        Ok(timer)
    }

    /// Cancel timers by id, by description, or the newest one.
    ///
    /// A numeric target matches an id exactly. Any other target removes every
    /// timer whose description contains it, ignoring case. Without a target
    /// the timer with the highest id is removed.
    pub fn cancel(&self, target: Option<&str>) -> Result<Vec<Timer>, TimerError> {
        let target = target.map(str::trim).filter(|t| !t.is_empty());
        let mut book = self.book();

        let removed: Vec<Timer> = match target {
            None => {
                let newest = book
                    .active
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, t)| t.id)
                    .map(|(i, _)| i)
                    .ok_or(TimerError::NotFound(None))?;
                vec![book.active.remove(newest)]
            }
            Some(t) => {
                let matches: Box<dyn Fn(&Timer) -> bool> = match t.parse::<u64>() {
                    Ok(id) => Box::new(move |timer: &Timer| timer.id == id),
                    Err(_) => {
                        let needle = t.to_lowercase();
                        Box::new(move |timer: &Timer| {
                            timer.description.to_lowercase().contains(&needle)
                        })
                    }
                };
                let (hit, kept): (Vec<Timer>, Vec<Timer>) =
                    book.active.drain(..).partition(|timer| matches(timer));
                book.active = kept;
                if hit.is_empty() {
                    return Err(TimerError::NotFound(Some(t.to_string())));
                }
                hit
            }
        };
        drop(book);

        let removed: Vec<Timer> = removed
            .into_iter()
            .map(|t| t.finish(TimerState::Cancelled))
            .collect();
        for timer in &removed {
            tracing::info!(id = timer.id, "Timer cancelled");
        }
        Ok(removed)
    }

    /// Remove every active timer, returning how many there were.
    pub fn cancel_all(&self) -> usize {
        let count = {
            let mut book = self.book();
            let count = book.active.len();
            book.active.clear();
            count
        };
        tracing::info!(count, "All timers cancelled");
        count
    }

    /// Snapshot of the active set in end-time order.
    pub fn active(&self) -> Vec<Timer> {
        self.book().active.clone()
    }

    pub fn active_count(&self) -> usize {
        self.book().active.len()
    }

    /// Remove and return every timer due at or before `now`.
    ///
    /// Stops at the first timer still running since the set is sorted.
    pub fn collect_expired(&self, now: Instant) -> Vec<Timer> {
        let mut book = self.book();
        let due = book.active.partition_point(|t| t.end_time <= now);
        book.active
            .drain(..due)
            .map(|t| t.finish(TimerState::Expired))
            .collect()
    }
}

/// Confirmation for a newly created timer.
pub fn set_message(timer: &Timer) -> String {
    format!(
        "Understood. A {} timer, ID {}, has been set for '{}'.",
        timer.duration_label, timer.id, timer.description
    )
}

/// Notification delivered when a timer runs out.
pub fn expiry_message(timer: &Timer) -> String {
    format!(
        "Your {} timer for '{}' (ID: {}) has concluded!",
        timer.duration_label, timer.description, timer.id
    )
}
