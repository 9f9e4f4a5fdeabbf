//! Bounded session transcript.
//!
//! Entries are appended under a short lock and the oldest are evicted as soon
//! as the bound is exceeded. Sequence indices keep increasing across
//! evictions, so an index identifies an entry for the whole session.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use concierge_core::{ConversationEntry, Role};

struct Transcript {
    entries: VecDeque<ConversationEntry>,
    next_index: u64,
}

/// Thread-safe FIFO of [`ConversationEntry`] values.
pub struct HistoryStore {
    inner: Mutex<Transcript>,
    max_entries: usize,
}

impl HistoryStore {
    /// Create a store holding at most `max_entries` entries (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            inner: Mutex::new(Transcript {
                entries: VecDeque::with_capacity(max_entries),
                next_index: 0,
            }),
            max_entries,
        }
    }

    fn transcript(&self) -> MutexGuard<'_, Transcript> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and return its sequence index.
    pub fn append(&self, role: Role, text: impl Into<String>) -> u64 {
        self.append_reply(role, text, None)
    }

    /// Append an entry answering the utterance at `in_reply_to`.
    pub fn append_reply(
        &self,
        role: Role,
        text: impl Into<String>,
        in_reply_to: Option<u64>,
    ) -> u64 {
        let mut transcript = self.transcript();
        let sequence_index = transcript.next_index;
        transcript.next_index += 1;
        transcript.entries.push_back(ConversationEntry {
            role,
            text: text.into(),
            sequence_index,
            in_reply_to,
            recorded_at: Local::now(),
        });
        while transcript.entries.len() > self.max_entries {
            transcript.entries.pop_front();
        }
        sequence_index
    }

    /// The most recent `max` entries, oldest first.
    pub fn snapshot(&self, max: usize) -> Vec<ConversationEntry> {
        let transcript = self.transcript();
        let skip = transcript.entries.len().saturating_sub(max);
        transcript.entries.iter().skip(skip).cloned().collect()
    }

    /// Text of the newest assistant entry still in the window.
    pub fn last_assistant_text(&self) -> Option<String> {
        self.transcript()
            .entries
            .iter()
            .rev()
            .find(|e| e.role == Role::Assistant)
            .map(|e| e.text.clone())
    }

    /// Whether any of the last `window` entries contains one of `keywords`,
    /// ignoring case.
    pub fn mentions_any(&self, window: usize, keywords: &[&str]) -> bool {
        let transcript = self.transcript();
        let skip = transcript.entries.len().saturating_sub(window);
        transcript.entries.iter().skip(skip).any(|e| {
            let lower = e.text.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
    }

    pub fn len(&self) -> usize {
        self.transcript().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
