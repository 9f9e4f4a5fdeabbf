//! In-memory notepad.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session notes, kept in insertion order.
#[derive(Default)]
pub struct NoteBook {
    notes: Mutex<Vec<String>>,
}

impl NoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn notes(&self) -> MutexGuard<'_, Vec<String>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a note and return the new count.
    pub fn add(&self, text: impl Into<String>) -> usize {
        let mut notes = self.notes();
        notes.push(text.into());
        notes.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.notes().clone()
    }

    /// Remove every note, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut notes = self.notes();
        let count = notes.len();
        notes.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.notes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes().is_empty()
    }
}
