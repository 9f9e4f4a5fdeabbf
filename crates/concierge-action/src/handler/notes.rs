//! Session notes handler.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::{preview, required, ActionHandler};
use crate::notes::NoteBook;
use crate::types::{Intent, IntentKind};

pub struct NotesHandler {
    notes: Arc<NoteBook>,
}

impl NotesHandler {
    pub fn new(notes: Arc<NoteBook>) -> Self {
        Self { notes }
    }
}

#[async_trait]
impl ActionHandler for NotesHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::TakeNote,
            IntentKind::ViewNotes,
            IntentKind::ClearNotes,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::TakeNote => {
                let note = required(intent, "note")?;
                let count = self.notes.add(note);
                tracing::debug!(count, "Note added");
                Ok(format!(
                    "Noted. '{}...' has been added to my memory.",
                    preview(note, 30)
                ))
            }
            IntentKind::ViewNotes => {
                let notes = self.notes.list();
                if notes.is_empty() {
                    return Ok("My notepad is currently empty.".to_string());
                }
                let lines: Vec<String> = notes
                    .iter()
                    .enumerate()
                    .map(|(i, note)| format!("{}. {}", i + 1, note))
                    .collect();
                Ok(format!("Here are your current notes:\n{}", lines.join("\n")))
            }
            IntentKind::ClearNotes => Ok(format!(
                "All {} note(s) have been cleared from my memory.",
                self.notes.clear()
            )),
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent.kind {
            IntentKind::TakeNote => format!(
                "Take note: {}",
                preview(intent.param("note").unwrap_or(""), 50)
            ),
            kind => kind.to_string(),
        }
    }
}
