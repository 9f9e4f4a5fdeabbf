//! Action handler registry and trait definition.
//!
//! Defines the `ActionHandler` async trait and provides the handler
//! registry for dispatching intents to the correct implementation. Handlers
//! reach the host only through the injected [`Capabilities`].

pub mod application;
pub mod calculator;
pub mod clipboard;
pub mod filesystem;
pub mod fun;
pub mod help;
pub mod interface;
pub mod media;
pub mod notes;
pub mod power;
pub mod system_info;
pub mod timer;
pub mod type_text;
pub mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::Capabilities;
use crate::error::ActionError;
use crate::notes::NoteBook;
use crate::timer::TimerService;
use crate::types::{Intent, IntentKind, SafetyLevel, SensitiveAction};

/// Executes one family of intents.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Intent kinds this handler serves.
    fn kinds(&self) -> &'static [IntentKind];

    fn safety_level(&self, _intent: &Intent) -> SafetyLevel {
        SafetyLevel::Passive
    }

    /// The confirmation a sensitive intent must pass before it runs.
    fn sensitive_action(&self, _intent: &Intent) -> Result<Option<SensitiveAction>, ActionError> {
        Ok(None)
    }

    /// Run the intent and return the user-facing result message.
    async fn execute(&self, intent: &Intent) -> Result<String, ActionError>;

    /// Short description for logs.
    fn describe(&self, intent: &Intent) -> String;
}

/// Look up a required parameter.
pub(crate) fn required<'a>(intent: &'a Intent, name: &'static str) -> Result<&'a str, ActionError> {
    intent
        .param(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ActionError::MissingParameter(name))
}

/// First `max` characters of `text`, trimmed.
pub(crate) fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim().to_string()
}

/// Maps intent kinds to their handlers.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<IntentKind, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every kind it serves, replacing earlier ones.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        for kind in handler.kinds() {
            if self.handlers.insert(*kind, Arc::clone(&handler)).is_some() {
                tracing::warn!(%kind, "Replacing registered action handler");
            }
        }
    }

    pub fn get(&self, kind: IntentKind) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Register the built-in handlers for every intent kind.
    pub fn register_defaults(
        &mut self,
        caps: &Capabilities,
        timers: Arc<TimerService>,
        notes: Arc<NoteBook>,
    ) {
        self.register(Arc::new(interface::InterfaceHandler::new(Arc::clone(
            &caps.interface,
        ))));
        self.register(Arc::new(timer::TimerHandler::new(timers)));
        self.register(Arc::new(calculator::CalculatorHandler));
        self.register(Arc::new(fun::FunHandler));
        self.register(Arc::new(system_info::SystemInfoHandler::new(Arc::clone(
            &caps.system,
        ))));
        self.register(Arc::new(power::PowerHandler::new(
            Arc::clone(&caps.power),
            Arc::clone(&caps.recycle_bin),
        )));
        self.register(Arc::new(filesystem::FilesystemHandler::new(Arc::clone(
            &caps.filesystem,
        ))));
        self.register(Arc::new(notes::NotesHandler::new(notes)));
        self.register(Arc::new(clipboard::ClipboardHandler::new(Arc::clone(
            &caps.clipboard,
        ))));
        self.register(Arc::new(type_text::TypeTextHandler::new(Arc::clone(
            &caps.typer,
        ))));
        self.register(Arc::new(web::WebHandler::new(Arc::clone(&caps.browser))));
        self.register(Arc::new(application::ApplicationHandler::new(
            Arc::clone(&caps.apps),
            Arc::clone(&caps.terminator),
            Arc::clone(&caps.windows),
        )));
        self.register(Arc::new(media::MediaHandler::new(
            Arc::clone(&caps.media),
            Arc::clone(&caps.volume),
        )));
        self.register(Arc::new(help::HelpHandler));
        tracing::debug!(handlers = self.len(), "Default action handlers registered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::mock::MockDesktop;

    #[test]
    fn test_defaults_cover_every_intent_kind() {
        let mock = Arc::new(MockDesktop::new());
        let mut registry = ActionRegistry::new();
        registry.register_defaults(
            &MockDesktop::capabilities(&mock),
            Arc::new(TimerService::new()),
            Arc::new(NoteBook::new()),
        );
        for kind in IntentKind::ALL {
            assert!(registry.get(kind).is_some(), "no handler for {}", kind);
        }
        assert_eq!(registry.len(), IntentKind::ALL.len());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ActionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(IntentKind::Help).is_none());
    }

    #[test]
    fn test_required_rejects_blank() {
        let intent = Intent::new(IntentKind::OpenUrl, "open").with_param("url", "  ");
        assert!(matches!(
            required(&intent, "url"),
            Err(ActionError::MissingParameter("url"))
        ));
        let intent = intent.with_param("url", " example.com ");
        assert_eq!(required(&intent, "url").unwrap(), "example.com");
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("short", 30), "short");
    }
}
