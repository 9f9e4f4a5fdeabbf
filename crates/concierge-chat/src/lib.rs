//! Conversational layer for Concierge.
//!
//! Owns the session transcript, the fallback responder used when no rule
//! claims an utterance, and the orchestrator that runs each utterance
//! through the confirmation gate, the rule table and the action engine.

pub mod error;
pub mod history;
pub mod orchestrator;
pub mod responder;

pub use error::{ChatError, ResponderError};
pub use history::HistoryStore;
pub use orchestrator::{is_exit_phrase, ChatOrchestrator, EventSink, SessionEvent, Turn};
pub use responder::{build_responder, FallbackResponder, HttpResponder, OfflineResponder};
