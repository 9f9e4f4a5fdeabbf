//! Chat orchestrator: the per-utterance dispatch pipeline.
//!
//! An utterance passes the confirmation gate, then the rule table, then the
//! action orchestrator. Utterances no rule claims are answered by the
//! fallback responder on a spawned worker; its reply, like timer
//! notifications, comes back as a [`SessionEvent`] that the session owner
//! applies with [`ChatOrchestrator::apply_event`]. Only the owner mutates the
//! transcript.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use concierge_action::confirmation::{busy_message, declined_message, reprompt_message};
use concierge_action::{
    ConfirmationGate, GateDecision, MatchContext, NotificationSink, Orchestrator, OutcomeStatus,
    PatternSet,
};
use concierge_core::config::ConciergeConfig;
use concierge_core::{normalize_utterance, Role};
use tokio::sync::mpsc;

use crate::history::HistoryStore;
use crate::responder::FallbackResponder;

/// Whole utterances that end the session.
pub const EXIT_PHRASES: &[&str] = &["exit", "quit", "goodbye", "bye", "see ya", "later"];

/// Words in recent history that let bare "play"/"next"/"stop" control media.
const MEDIA_CONTEXT_WORDS: &[&str] = &["music", "song", "track", "playlist", "album", "spotify"];

const FAREWELL: &str = "Understood. System disengaging. Farewell.";

/// Messages delivered to the session owner from other tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Fallback reply to the user utterance with sequence index `in_reply_to`.
    Reply { in_reply_to: u64, text: String },
    /// Out-of-band notice such as a timer expiry.
    Notification(String),
}

/// Immediate result of handling one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Blank input; nothing was recorded.
    Ignored,
    /// An exit phrase. Carries the farewell line.
    Exit(String),
    /// Answered synchronously by the gate or an action.
    Reply(String),
    /// Handed to the fallback responder; the answer arrives as a
    /// [`SessionEvent::Reply`] for `sequence_index`.
    Deferred { sequence_index: u64 },
}

/// Forwards timer notifications into the session event channel.
pub struct EventSink {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl NotificationSink for EventSink {
    fn notify(&self, text: String) {
        if self.events.send(SessionEvent::Notification(text)).is_err() {
            tracing::debug!("Session closed; notification dropped");
        }
    }
}

/// Whether `text` is one of [`EXIT_PHRASES`], ignoring case and trailing
/// punctuation.
pub fn is_exit_phrase(text: &str) -> bool {
    let lower = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
        .to_lowercase();
    EXIT_PHRASES.contains(&lower.as_str())
}

/// Central coordinator wiring gate, matcher, actions and responder.
pub struct ChatOrchestrator {
    history: HistoryStore,
    gate: ConfirmationGate,
    patterns: PatternSet,
    actions: Orchestrator,
    responder: Arc<dyn FallbackResponder>,
    events: mpsc::UnboundedSender<SessionEvent>,
    latest_utterance: AtomicU64,
    assistant_name: String,
    user_name: String,
    context_entries: usize,
    media_window: usize,
}

impl ChatOrchestrator {
    /// Create the orchestrator and the receiving end of its event channel.
    pub fn new(
        config: &ConciergeConfig,
        actions: Orchestrator,
        responder: Arc<dyn FallbackResponder>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let orchestrator = Self {
            history: HistoryStore::new(config.history.max_entries),
            gate: ConfirmationGate::new(Duration::from_secs(config.confirmation.timeout_seconds)),
            patterns: PatternSet::new(),
            actions,
            responder,
            events,
            latest_utterance: AtomicU64::new(0),
            assistant_name: config.general.assistant_name.clone(),
            user_name: config.general.user_name.clone(),
            context_entries: config.history.context_entries,
            media_window: config.media.context_window,
        };
        (orchestrator, receiver)
    }

    /// A sink for the timer scheduler that feeds this session's channel.
    pub fn notification_sink(&self) -> Arc<dyn NotificationSink> {
        Arc::new(EventSink {
            events: self.events.clone(),
        })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    /// Record and return the opening line.
    pub fn greeting(&self) -> String {
        let text = format!(
            "Good day, {}. {} at your service. How may I assist you?",
            self.user_name, self.assistant_name
        );
        self.history.append(Role::Assistant, text.clone());
        text
    }

    /// Run one utterance through the pipeline.
    pub async fn handle_utterance(&self, raw: &str) -> Turn {
        let text = normalize_utterance(raw);
        if text.is_empty() {
            return Turn::Ignored;
        }

        let last_assistant = self.history.last_assistant_text();
        let seq = self.history.append(Role::User, text.clone());
        self.latest_utterance.store(seq, Ordering::SeqCst);

        if is_exit_phrase(&text) {
            tracing::info!("Exit phrase received");
            self.history.append_reply(Role::Assistant, FAREWELL, Some(seq));
            return Turn::Exit(FAREWELL.to_string());
        }

        let pending_before = self.gate.pending();
        match self.gate.intercept(&text, last_assistant.as_deref()) {
            GateDecision::Confirmed(action) => {
                let outcome = self.actions.execute_confirmed(action).await;
                return self.reply(seq, outcome.message);
            }
            GateDecision::Declined(action) => {
                tracing::info!(%action, "Sensitive action declined");
                return self.reply(seq, declined_message(action));
            }
            GateDecision::Reprompt(action) => return self.reply(seq, reprompt_message(action)),
            GateDecision::Discarded(action) => {
                tracing::info!(%action, "Pending confirmation dropped for unrelated input");
            }
            GateDecision::Pass => {}
        }

        let context = MatchContext {
            media_context: self.history.mentions_any(self.media_window, MEDIA_CONTEXT_WORDS),
        };
        let Some(intent) = self.patterns.detect(&text, &context) else {
            return self.defer_to_responder(seq, text);
        };

        tracing::debug!(kind = %intent.kind, "Intent matched");
        let outcome = self.actions.execute(&intent).await;
        let OutcomeStatus::ConfirmationRequired(action) = outcome.status else {
            return self.reply(seq, outcome.message);
        };

        if let Some(previous) = pending_before {
            // A sensitive request cannot displace one that is still awaiting an answer.
            let pending = previous.action;
            self.gate.reinstate(previous);
            if pending != action {
                return self.reply(seq, busy_message(pending));
            }
            return self.reply(seq, outcome.message);
        }
        match self.gate.arm(action) {
            Ok(()) => self.reply(seq, outcome.message),
            Err(pending) => self.reply(seq, busy_message(pending)),
        }
    }

    /// Record an event from the channel and return the text to display.
    pub fn apply_event(&self, event: SessionEvent) -> String {
        match event {
            SessionEvent::Reply { in_reply_to, text } => {
                let latest = self.latest_utterance.load(Ordering::SeqCst);
                if in_reply_to < latest {
                    tracing::debug!(in_reply_to, latest, "Reply arrived after a newer utterance");
                }
                self.history
                    .append_reply(Role::Assistant, text.clone(), Some(in_reply_to));
                text
            }
            SessionEvent::Notification(text) => {
                self.history.append(Role::System, text.clone());
                text
            }
        }
    }

    fn reply(&self, seq: u64, message: String) -> Turn {
        self.history
            .append_reply(Role::Assistant, message.clone(), Some(seq));
        Turn::Reply(message)
    }

    fn defer_to_responder(&self, seq: u64, utterance: String) -> Turn {
        let transcript: Vec<_> = self
            .history
            .snapshot(self.context_entries + 1)
            .into_iter()
            .filter(|e| e.sequence_index != seq)
            .collect();
        let transcript_len = transcript.len().min(self.context_entries);
        let transcript = transcript[transcript.len() - transcript_len..].to_vec();

        let responder = Arc::clone(&self.responder);
        let events = self.events.clone();
        tracing::debug!(seq, context = transcript.len(), "Deferring to fallback responder");
        tokio::spawn(async move {
            let text = match responder.respond(&transcript, &utterance).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Fallback responder failed");
                    e.apology()
                }
            };
            if events
                .send(SessionEvent::Reply {
                    in_reply_to: seq,
                    text,
                })
                .is_err()
            {
                tracing::debug!(seq, "Session closed before reply arrived");
            }
        });
        Turn::Deferred {
            sequence_index: seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResponderError;
    use async_trait::async_trait;
    use concierge_action::capability::mock::MockDesktop;
    use concierge_action::{ActionRegistry, NoteBook, SensitiveAction, TimerService};
    use concierge_core::ConversationEntry;

    struct EchoResponder;

    #[async_trait]
    impl FallbackResponder for EchoResponder {
        async fn respond(
            &self,
            transcript: &[ConversationEntry],
            utterance: &str,
        ) -> Result<String, ResponderError> {
            Ok(format!("echo({}): {}", transcript.len(), utterance))
        }
    }

    fn make_chat() -> (
        ChatOrchestrator,
        mpsc::UnboundedReceiver<SessionEvent>,
        Arc<MockDesktop>,
    ) {
        let mock = Arc::new(MockDesktop::new());
        let mut registry = ActionRegistry::new();
        registry.register_defaults(
            &MockDesktop::capabilities(&mock),
            Arc::new(TimerService::new()),
            Arc::new(NoteBook::new()),
        );
        let (chat, rx) = ChatOrchestrator::new(
            &ConciergeConfig::default(),
            Orchestrator::new(registry),
            Arc::new(EchoResponder),
        );
        (chat, rx, mock)
    }

    #[test]
    fn test_exit_phrases() {
        for phrase in ["exit", "Quit", "goodbye!", "see ya", "Later."] {
            assert!(is_exit_phrase(phrase), "{}", phrase);
        }
        assert!(!is_exit_phrase("quit spotify"));
        assert!(!is_exit_phrase("see you later alligator"));
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let (chat, _rx, _) = make_chat();
        assert_eq!(chat.handle_utterance("   ").await, Turn::Ignored);
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_exit_turn() {
        let (chat, _rx, _) = make_chat();
        assert_eq!(chat.handle_utterance("bye").await, Turn::Exit(FAREWELL.to_string()));
    }

    #[tokio::test]
    async fn test_action_reply_recorded_against_utterance() {
        let (chat, _rx, mock) = make_chat();
        let turn = chat.handle_utterance("lock the screen").await;
        assert_eq!(turn, Turn::Reply("Screen lock initiated.".to_string()));
        assert_eq!(mock.calls(), vec!["lock_screen"]);

        let entries = chat.history().snapshot(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].in_reply_to, Some(entries[0].sequence_index));
    }

    #[tokio::test]
    async fn test_unmatched_goes_to_responder() {
        let (chat, mut rx, _) = make_chat();
        chat.greeting();
        let turn = chat.handle_utterance("how are you this evening").await;
        let Turn::Deferred { sequence_index } = turn else {
            panic!("expected deferral, got {:?}", turn);
        };

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SessionEvent::Reply {
                in_reply_to: sequence_index,
                text: "echo(1): how are you this evening".to_string(),
            }
        );
        chat.apply_event(event);
        assert_eq!(chat.history().len(), 3);
    }

    #[tokio::test]
    async fn test_second_sensitive_request_rejected() {
        let (chat, _rx, mock) = make_chat();
        let first = chat.handle_utterance("empty the recycle bin").await;
        assert_eq!(
            first,
            Turn::Reply(SensitiveAction::EmptyRecycleBin.confirmation_prompt())
        );

        let second = chat.handle_utterance("restart").await;
        assert_eq!(
            second,
            Turn::Reply(busy_message(SensitiveAction::EmptyRecycleBin))
        );
        assert_eq!(
            chat.gate().pending().map(|c| c.action),
            Some(SensitiveAction::EmptyRecycleBin)
        );
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_notification_sink_feeds_channel() {
        let (chat, mut rx, _) = make_chat();
        chat.notification_sink().notify("Timer done".to_string());
        let event = rx.recv().await.unwrap();
        assert_eq!(chat.apply_event(event), "Timer done");
        assert_eq!(chat.history().snapshot(1)[0].role, Role::System);
    }
}
