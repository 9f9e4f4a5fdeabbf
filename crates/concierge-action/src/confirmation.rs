//! Confirmation gate for destructive actions.
//!
//! Holds at most one pending [`SensitiveAction`] and classifies the next user
//! utterance before ordinary intent matching runs. The pending action is an
//! explicit piece of state; the last assistant message is only consulted to
//! accept a bare "yes".

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::{PowerAction, SensitiveAction};

const AFFIRMATIVE_WORDS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "sure", "confirm", "confirmed", "proceed", "affirmative", "ok",
    "okay",
];
const AFFIRMATIVE_PHRASES: &[&str] = &["do it", "go ahead"];
/// Words allowed alongside a bare affirmation such as "yes please".
const AFFIRMATIVE_FILLER: &[&str] = &[
    "please", "sir", "do", "it", "go", "ahead", "absolutely", "definitely", "certainly",
];
/// Words that turn an affirmation into a hedge.
const HEDGE_WORDS: &[&str] = &[
    "but", "not", "don't", "dont", "maybe", "perhaps", "wait", "first", "later", "unsure", "if",
    "before",
];

const SENSITIVE_ACTIONS: [SensitiveAction; 4] = [
    SensitiveAction::EmptyRecycleBin,
    SensitiveAction::Power(PowerAction::Shutdown),
    SensitiveAction::Power(PowerAction::Restart),
    SensitiveAction::Power(PowerAction::Logout),
];

const NEGATIVE_WORDS: &[&str] = &["no", "nope", "nah", "abort", "stop", "don't", "dont"];
const NEGATIVE_PHRASES: &[&str] = &["cancel", "never mind", "nevermind", "forget it"];

/// A sensitive action awaiting the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationContext {
    pub action: SensitiveAction,
    pub created_at: Instant,
}

/// What the gate decided about an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing pending; run ordinary matching.
    Pass,
    /// Execute the action with confirmation granted.
    Confirmed(SensitiveAction),
    /// The user said no; the action is abandoned.
    Declined(SensitiveAction),
    /// An affirmation that could not be tied to the pending action. The
    /// context stays armed.
    Reprompt(SensitiveAction),
    /// Unrelated input or a stale context. The context is dropped and the
    /// utterance goes to ordinary matching.
    Discarded(SensitiveAction),
}

impl GateDecision {
    /// Whether the gate consumed the utterance.
    pub fn claims_utterance(&self) -> bool {
        matches!(
            self,
            GateDecision::Confirmed(_) | GateDecision::Declined(_) | GateDecision::Reprompt(_)
        )
    }
}

/// Two-state machine: idle, or awaiting confirmation of one action.
pub struct ConfirmationGate {
    timeout: Duration,
    pending: Mutex<Option<ConfirmationContext>>,
}

impl ConfirmationGate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ConfirmationContext>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, ctx: &ConfirmationContext, now: Instant) -> bool {
        now.saturating_duration_since(ctx.created_at) <= self.timeout
    }

    /// Start awaiting confirmation of `action`.
    ///
    /// Fails with the already pending action if one is still live; the
    /// existing context is left untouched.
    pub fn arm(&self, action: SensitiveAction) -> Result<(), SensitiveAction> {
        let now = Instant::now();
        let mut slot = self.slot();
        if let Some(existing) = slot.as_ref() {
            if self.is_live(existing, now) {
                return Err(existing.action);
            }
        }
        *slot = Some(ConfirmationContext {
            action,
            created_at: now,
        });
        tracing::info!(%action, "Awaiting confirmation");
        Ok(())
    }

    /// The pending context, if it has not timed out.
    pub fn pending(&self) -> Option<ConfirmationContext> {
        let now = Instant::now();
        self.slot()
            .as_ref()
            .filter(|ctx| self.is_live(ctx, now))
            .cloned()
    }

    pub fn clear(&self) {
        self.slot().take();
    }

    /// Put back a context that [`intercept`](Self::intercept) discarded,
    /// keeping its original creation time. Ignored if another context has
    /// been armed since.
    pub fn reinstate(&self, ctx: ConfirmationContext) {
        let mut slot = self.slot();
        if slot.is_none() {
            tracing::debug!(action = %ctx.action, "Pending confirmation reinstated");
            *slot = Some(ctx);
        }
    }

    /// Classify `utterance` against the pending action.
    ///
    /// A reply confirms when it opens with an affirmation and names the
    /// pending action, or when it is a bare affirmation and
    /// `last_assistant_text` names the pending action. Hedged replies and
    /// affirmations followed by anything else are discarded.
    pub fn intercept(&self, utterance: &str, last_assistant_text: Option<&str>) -> GateDecision {
        let now = Instant::now();
        let mut slot = self.slot();
        let Some(ctx) = slot.as_ref() else {
            return GateDecision::Pass;
        };
        let action = ctx.action;

        if !self.is_live(ctx, now) {
            *slot = None;
            tracing::info!(%action, "Pending confirmation expired");
            return GateDecision::Discarded(action);
        }

        let lower = utterance.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let decision = if is_negative(&lower, &words) {
            GateDecision::Declined(action)
        } else if !opens_affirmative(&words) || words.iter().any(|w| HEDGE_WORDS.contains(w)) {
            GateDecision::Discarded(action)
        } else if mentions_action(&lower, action) {
            GateDecision::Confirmed(action)
        } else if is_bare_affirmation(&words) {
            let prompted = last_assistant_text
                .map(|text| mentions_action(&text.to_lowercase(), action))
                .unwrap_or(false);
            if prompted {
                GateDecision::Confirmed(action)
            } else {
                GateDecision::Reprompt(action)
            }
        } else if SENSITIVE_ACTIONS.iter().any(|a| mentions_action(&lower, *a)) {
            GateDecision::Reprompt(action)
        } else {
            GateDecision::Discarded(action)
        };

        if !matches!(decision, GateDecision::Reprompt(_)) {
            *slot = None;
        }
        drop(slot);

        tracing::debug!(?decision, "Confirmation gate decision");
        decision
    }
}

fn is_negative(lower: &str, words: &[&str]) -> bool {
    words.first().is_some_and(|w| NEGATIVE_WORDS.contains(w))
        || NEGATIVE_PHRASES.iter().any(|p| lower.contains(p))
}

/// The reply starts with an affirmative word or phrase.
fn opens_affirmative(words: &[&str]) -> bool {
    if words.first().is_some_and(|w| AFFIRMATIVE_WORDS.contains(w)) {
        return true;
    }
    let joined = words.join(" ");
    AFFIRMATIVE_PHRASES.iter().any(|p| joined.starts_with(p))
}

/// The reply holds nothing but affirmative words and filler.
fn is_bare_affirmation(words: &[&str]) -> bool {
    words
        .iter()
        .all(|w| AFFIRMATIVE_WORDS.contains(w) || AFFIRMATIVE_FILLER.contains(w))
}

fn mentions_action(lower: &str, action: SensitiveAction) -> bool {
    action.keywords().iter().any(|k| lower.contains(k))
}

/// Message recorded when the user declines.
pub fn declined_message(action: SensitiveAction) -> String {
    match action {
        SensitiveAction::EmptyRecycleBin => "Recycle bin operation cancelled by user.".to_string(),
        SensitiveAction::Power(p) => format!("System {} cancelled by user.", p),
    }
}

/// Message recorded when a second sensitive request arrives while one is
/// still pending.
pub fn busy_message(pending: SensitiveAction) -> String {
    format!(
        "I'm still awaiting your confirmation to {}. Please answer that first, \
         with 'yes' to proceed or 'no' to cancel.",
        pending
    )
}

/// Message recorded when an affirmation does not name the pending action.
pub fn reprompt_message(pending: SensitiveAction) -> String {
    format!(
        "To be certain: shall I {}? {}",
        pending,
        pending.confirmation_prompt()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIN: SensitiveAction = SensitiveAction::EmptyRecycleBin;
    const RESTART: SensitiveAction = SensitiveAction::Power(PowerAction::Restart);

    fn make_gate() -> ConfirmationGate {
        ConfirmationGate::new(Duration::from_secs(300))
    }

    fn armed(action: SensitiveAction) -> ConfirmationGate {
        let gate = make_gate();
        gate.arm(action).unwrap();
        gate
    }

    #[tokio::test]
    async fn test_idle_gate_passes() {
        let gate = make_gate();
        assert_eq!(gate.intercept("yes", None), GateDecision::Pass);
        assert!(gate.pending().is_none());
    }

    #[tokio::test]
    async fn test_explicit_affirmation_confirms() {
        let gate = armed(BIN);
        assert_eq!(
            gate.intercept("yes, empty it", None),
            GateDecision::Confirmed(BIN)
        );
        assert!(gate.pending().is_none());

        let gate = armed(BIN);
        assert_eq!(
            gate.intercept("confirm empty recycle bin", None),
            GateDecision::Confirmed(BIN)
        );

        let gate = armed(RESTART);
        assert_eq!(gate.intercept("confirm restart", None), GateDecision::Confirmed(RESTART));
        let gate = armed(RESTART);
        assert_eq!(gate.intercept("Yes, reboot.", None), GateDecision::Confirmed(RESTART));
    }

    #[tokio::test]
    async fn test_bare_yes_needs_prompt_in_last_assistant_text() {
        let gate = armed(BIN);
        let prompt = BIN.confirmation_prompt();
        assert_eq!(gate.intercept("yes", Some(&prompt)), GateDecision::Confirmed(BIN));

        let gate = armed(BIN);
        let unrelated = "Your 5 seconds timer for 'tea' (ID: 1) has concluded!";
        assert_eq!(gate.intercept("yes", Some(unrelated)), GateDecision::Reprompt(BIN));
        assert_eq!(gate.pending().map(|c| c.action), Some(BIN));
        assert_eq!(gate.intercept("yes", None), GateDecision::Reprompt(BIN));
    }

    #[tokio::test]
    async fn test_negation_declines() {
        for reply in ["no", "No thanks", "nope", "cancel that", "never mind", "abort"] {
            let gate = armed(BIN);
            assert_eq!(gate.intercept(reply, None), GateDecision::Declined(BIN), "{}", reply);
            assert!(gate.pending().is_none());
        }
    }

    #[tokio::test]
    async fn test_bare_affirmation_variants() {
        let prompt = BIN.confirmation_prompt();
        for reply in ["Yes.", "yes please", "proceed", "confirm", "ok!", "go ahead", "do it"] {
            let gate = armed(BIN);
            assert_eq!(
                gate.intercept(reply, Some(&prompt)),
                GateDecision::Confirmed(BIN),
                "{}",
                reply
            );
        }
    }

    #[tokio::test]
    async fn test_hedged_reply_never_confirms() {
        let prompt = BIN.confirmation_prompt();
        for reply in [
            "I'm not sure about that",
            "sure, but first tell me the time",
            "yes, but not yet",
            "maybe later",
            "ok wait",
        ] {
            let gate = armed(BIN);
            assert_eq!(
                gate.intercept(reply, Some(&prompt)),
                GateDecision::Discarded(BIN),
                "{}",
                reply
            );
            assert!(gate.pending().is_none());
        }
    }

    #[tokio::test]
    async fn test_affirmation_followed_by_command_is_discarded() {
        let shutdown = SensitiveAction::Power(PowerAction::Shutdown);
        let gate = armed(shutdown);
        let prompt = shutdown.confirmation_prompt();
        assert_eq!(
            gate.intercept("ok what time is it", Some(&prompt)),
            GateDecision::Discarded(shutdown)
        );
        assert!(gate.pending().is_none());
    }

    #[tokio::test]
    async fn test_action_named_mid_sentence_does_not_confirm() {
        let gate = armed(BIN);
        assert_eq!(
            gate.intercept("what happens if I empty the trash", None),
            GateDecision::Discarded(BIN)
        );
    }

    #[tokio::test]
    async fn test_negation_wins_over_affirmation() {
        let gate = armed(RESTART);
        assert_eq!(
            gate.intercept("no, don't restart", None),
            GateDecision::Declined(RESTART)
        );
    }

    #[tokio::test]
    async fn test_unrelated_input_discards_without_confirming() {
        let gate = armed(BIN);
        assert_eq!(
            gate.intercept("what time is it", Some(&BIN.confirmation_prompt())),
            GateDecision::Discarded(BIN)
        );
        assert!(gate.pending().is_none());
        assert_eq!(gate.intercept("yes", None), GateDecision::Pass);
    }

    #[tokio::test]
    async fn test_affirming_the_wrong_action_does_not_confirm() {
        let gate = armed(RESTART);
        // Names a different action and the last message does not mention a restart.
        assert_eq!(
            gate.intercept("yes, empty it", Some("Anything else?")),
            GateDecision::Reprompt(RESTART)
        );
    }

    #[tokio::test]
    async fn test_second_arm_rejected_while_pending() {
        let gate = armed(BIN);
        assert_eq!(gate.arm(RESTART), Err(BIN));
        assert_eq!(gate.pending().map(|c| c.action), Some(BIN));
        gate.clear();
        assert_eq!(gate.arm(RESTART), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinstate_keeps_creation_time() {
        let gate = armed(BIN);
        let ctx = gate.pending().unwrap();
        assert_eq!(gate.intercept("shutdown", None), GateDecision::Discarded(BIN));

        tokio::time::advance(Duration::from_secs(200)).await;
        gate.reinstate(ctx.clone());
        assert_eq!(gate.pending(), Some(ctx.clone()));

        tokio::time::advance(Duration::from_secs(101)).await;
        assert!(gate.pending().is_none());
    }

    #[tokio::test]
    async fn test_reinstate_does_not_overwrite() {
        let gate = armed(BIN);
        let ctx = gate.pending().unwrap();
        gate.clear();
        gate.arm(RESTART).unwrap();
        gate.reinstate(ctx);
        assert_eq!(gate.pending().map(|c| c.action), Some(RESTART));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_is_discarded() {
        let gate = armed(BIN);
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(gate.pending().is_none());
        assert_eq!(
            gate.intercept("yes, empty it", None),
            GateDecision::Discarded(BIN)
        );
        assert_eq!(gate.intercept("yes, empty it", None), GateDecision::Pass);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_context_can_be_rearmed() {
        let gate = armed(BIN);
        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(gate.arm(RESTART), Ok(()));
        assert_eq!(gate.pending().map(|c| c.action), Some(RESTART));
    }

    #[test]
    fn test_claims_utterance() {
        assert!(GateDecision::Confirmed(BIN).claims_utterance());
        assert!(GateDecision::Declined(BIN).claims_utterance());
        assert!(GateDecision::Reprompt(BIN).claims_utterance());
        assert!(!GateDecision::Discarded(BIN).claims_utterance());
        assert!(!GateDecision::Pass.claims_utterance());
    }

    #[test]
    fn test_messages() {
        assert_eq!(declined_message(BIN), "Recycle bin operation cancelled by user.");
        assert_eq!(declined_message(RESTART), "System restart cancelled by user.");
        assert!(busy_message(BIN).contains("empty the recycle bin"));
        assert!(reprompt_message(RESTART).contains("'confirm restart'"));
    }
}
