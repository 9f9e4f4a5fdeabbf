//! Action engine orchestrator.
//!
//! Resolves the handler for an intent, routes sensitive actions to the
//! confirmation flow and turns every handler result into an
//! [`ActionOutcome`]. Nothing below this boundary escapes as an error.

use crate::error::ActionError;
use crate::handler::ActionRegistry;
use crate::types::{ActionOutcome, Intent, IntentKind, SafetyLevel, SensitiveAction};

/// Coordinates handler lookup, safety routing and execution.
pub struct Orchestrator {
    registry: ActionRegistry,
}

impl Orchestrator {
    pub fn new(registry: ActionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Execute a freshly matched intent.
    ///
    /// Sensitive intents are not run; they come back as
    /// `ConfirmationRequired` so the caller can arm the gate.
    pub async fn execute(&self, intent: &Intent) -> ActionOutcome {
        let Some(handler) = self.registry.get(intent.kind) else {
            tracing::warn!(kind = %intent.kind, "No handler registered");
            return ActionOutcome::failure(
                ActionError::UnregisteredHandler(intent.kind).to_string(),
            );
        };

        if handler.safety_level(intent) == SafetyLevel::Sensitive {
            match handler.sensitive_action(intent) {
                Ok(Some(action)) => {
                    tracing::info!(%action, "Sensitive action requires confirmation");
                    return ActionOutcome::confirmation_required(action);
                }
                Ok(None) => {}
                Err(e) => return failure(intent.kind, e),
            }
        }

        tracing::info!(action = %handler.describe(intent), "Executing action");
        match handler.execute(intent).await {
            Ok(message) => ActionOutcome::success(message),
            Err(e) => failure(intent.kind, e),
        }
    }

    /// Execute a sensitive action the user has explicitly confirmed.
    pub async fn execute_confirmed(&self, action: SensitiveAction) -> ActionOutcome {
        let intent = confirmed_intent(action);
        let Some(handler) = self.registry.get(intent.kind) else {
            tracing::warn!(kind = %intent.kind, "No handler registered");
            return ActionOutcome::failure(
                ActionError::UnregisteredHandler(intent.kind).to_string(),
            );
        };

        tracing::info!(%action, "Executing confirmed action");
        match handler.execute(&intent).await {
            Ok(message) => ActionOutcome::success(message),
            Err(e) => failure(intent.kind, e),
        }
    }
}

fn confirmed_intent(action: SensitiveAction) -> Intent {
    let source = format!("confirmed: {}", action);
    match action {
        SensitiveAction::EmptyRecycleBin => Intent::new(IntentKind::EmptyRecycleBin, source),
        SensitiveAction::Power(p) => {
            Intent::new(IntentKind::Power, source).with_param("action", p.to_string())
        }
    }
}

fn failure(kind: IntentKind, err: ActionError) -> ActionOutcome {
    if err.is_invalid_input() {
        tracing::debug!(%kind, error = %err, "Rejected input");
    } else {
        tracing::warn!(%kind, error = %err, "Action failed");
    }
    ActionOutcome::failure(err.to_string())
}
