//! Power, screen lock and recycle bin handler.
//!
//! Emptying the recycle bin and the power operations are Sensitive: the
//! orchestrator asks for confirmation first and only calls `execute` once
//! the user agreed. Locking the screen is reversible and runs directly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{PowerController, RecycleBinController};
use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind, PowerAction, SafetyLevel, SensitiveAction};

pub struct PowerHandler {
    power: Arc<dyn PowerController>,
    recycle_bin: Arc<dyn RecycleBinController>,
}

impl PowerHandler {
    pub fn new(
        power: Arc<dyn PowerController>,
        recycle_bin: Arc<dyn RecycleBinController>,
    ) -> Self {
        Self { power, recycle_bin }
    }
}

fn power_action(intent: &Intent) -> Result<PowerAction, ActionError> {
    let verb = required(intent, "action")?;
    PowerAction::from_verb(verb)
        .ok_or_else(|| ActionError::InvalidInput(format!("Unknown power action '{}'.", verb)))
}

#[async_trait]
impl ActionHandler for PowerHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::EmptyRecycleBin,
            IntentKind::LockScreen,
            IntentKind::Power,
        ]
    }

    fn safety_level(&self, intent: &Intent) -> SafetyLevel {
        match intent.kind {
            IntentKind::LockScreen => SafetyLevel::Passive,
            _ => SafetyLevel::Sensitive,
        }
    }

    fn sensitive_action(&self, intent: &Intent) -> Result<Option<SensitiveAction>, ActionError> {
        match intent.kind {
            IntentKind::EmptyRecycleBin => Ok(Some(SensitiveAction::EmptyRecycleBin)),
            IntentKind::Power => Ok(Some(SensitiveAction::Power(power_action(intent)?))),
            _ => Ok(None),
        }
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::EmptyRecycleBin => {
                self.recycle_bin.empty().await?;
                tracing::info!("Recycle bin emptied");
                Ok("The recycle bin has been emptied.".to_string())
            }
            IntentKind::LockScreen => {
                self.power.lock_screen().await?;
                Ok("Screen lock initiated.".to_string())
            }
            IntentKind::Power => {
                let action = power_action(intent)?;
                tracing::warn!(%action, "Initiating system power action");
                self.power.power(action).await?;
                Ok(format!("The system {} sequence has been initiated.", action))
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent.kind {
            IntentKind::Power => format!("Power: {}", intent.param("action").unwrap_or("?")),
            IntentKind::LockScreen => "Lock screen".to_string(),
            _ => "Empty recycle bin".to_string(),
        }
    }
}
