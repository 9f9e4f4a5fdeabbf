//! Timer action handler.
//!
//! Creates and cancels countdowns on the shared [`TimerService`]. Expiry is
//! reported by the scheduler, not here.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::timer::{set_message, Timer, TimerService};
use crate::types::{Intent, IntentKind};

pub struct TimerHandler {
    timers: Arc<TimerService>,
}

impl TimerHandler {
    pub fn new(timers: Arc<TimerService>) -> Self {
        Self { timers }
    }
}

fn cancelled_message(removed: &[Timer]) -> String {
    let summaries: Vec<String> = removed.iter().map(Timer::summary).collect();
    format!(
        "The following timer(s) have been cancelled: {}.",
        summaries.join(", ")
    )
}

#[async_trait]
impl ActionHandler for TimerHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::SetTimer,
            IntentKind::CancelTimer,
            IntentKind::CancelAllTimers,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::SetTimer => {
                let duration = required(intent, "duration")?;
                let timer = self.timers.create(duration, intent.param("description"))?;
                Ok(set_message(&timer))
            }
            IntentKind::CancelTimer => {
                let removed = self.timers.cancel(intent.param("target"))?;
                Ok(cancelled_message(&removed))
            }
            IntentKind::CancelAllTimers => match self.timers.cancel_all() {
                0 => Ok("There were no active timers to cancel.".to_string()),
                n => Ok(format!(
                    "All {} active timer(s) have been successfully cancelled.",
                    n
                )),
            },
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent.kind {
            IntentKind::SetTimer => format!(
                "Set timer: {}",
                intent.param("duration").unwrap_or("<no duration>")
            ),
            IntentKind::CancelTimer => format!(
                "Cancel timer: {}",
                intent.param("target").unwrap_or("<newest>")
            ),
            _ => "Cancel all timers".to_string(),
        }
    }
}
