//! Types text into the focused window.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::TextTyper;
use crate::error::ActionError;
use crate::handler::{preview, required, ActionHandler};
use crate::types::{Intent, IntentKind};

/// Time the user gets to focus the target window.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_secs(2);

pub struct TypeTextHandler {
    typer: Arc<dyn TextTyper>,
    delay: Duration,
}

impl TypeTextHandler {
    pub fn new(typer: Arc<dyn TextTyper>) -> Self {
        Self {
            typer,
            delay: DEFAULT_TYPING_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ActionHandler for TypeTextHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::TypeText]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        let text = required(intent, "text")?;
        if !self.delay.is_zero() {
            tracing::info!(delay_ms = self.delay.as_millis() as u64, "Waiting before typing");
            tokio::time::sleep(self.delay).await;
        }
        self.typer.type_text(text).await?;
        Ok("The requested text has been typed out.".to_string())
    }

    fn describe(&self, intent: &Intent) -> String {
        format!("Type: {}", preview(intent.param("text").unwrap_or(""), 50))
    }
}
