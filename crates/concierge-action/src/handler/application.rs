//! Application launch/close, window focus and tab close.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{AppLauncher, AppTerminator, WindowFocuser};
use crate::error::{ActionError, CapabilityError};
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind};

pub struct ApplicationHandler {
    apps: Arc<dyn AppLauncher>,
    terminator: Arc<dyn AppTerminator>,
    windows: Arc<dyn WindowFocuser>,
}

impl ApplicationHandler {
    pub fn new(
        apps: Arc<dyn AppLauncher>,
        terminator: Arc<dyn AppTerminator>,
        windows: Arc<dyn WindowFocuser>,
    ) -> Self {
        Self {
            apps,
            terminator,
            windows,
        }
    }

    async fn open(&self, name: &str) -> Result<String, ActionError> {
        if let Err(e) = self.apps.launch(name).await {
            tracing::warn!(app = name, error = %e, "Application launch failed");
            return Err(ActionError::ExecutionFailed(format!(
                "Failed to launch application '{}'. \
                 It might not be installed or the name is incorrect.",
                name
            )));
        }
        Ok(format!("Application '{}' launch initiated.", name))
    }

    async fn close(&self, name: &str) -> Result<String, ActionError> {
        let closed = self.terminator.terminate(name).await?;
        tracing::info!(app = name, closed, "Close requested");
        if closed == 0 {
            return Err(ActionError::ExecutionFailed(format!(
                "No running process found clearly matching '{}' to close.",
                name
            )));
        }
        Ok(format!("Attempted to close '{}'.", name))
    }

    async fn focus(&self, target: &str) -> Result<String, ActionError> {
        match self.windows.focus(target).await {
            Ok(()) => Ok(format!("Focused window: {}", target)),
            Err(CapabilityError::CommandFailed { .. }) => Err(ActionError::ExecutionFailed(
                format!("No suitable window found for: '{}'", target),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ActionHandler for ApplicationHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::OpenApplication,
            IntentKind::CloseApplication,
            IntentKind::FocusWindow,
            IntentKind::CloseTab,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::OpenApplication => self.open(required(intent, "name")?).await,
            IntentKind::CloseApplication => self.close(required(intent, "name")?).await,
            IntentKind::FocusWindow => self.focus(required(intent, "target")?).await,
            IntentKind::CloseTab => {
                self.windows.close_active_tab().await?;
                Ok("Close tab command sent.".to_string())
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent
            .param("name")
            .or_else(|| intent.param("target"))
        {
            Some(target) => format!("{}: {}", intent.kind, target),
            None => intent.kind.to_string(),
        }
    }
}
