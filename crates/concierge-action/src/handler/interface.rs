//! Graphical interface launch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::InterfaceLauncher;
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Intent, IntentKind};

pub struct InterfaceHandler {
    interface: Arc<dyn InterfaceLauncher>,
}

impl InterfaceHandler {
    pub fn new(interface: Arc<dyn InterfaceLauncher>) -> Self {
        Self { interface }
    }
}

#[async_trait]
impl ActionHandler for InterfaceHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::LaunchInterface]
    }

    async fn execute(&self, _intent: &Intent) -> Result<String, ActionError> {
        self.interface.launch_interface().await?;
        Ok("Interface launch initiated.".to_string())
    }

    fn describe(&self, _intent: &Intent) -> String {
        "Launch graphical interface".to_string()
    }
}
