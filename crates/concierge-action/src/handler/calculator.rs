//! Arithmetic handler.

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::intent::arithmetic::{evaluate, format_number};
use crate::types::{Intent, IntentKind};

/// Evaluates the `expression` parameter prepared by the matcher.
pub struct CalculatorHandler;

#[async_trait]
impl ActionHandler for CalculatorHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::Calculate]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        let expression = required(intent, "expression")?;
        let value = evaluate(expression)?;
        Ok(format!(
            "The result of '{}' is {}.",
            expression,
            format_number(value)
        ))
    }

    fn describe(&self, intent: &Intent) -> String {
        format!(
            "Calculate: {}",
            intent.param("expression").unwrap_or("<no expression>")
        )
    }
}
