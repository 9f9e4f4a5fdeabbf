//! Error types for the action engine.

use crate::types::IntentKind;

/// Errors from action handler execution.
///
/// The orchestrator converts every variant into a failure outcome; none of
/// them escape to the dispatch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    /// The action ran but did not achieve its goal; the message is user facing.
    #[error("{0}")]
    ExecutionFailed(String),
    #[error("Intent kind not registered: {0}")]
    UnregisteredHandler(IntentKind),
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl ActionError {
    /// Whether the error came from the user's input rather than the system.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ActionError::InvalidInput(_)
                | ActionError::MissingParameter(_)
                | ActionError::Arithmetic(_)
                | ActionError::Timer(TimerError::InvalidDuration(_))
        )
    }
}

/// Errors from the timer subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error(
        "That duration doesn't seem quite right. \
         Could you specify it like '10 minutes' or '1h 30s'?"
    )]
    InvalidDuration(String),
    #[error("{}", not_found_message(.0))]
    NotFound(Option<String>),
}

fn not_found_message(target: &Option<String>) -> String {
    match target {
        None => "There are no active timers to cancel at the moment.".to_string(),
        Some(t) if t.parse::<u64>().is_ok() => format!("No timer found with ID {}.", t),
        Some(t) => format!("No active timer matches '{}'.", t),
    }
}

/// Errors from evaluating an arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("Division by zero is undefined, I'm afraid.")]
    DivisionByZero,
    #[error("I couldn't make sense of that expression: {0}")]
    Syntax(String),
    #[error("That result is too large to represent.")]
    Overflow,
}

/// Errors raised by platform capabilities.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("{capability} is not available on this system: {reason}")]
    Unavailable {
        capability: &'static str,
        reason: String,
    },
    #[error("`{program}` failed: {detail}")]
    CommandFailed { program: String, detail: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CapabilityError {
    pub fn unavailable(capability: &'static str, reason: impl Into<String>) -> Self {
        CapabilityError::Unavailable {
            capability,
            reason: reason.into(),
        }
    }
}
