//! Action engine for Concierge.
//!
//! Matches utterances against an ordered rule table, gates destructive
//! actions behind a confirmation turn, runs timers on a background ticker and
//! dispatches everything else through pluggable handlers backed by platform
//! capabilities.

pub mod capability;
pub mod confirmation;
pub mod error;
pub mod handler;
pub mod intent;
pub mod notes;
pub mod orchestrator;
pub mod scheduler;
pub mod timer;
pub mod types;

pub use capability::Capabilities;
pub use confirmation::{ConfirmationContext, ConfirmationGate, GateDecision};
pub use error::{ActionError, ArithmeticError, CapabilityError, TimerError};
pub use handler::{ActionHandler, ActionRegistry};
pub use intent::{MatchContext, PatternSet};
pub use notes::NoteBook;
pub use orchestrator::Orchestrator;
pub use scheduler::{NotificationSink, Scheduler};
pub use timer::{Timer, TimerService};
pub use types::{
    ActionOutcome, Intent, IntentKind, MediaCommand, OutcomeStatus, PowerAction, SafetyLevel,
    SensitiveAction, VolumeCommand,
};
