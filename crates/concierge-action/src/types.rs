//! Core types and value objects for the action engine.
//!
//! Defines intents, precedence groups, sensitive actions and the normalized
//! outcome every handler invocation is converted into.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Intents
// =============================================================================

/// Every command the matcher can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    LaunchInterface,
    SetTimer,
    CancelTimer,
    CancelAllTimers,
    Calculate,
    Weather,
    RollDice,
    FlipCoin,
    TellJoke,
    RandomNumber,
    SystemUptime,
    SystemStats,
    InternetCheck,
    DateTime,
    EmptyRecycleBin,
    LockScreen,
    Power,
    ListDirectory,
    CreateDirectory,
    OpenFile,
    TakeNote,
    ViewNotes,
    ClearNotes,
    CopyToClipboard,
    ReadClipboard,
    TypeText,
    OpenUrl,
    WebSearch,
    OpenApplication,
    CloseApplication,
    Media,
    Volume,
    FocusWindow,
    CloseTab,
    Help,
}

impl IntentKind {
    /// All kinds, in declaration order.
    pub const ALL: [IntentKind; 35] = [
        IntentKind::LaunchInterface,
        IntentKind::SetTimer,
        IntentKind::CancelTimer,
        IntentKind::CancelAllTimers,
        IntentKind::Calculate,
        IntentKind::Weather,
        IntentKind::RollDice,
        IntentKind::FlipCoin,
        IntentKind::TellJoke,
        IntentKind::RandomNumber,
        IntentKind::SystemUptime,
        IntentKind::SystemStats,
        IntentKind::InternetCheck,
        IntentKind::DateTime,
        IntentKind::EmptyRecycleBin,
        IntentKind::LockScreen,
        IntentKind::Power,
        IntentKind::ListDirectory,
        IntentKind::CreateDirectory,
        IntentKind::OpenFile,
        IntentKind::TakeNote,
        IntentKind::ViewNotes,
        IntentKind::ClearNotes,
        IntentKind::CopyToClipboard,
        IntentKind::ReadClipboard,
        IntentKind::TypeText,
        IntentKind::OpenUrl,
        IntentKind::WebSearch,
        IntentKind::OpenApplication,
        IntentKind::CloseApplication,
        IntentKind::Media,
        IntentKind::Volume,
        IntentKind::FocusWindow,
        IntentKind::CloseTab,
        IntentKind::Help,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            IntentKind::LaunchInterface => "launch_interface",
            IntentKind::SetTimer => "set_timer",
            IntentKind::CancelTimer => "cancel_timer",
            IntentKind::CancelAllTimers => "cancel_all_timers",
            IntentKind::Calculate => "calculate",
            IntentKind::Weather => "weather",
            IntentKind::RollDice => "roll_dice",
            IntentKind::FlipCoin => "flip_coin",
            IntentKind::TellJoke => "tell_joke",
            IntentKind::RandomNumber => "random_number",
            IntentKind::SystemUptime => "system_uptime",
            IntentKind::SystemStats => "system_stats",
            IntentKind::InternetCheck => "internet_check",
            IntentKind::DateTime => "date_time",
            IntentKind::EmptyRecycleBin => "empty_recycle_bin",
            IntentKind::LockScreen => "lock_screen",
            IntentKind::Power => "power",
            IntentKind::ListDirectory => "list_directory",
            IntentKind::CreateDirectory => "create_directory",
            IntentKind::OpenFile => "open_file",
            IntentKind::TakeNote => "take_note",
            IntentKind::ViewNotes => "view_notes",
            IntentKind::ClearNotes => "clear_notes",
            IntentKind::CopyToClipboard => "copy_to_clipboard",
            IntentKind::ReadClipboard => "read_clipboard",
            IntentKind::TypeText => "type_text",
            IntentKind::OpenUrl => "open_url",
            IntentKind::WebSearch => "web_search",
            IntentKind::OpenApplication => "open_application",
            IntentKind::CloseApplication => "close_application",
            IntentKind::Media => "media",
            IntentKind::Volume => "volume",
            IntentKind::FocusWindow => "focus_window",
            IntentKind::CloseTab => "close_tab",
            IntentKind::Help => "help",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IntentKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown intent kind: {}", s))
    }
}

/// Precedence groups of the rule table, highest priority first.
///
/// Pending confirmation replies sit logically above all of these and are
/// handled by the confirmation gate before matching runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrecedenceGroup {
    Interface,
    Timers,
    Arithmetic,
    Weather,
    Fun,
    Introspection,
    SensitiveSystem,
    Filesystem,
    Notes,
    Clipboard,
    TypeText,
    UrlOpen,
    WebSearch,
    Applications,
    Media,
    Volume,
    WindowFocus,
    TabClose,
    Help,
}

/// A structured interpretation of one utterance.
///
/// Parameters keep their insertion order so handlers and logs see them the
/// way the extractor produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    params: Vec<(String, String)>,
    /// The normalized utterance the intent was extracted from.
    pub source: String,
}

impl Intent {
    pub fn new(kind: IntentKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            params: Vec::new(),
            source: source.into(),
        }
    }

    /// Add a parameter, replacing any previous value under the same name.
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

// =============================================================================
// Sensitive actions
// =============================================================================

/// Session power operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    Shutdown,
    Restart,
    Logout,
}

impl PowerAction {
    /// Map a spoken verb ("reboot", "sign out", ...) to a power action.
    pub fn from_verb(verb: &str) -> Option<Self> {
        let compact: String = verb
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match compact.as_str() {
            "shutdown" | "poweroff" => Some(PowerAction::Shutdown),
            "restart" | "reboot" => Some(PowerAction::Restart),
            "logoff" | "logout" | "signout" => Some(PowerAction::Logout),
            _ => None,
        }
    }

    /// Words that name this action in a confirmation reply.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            PowerAction::Shutdown => &["shutdown", "shut down", "power off"],
            PowerAction::Restart => &["restart", "reboot"],
            PowerAction::Logout => &["logout", "log out", "log off", "sign out"],
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerAction::Shutdown => write!(f, "shutdown"),
            PowerAction::Restart => write!(f, "restart"),
            PowerAction::Logout => write!(f, "logout"),
        }
    }
}

/// Destructive operations that must pass the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveAction {
    EmptyRecycleBin,
    Power(PowerAction),
}

impl SensitiveAction {
    /// Words that tie a confirmation reply to this action.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            SensitiveAction::EmptyRecycleBin => &["recycle bin", "trash", "empty"],
            SensitiveAction::Power(p) => p.keywords(),
        }
    }

    /// The prompt issued when the action is first requested.
    pub fn confirmation_prompt(&self) -> String {
        match self {
            SensitiveAction::EmptyRecycleBin => "Emptying the recycle bin is a permanent action \
                 and cannot be undone. Are you absolutely sure you wish to proceed? \
                 (Please say 'yes, empty it' or 'confirm empty recycle bin' to continue.)"
                .to_string(),
            SensitiveAction::Power(p) => format!(
                "Are you absolutely sure you wish to {p} the computer? \
                 (Say 'yes, {p}' or 'confirm {p}' to proceed.)"
            ),
        }
    }
}

impl fmt::Display for SensitiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitiveAction::EmptyRecycleBin => write!(f, "empty the recycle bin"),
            SensitiveAction::Power(p) => write!(f, "{} the computer", p),
        }
    }
}

// =============================================================================
// Capability commands
// =============================================================================

/// Volume adjustments understood by the volume controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCommand {
    /// Absolute level in percent (0 to 100).
    Set(u8),
    Up,
    Down,
    ToggleMute,
}

/// Media transport keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCommand {
    PlayPause,
    Next,
    Previous,
    Stop,
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaCommand::PlayPause => write!(f, "play_pause"),
            MediaCommand::Next => write!(f, "next"),
            MediaCommand::Previous => write!(f, "previous"),
            MediaCommand::Stop => write!(f, "stop"),
        }
    }
}

impl std::str::FromStr for MediaCommand {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play_pause" => Ok(MediaCommand::PlayPause),
            "next" => Ok(MediaCommand::Next),
            "previous" => Ok(MediaCommand::Previous),
            "stop" => Ok(MediaCommand::Stop),
            _ => Err(format!("Unknown media command: {}", s)),
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Safety level controlling whether execution needs explicit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// Runs immediately.
    Passive,
    /// Destructive; runs only after the user confirms.
    Sensitive,
}

/// Result classification of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failure,
    /// Not an error: the gate must be armed for the given action.
    ConfirmationRequired(SensitiveAction),
}

/// The normalized result of executing an intent. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            message: message.into(),
        }
    }

    pub fn confirmation_required(action: SensitiveAction) -> Self {
        Self {
            status: OutcomeStatus::ConfirmationRequired(action),
            message: action.confirmation_prompt(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
