use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Who produced a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person talking to the assistant.
    User,
    /// Replies and action outcomes produced by the assistant.
    Assistant,
    /// Out-of-band events such as timer notifications.
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// One line of the session transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub text: String,
    /// Position in the session; strictly increasing, never reused.
    pub sequence_index: u64,
    /// Sequence index of the utterance this entry answers, if any.
    pub in_reply_to: Option<u64>,
    pub recorded_at: DateTime<Local>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Trim an utterance and collapse internal whitespace runs to one space.
///
/// Case is preserved so that captured parameters keep their spelling.
pub fn normalize_utterance(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = trimmed
        .strip_prefix("~/")
        .or_else(|| trimmed.strip_prefix("~\\"))
    {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_and_parse() {
        for role in [Role::User, Role::Assistant, Role::System] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("robot".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_utterance("  set   a timer\tfor 5m \n"), "set a timer for 5m");
    }

    #[test]
    fn test_normalize_preserves_case() {
        assert_eq!(normalize_utterance("Note That Bob Called"), "Note That Bob Called");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_utterance("   "), "");
    }

    #[test]
    fn test_expand_home_plain_path_untouched() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home(" relative/dir "), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/Documents"), home.join("Documents"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
