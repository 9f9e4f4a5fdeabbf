use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Number of user turns the transcript is sized for.
pub const HISTORY_TURNS: usize = 12;

/// Top-level configuration for the Concierge assistant.
///
/// Loaded from `~/.concierge/config.toml` by default. Every section is
/// optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub responder: ResponderConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Name the assistant answers to in prompts and transcripts.
    pub assistant_name: String,
    /// How the assistant addresses the user.
    pub user_name: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Jarvis".to_string(),
            user_name: "Sir".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Conversation transcript bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Hard bound on stored entries; oldest are evicted first.
    pub max_entries: usize,
    /// Entries handed to the fallback responder as context.
    pub context_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: HISTORY_TURNS * 3 + 20,
            context_entries: HISTORY_TURNS * 2,
        }
    }
}

/// Timer subsystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Ticker polling interval in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

/// Confirmation gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Seconds after which an unanswered confirmation is discarded.
    pub timeout_seconds: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
        }
    }
}

/// Media context detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Number of recent transcript entries scanned for media keywords.
    pub context_window: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { context_window: 4 }
    }
}

/// Conversational fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Base URL of the `generateContent` style endpoint.
    pub api_url: String,
    /// Model identifier appended to the URL.
    pub model: String,
    /// API key. `CONCIERGE_API_KEY` takes precedence when set.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Persona instructions prepended to every prompt.
    pub persona: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout_seconds: 30,
            persona: "You are a composed, witty and unfailingly polite personal assistant. \
                      Answer briefly and stay in character. When the transcript shows a \
                      system action result, acknowledge it naturally instead of repeating it."
                .to_string(),
        }
    }
}

impl ResponderConfig {
    /// Resolve the API key, preferring the environment over the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("CONCIERGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConciergeError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = ConciergeConfig::default();
        assert_eq!(config.general.assistant_name, "Jarvis");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.history.max_entries, 56);
        assert_eq!(config.history.context_entries, 24);
        assert_eq!(config.timers.tick_interval_ms, 1000);
        assert_eq!(config.confirmation.timeout_seconds, 300);
        assert_eq!(config.media.context_window, 4);
        assert_eq!(config.responder.timeout_seconds, 30);
        assert!(config.responder.api_key.is_none());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
assistant_name = "Friday"
log_level = "debug"

[history]
max_entries = 10
context_entries = 4

[timers]
tick_interval_ms = 250

[responder]
model = "gemini-pro"
api_key = "secret"
"#;
        let file = create_temp_config(content);
        let config = ConciergeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.assistant_name, "Friday");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.history.max_entries, 10);
        assert_eq!(config.history.context_entries, 4);
        assert_eq!(config.timers.tick_interval_ms, 250);
        assert_eq!(config.responder.model, "gemini-pro");
        assert_eq!(config.responder.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"
"#;
        let file = create_temp_config(content);
        let config = ConciergeConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        // Remaining fields use defaults
        assert_eq!(config.general.assistant_name, "Jarvis");
        assert_eq!(config.history.max_entries, 56);
        assert_eq!(config.confirmation.timeout_seconds, 300);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConciergeConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.history.max_entries, 56);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[general\nlog_level = ");
        let err = ConciergeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ConciergeConfig::default();
        config.general.user_name = "Boss".to_string();
        config.save(&path).unwrap();

        let reloaded = ConciergeConfig::load(&path).unwrap();
        assert_eq!(reloaded.general.user_name, "Boss");
        assert_eq!(reloaded.history.max_entries, config.history.max_entries);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = ConciergeConfig::load(file.path()).unwrap();
        assert_eq!(config.media.context_window, 4);
        assert_eq!(config.timers.tick_interval_ms, 1000);
    }
}
