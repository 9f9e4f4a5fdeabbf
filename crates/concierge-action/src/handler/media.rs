//! Media transport and volume.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{MediaController, VolumeController};
use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind, MediaCommand, VolumeCommand};

pub struct MediaHandler {
    media: Arc<dyn MediaController>,
    volume: Arc<dyn VolumeController>,
}

impl MediaHandler {
    pub fn new(media: Arc<dyn MediaController>, volume: Arc<dyn VolumeController>) -> Self {
        Self { media, volume }
    }
}

/// Map the `command`/`level` parameters onto a [`VolumeCommand`].
pub fn volume_command(intent: &Intent) -> Result<VolumeCommand, ActionError> {
    match required(intent, "command")? {
        "up" => Ok(VolumeCommand::Up),
        "down" => Ok(VolumeCommand::Down),
        "mute" => Ok(VolumeCommand::ToggleMute),
        "set" => {
            let raw = required(intent, "level")?;
            match raw.parse::<u8>() {
                Ok(level) if level <= 100 => Ok(VolumeCommand::Set(level)),
                _ => Err(ActionError::InvalidInput(format!(
                    "Volume level must be between 0 and 100, not '{}'.",
                    raw
                ))),
            }
        }
        other => Err(ActionError::InvalidInput(format!(
            "Unknown volume command: {}",
            other
        ))),
    }
}

#[async_trait]
impl ActionHandler for MediaHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::Media, IntentKind::Volume]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::Media => {
                let command: MediaCommand = required(intent, "command")?
                    .parse()
                    .map_err(ActionError::InvalidInput)?;
                self.media.send(command).await?;
                Ok(format!("Media '{}' command sent.", command))
            }
            IntentKind::Volume => {
                let command = volume_command(intent)?;
                self.volume.apply(command).await?;
                let label = match command {
                    VolumeCommand::Set(level) => format!("set to {}%", level),
                    VolumeCommand::Up => "up".to_string(),
                    VolumeCommand::Down => "down".to_string(),
                    VolumeCommand::ToggleMute => "mute".to_string(),
                };
                Ok(format!("Volume adjusted for '{}'.", label))
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        format!(
            "{}: {}",
            intent.kind,
            intent.param("command").unwrap_or("<none>")
        )
    }
}
