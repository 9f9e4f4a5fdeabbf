//! Directory listing, directory creation and file opening.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::{resolve_path, DirListing, FilesystemAccessor};
use crate::error::{ActionError, CapabilityError};
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind};

/// Entries shown per category before summarising the rest.
const LISTING_LIMIT: usize = 5;

pub struct FilesystemHandler {
    fs: Arc<dyn FilesystemAccessor>,
}

impl FilesystemHandler {
    pub fn new(fs: Arc<dyn FilesystemAccessor>) -> Self {
        Self { fs }
    }
}

fn summarize(label: &str, names: &[String]) -> String {
    let shown = names[..names.len().min(LISTING_LIMIT)].join(", ");
    if names.len() > LISTING_LIMIT {
        format!(
            "\n  {}: {}, and {} more.",
            label,
            shown,
            names.len() - LISTING_LIMIT
        )
    } else {
        format!("\n  {}: {}", label, shown)
    }
}

/// Render a listing the way it is read back to the user.
pub fn listing_message(path: &str, listing: &DirListing) -> String {
    if listing.is_empty() {
        return format!("The directory '{}' is empty.", path);
    }
    let mut message = format!("Contents of '{}':", path);
    if !listing.dirs.is_empty() {
        message.push_str(&summarize("Directories", &listing.dirs));
    }
    if !listing.files.is_empty() {
        message.push_str(&summarize("Files", &listing.files));
    }
    message
}

#[async_trait]
impl ActionHandler for FilesystemHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::ListDirectory,
            IntentKind::CreateDirectory,
            IntentKind::OpenFile,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::ListDirectory => {
                let raw = intent.param("path").unwrap_or(".");
                let listing = match self.fs.list(&resolve_path(raw)).await {
                    Err(CapabilityError::InvalidArgument(_)) => {
                        return Err(ActionError::InvalidInput(format!(
                            "Path '{}' isn't a directory or I can't find it.",
                            raw
                        )))
                    }
                    other => other?,
                };
                Ok(listing_message(raw, &listing))
            }
            IntentKind::CreateDirectory => {
                let raw = required(intent, "path")?;
                self.fs.create_dir(&resolve_path(raw)).await?;
                tracing::info!(path = raw, "Directory created");
                Ok(format!("Directory '{}' created (or already existed).", raw))
            }
            IntentKind::OpenFile => {
                let raw = required(intent, "path")?;
                let path = resolve_path(raw);
                match self.fs.open(&path).await {
                    Err(CapabilityError::InvalidArgument(_)) => Err(ActionError::InvalidInput(
                        format!("'{}' isn't a file or I can't find it.", raw),
                    )),
                    other => {
                        other?;
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| raw.to_string());
                        Ok(format!(
                            "File '{}' should be opening with its default application.",
                            name
                        ))
                    }
                }
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        format!(
            "{}: {}",
            intent.kind,
            intent.param("path").unwrap_or(".")
        )
    }
}
