//! Clipboard action handler.
//!
//! Copies text to, or reads text from, the system clipboard.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capability::ClipboardAccessor;
use crate::error::ActionError;
use crate::handler::{preview, required, ActionHandler};
use crate::types::{Intent, IntentKind};

/// Characters of clipboard content read back to the user.
const READ_PREVIEW: usize = 100;

pub struct ClipboardHandler {
    clipboard: Arc<dyn ClipboardAccessor>,
}

impl ClipboardHandler {
    pub fn new(clipboard: Arc<dyn ClipboardAccessor>) -> Self {
        Self { clipboard }
    }
}

#[async_trait]
impl ActionHandler for ClipboardHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::CopyToClipboard, IntentKind::ReadClipboard]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::CopyToClipboard => {
                let text = required(intent, "text")?;
                self.clipboard.copy(text).await?;
                tracing::info!(text_len = text.len(), "Copied to clipboard");
                Ok(format!(
                    "'{}...' has been copied to the clipboard.",
                    preview(text, 30)
                ))
            }
            IntentKind::ReadClipboard => {
                let content = self.clipboard.read().await?;
                if content.trim().is_empty() {
                    return Ok("The clipboard is currently empty.".to_string());
                }
                let ellipsis = if content.chars().count() > READ_PREVIEW {
                    "..."
                } else {
                    ""
                };
                Ok(format!(
                    "The clipboard contains: '{}{}'",
                    preview(&content, READ_PREVIEW),
                    ellipsis
                ))
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent.kind {
            IntentKind::CopyToClipboard => format!(
                "Copy to clipboard: {}",
                preview(intent.param("text").unwrap_or("<no text>"), 50)
            ),
            _ => "Read clipboard".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::mock::MockDesktop;

    fn make_handler() -> (ClipboardHandler, Arc<MockDesktop>) {
        let mock = Arc::new(MockDesktop::new());
        (ClipboardHandler::new(mock.clone()), mock)
    }

    fn copy(text: &str) -> Intent {
        Intent::new(IntentKind::CopyToClipboard, "copy").with_param("text", text)
    }

    #[tokio::test]
    async fn test_clipboard_copy() {
        let (handler, mock) = make_handler();
        let msg = handler.execute(&copy("some text to copy")).await.unwrap();
        assert_eq!(msg, "'some text to copy...' has been copied to the clipboard.");
        assert_eq!(mock.calls(), vec!["copy some text to copy"]);
    }

    #[tokio::test]
    async fn test_clipboard_missing_text() {
        let (handler, mock) = make_handler();
        let err = handler
            .execute(&Intent::new(IntentKind::CopyToClipboard, "copy"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::MissingParameter("text")));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clipboard_read_empty() {
        let (handler, _) = make_handler();
        let msg = handler
            .execute(&Intent::new(IntentKind::ReadClipboard, "read clipboard"))
            .await
            .unwrap();
        assert_eq!(msg, "The clipboard is currently empty.");
    }

    #[tokio::test]
    async fn test_clipboard_read_truncates() {
        let (handler, mock) = make_handler();
        mock.set_clipboard("x".repeat(150));
        let msg = handler
            .execute(&Intent::new(IntentKind::ReadClipboard, "read clipboard"))
            .await
            .unwrap();
        assert_eq!(msg, format!("The clipboard contains: '{}...'", "x".repeat(100)));
    }

    #[tokio::test]
    async fn test_clipboard_unavailable() {
        let (handler, mock) = make_handler();
        mock.fail_on("Clipboard");
        let err = handler.execute(&copy("hi")).await.unwrap_err();
        assert!(matches!(err, ActionError::Capability(_)));
    }

    #[test]
    fn test_clipboard_describe() {
        let (handler, _) = make_handler();
        assert_eq!(
            handler.describe(&copy("hello world")),
            "Copy to clipboard: hello world"
        );
    }
}
