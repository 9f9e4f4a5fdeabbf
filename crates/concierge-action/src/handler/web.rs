//! URL opening, web search and weather lookups.
//!
//! All three end in the default browser; search and weather build a query
//! URL first.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::capability::Browser;
use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind};

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

pub struct WebHandler {
    browser: Arc<dyn Browser>,
}

impl WebHandler {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }

    async fn open(&self, url: &Url) -> Result<(), ActionError> {
        tracing::info!(url = %url, "Opening URL");
        self.browser.open_url(url.as_str()).await?;
        Ok(())
    }
}

/// Parse a user supplied address, adding `https://` when no scheme is given.
pub fn normalize_url(raw: &str) -> Result<Url, ActionError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    Url::parse(&candidate)
        .ok()
        .filter(|u| u.host_str().is_some())
        .ok_or_else(|| {
            ActionError::InvalidInput(format!("'{}' doesn't look like a web address.", raw))
        })
}

pub fn search_url(query: &str) -> Result<Url, ActionError> {
    Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query)])
        .map_err(|e| ActionError::ExecutionFailed(e.to_string()))
}

#[async_trait]
impl ActionHandler for WebHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::OpenUrl, IntentKind::WebSearch, IntentKind::Weather]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::OpenUrl => {
                let url = normalize_url(required(intent, "url")?)?;
                self.open(&url).await?;
                Ok(format!("URL '{}' opened.", url))
            }
            IntentKind::WebSearch => {
                let query = required(intent, "query")?;
                self.open(&search_url(query)?).await?;
                Ok(format!("Searching the web for '{}'.", query))
            }
            IntentKind::Weather => {
                let location = required(intent, "location")?;
                self.open(&search_url(&format!("weather in {}", location))?)
                    .await?;
                Ok(format!(
                    "I've initiated a search for the weather in '{}'.",
                    location
                ))
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        let target = intent
            .param("url")
            .or_else(|| intent.param("query"))
            .or_else(|| intent.param("location"))
            .unwrap_or("<nothing>");
        format!("{}: {}", intent.kind, target)
    }
}
