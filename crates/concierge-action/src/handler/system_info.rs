//! Uptime, load, connectivity and clock queries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::capability::SystemProbe;
use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Intent, IntentKind};

pub struct SystemInfoHandler {
    system: Arc<dyn SystemProbe>,
}

impl SystemInfoHandler {
    pub fn new(system: Arc<dyn SystemProbe>) -> Self {
        Self { system }
    }

    async fn uptime(&self) -> Result<String, ActionError> {
        let uptime = self.system.uptime().await?;
        let now = Local::now().naive_local();
        let since = chrono::Duration::from_std(uptime)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(now);
        Ok(format!(
            "The system has been up for {} (since {}).",
            format_uptime(uptime),
            since.format("%Y-%m-%d %H:%M:%S")
        ))
    }

    async fn stats(&self) -> Result<String, ActionError> {
        let stats = self.system.stats().await?;
        Ok(format!(
            "Current system load: CPU at {:.1}%, RAM at {:.1}% (of {:.1}GB).",
            stats.cpu_percent,
            stats.mem_used_percent(),
            stats.mem_total_gb()
        ))
    }

    async fn internet(&self) -> Result<String, ActionError> {
        if self.system.internet_reachable().await {
            Ok("Internet connection appears to be active.".to_string())
        } else {
            tracing::info!("Internet check failed");
            Err(ActionError::ExecutionFailed(
                "It seems I'm unable to connect to the internet at the moment.".to_string(),
            ))
        }
    }
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

/// "2 days, 3 hours, 1 minute"; seconds only while under a minute.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if parts.is_empty() {
        parts.push(plural(total % 60, "second"));
    }
    parts.join(", ")
}

/// Answer a clock query; `field` is "time", "date" or "both".
pub fn datetime_message(field: &str, now: NaiveDateTime) -> String {
    let date = now.format("%A, %B %d, %Y");
    let time = now.format("%I:%M %p");
    match field {
        "date" => format!("Today is {}.", date),
        "both" => format!("The current date is {}, and the time is {}.", date, time),
        _ => format!("The time is {}.", time),
    }
}

#[async_trait]
impl ActionHandler for SystemInfoHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::SystemUptime,
            IntentKind::SystemStats,
            IntentKind::InternetCheck,
            IntentKind::DateTime,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::SystemUptime => self.uptime().await,
            IntentKind::SystemStats => self.stats().await,
            IntentKind::InternetCheck => self.internet().await,
            IntentKind::DateTime => Ok(datetime_message(
                intent.param("field").unwrap_or("both"),
                Local::now().naive_local(),
            )),
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        format!("System query: {}", intent.kind)
    }
}
