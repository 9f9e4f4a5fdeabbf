//! macOS desktop driven through `open`, `osascript` and `pbcopy`.

use std::time::Duration;

use async_trait::async_trait;

use super::portable::NetworkProbe;
use super::process::{run, run_with_input};
use super::{
    AppLauncher, AppTerminator, CapabilityResult, ClipboardAccessor, MediaController,
    PowerController, RecycleBinController, SystemProbe, SystemStats, TextTyper,
    VolumeController, WindowFocuser,
};
use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

/// Common spoken names mapped to bundle names.
const APP_ALIASES: &[(&str, &str)] = &[
    ("chrome", "Google Chrome"),
    ("vscode", "Visual Studio Code"),
    ("vs code", "Visual Studio Code"),
    ("system preferences", "System Settings"),
    ("settings", "System Settings"),
    ("facetime", "FaceTime"),
];

fn app_name(spoken: &str) -> String {
    let lower = spoken.trim().to_lowercase();
    APP_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| spoken.trim().to_string())
}

/// Quote a value for inclusion in an AppleScript string literal.
fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

async fn osascript(capability: &'static str, script: &str) -> CapabilityResult<String> {
    run(capability, "osascript", &["-e", script]).await
}

#[derive(Default)]
pub struct MacDesktop;

impl MacDesktop {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AppLauncher for MacDesktop {
    async fn launch(&self, name: &str) -> CapabilityResult<()> {
        let name = app_name(name);
        run("Application launch", "open", &["-a", name.as_str()])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl AppTerminator for MacDesktop {
    async fn terminate(&self, name: &str) -> CapabilityResult<usize> {
        let name = app_name(name);
        let running = osascript(
            "Application control",
            &format!(
                "application {} is running",
                applescript_string(&name)
            ),
        )
        .await?;
        if running.trim() != "true" {
            return Ok(0);
        }
        osascript(
            "Application control",
            &format!("tell application {} to quit", applescript_string(&name)),
        )
        .await?;
        Ok(1)
    }
}

#[async_trait]
impl VolumeController for MacDesktop {
    async fn apply(&self, command: VolumeCommand) -> CapabilityResult<()> {
        let script = match command {
            VolumeCommand::Set(level) => format!("set volume output volume {}", level.min(100)),
            VolumeCommand::Up => {
                "set volume output volume ((output volume of (get volume settings)) + 10)"
                    .to_string()
            }
            VolumeCommand::Down => {
                "set volume output volume ((output volume of (get volume settings)) - 10)"
                    .to_string()
            }
            VolumeCommand::ToggleMute => {
                "set volume output muted (not (output muted of (get volume settings)))".to_string()
            }
        };
        osascript("Volume control", &script).await.map(|_| ())
    }
}

#[async_trait]
impl MediaController for MacDesktop {
    async fn send(&self, command: MediaCommand) -> CapabilityResult<()> {
        let verb = match command {
            MediaCommand::PlayPause => "playpause",
            MediaCommand::Next => "next track",
            MediaCommand::Previous => "previous track",
            MediaCommand::Stop => "pause",
        };
        osascript(
            "Media control",
            &format!("tell application \"Music\" to {}", verb),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl WindowFocuser for MacDesktop {
    async fn focus(&self, target: &str) -> CapabilityResult<()> {
        let name = app_name(target);
        osascript(
            "Window focus",
            &format!("tell application {} to activate", applescript_string(&name)),
        )
        .await
        .map(|_| ())
    }

    async fn close_active_tab(&self) -> CapabilityResult<()> {
        osascript(
            "Tab control",
            "tell application \"System Events\" to keystroke \"w\" using command down",
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl PowerController for MacDesktop {
    async fn power(&self, action: PowerAction) -> CapabilityResult<()> {
        let verb = match action {
            PowerAction::Shutdown => "shut down",
            PowerAction::Restart => "restart",
            PowerAction::Logout => "log out",
        };
        osascript(
            "Power control",
            &format!("tell application \"System Events\" to {}", verb),
        )
        .await
        .map(|_| ())
    }

    async fn lock_screen(&self) -> CapabilityResult<()> {
        run("Screen lock", "pmset", &["displaysleepnow"]).await.map(|_| ())
    }
}

#[async_trait]
impl RecycleBinController for MacDesktop {
    async fn empty(&self) -> CapabilityResult<()> {
        osascript("Recycle bin", "tell application \"Finder\" to empty trash")
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ClipboardAccessor for MacDesktop {
    async fn copy(&self, text: &str) -> CapabilityResult<()> {
        run_with_input("Clipboard", "pbcopy", &[], text).await
    }

    async fn read(&self) -> CapabilityResult<String> {
        run("Clipboard", "pbpaste", &[]).await
    }
}

#[async_trait]
impl TextTyper for MacDesktop {
    async fn type_text(&self, text: &str) -> CapabilityResult<()> {
        osascript(
            "Typing",
            &format!(
                "tell application \"System Events\" to keystroke {}",
                applescript_string(text)
            ),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl SystemProbe for MacDesktop {
    async fn uptime(&self) -> CapabilityResult<Duration> {
        // "{ sec = 1700000000, usec = 0 } Tue Nov 14 ..."
        let raw = run("Uptime", "sysctl", &["-n", "kern.boottime"]).await?;
        let boot: u64 = raw
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CapabilityError::unavailable("Uptime", "unexpected sysctl output"))?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| CapabilityError::unavailable("Uptime", e.to_string()))?;
        Ok(now.saturating_sub(Duration::from_secs(boot)))
    }

    async fn stats(&self) -> CapabilityResult<SystemStats> {
        let total: u64 = run("System statistics", "sysctl", &["-n", "hw.memsize"])
            .await?
            .trim()
            .parse()
            .map_err(|_| CapabilityError::unavailable("System statistics", "bad hw.memsize"))?;
        let vm = run("System statistics", "vm_stat", &[]).await?;
        let page_size = 4096u64;
        let pages = |label: &str| {
            vm.lines()
                .find(|l| l.starts_with(label))
                .and_then(|l| l.rsplit(':').next())
                .and_then(|v| v.trim().trim_end_matches('.').parse::<u64>().ok())
                .unwrap_or(0)
        };
        let available = (pages("Pages free") + pages("Pages inactive")) * page_size;

        let top = run("System statistics", "top", &["-l", "1", "-n", "0"]).await?;
        let idle = top
            .lines()
            .find(|l| l.starts_with("CPU usage"))
            .and_then(|l| l.split(',').find(|p| p.contains("idle")))
            .and_then(|p| p.trim().split('%').next())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(100.0);

        Ok(SystemStats {
            cpu_percent: (100.0 - idle).clamp(0.0, 100.0),
            mem_total_kb: total / 1024,
            mem_available_kb: available / 1024,
        })
    }

    async fn internet_reachable(&self) -> bool {
        NetworkProbe::internet().await
    }
}
