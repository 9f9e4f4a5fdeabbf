//! Linux desktop backed by common userland tools.
//!
//! PulseAudio (`pactl`), MPRIS (`playerctl`), X11 helpers (`wmctrl`,
//! `xdotool`, `xclip`), systemd (`systemctl`, `loginctl`) and GIO (`gio`).
//! Missing tools surface as `CapabilityError::Unavailable`.

use std::time::Duration;

use async_trait::async_trait;

use super::portable::NetworkProbe;
use super::process::{run, run_first, run_with_input, spawn_detached};
use super::{
    AppLauncher, AppTerminator, CapabilityResult, ClipboardAccessor, MediaController,
    PowerController, RecycleBinController, SystemProbe, SystemStats, TextTyper,
    VolumeController, WindowFocuser,
};
use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

const VOLUME_STEP: &str = "10%";

#[derive(Default)]
pub struct LinuxDesktop;

impl LinuxDesktop {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AppLauncher for LinuxDesktop {
    async fn launch(&self, name: &str) -> CapabilityResult<()> {
        let program = name.trim().to_lowercase().replace(' ', "-");
        spawn_detached("Application launch", &program, &[])
            .or_else(|_| spawn_detached("Application launch", "gtk-launch", &[program.as_str()]))
    }
}

#[async_trait]
impl AppTerminator for LinuxDesktop {
    async fn terminate(&self, name: &str) -> CapabilityResult<usize> {
        let pattern = name.trim().to_lowercase();
        let args = ["-i", "-f", pattern.as_str()];
        let pids = match run("Application control", "pgrep", &args).await {
            Ok(out) => out.lines().count(),
            // pgrep exits 1 when nothing matches.
            Err(CapabilityError::CommandFailed { .. }) => 0,
            Err(err) => return Err(err),
        };
        if pids > 0 {
            run("Application control", "pkill", &args).await?;
        }
        Ok(pids)
    }
}

#[async_trait]
impl VolumeController for LinuxDesktop {
    async fn apply(&self, command: VolumeCommand) -> CapabilityResult<()> {
        let level;
        let args: [&str; 3] = match command {
            VolumeCommand::Set(percent) => {
                level = format!("{}%", percent.min(100));
                ["set-sink-volume", "@DEFAULT_SINK@", level.as_str()]
            }
            VolumeCommand::Up => {
                level = format!("+{}", VOLUME_STEP);
                ["set-sink-volume", "@DEFAULT_SINK@", level.as_str()]
            }
            VolumeCommand::Down => {
                level = format!("-{}", VOLUME_STEP);
                ["set-sink-volume", "@DEFAULT_SINK@", level.as_str()]
            }
            VolumeCommand::ToggleMute => ["set-sink-mute", "@DEFAULT_SINK@", "toggle"],
        };
        run("Volume control", "pactl", &args).await.map(|_| ())
    }
}

#[async_trait]
impl MediaController for LinuxDesktop {
    async fn send(&self, command: MediaCommand) -> CapabilityResult<()> {
        let verb = match command {
            MediaCommand::PlayPause => "play-pause",
            MediaCommand::Next => "next",
            MediaCommand::Previous => "previous",
            MediaCommand::Stop => "stop",
        };
        run("Media control", "playerctl", &[verb]).await.map(|_| ())
    }
}

#[async_trait]
impl WindowFocuser for LinuxDesktop {
    async fn focus(&self, target: &str) -> CapabilityResult<()> {
        run("Window focus", "wmctrl", &["-a", target]).await.map(|_| ())
    }

    async fn close_active_tab(&self) -> CapabilityResult<()> {
        run("Tab control", "xdotool", &["key", "--clearmodifiers", "ctrl+w"])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl PowerController for LinuxDesktop {
    async fn power(&self, action: PowerAction) -> CapabilityResult<()> {
        let result = match action {
            PowerAction::Shutdown => run("Power control", "systemctl", &["poweroff"]).await,
            PowerAction::Restart => run("Power control", "systemctl", &["reboot"]).await,
            PowerAction::Logout => {
                let session = std::env::var("XDG_SESSION_ID").unwrap_or_default();
                if session.is_empty() {
                    let user = std::env::var("USER").unwrap_or_default();
                    run("Power control", "loginctl", &["terminate-user", user.as_str()]).await
                } else {
                    run("Power control", "loginctl", &["terminate-session", session.as_str()]).await
                }
            }
        };
        result.map(|_| ())
    }

    async fn lock_screen(&self) -> CapabilityResult<()> {
        let used = run_first(
            "Screen lock",
            &[
                ("loginctl", &["lock-session"]),
                ("xdg-screensaver", &["lock"]),
                ("gnome-screensaver-command", &["-l"]),
                ("dm-tool", &["lock"]),
            ],
        )
        .await?;
        tracing::debug!(locker = used, "Screen locked");
        Ok(())
    }
}

#[async_trait]
impl RecycleBinController for LinuxDesktop {
    async fn empty(&self) -> CapabilityResult<()> {
        run("Recycle bin", "gio", &["trash", "--empty"]).await.map(|_| ())
    }
}

#[async_trait]
impl ClipboardAccessor for LinuxDesktop {
    async fn copy(&self, text: &str) -> CapabilityResult<()> {
        match run_with_input("Clipboard", "wl-copy", &[], text).await {
            Err(CapabilityError::Unavailable { .. }) => {
                run_with_input("Clipboard", "xclip", &["-selection", "clipboard"], text).await
            }
            other => other,
        }
    }

    async fn read(&self) -> CapabilityResult<String> {
        match run("Clipboard", "wl-paste", &["--no-newline"]).await {
            Err(CapabilityError::Unavailable { .. }) => {
                run("Clipboard", "xclip", &["-selection", "clipboard", "-o"]).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl TextTyper for LinuxDesktop {
    async fn type_text(&self, text: &str) -> CapabilityResult<()> {
        run("Typing", "xdotool", &["type", "--delay", "10", "--", text])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl SystemProbe for LinuxDesktop {
    async fn uptime(&self) -> CapabilityResult<Duration> {
        let raw = tokio::fs::read_to_string("/proc/uptime").await?;
        parse_uptime(&raw)
    }

    async fn stats(&self) -> CapabilityResult<SystemStats> {
        let first = parse_cpu_times(&tokio::fs::read_to_string("/proc/stat").await?)?;
        tokio::time::sleep(Duration::from_millis(250)).await;
        let second = parse_cpu_times(&tokio::fs::read_to_string("/proc/stat").await?)?;
        let (mem_total_kb, mem_available_kb) =
            parse_meminfo(&tokio::fs::read_to_string("/proc/meminfo").await?)?;
        Ok(SystemStats {
            cpu_percent: cpu_percent(first, second),
            mem_total_kb,
            mem_available_kb,
        })
    }

    async fn internet_reachable(&self) -> bool {
        NetworkProbe::internet().await
    }
}

fn malformed(file: &str) -> CapabilityError {
    CapabilityError::unavailable("System statistics", format!("unexpected format in {}", file))
}

fn parse_uptime(raw: &str) -> CapabilityResult<Duration> {
    let secs: f64 = raw
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| malformed("/proc/uptime"))?;
    Ok(Duration::from_secs_f64(secs.max(0.0)))
}

/// `(busy, total)` jiffies from the aggregate `cpu` line.
fn parse_cpu_times(raw: &str) -> CapabilityResult<(u64, u64)> {
    let line = raw
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| malformed("/proc/stat"))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return Err(malformed("/proc/stat"));
    }
    let total: u64 = fields.iter().sum();
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Ok((total - idle, total))
}

fn cpu_percent(first: (u64, u64), second: (u64, u64)) -> f64 {
    let busy = second.0.saturating_sub(first.0) as f64;
    let total = second.1.saturating_sub(first.1) as f64;
    if total == 0.0 {
        0.0
    } else {
        (busy * 100.0 / total).clamp(0.0, 100.0)
    }
}

fn parse_meminfo(raw: &str) -> CapabilityResult<(u64, u64)> {
    let field = |name: &str| {
        raw.lines()
            .find(|l| l.starts_with(name))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
    };
    let total = field("MemTotal:").ok_or_else(|| malformed("/proc/meminfo"))?;
    let available = field("MemAvailable:")
        .or_else(|| field("MemFree:"))
        .ok_or_else(|| malformed("/proc/meminfo"))?;
    Ok((total, available))
}
