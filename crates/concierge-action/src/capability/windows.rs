//! Windows desktop driven through PowerShell and built-in tools.

use std::time::Duration;

use async_trait::async_trait;

use super::portable::NetworkProbe;
use super::process::{run, spawn_detached};
use super::{
    AppLauncher, AppTerminator, CapabilityResult, ClipboardAccessor, MediaController,
    PowerController, RecycleBinController, SystemProbe, SystemStats, TextTyper,
    VolumeController, WindowFocuser,
};
use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

/// Spoken names mapped to executables.
const APP_ALIASES: &[(&str, &str)] = &[
    ("notes", "notepad.exe"),
    ("notepad", "notepad.exe"),
    ("chrome", "chrome.exe"),
    ("firefox", "firefox.exe"),
    ("edge", "msedge.exe"),
    ("explorer", "explorer.exe"),
    ("file explorer", "explorer.exe"),
    ("word", "winword.exe"),
    ("excel", "excel.exe"),
    ("powerpoint", "powerpnt.exe"),
    ("outlook", "outlook.exe"),
    ("calculator", "calc.exe"),
    ("cmd", "cmd.exe"),
    ("command prompt", "cmd.exe"),
    ("powershell", "powershell.exe"),
    ("spotify", "spotify.exe"),
    ("vscode", "code.exe"),
    ("task manager", "taskmgr.exe"),
];

// Virtual key codes sent through WScript.Shell.
const VK_VOLUME_MUTE: u8 = 173;
const VK_VOLUME_DOWN: u8 = 174;
const VK_VOLUME_UP: u8 = 175;
const VK_MEDIA_NEXT: u8 = 176;
const VK_MEDIA_PREV: u8 = 177;
const VK_MEDIA_STOP: u8 = 178;
const VK_MEDIA_PLAY_PAUSE: u8 = 179;

fn executable(spoken: &str) -> String {
    let lower = spoken.trim().to_lowercase();
    APP_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, exe)| exe.to_string())
        .unwrap_or_else(|| {
            if lower.ends_with(".exe") {
                lower
            } else {
                format!("{}.exe", lower)
            }
        })
}

/// Quote a value as a PowerShell single-quoted string.
fn ps_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape characters that SendKeys treats as modifiers or groups.
fn sendkeys_escape(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => format!("{{{}}}", c),
            '\n' => "{ENTER}".to_string(),
            other => other.to_string(),
        })
        .collect()
}

async fn powershell(capability: &'static str, script: &str) -> CapabilityResult<String> {
    run(
        capability,
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
    )
    .await
}

async fn send_keys(capability: &'static str, keys: &str) -> CapabilityResult<()> {
    let script = format!(
        "(New-Object -ComObject WScript.Shell).SendKeys({})",
        ps_string(keys)
    );
    powershell(capability, &script).await.map(|_| ())
}

async fn send_virtual_key(capability: &'static str, key: u8, times: u8) -> CapabilityResult<()> {
    let script = format!(
        "$s = New-Object -ComObject WScript.Shell; \
         1..{} | ForEach-Object {{ $s.SendKeys([char]{}) }}",
        times, key
    );
    powershell(capability, &script).await.map(|_| ())
}

#[derive(Default)]
pub struct WindowsDesktop;

impl WindowsDesktop {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AppLauncher for WindowsDesktop {
    async fn launch(&self, name: &str) -> CapabilityResult<()> {
        let exe = executable(name);
        spawn_detached("Application launch", "cmd", &["/C", "start", "", exe.as_str()])
    }
}

#[async_trait]
impl AppTerminator for WindowsDesktop {
    async fn terminate(&self, name: &str) -> CapabilityResult<usize> {
        let exe = executable(name);
        match run("Application control", "taskkill", &["/IM", exe.as_str(), "/F"]).await {
            Ok(out) => Ok(out.lines().filter(|l| l.starts_with("SUCCESS")).count()),
            // taskkill exits non-zero when no process matches.
            Err(CapabilityError::CommandFailed { .. }) => Ok(0),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl VolumeController for WindowsDesktop {
    async fn apply(&self, command: VolumeCommand) -> CapabilityResult<()> {
        match command {
            // Each key press moves the master volume by two percent.
            VolumeCommand::Set(level) => {
                send_virtual_key("Volume control", VK_VOLUME_DOWN, 50).await?;
                let presses = level.min(100) / 2;
                if presses > 0 {
                    send_virtual_key("Volume control", VK_VOLUME_UP, presses).await?;
                }
                Ok(())
            }
            VolumeCommand::Up => send_virtual_key("Volume control", VK_VOLUME_UP, 5).await,
            VolumeCommand::Down => send_virtual_key("Volume control", VK_VOLUME_DOWN, 5).await,
            VolumeCommand::ToggleMute => {
                send_virtual_key("Volume control", VK_VOLUME_MUTE, 1).await
            }
        }
    }
}

#[async_trait]
impl MediaController for WindowsDesktop {
    async fn send(&self, command: MediaCommand) -> CapabilityResult<()> {
        let key = match command {
            MediaCommand::PlayPause => VK_MEDIA_PLAY_PAUSE,
            MediaCommand::Next => VK_MEDIA_NEXT,
            MediaCommand::Previous => VK_MEDIA_PREV,
            MediaCommand::Stop => VK_MEDIA_STOP,
        };
        send_virtual_key("Media control", key, 1).await
    }
}

#[async_trait]
impl WindowFocuser for WindowsDesktop {
    async fn focus(&self, target: &str) -> CapabilityResult<()> {
        let script = format!(
            "if (-not (New-Object -ComObject WScript.Shell).AppActivate({})) {{ exit 1 }}",
            ps_string(target)
        );
        powershell("Window focus", &script).await.map(|_| ())
    }

    async fn close_active_tab(&self) -> CapabilityResult<()> {
        send_keys("Tab control", "^w").await
    }
}

#[async_trait]
impl PowerController for WindowsDesktop {
    async fn power(&self, action: PowerAction) -> CapabilityResult<()> {
        let args: &[&str] = match action {
            PowerAction::Shutdown => &["/s", "/t", "1"],
            PowerAction::Restart => &["/r", "/t", "1"],
            PowerAction::Logout => &["/l"],
        };
        run("Power control", "shutdown", args).await.map(|_| ())
    }

    async fn lock_screen(&self) -> CapabilityResult<()> {
        run("Screen lock", "rundll32.exe", &["user32.dll,LockWorkStation"])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl RecycleBinController for WindowsDesktop {
    async fn empty(&self) -> CapabilityResult<()> {
        powershell("Recycle bin", "Clear-RecycleBin -Force -ErrorAction Stop")
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ClipboardAccessor for WindowsDesktop {
    async fn copy(&self, text: &str) -> CapabilityResult<()> {
        powershell("Clipboard", &format!("Set-Clipboard -Value {}", ps_string(text)))
            .await
            .map(|_| ())
    }

    async fn read(&self) -> CapabilityResult<String> {
        powershell("Clipboard", "Get-Clipboard -Raw").await
    }
}

#[async_trait]
impl TextTyper for WindowsDesktop {
    async fn type_text(&self, text: &str) -> CapabilityResult<()> {
        send_keys("Typing", &sendkeys_escape(text)).await
    }
}

#[async_trait]
impl SystemProbe for WindowsDesktop {
    async fn uptime(&self) -> CapabilityResult<Duration> {
        let raw = powershell(
            "Uptime",
            "$os = Get-CimInstance Win32_OperatingSystem; \
             [int64]((Get-Date) - $os.LastBootUpTime).TotalSeconds",
        )
        .await?;
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| CapabilityError::unavailable("Uptime", "unexpected PowerShell output"))
    }

    async fn stats(&self) -> CapabilityResult<SystemStats> {
        let raw = powershell(
            "System statistics",
            "$os = Get-CimInstance Win32_OperatingSystem; \
             $cpu = (Get-CimInstance Win32_Processor | \
             Measure-Object -Property LoadPercentage -Average).Average; \
             \"$cpu $($os.TotalVisibleMemorySize) $($os.FreePhysicalMemory)\"",
        )
        .await?;
        let fields: Vec<f64> = raw
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        match fields.as_slice() {
            [cpu, total, free] => Ok(SystemStats {
                cpu_percent: cpu.clamp(0.0, 100.0),
                mem_total_kb: *total as u64,
                mem_available_kb: *free as u64,
            }),
            _ => Err(CapabilityError::unavailable(
                "System statistics",
                "unexpected PowerShell output",
            )),
        }
    }

    async fn internet_reachable(&self) -> bool {
        NetworkProbe::internet().await
    }
}
