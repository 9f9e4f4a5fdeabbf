//! Recording capabilities for tests and dry runs.
//!
//! [`MockDesktop`] performs no side effects. Every successful call is
//! appended to a call log such as `"volume up"` or `"power shutdown"`;
//! capabilities can be switched to fail by name.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{
    AppLauncher, AppTerminator, Browser, Capabilities, CapabilityResult, ClipboardAccessor,
    DirListing, FilesystemAccessor, InterfaceLauncher, MediaController, PowerController,
    RecycleBinController, SystemProbe, SystemStats, TextTyper, VolumeController, WindowFocuser,
};
use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

struct MockState {
    calls: Vec<String>,
    failing: Vec<&'static str>,
    clipboard: String,
    running: usize,
    online: bool,
    uptime: Duration,
    stats: SystemStats,
    listing: DirListing,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            failing: Vec::new(),
            clipboard: String::new(),
            running: 1,
            online: true,
            uptime: Duration::from_secs(3723),
            stats: SystemStats {
                cpu_percent: 12.5,
                mem_total_kb: 8 * 1024 * 1024,
                mem_available_kb: 6 * 1024 * 1024,
            },
            listing: DirListing::default(),
        }
    }
}

/// A desktop that only records what it was asked to do.
#[derive(Default)]
pub struct MockDesktop {
    state: Mutex<MockState>,
}

impl MockDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Capabilities where every concern, filesystem included, is this mock.
    pub fn capabilities(mock: &Arc<Self>) -> Capabilities {
        Capabilities {
            apps: mock.clone(),
            terminator: mock.clone(),
            volume: mock.clone(),
            media: mock.clone(),
            windows: mock.clone(),
            power: mock.clone(),
            recycle_bin: mock.clone(),
            clipboard: mock.clone(),
            filesystem: mock.clone(),
            typer: mock.clone(),
            browser: mock.clone(),
            system: mock.clone(),
            interface: mock.clone(),
        }
    }

    /// Make every call to `capability` fail as unavailable.
    pub fn fail_on(&self, capability: &'static str) {
        self.state().failing.push(capability);
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn set_clipboard(&self, text: impl Into<String>) {
        self.state().clipboard = text.into();
    }

    /// Number of processes `terminate` reports as matched.
    pub fn set_running(&self, count: usize) {
        self.state().running = count;
    }

    pub fn set_online(&self, online: bool) {
        self.state().online = online;
    }

    pub fn set_uptime(&self, uptime: Duration) {
        self.state().uptime = uptime;
    }

    pub fn set_listing(&self, listing: DirListing) {
        self.state().listing = listing;
    }

    fn record(&self, capability: &'static str, call: String) -> CapabilityResult<()> {
        let mut state = self.state();
        if state.failing.contains(&capability) {
            return Err(CapabilityError::unavailable(capability, "disabled in mock"));
        }
        tracing::debug!(%call, "Mock capability invoked");
        state.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl AppLauncher for MockDesktop {
    async fn launch(&self, name: &str) -> CapabilityResult<()> {
        self.record("Application launch", format!("launch {}", name))
    }
}

#[async_trait]
impl AppTerminator for MockDesktop {
    async fn terminate(&self, name: &str) -> CapabilityResult<usize> {
        self.record("Application control", format!("terminate {}", name))?;
        Ok(self.state().running)
    }
}

#[async_trait]
impl VolumeController for MockDesktop {
    async fn apply(&self, command: VolumeCommand) -> CapabilityResult<()> {
        let detail = match command {
            VolumeCommand::Set(level) => format!("set {}", level),
            VolumeCommand::Up => "up".to_string(),
            VolumeCommand::Down => "down".to_string(),
            VolumeCommand::ToggleMute => "mute".to_string(),
        };
        self.record("Volume control", format!("volume {}", detail))
    }
}

#[async_trait]
impl MediaController for MockDesktop {
    async fn send(&self, command: MediaCommand) -> CapabilityResult<()> {
        self.record("Media control", format!("media {}", command))
    }
}

#[async_trait]
impl WindowFocuser for MockDesktop {
    async fn focus(&self, target: &str) -> CapabilityResult<()> {
        self.record("Window focus", format!("focus {}", target))
    }

    async fn close_active_tab(&self) -> CapabilityResult<()> {
        self.record("Tab control", "close_tab".to_string())
    }
}

#[async_trait]
impl PowerController for MockDesktop {
    async fn power(&self, action: PowerAction) -> CapabilityResult<()> {
        self.record("Power control", format!("power {}", action))
    }

    async fn lock_screen(&self) -> CapabilityResult<()> {
        self.record("Screen lock", "lock_screen".to_string())
    }
}

#[async_trait]
impl RecycleBinController for MockDesktop {
    async fn empty(&self) -> CapabilityResult<()> {
        self.record("Recycle bin", "empty_recycle_bin".to_string())
    }
}

#[async_trait]
impl ClipboardAccessor for MockDesktop {
    async fn copy(&self, text: &str) -> CapabilityResult<()> {
        self.record("Clipboard", format!("copy {}", text))?;
        self.state().clipboard = text.to_string();
        Ok(())
    }

    async fn read(&self) -> CapabilityResult<String> {
        self.record("Clipboard", "read_clipboard".to_string())?;
        Ok(self.state().clipboard.clone())
    }
}

#[async_trait]
impl FilesystemAccessor for MockDesktop {
    async fn list(&self, path: &Path) -> CapabilityResult<DirListing> {
        self.record("Filesystem", format!("list {}", path.display()))?;
        Ok(self.state().listing.clone())
    }

    async fn create_dir(&self, path: &Path) -> CapabilityResult<()> {
        self.record("Filesystem", format!("create_dir {}", path.display()))
    }

    async fn open(&self, path: &Path) -> CapabilityResult<()> {
        self.record("Filesystem", format!("open {}", path.display()))
    }
}

#[async_trait]
impl TextTyper for MockDesktop {
    async fn type_text(&self, text: &str) -> CapabilityResult<()> {
        self.record("Typing", format!("type {}", text))
    }
}

#[async_trait]
impl Browser for MockDesktop {
    async fn open_url(&self, url: &str) -> CapabilityResult<()> {
        self.record("Browser", format!("open_url {}", url))
    }
}

#[async_trait]
impl SystemProbe for MockDesktop {
    async fn uptime(&self) -> CapabilityResult<Duration> {
        self.record("Uptime", "uptime".to_string())?;
        Ok(self.state().uptime)
    }

    async fn stats(&self) -> CapabilityResult<SystemStats> {
        self.record("System statistics", "stats".to_string())?;
        Ok(self.state().stats)
    }

    async fn internet_reachable(&self) -> bool {
        self.state().online
    }
}

#[async_trait]
impl InterfaceLauncher for MockDesktop {
    async fn launch_interface(&self) -> CapabilityResult<()> {
        self.record("Graphical interface", "launch_interface".to_string())
    }
}
