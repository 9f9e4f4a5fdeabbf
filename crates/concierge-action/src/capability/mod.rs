//! Host capabilities used by action handlers.
//!
//! Each OS-facing concern is one trait. [`Capabilities::for_current_platform`]
//! picks the implementation for the compiled target once at startup; handlers
//! only ever see the trait objects.

pub mod mock;
mod portable;
pub(crate) mod process;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

pub use portable::{LocalFilesystem, NetworkProbe, NoInterface, SystemBrowser, Unsupported};

pub type CapabilityResult<T> = Result<T, CapabilityError>;

#[async_trait]
pub trait AppLauncher: Send + Sync {
    async fn launch(&self, name: &str) -> CapabilityResult<()>;
}

#[async_trait]
pub trait AppTerminator: Send + Sync {
    /// Terminate every process matching `name`, returning how many were hit.
    async fn terminate(&self, name: &str) -> CapabilityResult<usize>;
}

#[async_trait]
pub trait VolumeController: Send + Sync {
    async fn apply(&self, command: VolumeCommand) -> CapabilityResult<()>;
}

#[async_trait]
pub trait MediaController: Send + Sync {
    async fn send(&self, command: MediaCommand) -> CapabilityResult<()>;
}

#[async_trait]
pub trait WindowFocuser: Send + Sync {
    async fn focus(&self, target: &str) -> CapabilityResult<()>;
    async fn close_active_tab(&self) -> CapabilityResult<()>;
}

#[async_trait]
pub trait PowerController: Send + Sync {
    async fn power(&self, action: PowerAction) -> CapabilityResult<()>;
    async fn lock_screen(&self) -> CapabilityResult<()>;
}

#[async_trait]
pub trait RecycleBinController: Send + Sync {
    async fn empty(&self) -> CapabilityResult<()>;
}

#[async_trait]
pub trait ClipboardAccessor: Send + Sync {
    async fn copy(&self, text: &str) -> CapabilityResult<()>;
    async fn read(&self) -> CapabilityResult<String>;
}

/// Entries of a directory, names only, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl DirListing {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

#[async_trait]
pub trait FilesystemAccessor: Send + Sync {
    /// Fails with `InvalidArgument` when `path` is not a directory.
    async fn list(&self, path: &Path) -> CapabilityResult<DirListing>;
    /// Creates missing parents; an existing directory is not an error.
    async fn create_dir(&self, path: &Path) -> CapabilityResult<()>;
    /// Fails with `InvalidArgument` when `path` is not a file.
    async fn open(&self, path: &Path) -> CapabilityResult<()>;
}

#[async_trait]
pub trait TextTyper: Send + Sync {
    async fn type_text(&self, text: &str) -> CapabilityResult<()>;
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn open_url(&self, url: &str) -> CapabilityResult<()>;
}

/// Point-in-time load figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStats {
    /// CPU utilisation in percent, 0 to 100.
    pub cpu_percent: f64,
    pub mem_total_kb: u64,
    pub mem_available_kb: u64,
}

impl SystemStats {
    pub fn mem_used_percent(&self) -> f64 {
        if self.mem_total_kb == 0 {
            return 0.0;
        }
        let used = self.mem_total_kb.saturating_sub(self.mem_available_kb);
        used as f64 * 100.0 / self.mem_total_kb as f64
    }

    pub fn mem_total_gb(&self) -> f64 {
        self.mem_total_kb as f64 / (1024.0 * 1024.0)
    }
}

#[async_trait]
pub trait SystemProbe: Send + Sync {
    async fn uptime(&self) -> CapabilityResult<Duration>;
    async fn stats(&self) -> CapabilityResult<SystemStats>;
    async fn internet_reachable(&self) -> bool;
}

#[async_trait]
pub trait InterfaceLauncher: Send + Sync {
    async fn launch_interface(&self) -> CapabilityResult<()>;
}

/// The full set of host capabilities handed to the handler registry.
#[derive(Clone)]
pub struct Capabilities {
    pub apps: Arc<dyn AppLauncher>,
    pub terminator: Arc<dyn AppTerminator>,
    pub volume: Arc<dyn VolumeController>,
    pub media: Arc<dyn MediaController>,
    pub windows: Arc<dyn WindowFocuser>,
    pub power: Arc<dyn PowerController>,
    pub recycle_bin: Arc<dyn RecycleBinController>,
    pub clipboard: Arc<dyn ClipboardAccessor>,
    pub filesystem: Arc<dyn FilesystemAccessor>,
    pub typer: Arc<dyn TextTyper>,
    pub browser: Arc<dyn Browser>,
    pub system: Arc<dyn SystemProbe>,
    pub interface: Arc<dyn InterfaceLauncher>,
}

impl Capabilities {
    /// Capabilities backed by the host the binary was compiled for.
    pub fn for_current_platform() -> Self {
        #[cfg(target_os = "linux")]
        let desktop = Arc::new(linux::LinuxDesktop::new());
        #[cfg(target_os = "macos")]
        let desktop = Arc::new(macos::MacDesktop::new());
        #[cfg(target_os = "windows")]
        let desktop = Arc::new(windows::WindowsDesktop::new());
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        let desktop = Arc::new(Unsupported);

        tracing::info!(os = std::env::consts::OS, "Host capabilities selected");
        Self::from_desktop(desktop)
    }

    /// Capabilities where every desktop concern is served by one value and
    /// the portable concerns use their default implementations.
    pub fn from_desktop<D>(desktop: Arc<D>) -> Self
    where
        D: AppLauncher
            + AppTerminator
            + VolumeController
            + MediaController
            + WindowFocuser
            + PowerController
            + RecycleBinController
            + ClipboardAccessor
            + TextTyper
            + SystemProbe
            + 'static,
    {
        Self {
            apps: desktop.clone(),
            terminator: desktop.clone(),
            volume: desktop.clone(),
            media: desktop.clone(),
            windows: desktop.clone(),
            power: desktop.clone(),
            recycle_bin: desktop.clone(),
            clipboard: desktop.clone(),
            filesystem: Arc::new(LocalFilesystem),
            typer: desktop.clone(),
            browser: Arc::new(SystemBrowser),
            system: desktop,
            interface: Arc::new(NoInterface),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn resolve_path(raw: &str) -> PathBuf {
    concierge_core::types::expand_home(raw.trim())
}
