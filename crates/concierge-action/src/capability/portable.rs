//! Capabilities that work the same on every host.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    AppLauncher, AppTerminator, Browser, CapabilityResult, ClipboardAccessor, DirListing,
    FilesystemAccessor, InterfaceLauncher, MediaController, PowerController,
    RecycleBinController, SystemProbe, SystemStats, TextTyper, VolumeController, WindowFocuser,
};
use crate::error::CapabilityError;
use crate::types::{MediaCommand, PowerAction, VolumeCommand};

/// Hand a path or URL to the desktop's default opener off the async runtime.
async fn open_detached(target: String) -> CapabilityResult<()> {
    tokio::task::spawn_blocking(move || open::that_detached(&target))
        .await
        .map_err(|e| CapabilityError::unavailable("Opener", e.to_string()))??;
    Ok(())
}

/// Filesystem access through `tokio::fs`.
pub struct LocalFilesystem;

#[async_trait]
impl FilesystemAccessor for LocalFilesystem {
    async fn list(&self, path: &Path) -> CapabilityResult<DirListing> {
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CapabilityError::InvalidArgument(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let mut listing = DirListing::default();
        let mut entries = tokio::fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                listing.dirs.push(name);
            } else {
                listing.files.push(name);
            }
        }
        listing.dirs.sort();
        listing.files.sort();
        Ok(listing)
    }

    async fn create_dir(&self, path: &Path) -> CapabilityResult<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn open(&self, path: &Path) -> CapabilityResult<()> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(CapabilityError::InvalidArgument(format!(
                "{} is not a file",
                path.display()
            )));
        }
        open_detached(path.to_string_lossy().into_owned()).await
    }
}

/// Opens URLs in the default browser.
pub struct SystemBrowser;

#[async_trait]
impl Browser for SystemBrowser {
    async fn open_url(&self, url: &str) -> CapabilityResult<()> {
        open_detached(url.to_string()).await
    }
}

/// No graphical front end is bundled.
pub struct NoInterface;

#[async_trait]
impl InterfaceLauncher for NoInterface {
    async fn launch_interface(&self) -> CapabilityResult<()> {
        Err(CapabilityError::unavailable(
            "Graphical interface",
            "this build only provides the text console",
        ))
    }
}

/// Checks reachability with a plain TCP connect.
pub struct NetworkProbe;

impl NetworkProbe {
    pub const TARGET: ([u8; 4], u16) = ([8, 8, 8, 8], 53);
    pub const TIMEOUT: Duration = Duration::from_secs(3);

    pub async fn reachable(addr: SocketAddr, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, tokio::net::TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }

    pub async fn internet() -> bool {
        Self::reachable(SocketAddr::from(Self::TARGET), Self::TIMEOUT).await
    }
}

/// Desktop stand-in for hosts without a native implementation.
pub struct Unsupported;

fn unsupported<T>(capability: &'static str) -> CapabilityResult<T> {
    Err(CapabilityError::unavailable(
        capability,
        format!("not supported on {}", std::env::consts::OS),
    ))
}

#[async_trait]
impl AppLauncher for Unsupported {
    async fn launch(&self, _name: &str) -> CapabilityResult<()> {
        unsupported("Application launch")
    }
}

#[async_trait]
impl AppTerminator for Unsupported {
    async fn terminate(&self, _name: &str) -> CapabilityResult<usize> {
        unsupported("Application control")
    }
}

#[async_trait]
impl VolumeController for Unsupported {
    async fn apply(&self, _command: VolumeCommand) -> CapabilityResult<()> {
        unsupported("Volume control")
    }
}

#[async_trait]
impl MediaController for Unsupported {
    async fn send(&self, _command: MediaCommand) -> CapabilityResult<()> {
        unsupported("Media control")
    }
}

#[async_trait]
impl WindowFocuser for Unsupported {
    async fn focus(&self, _target: &str) -> CapabilityResult<()> {
        unsupported("Window focus")
    }

    async fn close_active_tab(&self) -> CapabilityResult<()> {
        unsupported("Tab control")
    }
}

#[async_trait]
impl PowerController for Unsupported {
    async fn power(&self, _action: PowerAction) -> CapabilityResult<()> {
        unsupported("Power control")
    }

    async fn lock_screen(&self) -> CapabilityResult<()> {
        unsupported("Screen lock")
    }
}

#[async_trait]
impl RecycleBinController for Unsupported {
    async fn empty(&self) -> CapabilityResult<()> {
        unsupported("Recycle bin")
    }
}

#[async_trait]
impl ClipboardAccessor for Unsupported {
    async fn copy(&self, _text: &str) -> CapabilityResult<()> {
        unsupported("Clipboard")
    }

    async fn read(&self) -> CapabilityResult<String> {
        unsupported("Clipboard")
    }
}

#[async_trait]
impl TextTyper for Unsupported {
    async fn type_text(&self, _text: &str) -> CapabilityResult<()> {
        unsupported("Typing")
    }
}

#[async_trait]
impl SystemProbe for Unsupported {
    async fn uptime(&self) -> CapabilityResult<Duration> {
        unsupported("Uptime")
    }

    async fn stats(&self) -> CapabilityResult<SystemStats> {
        unsupported("System statistics")
    }

    async fn internet_reachable(&self) -> bool {
        NetworkProbe::internet().await
    }
}
