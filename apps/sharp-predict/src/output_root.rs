//! # OutputRootController - Server-Held Output Folder
//!
//! Shows where the service writes run folders and lets the user change or
//! open it. Failures stay inside this panel; they never touch the predict
//! flow. Each action disables only its own button while it is in flight.

use std::sync::Arc;

use serde::Serialize;
use sharp_data::StudioBackend;
use sharp_widgets::{Toast, UiLock};
use tokio::time::Instant;

pub const UNAVAILABLE_MARKER: &str = "Unavailable";
pub const CHANGED_CONFIRMATION: &str = "Output folder updated.";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "path", rename_all = "lowercase")]
pub enum OutputRootDisplay {
    #[default]
    Loading,
    Path(String),
    Unavailable,
}

impl OutputRootDisplay {
    pub fn text(&self) -> &str {
        match self {
            OutputRootDisplay::Loading => "Loading…",
            OutputRootDisplay::Path(path) => path,
            OutputRootDisplay::Unavailable => UNAVAILABLE_MARKER,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            OutputRootDisplay::Path(path) => Some(path),
            _ => None,
        }
    }
}

pub struct OutputRootController {
    backend: Arc<dyn StudioBackend>,
    display: OutputRootDisplay,
    error: Option<String>,
    toast: Toast,
    refresh_lock: UiLock,
    select_lock: UiLock,
    open_lock: UiLock,
}

impl OutputRootController {
    pub fn new(backend: Arc<dyn StudioBackend>) -> Self {
        Self {
            backend,
            display: OutputRootDisplay::Loading,
            error: None,
            toast: Toast::default(),
            refresh_lock: UiLock::new("output-root refresh"),
            select_lock: UiLock::new("output-root select"),
            open_lock: UiLock::new("output-root open"),
        }
    }

    /// Read the current path. Failure shows the unavailable marker.
    pub async fn refresh(&mut self) {
        let Some(_guard) = self.refresh_lock.acquire() else { return };

        match self.backend.output_root().await {
            Ok(path) => {
                log::debug!("Output root: {}", path);
                self.display = OutputRootDisplay::Path(path);
            }
            Err(e) => {
                log::warn!("Failed to read output root: {}", e);
                self.display = OutputRootDisplay::Unavailable;
            }
        }
    }

    /// Ask the service to pick a new folder. Confirms only when the service
    /// reports an actual change.
    pub async fn select(&mut self) {
        let Some(_guard) = self.select_lock.acquire() else { return };

        match self.backend.select_output_root().await {
            Ok(selection) => {
                self.error = None;
                if self.display.path() != Some(selection.path.as_str()) {
                    self.display = OutputRootDisplay::Path(selection.path.clone());
                }
                if selection.changed {
                    log::info!("Output root changed to {}", selection.path);
                    self.toast.show(CHANGED_CONFIRMATION, Instant::now());
                    self.reread_after_change().await;
                }
            }
            Err(e) => {
                let e = e.into_setting();
                log::warn!("Failed to select output root: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// The service owns the path; show what it now reports. A failed read
    /// keeps the selected path.
    async fn reread_after_change(&mut self) {
        match self.backend.output_root().await {
            Ok(path) => self.display = OutputRootDisplay::Path(path),
            Err(e) => log::warn!("Failed to re-read output root after change: {}", e),
        }
    }

    /// Ask the service to reveal the folder in the platform file browser.
    pub async fn open(&mut self) {
        let Some(_guard) = self.open_lock.acquire() else { return };

        match self.backend.open_output_root().await {
            Ok(()) => self.error = None,
            Err(e) => {
                let e = e.into_setting();
                log::warn!("Failed to open output root: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn display(&self) -> &OutputRootDisplay {
        &self.display
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Confirmation text if still on screen at `now`.
    pub fn confirmation(&self, now: Instant) -> Option<&str> {
        self.toast.visible(now)
    }

    /// Clear an expired confirmation. Returns true if one was cleared.
    pub fn expire_confirmation(&mut self, now: Instant) -> bool {
        self.toast.expire(now)
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh_lock.is_enabled()
    }

    pub fn select_enabled(&self) -> bool {
        self.select_lock.is_enabled()
    }

    pub fn open_enabled(&self) -> bool {
        self.open_lock.is_enabled()
    }
}
