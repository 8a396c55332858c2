//! Client preferences persisted between sessions.
//!
//! Stored as pretty JSON next to the service's own config, under the
//! platform config directory (`~/.config/SHARP Studio/client.json` on Linux,
//! `~/Library/Application Support/SHARP Studio/client.json` on macOS).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::input::Device;

const PREFERENCES_DIR: &str = "SHARP Studio";
const PREFERENCES_FILENAME: &str = "client.json";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 7860;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Base URL of the prediction service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Last device picked in the options panel.
    #[serde(default)]
    pub device: Device,

    /// Whether video rendering was requested last time.
    #[serde(default)]
    pub render: bool,

    /// Last output folder reported by the service (display only).
    #[serde(default)]
    pub last_output_root: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            device: Device::Default,
            render: false,
            last_output_root: None,
            updated_at: None,
        }
    }
}

/// `http://{SHARP_GUI_HOST}:{SHARP_GUI_PORT}`, falling back to
/// `http://127.0.0.1:7860` when unset or unparsable.
pub fn default_server_url() -> String {
    let host = std::env::var("SHARP_GUI_HOST")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = std::env::var("SHARP_GUI_PORT")
        .ok()
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    format!("http://{}:{}", host.trim(), port)
}

impl Preferences {
    /// `<config dir>/SHARP Studio/client.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(PREFERENCES_DIR).join(PREFERENCES_FILENAME))
    }

    /// Load from the default location, or defaults if absent or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Preferences: cannot determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(prefs) => {
                    log::debug!("Preferences: loaded from {}", path.display());
                    prefs
                }
                Err(e) => {
                    log::warn!("Preferences: failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Preferences: failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path().ok_or_else(|| "cannot determine config directory".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| format!("create dir: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| format!("serialize: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("write: {}", e))?;
        Ok(())
    }

    pub fn set_server_url(&mut self, url: impl Into<String>) {
        self.server_url = url.into();
        self.touch();
    }

    pub fn set_device(&mut self, device: Device) {
        self.device = device;
        self.touch();
    }

    pub fn set_render(&mut self, render: bool) {
        self.render = render;
        self.touch();
    }

    pub fn set_last_output_root(&mut self, path: Option<String>) {
        self.last_output_root = path;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
