//! # SharpApp Trait - Page Integration Interface
//!
//! Each page lives in its own crate under `apps/` and connects to the shell
//! through this trait:
//! 1. Import: `use sharp_predict::SharpPredictApp;`
//! 2. Metadata: `SharpPredictApp::info()` goes into the [`AppRegistry`]
//! 3. Construction: `SharpPredictApp::create_page(context)` builds the page
//!    the front end drives
//!
//! ```rust,ignore
//! use sharp_widgets::{AppRegistry, SharpApp};
//! use sharp_predict::SharpPredictApp;
//!
//! let mut registry = AppRegistry::new();
//! registry.register(SharpPredictApp::info());
//! let page = SharpPredictApp::create_page(backend);
//! ```

/// Metadata about a registered app
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppInfo {
    /// Display name shown in UI
    pub name: &'static str,
    /// Unique identifier for the app
    pub id: &'static str,
    pub description: &'static str,
}

/// Trait for pages that integrate with the SHARP Studio shell
pub trait SharpApp {
    /// The view-model the shell drives.
    type Page;
    /// What the shell hands over to build the page.
    type Context;

    /// Returns metadata about this app
    fn info() -> AppInfo
    where
        Self: Sized;

    fn create_page(context: Self::Context) -> Self::Page;
}

/// Registry of all installed apps
pub struct AppRegistry {
    apps: Vec<AppInfo>,
}

impl AppRegistry {
    pub const fn new() -> Self {
        Self { apps: Vec::new() }
    }

    /// Register an app. A second registration under the same id replaces
    /// the first.
    pub fn register(&mut self, info: AppInfo) {
        match self.apps.iter_mut().find(|app| app.id == info.id) {
            Some(existing) => {
                log::warn!("App '{}' registered twice, keeping the latest", info.id);
                *existing = info;
            }
            None => self.apps.push(info),
        }
    }

    pub fn apps(&self) -> &[AppInfo] {
        &self.apps
    }

    pub fn find_by_id(&self, id: &str) -> Option<&AppInfo> {
        self.apps.iter().find(|app| app.id == id)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}
