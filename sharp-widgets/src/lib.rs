//! View-model primitives shared by SHARP Studio pages.
//!
//! Nothing here knows about the prediction service; these are the building
//! blocks a page composes: transient preview handles, tiles, the lightbox,
//! the status line, toasts and the loading lock, plus the [`SharpApp`]
//! contract pages implement to plug into the shell.

pub mod app_trait;
pub mod lightbox;
pub mod resource_handles;
pub mod status;
pub mod tile;
pub mod toast;
pub mod ui_lock;

pub use app_trait::{AppInfo, AppRegistry, SharpApp};
pub use lightbox::{Key, Lightbox};
pub use resource_handles::{ResourceHandle, ResourceHandleTracker};
pub use status::{StatusKind, StatusLine};
pub use tile::{MediaKind, Tile};
pub use toast::{Toast, TOAST_DURATION};
pub use ui_lock::{UiLock, UiLockGuard};
