//! The SHARP Studio prediction page as a headless view-model.
//!
//! [`PredictScreen`] owns the input gallery, the progress timeline, the
//! request lifecycle, the output gallery, the lightbox and the output folder
//! panel. Front ends feed it user actions and render its [`PageView`].

use std::sync::Arc;

use sharp_data::StudioBackend;
use sharp_widgets::{AppInfo, SharpApp};

pub mod file_set;
pub mod output_root;
pub mod progress;
pub mod results;
pub mod screen;
pub mod submission;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use file_set::{DroppedItem, ExternalFiles, FileSetController, GalleryChip, HeroPreview, PreviewTarget};
pub use output_root::{OutputRootController, OutputRootDisplay, CHANGED_CONFIRMATION, UNAVAILABLE_MARKER};
pub use progress::{ProgressTimeline, Stage, StageStatus, TimelineConfig, RUNNING_NOTE};
pub use results::{DownloadEntry, DownloadKind, OutputGrid, ResultRenderer, MAX_SKELETONS};
pub use screen::{ChipView, OutputRootActions, PageView, PredictScreen, StageView};
pub use submission::{SubmissionController, SubmitOptions, SubmitOutcome, EMPTY_SELECTION};

/// Registration entry for the shell.
pub struct SharpPredictApp;

impl SharpApp for SharpPredictApp {
    type Page = PredictScreen;
    type Context = Arc<dyn StudioBackend>;

    fn info() -> AppInfo {
        AppInfo {
            name: "Predict",
            id: "sharp-predict",
            description: "Turn photos into 3D scenes",
        }
    }

    fn create_page(backend: Self::Context) -> Self::Page {
        PredictScreen::new(backend, TimelineConfig::default())
    }
}
