//! # PredictScreen - The Prediction Page
//!
//! Owns every controller of the page and routes user actions to them. Front
//! ends never touch the controllers directly; they call the action methods
//! here and render [`PageView`] snapshots.
//!
//! A prediction does not hold the page. [`PredictScreen::start_submit`]
//! spawns the request and returns; the front end then keeps handling user
//! actions and calls [`PredictScreen::poll`] (or awaits
//! [`PredictScreen::next_update`]) to apply progress and the outcome.

use std::sync::Arc;

use serde::Serialize;
use sharp_data::{Device, InputFile, PredictionResult, StudioBackend};
use sharp_widgets::{Key, Lightbox, ResourceHandle, StatusLine, Tile};
use tokio::time::Instant;

use crate::file_set::{ExternalFiles, FileSetController, HeroPreview, PreviewTarget};
use crate::output_root::{OutputRootController, OutputRootDisplay};
use crate::progress::{Stage, StageStatus, TimelineConfig};
use crate::results::{DownloadEntry, OutputGrid};
use crate::submission::{SubmissionController, SubmitOptions, SubmitOutcome};

// ── View snapshot ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChipView {
    pub index: usize,
    pub label: String,
    pub source: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub stage: Stage,
    pub status: StageStatus,
}

/// Which output folder buttons accept a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRootActions {
    pub refresh: bool,
    pub select: bool,
    pub open: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PageView {
    pub chips: Vec<ChipView>,
    /// `None` shows the placeholder.
    pub hero: Option<Tile>,
    pub stages: Vec<StageView>,
    pub status: StatusLine,
    pub outputs: OutputGrid,
    pub downloads: Vec<DownloadEntry>,
    pub bundle: Option<String>,
    pub warning: Option<String>,
    pub lightbox: Option<Tile>,
    pub scroll_locked: bool,
    pub output_root: OutputRootDisplay,
    pub output_root_error: Option<String>,
    pub output_root_confirmation: Option<String>,
    pub output_root_actions: OutputRootActions,
    /// Submit and input controls.
    pub controls_enabled: bool,
}

/// Which controller wrote the hero last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum HeroSource {
    #[default]
    Input,
    Output,
}

// ── Page ──────────────────────────────────────────────────────────────────────

pub struct PredictScreen {
    files: FileSetController,
    submission: SubmissionController,
    output_root: OutputRootController,
    lightbox: Lightbox,
    // Handle behind an input tile shown in the lightbox
    lightbox_lease: Option<ResourceHandle>,
    options: SubmitOptions,
    hero_source: HeroSource,
}

impl PredictScreen {
    pub fn new(backend: Arc<dyn StudioBackend>, timeline: TimelineConfig) -> Self {
        Self {
            files: FileSetController::new(),
            submission: SubmissionController::new(Arc::clone(&backend), timeline),
            output_root: OutputRootController::new(backend),
            lightbox: Lightbox::new(),
            lightbox_lease: None,
            options: SubmitOptions {
                device: Device::Default.to_string(),
                ..Default::default()
            },
            hero_source: HeroSource::Input,
        }
    }

    /// Initial page load.
    pub async fn load(&mut self) {
        self.submission.prepare_idle(self.options.render);
        self.output_root.refresh().await;
    }

    // ── Input selection ───────────────────────────────────────────────────────

    pub fn set_selection(&mut self, files: Vec<InputFile>) {
        if self.ignore_while_busy("set_selection") {
            return;
        }
        self.files.set_selection(files);
        self.hero_source = HeroSource::Input;
    }

    pub fn add_files(&mut self, files: Vec<InputFile>) {
        if self.ignore_while_busy("add_files") {
            return;
        }
        self.files.append(files);
        self.hero_source = HeroSource::Input;
    }

    /// Chip remove button. Out of range does nothing.
    pub fn remove_file(&mut self, index: usize) -> bool {
        if self.ignore_while_busy("remove_file") {
            return false;
        }
        let removed = self.files.remove_at(index);
        if removed {
            self.hero_source = HeroSource::Input;
        }
        removed
    }

    /// Files from the picker or a drop.
    pub fn on_external_files(&mut self, source: ExternalFiles) -> usize {
        if self.ignore_while_busy("on_external_files") {
            return self.files.len();
        }
        let files = source.normalize();
        let replaces = !files.is_empty();
        let len = self.files.on_external_mutation(ExternalFiles::Picked(files));
        if replaces {
            self.hero_source = HeroSource::Input;
        }
        len
    }

    pub fn mark_preview_loaded(&mut self, target: PreviewTarget) -> bool {
        self.files.mark_loaded(target)
    }

    pub fn mark_all_previews_loaded(&mut self) {
        self.files.mark_all_loaded();
    }

    fn ignore_while_busy(&self, action: &str) -> bool {
        let busy = self.submission.is_busy();
        if busy {
            log::debug!("{} ignored while a prediction runs", action);
        }
        busy
    }

    // ── Options ───────────────────────────────────────────────────────────────

    pub fn set_device(&mut self, device: impl Into<String>) {
        self.options.device = device.into();
    }

    /// Toggling render while idle updates the stage list right away.
    pub fn set_render(&mut self, render: bool) {
        self.options.render = render;
        self.submission.prepare_idle(render);
    }

    pub fn set_unsafe_checkpoint(&mut self, unsafe_checkpoint: bool) {
        self.options.unsafe_checkpoint = unsafe_checkpoint;
    }

    pub fn set_checkpoint(&mut self, checkpoint: Option<InputFile>) {
        self.options.checkpoint = checkpoint;
    }

    pub fn options(&self) -> &SubmitOptions {
        &self.options
    }

    // ── Submission ────────────────────────────────────────────────────────────

    /// Validate and send the current selection. `Some` when it ended without
    /// reaching the network; otherwise drive it with [`Self::poll`] or
    /// [`Self::next_update`] while the rest of the page stays usable.
    pub fn start_submit(&mut self) -> Option<SubmitOutcome> {
        self.submission.start(self.files.selection(), self.options.clone())
    }

    /// Event-loop step: applies a finished request or due progress steps,
    /// and clears an expired output folder confirmation.
    pub fn poll(&mut self, now: Instant) -> Option<SubmitOutcome> {
        self.output_root.expire_confirmation(now);
        let outcome = self.submission.poll(now);
        self.after_outcome(outcome)
    }

    /// Wait for the next progress step or the outcome. Returns `None` right
    /// away when no request is in flight.
    pub async fn next_update(&mut self) -> Option<SubmitOutcome> {
        let outcome = self.submission.next_update().await;
        self.after_outcome(outcome)
    }

    /// Start and wait for the outcome.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Some(outcome) = self.start_submit() {
            return outcome;
        }
        loop {
            if let Some(outcome) = self.next_update().await {
                return outcome;
            }
        }
    }

    fn after_outcome(&mut self, outcome: Option<SubmitOutcome>) -> Option<SubmitOutcome> {
        if matches!(outcome, Some(SubmitOutcome::Completed { .. })) {
            self.hero_source = HeroSource::Output;
        }
        outcome
    }

    pub fn is_running(&self) -> bool {
        self.submission.is_running()
    }

    pub fn last_result(&self) -> Option<&PredictionResult> {
        self.submission.last_result()
    }

    /// Submit and input controls.
    pub fn controls_enabled(&self) -> bool {
        !self.submission.is_busy()
    }

    // ── Output folder ─────────────────────────────────────────────────────────

    pub async fn refresh_output_root(&mut self) {
        self.output_root.refresh().await;
    }

    pub async fn select_output_root(&mut self) {
        self.output_root.select().await;
    }

    pub async fn open_output_root(&mut self) {
        self.output_root.open().await;
    }

    pub fn output_root(&self) -> &OutputRootController {
        &self.output_root
    }

    // ── Lightbox ──────────────────────────────────────────────────────────────

    /// Open input file `index` in the lightbox through its own handle.
    pub fn open_input_tile(&mut self, index: usize) -> bool {
        let Some((tile, handle)) = self.files.lease_tile(index) else {
            return false;
        };
        self.lightbox.open(tile);
        self.replace_lease(Some(handle));
        true
    }

    pub fn open_output_tile(&mut self, index: usize) -> bool {
        let Some(tile) = self.submission.results().tiles().get(index).cloned() else {
            return false;
        };
        self.lightbox.open(tile);
        self.replace_lease(None);
        true
    }

    pub fn close_lightbox(&mut self) {
        if self.lightbox.close().is_some() {
            self.replace_lease(None);
        }
    }

    pub fn handle_key(&mut self, key: Key) {
        if self.lightbox.handle_key(key).is_some() {
            self.replace_lease(None);
        }
    }

    fn replace_lease(&mut self, lease: Option<ResourceHandle>) {
        if let Some(previous) = std::mem::replace(&mut self.lightbox_lease, lease) {
            self.files.release_lease(&previous);
        }
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    // ── Snapshot ──────────────────────────────────────────────────────────────

    pub fn files(&self) -> &FileSetController {
        &self.files
    }

    pub fn submission(&self) -> &SubmissionController {
        &self.submission
    }

    fn hero(&self) -> Option<Tile> {
        if self.hero_source == HeroSource::Output {
            if let Some(tile) = self.submission.results().hero() {
                return Some(tile.clone());
            }
        }
        match self.files.hero() {
            HeroPreview::Input { label, preview, .. } => Some(Tile::image(preview.url(), label.clone())),
            HeroPreview::Placeholder => None,
        }
    }

    pub fn view(&self, now: Instant) -> PageView {
        let results = self.submission.results();
        PageView {
            chips: self
                .files
                .chips()
                .iter()
                .map(|chip| ChipView {
                    index: chip.index,
                    label: chip.label.clone(),
                    source: chip.source(),
                })
                .collect(),
            hero: self.hero(),
            stages: self
                .submission
                .timeline()
                .stages()
                .into_iter()
                .map(|(stage, status)| StageView { stage, status })
                .collect(),
            status: self.submission.status().clone(),
            outputs: results.grid().clone(),
            downloads: results.downloads().to_vec(),
            bundle: results.bundle().map(String::from),
            warning: results.warning().map(String::from),
            lightbox: self.lightbox.content().cloned(),
            scroll_locked: self.lightbox.is_scroll_locked(),
            output_root: self.output_root.display().clone(),
            output_root_error: self.output_root.error().map(String::from),
            output_root_confirmation: self.output_root.confirmation(now).map(String::from),
            output_root_actions: OutputRootActions {
                refresh: self.output_root.refresh_enabled(),
                select: self.output_root.select_enabled(),
                open: self.output_root.open_enabled(),
            },
            controls_enabled: self.controls_enabled(),
        }
    }
}
