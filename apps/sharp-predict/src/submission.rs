//! # SubmissionController - Predict Request Lifecycle
//!
//! Runs one prediction: validates the selection, starts the cosmetic
//! [`ProgressTimeline`], spawns the upload and applies the real outcome.
//!
//! The request runs on its own task and reports back over a channel, so the
//! page stays usable while it is in flight. The owner drains updates with
//! [`SubmissionController::poll`] from its event loop, or awaits
//! [`SubmissionController::next_update`]. Both check the channel before the
//! schedule, and the outcome is applied through `finalize`/`reset`, which
//! cancel the remaining schedule before touching any stage. A late cosmetic
//! entry therefore has nothing left to overwrite.

use std::sync::Arc;

use sharp_data::{
    Device, InputFile, PredictRequest, PredictionResult, StudioBackend, StudioError, StudioResult,
    UNREACHABLE,
};
use sharp_widgets::{StatusLine, UiLock, UiLockGuard};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::time::Instant;

use crate::progress::{ProgressTimeline, TimelineConfig};
use crate::results::ResultRenderer;

pub const EMPTY_SELECTION: &str = "Select at least one image to run a prediction.";

/// Options panel state sent along with the images.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Device name as typed or picked; validated on submit.
    pub device: String,
    pub render: bool,
    pub unsafe_checkpoint: bool,
    pub checkpoint: Option<InputFile>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed { device: String, outputs: usize },
    /// Rejected locally, nothing was sent.
    Rejected(StudioError),
    Failed(StudioError),
    /// Another submission holds the lock.
    Busy,
}

/// The request currently in flight. Dropping it releases the busy lock.
struct InFlight {
    outcome_rx: UnboundedReceiver<StudioResult<PredictionResult>>,
    _busy: UiLockGuard,
}

pub struct SubmissionController {
    backend: Arc<dyn StudioBackend>,
    timeline: ProgressTimeline,
    results: ResultRenderer,
    status: StatusLine,
    lock: UiLock,
    in_flight: Option<InFlight>,
    last_result: Option<PredictionResult>,
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn StudioBackend>, timeline: TimelineConfig) -> Self {
        Self {
            backend,
            timeline: ProgressTimeline::new(timeline),
            results: ResultRenderer::new(),
            status: StatusLine::idle(),
            lock: UiLock::new("submit"),
            in_flight: None,
            last_result: None,
        }
    }

    /// Show the idle stage layout for the current render choice. Ignored
    /// while a submission runs.
    pub fn prepare_idle(&mut self, render_requested: bool) {
        if self.lock.is_enabled() {
            self.timeline.reset(render_requested);
        }
    }

    /// Validate, lock, start the timeline and spawn the request.
    ///
    /// Returns `Some` when the submission ended without reaching the
    /// network; `None` means the request is in flight. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self, selection: &[InputFile], options: SubmitOptions) -> Option<SubmitOutcome> {
        let Some(busy) = self.lock.acquire() else {
            return Some(SubmitOutcome::Busy);
        };

        let request = match Self::build_request(selection, options) {
            Ok(request) => request,
            Err(e) => {
                log::info!("Submission rejected: {}", e);
                self.status = StatusLine::error(e.state_label(), e.to_string());
                return Some(SubmitOutcome::Rejected(e));
            }
        };

        let render = request.render;
        let image_count = request.images.len();

        self.last_result = None;
        self.results.show_skeletons(image_count);
        self.timeline.start(render, Instant::now());
        self.status = StatusLine::busy("Running", format!("Uploading {} image(s)…", image_count));

        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let pending = self.backend.predict(request);
        tokio::spawn(async move {
            let outcome = pending.await;
            if outcome_tx.send(outcome).is_err() {
                log::debug!("Submission dropped before its result arrived");
            }
        });

        self.in_flight = Some(InFlight {
            outcome_rx,
            _busy: busy,
        });
        None
    }

    fn build_request(selection: &[InputFile], options: SubmitOptions) -> StudioResult<PredictRequest> {
        if selection.is_empty() {
            return Err(StudioError::validation(EMPTY_SELECTION));
        }
        let device: Device = options.device.parse()?;
        Ok(PredictRequest {
            images: selection.to_vec(),
            device,
            render: options.render,
            unsafe_checkpoint: options.unsafe_checkpoint,
            checkpoint: options.checkpoint,
        })
    }

    /// Non-blocking update step for an event loop. Applies the outcome if it
    /// has arrived, otherwise every timeline entry due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<SubmitOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        match in_flight.outcome_rx.try_recv() {
            Ok(outcome) => return Some(self.finish(Some(outcome))),
            Err(TryRecvError::Disconnected) => return Some(self.finish(None)),
            Err(TryRecvError::Empty) => {}
        }
        self.tick(now);
        None
    }

    /// Wait for the next change: the outcome, or the next timeline deadline.
    /// Returns `None` right away when nothing is in flight. Cancel safe.
    pub async fn next_update(&mut self) -> Option<SubmitOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let deadline = self.timeline.next_deadline();
        let received = tokio::select! {
            biased;
            outcome = in_flight.outcome_rx.recv() => Some(outcome),
            _ = sleep_until(deadline) => None,
        };
        match received {
            Some(outcome) => Some(self.finish(outcome)),
            None => {
                self.tick(Instant::now());
                None
            }
        }
    }

    /// Start and wait for the outcome.
    pub async fn submit(&mut self, selection: &[InputFile], options: SubmitOptions) -> SubmitOutcome {
        if let Some(outcome) = self.start(selection, options) {
            return outcome;
        }
        loop {
            if let Some(outcome) = self.next_update().await {
                return outcome;
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        let notes = self.timeline.poll_due(now);
        if let Some(note) = notes.last() {
            self.status.detail = note.to_string();
        }
    }

    /// `None` means the request task went away without an answer.
    fn finish(&mut self, outcome: Option<StudioResult<PredictionResult>>) -> SubmitOutcome {
        self.in_flight = None;
        match outcome {
            Some(Ok(result)) => self.apply_success(result),
            Some(Err(e)) => self.apply_failure(e),
            None => self.apply_failure(StudioError::transport(None, UNREACHABLE)),
        }
    }

    fn apply_success(&mut self, result: PredictionResult) -> SubmitOutcome {
        self.timeline.finalize(result.render_enabled);
        self.results.render(&result);

        let outputs = result.output_count();
        self.status = StatusLine::success(
            "Done",
            format!("{} output(s) ready on {}.", outputs, result.device),
        );
        log::info!("Prediction finished: {} output(s) on {}", outputs, result.device);

        let device = result.device.clone();
        self.last_result = Some(result);
        SubmitOutcome::Completed { device, outputs }
    }

    fn apply_failure(&mut self, error: StudioError) -> SubmitOutcome {
        self.timeline.reset(false);
        self.results.clear();
        self.status = StatusLine::error(error.state_label(), error.to_string());
        log::warn!("Prediction failed: {}", error);
        SubmitOutcome::Failed(error)
    }

    pub fn timeline(&self) -> &ProgressTimeline {
        &self.timeline
    }

    pub fn results(&self) -> &ResultRenderer {
        &self.results
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn last_result(&self) -> Option<&PredictionResult> {
        self.last_result.as_ref()
    }

    /// Whether submit and input controls are disabled.
    pub fn is_busy(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
