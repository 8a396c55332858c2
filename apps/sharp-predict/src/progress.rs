//! # ProgressTimeline - Simulated Job Progress
//!
//! Four stages, `prepare → predict → render → bundle`, advanced by a cosmetic
//! schedule of delayed transitions. The schedule only paces the display; it
//! knows nothing about the real job. The owner races it against the real
//! request and calls [`ProgressTimeline::finalize`] or
//! [`ProgressTimeline::reset`] when the request resolves, which cancels
//! whatever is still queued.
//!
//! Invariants:
//! - at most one stage is `Active`
//! - stages complete in declared order and never go back to `Pending`
//! - the schedule never completes `bundle`; only `finalize` does
//! - after `finalize`/`reset` the schedule is empty

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Prepare,
    Predict,
    Render,
    Bundle,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Prepare, Stage::Predict, Stage::Render, Stage::Bundle];

    fn index(self) -> usize {
        match self {
            Stage::Prepare => 0,
            Stage::Predict => 1,
            Stage::Render => 2,
            Stage::Bundle => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Prepare => "Prepare",
            Stage::Predict => "Predict",
            Stage::Render => "Render",
            Stage::Bundle => "Bundle",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Pending,
    Active,
    Done,
    Skipped,
}

/// Delays of the cosmetic schedule, relative to `start`.
///
/// Values only need to keep their relative order; entries sharing a delay
/// fire in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    pub status_note_after: Duration,
    pub prepare_done_after: Duration,
    pub predict_done_after: Duration,
    pub render_done_after: Duration,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            status_note_after: Duration::from_millis(300),
            prepare_done_after: Duration::from_millis(700),
            predict_done_after: Duration::from_millis(1600),
            render_done_after: Duration::from_millis(2600),
        }
    }
}

impl TimelineConfig {
    /// Every entry due at `start`; the whole schedule drains on first poll.
    pub fn immediate() -> Self {
        Self {
            status_note_after: Duration::ZERO,
            prepare_done_after: Duration::ZERO,
            predict_done_after: Duration::ZERO,
            render_done_after: Duration::ZERO,
        }
    }
}

/// Status text the schedule asks the page to show while the job runs.
pub const RUNNING_NOTE: &str = "Images uploaded, running the model…";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScheduledStep {
    Note(&'static str),
    /// Complete the active stage and activate the next pending one.
    Advance,
}

#[derive(Clone, Debug)]
struct ScheduleEntry {
    due: Instant,
    step: ScheduledStep,
}

#[derive(Clone, Debug)]
pub struct ProgressTimeline {
    stages: [StageStatus; 4],
    schedule: VecDeque<ScheduleEntry>,
    config: TimelineConfig,
}

impl Default for ProgressTimeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl ProgressTimeline {
    /// A fresh timeline in the idle state of a run without rendering.
    pub fn new(config: TimelineConfig) -> Self {
        let mut timeline = Self {
            stages: [StageStatus::Pending; 4],
            schedule: VecDeque::new(),
            config,
        };
        timeline.reset(false);
        timeline
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Begin a run: cancel any previous schedule, mark `prepare` active and
    /// queue the cosmetic transitions.
    pub fn start(&mut self, render_requested: bool, now: Instant) {
        self.cancel_schedule();
        self.stages = [StageStatus::Pending; 4];
        if !render_requested {
            self.stages[Stage::Render.index()] = StageStatus::Skipped;
        }
        self.stages[Stage::Prepare.index()] = StageStatus::Active;

        let mut entries = vec![
            (self.config.status_note_after, ScheduledStep::Note(RUNNING_NOTE)),
            (self.config.prepare_done_after, ScheduledStep::Advance),
            (self.config.predict_done_after, ScheduledStep::Advance),
        ];
        if render_requested {
            entries.push((self.config.render_done_after, ScheduledStep::Advance));
        }
        // Stable: equal delays keep declaration order.
        entries.sort_by_key(|(delay, _)| *delay);

        self.schedule = entries
            .into_iter()
            .map(|(delay, step)| ScheduleEntry { due: now + delay, step })
            .collect();

        log::debug!(
            "Timeline started (render={}), {} entries queued",
            render_requested,
            self.schedule.len()
        );
    }

    /// Apply every entry due at `now`, in order. Returns the status notes
    /// those entries carried.
    pub fn poll_due(&mut self, now: Instant) -> Vec<&'static str> {
        let mut notes = Vec::new();
        while self.schedule.front().is_some_and(|entry| entry.due <= now) {
            let Some(entry) = self.schedule.pop_front() else { break };
            match entry.step {
                ScheduledStep::Note(note) => notes.push(note),
                ScheduledStep::Advance => self.advance(),
            }
        }
        notes
    }

    /// Authoritative completion: drop the schedule, then mark every stage
    /// done, except `render`, which is skipped when the service did not
    /// render.
    pub fn finalize(&mut self, render_enabled: bool) {
        self.cancel_schedule();
        for stage in Stage::ALL {
            let status = &mut self.stages[stage.index()];
            *status = match (stage, *status) {
                (Stage::Render, _) if !render_enabled => StageStatus::Skipped,
                (_, StageStatus::Skipped) => StageStatus::Skipped,
                _ => StageStatus::Done,
            };
        }
        log::debug!("Timeline finalized (render_enabled={})", render_enabled);
    }

    /// Back to idle: drop the schedule and set every stage pending, with
    /// `render` skipped unless rendering is requested.
    pub fn reset(&mut self, render_requested: bool) {
        self.cancel_schedule();
        self.stages = [StageStatus::Pending; 4];
        if !render_requested {
            self.stages[Stage::Render.index()] = StageStatus::Skipped;
        }
    }

    fn cancel_schedule(&mut self) {
        if !self.schedule.is_empty() {
            log::trace!("Timeline: canceling {} pending entries", self.schedule.len());
            self.schedule.clear();
        }
    }

    fn advance(&mut self) {
        let Some(active) = self.stages.iter().position(|s| *s == StageStatus::Active) else {
            return;
        };
        // The terminal stage belongs to finalize.
        if active == Stage::Bundle.index() {
            return;
        }
        self.stages[active] = StageStatus::Done;
        if let Some(next) = self.stages[active + 1..]
            .iter()
            .position(|s| *s == StageStatus::Pending)
        {
            self.stages[active + 1 + next] = StageStatus::Active;
        }
    }

    pub fn status(&self, stage: Stage) -> StageStatus {
        self.stages[stage.index()]
    }

    /// `(stage, status)` for all four stages, in order.
    pub fn stages(&self) -> Vec<(Stage, StageStatus)> {
        Stage::ALL.iter().map(|s| (*s, self.status(*s))).collect()
    }

    pub fn active_stage(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|s| self.status(*s) == StageStatus::Active)
    }

    pub fn pending_entries(&self) -> usize {
        self.schedule.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.front().map(|entry| entry.due)
    }

    /// Completed fraction of the stages that will run, `0.0..=1.0`.
    pub fn fraction_done(&self) -> f32 {
        let counted = self.stages.iter().filter(|s| **s != StageStatus::Skipped).count();
        if counted == 0 {
            return 0.0;
        }
        let done = self.stages.iter().filter(|s| **s == StageStatus::Done).count();
        done as f32 / counted as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn statuses(timeline: &ProgressTimeline) -> Vec<StageStatus> {
        timeline.stages().into_iter().map(|(_, s)| s).collect()
    }

    fn assert_single_active(timeline: &ProgressTimeline) {
        let active = statuses(timeline)
            .into_iter()
            .filter(|s| *s == StageStatus::Active)
            .count();
        assert!(active <= 1, "more than one active stage: {:?}", statuses(timeline));
    }

    #[test]
    fn test_start_without_render_skips_render() {
        let t0 = Instant::now();
        let mut timeline = ProgressTimeline::default();
        timeline.start(false, t0);

        assert_eq!(timeline.status(Stage::Prepare), StageStatus::Active);
        assert_eq!(timeline.status(Stage::Render), StageStatus::Skipped);

        for step in 0..40 {
            timeline.poll_due(t0 + ms(step * 100));
            assert_ne!(timeline.status(Stage::Render), StageStatus::Active);
            assert_single_active(&timeline);
        }
        assert_eq!(timeline.active_stage(), Some(Stage::Bundle));
    }

    #[test]
    fn test_schedule_pacing_with_render() {
        let t0 = Instant::now();
        let mut timeline = ProgressTimeline::default();
        timeline.start(true, t0);
        assert_eq!(timeline.pending_entries(), 4);

        assert_eq!(timeline.poll_due(t0 + ms(300)), vec![RUNNING_NOTE]);
        assert_eq!(timeline.active_stage(), Some(Stage::Prepare));

        timeline.poll_due(t0 + ms(700));
        assert_eq!(timeline.status(Stage::Prepare), StageStatus::Done);
        assert_eq!(timeline.active_stage(), Some(Stage::Predict));

        timeline.poll_due(t0 + ms(1600));
        assert_eq!(timeline.active_stage(), Some(Stage::Render));

        timeline.poll_due(t0 + ms(2600));
        assert_eq!(timeline.status(Stage::Render), StageStatus::Done);
        assert_eq!(timeline.active_stage(), Some(Stage::Bundle));
        assert_eq!(timeline.pending_entries(), 0);

        // The schedule alone never completes the run.
        timeline.poll_due(t0 + ms(60_000));
        assert_eq!(timeline.status(Stage::Bundle), StageStatus::Active);
    }

    #[test]
    fn test_finalize_overrides_partial_progress() {
        let t0 = Instant::now();
        let mut timeline = ProgressTimeline::default();
        timeline.start(true, t0);
        timeline.poll_due(t0 + ms(800));

        timeline.finalize(true);
        assert_eq!(timeline.pending_entries(), 0);
        assert!(statuses(&timeline).iter().all(|s| *s == StageStatus::Done));

        // Nothing queued can resurface later.
        timeline.poll_due(t0 + ms(10_000));
        assert!(statuses(&timeline).iter().all(|s| *s == StageStatus::Done));
    }

    #[test]
    fn test_finalize_skips_render_when_service_did_not_render() {
        let mut timeline = ProgressTimeline::default();
        timeline.start(true, Instant::now());
        timeline.finalize(false);

        assert_eq!(
            statuses(&timeline),
            vec![
                StageStatus::Done,
                StageStatus::Done,
                StageStatus::Skipped,
                StageStatus::Done
            ]
        );
    }

    #[test]
    fn test_finalize_and_reset_are_idempotent() {
        let mut timeline = ProgressTimeline::default();
        timeline.start(true, Instant::now());

        timeline.finalize(true);
        let once = statuses(&timeline);
        timeline.finalize(true);
        assert_eq!(statuses(&timeline), once);
        assert_eq!(timeline.pending_entries(), 0);

        timeline.start(true, Instant::now());
        timeline.reset(false);
        let once = statuses(&timeline);
        timeline.reset(false);
        assert_eq!(statuses(&timeline), once);
        assert_eq!(
            once,
            vec![
                StageStatus::Pending,
                StageStatus::Pending,
                StageStatus::Skipped,
                StageStatus::Pending
            ]
        );
        assert_eq!(timeline.pending_entries(), 0);
    }

    #[test]
    fn test_restart_cancels_previous_schedule() {
        let t0 = Instant::now();
        let mut timeline = ProgressTimeline::default();
        timeline.start(true, t0);
        timeline.start(false, t0 + ms(1000));

        assert_eq!(timeline.pending_entries(), 3);
        assert_eq!(timeline.next_deadline(), Some(t0 + ms(1300)));
        assert_eq!(timeline.active_stage(), Some(Stage::Prepare));
    }

    #[test]
    fn test_immediate_config_drains_on_first_poll() {
        let t0 = Instant::now();
        let mut timeline = ProgressTimeline::new(TimelineConfig::immediate());
        timeline.start(true, t0);

        assert_eq!(timeline.poll_due(t0), vec![RUNNING_NOTE]);
        assert_eq!(timeline.active_stage(), Some(Stage::Bundle));
        assert_eq!(timeline.pending_entries(), 0);
    }

    #[test]
    fn test_fraction_done() {
        let mut timeline = ProgressTimeline::default();
        assert_eq!(timeline.fraction_done(), 0.0);
        timeline.start(false, Instant::now());
        timeline.finalize(false);
        assert_eq!(timeline.fraction_done(), 1.0);
    }
}
