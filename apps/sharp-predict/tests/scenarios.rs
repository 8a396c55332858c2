//! End-to-end page scenarios against a scripted service, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use sharp_data::{InputFile, StudioError};
use sharp_predict::testing::ScriptedBackend;
use sharp_predict::{
    ExternalFiles, OutputGrid, OutputRootDisplay, PredictScreen, Stage, StageStatus, SubmitOutcome,
    TimelineConfig, CHANGED_CONFIRMATION, RUNNING_NOTE,
};
use sharp_widgets::{MediaKind, StatusKind, TOAST_DURATION};
use tokio::time::Instant;

fn image(name: &str) -> InputFile {
    InputFile::new(name, format!("png:{name}").into_bytes())
}

fn page() -> (Arc<ScriptedBackend>, PredictScreen) {
    let backend = Arc::new(ScriptedBackend::new());
    let screen = PredictScreen::new(backend.clone(), TimelineConfig::default());
    (backend, screen)
}

fn stage(screen: &PredictScreen, stage: Stage) -> StageStatus {
    screen.submission().timeline().status(stage)
}

const SCENE1: &str = r#"{"device":"cpu","render_enabled":false,"warnings":[],"bundle":"/b.zip",
    "outputs":[{"name":"scene1","preview":"/p1.png","ply":"/p1.ply"}]}"#;

#[tokio::test(start_paused = true)]
async fn single_image_without_render_succeeds() {
    let (backend, mut screen) = page();
    screen.on_external_files(ExternalFiles::Picked(vec![image("imgA.png")]));
    screen.set_device("cpu");
    screen.set_render(false);
    backend.push_predict_response(Duration::from_secs(1), 200, SCENE1);

    let outcome = screen.submit().await;
    assert_eq!(
        outcome,
        SubmitOutcome::Completed {
            device: "cpu".to_string(),
            outputs: 1
        }
    );

    let view = screen.view(Instant::now());
    let OutputGrid::Tiles(tiles) = &view.outputs else {
        panic!("expected tiles, got {:?}", view.outputs);
    };
    assert_eq!(tiles.len(), 1);
    assert!(tiles[0].featured);
    assert_eq!(view.downloads.len(), 1);
    assert_eq!(view.downloads[0].label, "scene1 (.ply)");
    assert_eq!(view.bundle.as_deref(), Some("/b.zip"));
    assert_eq!(view.warning, None);
    assert_eq!(stage(&screen, Stage::Render), StageStatus::Skipped);
    assert_eq!(stage(&screen, Stage::Bundle), StageStatus::Done);
    assert_eq!(view.status.kind, StatusKind::Success);
    assert!(view.controls_enabled);
}

#[tokio::test(start_paused = true)]
async fn rejected_upload_shows_server_detail_and_resets() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("imgA.png")]);
    backend.push_predict_response(
        Duration::from_secs(1),
        400,
        r#"{"detail":"Unsupported image format"}"#,
    );

    let outcome = screen.submit().await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(StudioError::Transport { status: Some(400), .. })
    ));

    let view = screen.view(Instant::now());
    assert!(view.status.is_error());
    assert_eq!(view.status.state, "Error");
    assert_eq!(view.status.detail, "Unsupported image format");
    assert_eq!(view.outputs, OutputGrid::Empty);
    assert!(view.downloads.is_empty());
    assert_eq!(view.bundle, None);
    let statuses: Vec<StageStatus> = view.stages.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StageStatus::Pending,
            StageStatus::Pending,
            StageStatus::Skipped,
            StageStatus::Pending
        ]
    );
    assert_eq!(screen.submission().timeline().pending_entries(), 0);
}

#[tokio::test(start_paused = true)]
async fn two_images_with_render_and_video() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("imgA.png"), image("imgB.png")]);
    screen.set_device("cuda");
    screen.set_render(true);
    backend.push_predict_response(
        Duration::from_secs(4),
        200,
        r#"{"device":"cuda","render_enabled":true,"warnings":[],"bundle":"/b.zip","run_id":"r1",
            "outputs":[
              {"name":"imgA","preview":"/a.png","ply":"/a.ply","video":"/a.mp4"},
              {"name":"imgB","preview":"/b.png","ply":"/b.ply"}]}"#,
    );

    screen.submit().await;

    let request = backend.last_request().unwrap();
    assert_eq!(request.images.len(), 2);
    assert!(request.render);

    let tiles = screen.submission().results().tiles().to_vec();
    let first: Vec<_> = tiles.iter().filter(|t| t.label.starts_with("imgA")).collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].kind, MediaKind::Image);
    assert_eq!(first[1].kind, MediaKind::Video);

    let downloads = screen.submission().results().downloads();
    let first_downloads: Vec<_> = downloads.iter().filter(|d| d.label.starts_with("imgA")).collect();
    assert_eq!(first_downloads.len(), 2);

    assert_eq!(stage(&screen, Stage::Render), StageStatus::Done);
    assert_eq!(screen.submission().last_result().unwrap().run_id.as_deref(), Some("r1"));
}

#[tokio::test(start_paused = true)]
async fn output_root_select_confirms_only_on_change() {
    let (backend, mut screen) = page();
    backend.push_output_root(200, r#"{"path":"/old/path"}"#);
    screen.load().await;
    assert_eq!(
        screen.view(Instant::now()).output_root,
        OutputRootDisplay::Path("/old/path".to_string())
    );

    backend.push_select(200, r#"{"path":"/new/path","changed":true}"#);
    backend.push_output_root(200, r#"{"path":"/new/path"}"#);
    screen.select_output_root().await;
    assert_eq!(backend.output_root_calls(), 2);
    let view = screen.view(Instant::now());
    assert_eq!(view.output_root.path(), Some("/new/path"));
    assert_eq!(view.output_root_confirmation.as_deref(), Some(CHANGED_CONFIRMATION));

    tokio::time::advance(TOAST_DURATION).await;
    assert_eq!(screen.view(Instant::now()).output_root_confirmation, None);

    backend.push_select(200, r#"{"path":"/other/path","changed":false}"#);
    screen.select_output_root().await;
    assert_eq!(backend.output_root_calls(), 2);
    let view = screen.view(Instant::now());
    assert_eq!(view.output_root.path(), Some("/other/path"));
    assert_eq!(view.output_root_confirmation, None);
}

#[tokio::test(start_paused = true)]
async fn output_root_failures_stay_in_their_panel() {
    let (backend, mut screen) = page();
    screen.load().await;
    assert_eq!(screen.view(Instant::now()).output_root, OutputRootDisplay::Unavailable);

    backend.push_select(500, r#"{"detail":"No display available for folder picker"}"#);
    screen.select_output_root().await;
    let view = screen.view(Instant::now());
    assert_eq!(
        view.output_root_error.as_deref(),
        Some("No display available for folder picker")
    );
    assert_eq!(view.status.kind, StatusKind::Idle);
    assert!(screen.output_root().select_enabled());

    backend.push_open(Ok(()));
    screen.open_output_root().await;
    assert_eq!(screen.output_root().error(), None);
    assert_eq!(backend.open_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_service_lets_every_cosmetic_step_run() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("imgA.png")]);
    screen.set_render(true);
    backend.push_predict_response(
        Duration::from_secs(5),
        200,
        r#"{"device":"cuda","render_enabled":true,"warnings":[],"bundle":"/b.zip",
            "outputs":[{"name":"a","preview":"/a.png","ply":"/a.ply"}]}"#,
    );

    assert_eq!(screen.start_submit(), None);
    let mut notes = Vec::new();
    while screen.next_update().await.is_none() {
        let view = screen.view(Instant::now());
        let active = view.stages.iter().filter(|s| s.status == StageStatus::Active).count();
        assert!(active <= 1);
        notes.push(view.status.detail);
    }

    assert!(notes.iter().any(|n| n == RUNNING_NOTE));
    assert!(screen
        .submission()
        .timeline()
        .stages()
        .iter()
        .all(|(_, s)| *s == StageStatus::Done));
}

#[tokio::test(start_paused = true)]
async fn fast_service_cancels_remaining_steps() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("imgA.png")]);
    screen.set_render(true);
    backend.push_predict_response(Duration::from_millis(800), 200, SCENE1);

    screen.submit().await;
    assert_eq!(screen.submission().timeline().pending_entries(), 0);
    let settled = screen.submission().timeline().stages();

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(screen.submission().timeline().stages(), settled);
    // The service did not render although it was asked to.
    assert_eq!(stage(&screen, Stage::Render), StageStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn malformed_body_releases_busy_lock() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("imgA.png")]);
    backend.push_predict_response(Duration::from_secs(1), 200, "<html>gateway</html>");

    let outcome = screen.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(StudioError::MalformedResponse(_))));
    assert!(screen.controls_enabled());
    assert_eq!(screen.view(Instant::now()).status.state, "Error");

    // A second submission goes through.
    backend.push_predict_response(Duration::ZERO, 200, SCENE1);
    screen.set_device("cpu");
    assert!(matches!(screen.submit().await, SubmitOutcome::Completed { .. }));
    assert_eq!(backend.predict_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_selection_stays_local() {
    let (backend, mut screen) = page();
    let outcome = screen.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Rejected(StudioError::Validation(_))));
    assert_eq!(backend.predict_calls(), 0);
    let view = screen.view(Instant::now());
    assert_eq!(view.status.state, "Missing input");
    assert_eq!(screen.submission().timeline().pending_entries(), 0);
}

#[tokio::test(start_paused = true)]
async fn previews_do_not_leak_across_submissions() {
    let (backend, mut screen) = page();
    screen.set_selection(vec![image("a.png"), image("b.png")]);
    screen.set_selection(vec![image("c.png")]);
    screen.mark_all_previews_loaded();
    assert_eq!(screen.files().live_handles(), 0);

    backend.push_predict_response(Duration::ZERO, 200, SCENE1);
    screen.set_device("cpu");
    screen.submit().await;
    screen.open_input_tile(0);
    screen.open_output_tile(0);
    screen.close_lightbox();
    assert_eq!(screen.files().live_handles(), 0);
}

#[tokio::test(start_paused = true)]
async fn pending_prediction_leaves_lightbox_and_output_folder_usable() {
    let (backend, mut screen) = page();
    backend.push_output_root(200, r#"{"path":"/runs"}"#);
    screen.load().await;
    screen.set_selection(vec![image("imgA.png"), image("imgB.png")]);
    screen.set_device("cpu");
    backend.push_predict_response(Duration::from_secs(5), 200, SCENE1);

    assert_eq!(screen.start_submit(), None);
    tokio::time::advance(Duration::from_millis(400)).await;
    assert_eq!(screen.poll(Instant::now()), None);

    let view = screen.view(Instant::now());
    assert!(!view.controls_enabled);
    assert_eq!(view.status.detail, RUNNING_NOTE);
    assert_eq!(view.outputs, OutputGrid::Skeletons(2));

    // Input edits are ignored, viewing is not.
    assert!(!screen.remove_file(1));
    screen.add_files(vec![image("imgC.png")]);
    assert_eq!(screen.files().len(), 2);
    assert!(screen.open_input_tile(1));
    assert!(screen.view(Instant::now()).scroll_locked);
    screen.close_lightbox();

    backend.push_select(200, r#"{"path":"/elsewhere","changed":true}"#);
    backend.push_output_root(200, r#"{"path":"/elsewhere"}"#);
    screen.select_output_root().await;
    backend.push_open(Ok(()));
    screen.open_output_root().await;
    let view = screen.view(Instant::now());
    assert_eq!(view.output_root.path(), Some("/elsewhere"));
    assert!(view.output_root_actions.select);
    assert!(screen.is_running());

    let mut outcome = None;
    while outcome.is_none() {
        outcome = screen.next_update().await;
    }
    assert!(matches!(outcome, Some(SubmitOutcome::Completed { outputs: 1, .. })));
    assert!(screen.controls_enabled());
    assert_eq!(backend.open_calls(), 1);
}
