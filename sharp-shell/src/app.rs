//! Command-line front end for one prediction page.

use std::sync::Arc;

use anyhow::{bail, Context};
use sharp_data::{Device, InputFile, Preferences, SharpClient, StudioBackend};
use sharp_predict::{ExternalFiles, OutputGrid, PageView, PredictScreen, SharpPredictApp, StageStatus, StageView, SubmitOutcome};
use sharp_widgets::{AppRegistry, SharpApp};
use tokio::time::Instant;

use crate::Cli;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut prefs = Preferences::load();
    if let Some(server) = &cli.server {
        prefs.set_server_url(server.trim());
    }

    let client = SharpClient::new(&prefs.server_url)
        .with_context(|| format!("Invalid server URL '{}'", prefs.server_url))?;
    log::info!("Using prediction service at {}", client.base_url());

    let mut registry = AppRegistry::new();
    registry.register(SharpPredictApp::info());
    for app in registry.apps() {
        log::debug!("Registered app '{}' ({}): {}", app.name, app.id, app.description);
    }

    let backend: Arc<dyn StudioBackend> = Arc::new(client.clone());
    let mut screen = SharpPredictApp::create_page(backend);
    screen.load().await;
    println!("Output folder: {}", screen.output_root().display().text());

    if cli.select_output {
        screen.select_output_root().await;
        report_output_root(&screen);
    }
    if cli.open_output {
        screen.open_output_root().await;
        report_output_root(&screen);
    }

    let outcome = if cli.images.is_empty() {
        None
    } else {
        Some(submit(&cli, &mut prefs, &mut screen).await?)
    };

    let view = screen.view(Instant::now());
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if view.status.is_error() {
        eprintln!("{}: {}", view.status.state, view.status.detail);
    } else if outcome.is_some() {
        print_results(&view, &client);
    }

    if let Some(SubmitOutcome::Completed { .. }) = &outcome {
        if let (Some(dir), Some(bundle)) = (&cli.download_bundle, &view.bundle) {
            let path = client
                .download(bundle, dir)
                .await
                .with_context(|| format!("Failed to download bundle into {}", dir.display()))?;
            println!("Bundle saved to {}", path.display());
        }
    }

    prefs.set_last_output_root(screen.output_root().display().path().map(String::from));
    if let Err(e) = prefs.save() {
        log::warn!("Failed to save preferences: {}", e);
    }

    match outcome {
        Some(SubmitOutcome::Rejected(e)) | Some(SubmitOutcome::Failed(e)) => bail!("{}", e),
        _ => Ok(()),
    }
}

async fn submit(
    cli: &Cli,
    prefs: &mut Preferences,
    screen: &mut PredictScreen,
) -> anyhow::Result<SubmitOutcome> {
    let images = cli
        .images
        .iter()
        .map(|path| InputFile::read(path).with_context(|| format!("Failed to read {}", path.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;
    screen.on_external_files(ExternalFiles::Picked(images));
    // Nothing is displayed, so every preview counts as loaded right away.
    screen.mark_all_previews_loaded();

    let device = cli.device.clone().unwrap_or_else(|| prefs.device.to_string());
    let render = if cli.render {
        true
    } else if cli.no_render {
        false
    } else {
        prefs.render
    };
    screen.set_device(device.clone());
    screen.set_render(render);

    if let Some(path) = &cli.checkpoint {
        let checkpoint =
            InputFile::read(path).with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        screen.set_checkpoint(Some(checkpoint));
        screen.set_unsafe_checkpoint(cli.unsafe_checkpoint);
    }

    let outcome = match screen.start_submit() {
        Some(outcome) => outcome,
        None => follow_progress(screen).await,
    };

    if let Ok(device) = device.parse::<Device>() {
        prefs.set_device(device);
    }
    prefs.set_render(render);

    Ok(outcome)
}

/// Drive the running submission, printing the stage line and status
/// whenever either changes.
async fn follow_progress(screen: &mut PredictScreen) -> SubmitOutcome {
    let started = chrono::Local::now();
    let mut last = String::new();
    loop {
        let outcome = screen.next_update().await;
        let view = screen.view(Instant::now());
        let line = format!("{}  {}: {}", stage_line(&view.stages), view.status.state, view.status.detail);
        if line != last {
            let elapsed = chrono::Local::now() - started;
            println!("[{:>5.1}s] {}", elapsed.num_milliseconds() as f64 / 1000.0, line);
            last = line;
        }
        if let Some(outcome) = outcome {
            return outcome;
        }
    }
}

fn stage_line(stages: &[StageView]) -> String {
    stages
        .iter()
        .map(|view| {
            let mark = match view.status {
                StageStatus::Pending => " ",
                StageStatus::Active => ">",
                StageStatus::Done => "x",
                StageStatus::Skipped => "-",
            };
            format!("[{}] {}", mark, view.stage.label())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn report_output_root(screen: &PredictScreen) {
    let output_root = screen.output_root();
    match output_root.error() {
        Some(error) => eprintln!("Output folder: {}", error),
        None => {
            println!("Output folder: {}", output_root.display().text());
            if let Some(confirmation) = output_root.confirmation(Instant::now()) {
                println!("{}", confirmation);
            }
        }
    }
}

fn print_results(view: &PageView, client: &SharpClient) {
    if let Some(warning) = &view.warning {
        println!("Warning: {}", warning);
    }
    let resolve = |href: &str| {
        client
            .resolve(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string())
    };
    if let OutputGrid::Tiles(tiles) = &view.outputs {
        for tile in tiles {
            let kind = if tile.is_video() { "video" } else { "preview" };
            println!("  {:<7} {:<24} {}", kind, tile.label, resolve(&tile.source));
        }
    }
    for entry in &view.downloads {
        println!("  {:<32} {}", entry.label, resolve(&entry.url));
    }
    if let Some(bundle) = &view.bundle {
        println!("Bundle: {}", resolve(bundle));
    }
}
