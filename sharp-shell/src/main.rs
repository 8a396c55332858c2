mod app;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "SHARP Studio - turn photos into 3D scenes with a SHARP prediction service"
)]
pub struct Cli {
    /// Images to submit, in order. Without images only the output folder
    /// actions run.
    #[arg(value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Base URL of the prediction service. Defaults to the saved value, or
    /// http://$SHARP_GUI_HOST:$SHARP_GUI_PORT.
    #[arg(long, env = "SHARP_STUDIO_SERVER")]
    pub server: Option<String>,

    /// Inference device: default, cpu, cuda or mps.
    #[arg(long)]
    pub device: Option<String>,

    /// Ask the service to render a camera-path video.
    #[arg(long, conflicts_with = "no_render")]
    pub render: bool,

    /// Do not render, even if rendering was requested last time.
    #[arg(long)]
    pub no_render: bool,

    /// Model checkpoint to upload instead of the service default.
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Allow loading a checkpoint with unsafe deserialization.
    #[arg(long, requires = "checkpoint")]
    pub unsafe_checkpoint: bool,

    /// Save the result bundle into this directory.
    #[arg(long, value_name = "DIR")]
    pub download_bundle: Option<PathBuf>,

    /// Pick a new output folder through the service's folder dialog.
    #[arg(long)]
    pub select_output: bool,

    /// Reveal the output folder in the file browser.
    #[arg(long)]
    pub open_output: bool,

    /// Print the final page state as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    log::info!("Starting SHARP Studio");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(cli))
}
