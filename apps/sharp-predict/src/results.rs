//! # ResultRenderer - Output Gallery
//!
//! Turns a [`PredictionResult`] into the output view: preview tiles, the
//! download list, the bundle link and the warning banner. Every render starts
//! from a clean slate; nothing accumulates across submissions.

use serde::Serialize;
use sharp_data::{OutputItem, PredictionResult};
use sharp_widgets::Tile;

/// Upper bound on placeholder tiles shown while a job runs.
pub const MAX_SKELETONS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadKind {
    PointCloud,
    Video,
    DepthVideo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DownloadEntry {
    pub label: String,
    pub url: String,
    pub kind: DownloadKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "items", rename_all = "lowercase")]
pub enum OutputGrid {
    #[default]
    Empty,
    Skeletons(usize),
    Tiles(Vec<Tile>),
}

#[derive(Clone, Debug, Default)]
pub struct ResultRenderer {
    grid: OutputGrid,
    downloads: Vec<DownloadEntry>,
    bundle: Option<String>,
    warning: Option<String>,
    hero: Option<Tile>,
}

impl ResultRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole output view from `result`.
    pub fn render(&mut self, result: &PredictionResult) {
        self.clear();

        let mut tiles = Vec::new();
        for (index, item) in result.outputs.iter().enumerate() {
            let preview = Tile::image(&item.preview, &item.name);
            tiles.push(if index == 0 { preview.featured() } else { preview });
            self.downloads.push(download(item, &item.ply, DownloadKind::PointCloud));

            if let Some(video) = &item.video {
                tiles.push(Tile::video(video, format!("{} (video)", item.name)));
                self.downloads.push(download(item, video, DownloadKind::Video));
            }
            if let Some(depth) = &item.depth_video {
                self.downloads.push(download(item, depth, DownloadKind::DepthVideo));
            }
        }

        self.hero = result
            .outputs
            .first()
            .map(|first| Tile::image(&first.preview, &first.name).featured());
        self.grid = OutputGrid::Tiles(tiles);
        self.bundle = Some(result.bundle.clone());

        let joined = result.warnings.join(" ");
        self.warning = (!joined.trim().is_empty()).then_some(joined);

        log::info!(
            "Rendered {} output(s), {} download(s), {} warning(s)",
            result.outputs.len(),
            self.downloads.len(),
            result.warnings.len()
        );
    }

    /// Placeholder tiles for a job over `input_count` images.
    pub fn show_skeletons(&mut self, input_count: usize) {
        self.clear();
        let count = input_count.min(MAX_SKELETONS);
        if count > 0 {
            self.grid = OutputGrid::Skeletons(count);
        }
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.grid = OutputGrid::Empty;
        self.downloads.clear();
        self.bundle = None;
        self.warning = None;
        self.hero = None;
    }

    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }

    pub fn tiles(&self) -> &[Tile] {
        match &self.grid {
            OutputGrid::Tiles(tiles) => tiles,
            _ => &[],
        }
    }

    pub fn skeleton_count(&self) -> usize {
        match self.grid {
            OutputGrid::Skeletons(n) => n,
            _ => 0,
        }
    }

    pub fn downloads(&self) -> &[DownloadEntry] {
        &self.downloads
    }

    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    /// Banner text; `None` keeps the banner hidden.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn hero(&self) -> Option<&Tile> {
        self.hero.as_ref()
    }

    pub fn has_results(&self) -> bool {
        !self.tiles().is_empty()
    }
}

fn download(item: &OutputItem, url: &str, kind: DownloadKind) -> DownloadEntry {
    let suffix = match kind {
        DownloadKind::PointCloud => "(.ply)",
        DownloadKind::Video => "(video)",
        DownloadKind::DepthVideo => "(depth video)",
    };
    DownloadEntry {
        label: format!("{} {}", item.name, suffix),
        url: url.to_string(),
        kind,
    }
}
