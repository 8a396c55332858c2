use serde::Serialize;

/// What a tile's source decodes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A renderable preview unit, shared by grids and the lightbox.
///
/// Tiles are always derived from the data that owns them and rebuilt
/// wholesale; nothing mutates a tile in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub source: String,
    pub kind: MediaKind,
    pub label: String,
    /// First output of a run, rendered larger in the grid.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub featured: bool,
}

impl Tile {
    pub fn image(source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: MediaKind::Image,
            label: label.into(),
            featured: false,
        }
    }

    pub fn video(source: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: MediaKind::Video,
            label: label.into(),
            featured: false,
        }
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}
