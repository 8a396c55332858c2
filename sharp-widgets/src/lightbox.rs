//! # Lightbox - Modal Single-Item Viewer
//!
//! Shows one [`Tile`] full size and freezes background scrolling while open.
//! The lightbox does not know where a tile came from; callers that opened it
//! through a transient handle get the replaced tile back from
//! [`Lightbox::open`] / [`Lightbox::close`] and release what they own.

use crate::tile::Tile;

/// Keys the lightbox reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Other,
}

#[derive(Clone, Debug, Default)]
pub struct Lightbox {
    content: Option<Tile>,
    scroll_locked: bool,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with `tile`. Returns the tile it displaced.
    pub fn open(&mut self, tile: Tile) -> Option<Tile> {
        log::debug!("Lightbox open: {} ({:?})", tile.label, tile.kind);
        self.scroll_locked = true;
        self.content.replace(tile)
    }

    /// Clear the content and restore scrolling. Closing an already closed
    /// lightbox does nothing and returns `None`.
    pub fn close(&mut self) -> Option<Tile> {
        self.scroll_locked = false;
        self.content.take()
    }

    /// Escape closes; every other key is ignored.
    pub fn handle_key(&mut self, key: Key) -> Option<Tile> {
        match key {
            Key::Escape if self.is_open() => self.close(),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&Tile> {
        self.content.as_ref()
    }

    /// Whether the page behind the lightbox must not scroll.
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_replaces_content() {
        let mut lightbox = Lightbox::new();
        assert!(lightbox.open(Tile::image("/a.png", "a")).is_none());
        assert!(lightbox.is_scroll_locked());

        let previous = lightbox.open(Tile::video("/b.mp4", "b")).unwrap();
        assert_eq!(previous.label, "a");
        assert_eq!(lightbox.content().unwrap().label, "b");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut lightbox = Lightbox::new();
        lightbox.open(Tile::image("/a.png", "a"));

        assert!(lightbox.close().is_some());
        assert!(!lightbox.is_open());
        assert!(!lightbox.is_scroll_locked());

        assert!(lightbox.close().is_none());
        assert!(!lightbox.is_scroll_locked());
    }

    #[test]
    fn test_escape_closes_other_keys_ignored() {
        let mut lightbox = Lightbox::new();
        lightbox.open(Tile::image("/a.png", "a"));

        assert!(lightbox.handle_key(Key::Enter).is_none());
        assert!(lightbox.is_open());

        assert!(lightbox.handle_key(Key::Escape).is_some());
        assert!(!lightbox.is_open());
        assert!(lightbox.handle_key(Key::Escape).is_none());
    }
}
