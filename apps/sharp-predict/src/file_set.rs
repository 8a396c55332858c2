//! # FileSetController - Input Selection and Gallery
//!
//! Owns the ordered input selection and everything derived from it: one
//! gallery chip per file and the hero preview of file 0. Every mutation is a
//! full replace followed by a full rebuild, so the gallery can never drift
//! from the selection.
//!
//! Each chip and the hero consume their own preview handle. A handle is
//! released when its consumer reports the first successful load, or when a
//! rebuild supersedes the consumer before that happens.

use sharp_data::InputFile;
use sharp_widgets::{ResourceHandle, ResourceHandleTracker, Tile};

/// Consumer of a preview handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewTarget {
    Chip(usize),
    Hero,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryChip {
    pub index: usize,
    pub label: String,
    pub preview: ResourceHandle,
    pub loaded: bool,
}

impl GalleryChip {
    pub fn source(&self) -> String {
        self.preview.url()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeroPreview {
    Placeholder,
    Input {
        label: String,
        preview: ResourceHandle,
        loaded: bool,
    },
}

/// One item of a drag-and-drop payload.
#[derive(Clone, Debug)]
pub enum DroppedItem {
    File(InputFile),
    /// Dragged text or links carry no file.
    Text(String),
}

/// The two ways files reach the page.
#[derive(Clone, Debug)]
pub enum ExternalFiles {
    Picked(Vec<InputFile>),
    Dropped(Vec<DroppedItem>),
}

impl ExternalFiles {
    /// Both sources reduced to the same ordered file list.
    pub fn normalize(self) -> Vec<InputFile> {
        match self {
            ExternalFiles::Picked(files) => files,
            ExternalFiles::Dropped(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    DroppedItem::File(file) => Some(file),
                    DroppedItem::Text(_) => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct FileSetController {
    selection: Vec<InputFile>,
    chips: Vec<GalleryChip>,
    hero: HeroPreview,
    handles: ResourceHandleTracker<InputFile>,
}

impl Default for FileSetController {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSetController {
    pub fn new() -> Self {
        Self {
            selection: Vec::new(),
            chips: Vec::new(),
            hero: HeroPreview::Placeholder,
            handles: ResourceHandleTracker::new(),
        }
    }

    /// Replace the selection wholesale and rebuild the gallery and hero.
    pub fn set_selection(&mut self, files: Vec<InputFile>) {
        self.release_gallery();

        self.selection = files;
        self.chips = self
            .selection
            .iter()
            .enumerate()
            .map(|(index, file)| GalleryChip {
                index,
                label: file.name().to_string(),
                preview: self.handles.allocate(file.clone()),
                loaded: false,
            })
            .collect();

        self.hero = match self.selection.first() {
            Some(first) => HeroPreview::Input {
                label: first.name().to_string(),
                preview: self.handles.allocate(first.clone()),
                loaded: false,
            },
            None => HeroPreview::Placeholder,
        };

        log::debug!("Selection set: {} file(s)", self.selection.len());
    }

    /// Drop the file at `index`. Out of range does nothing.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.selection.len() {
            log::debug!(
                "remove_at({}) ignored, selection has {} file(s)",
                index,
                self.selection.len()
            );
            return false;
        }
        let remaining = self
            .selection
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, file)| file.clone())
            .collect();
        self.set_selection(remaining);
        true
    }

    /// Add `files` after the current selection.
    pub fn append(&mut self, files: Vec<InputFile>) {
        let combined = self.selection.iter().cloned().chain(files).collect();
        self.set_selection(combined);
    }

    /// Picker and drop entry point. A payload without any file leaves the
    /// selection alone. Returns the new selection length.
    pub fn on_external_mutation(&mut self, source: ExternalFiles) -> usize {
        let files = source.normalize();
        if files.is_empty() {
            log::debug!("External mutation carried no files, selection kept");
        } else {
            self.set_selection(files);
        }
        self.selection.len()
    }

    /// A view finished its first load of `target`'s preview; release the
    /// handle. Returns false if there was nothing left to release.
    pub fn mark_loaded(&mut self, target: PreviewTarget) -> bool {
        let handle = match target {
            PreviewTarget::Chip(index) => match self.chips.get_mut(index) {
                Some(chip) if !chip.loaded => {
                    chip.loaded = true;
                    chip.preview
                }
                _ => return false,
            },
            PreviewTarget::Hero => match &mut self.hero {
                HeroPreview::Input {
                    preview, loaded, ..
                } if !*loaded => {
                    *loaded = true;
                    *preview
                }
                _ => return false,
            },
        };
        self.handles.release(&handle)
    }

    /// Report every current preview as loaded.
    pub fn mark_all_loaded(&mut self) {
        for index in 0..self.chips.len() {
            self.mark_loaded(PreviewTarget::Chip(index));
        }
        self.mark_loaded(PreviewTarget::Hero);
    }

    /// Allocate a fresh handle for viewing file `index` outside the gallery.
    /// The caller owns it and must hand it back to [`Self::release_lease`].
    pub fn lease_tile(&mut self, index: usize) -> Option<(Tile, ResourceHandle)> {
        let file = self.selection.get(index)?.clone();
        let label = file.name().to_string();
        let handle = self.handles.allocate(file);
        Some((Tile::image(handle.url(), label), handle))
    }

    pub fn release_lease(&mut self, handle: &ResourceHandle) -> bool {
        self.handles.release(handle)
    }

    fn release_gallery(&mut self) {
        let superseded: Vec<ResourceHandle> = self
            .chips
            .iter()
            .filter(|chip| !chip.loaded)
            .map(|chip| chip.preview)
            .chain(match &self.hero {
                HeroPreview::Input {
                    preview,
                    loaded: false,
                    ..
                } => Some(*preview),
                _ => None,
            })
            .collect();
        for handle in superseded {
            self.handles.release(&handle);
        }
    }

    pub fn selection(&self) -> &[InputFile] {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    pub fn chips(&self) -> &[GalleryChip] {
        &self.chips
    }

    pub fn hero(&self) -> &HeroPreview {
        &self.hero
    }

    /// Blob behind a still-live preview handle.
    pub fn resolve(&self, handle: &ResourceHandle) -> Option<&InputFile> {
        self.handles.resolve(handle)
    }

    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }
}
