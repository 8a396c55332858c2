//! # ResourceHandleTracker - Transient Preview Handles
//!
//! Hands out locally resolvable references to user-selected blobs so views
//! can thumbnail them without copying. Every handle must be released exactly
//! once: after its consumer's first successful load, or as soon as the
//! consumer is superseded. Releasing twice is a no-op.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

const HANDLE_SCHEME: &str = "blob:sharp-studio/";

/// Opaque reference to a blob registered in a [`ResourceHandleTracker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Uuid);

impl ResourceHandle {
    /// URL form used as a tile/preview source.
    pub fn url(&self) -> String {
        format!("{HANDLE_SCHEME}{}", self.0)
    }

    /// Parse a URL produced by [`ResourceHandle::url`].
    pub fn from_url(url: &str) -> Option<Self> {
        let id = url.strip_prefix(HANDLE_SCHEME)?;
        Uuid::parse_str(id).ok().map(Self)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Allocator for [`ResourceHandle`]s over blobs of type `B`.
#[derive(Debug)]
pub struct ResourceHandleTracker<B> {
    live: HashMap<ResourceHandle, B>,
    allocated: u64,
    released: u64,
}

impl<B> Default for ResourceHandleTracker<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ResourceHandleTracker<B> {
    pub fn new() -> Self {
        Self {
            live: HashMap::new(),
            allocated: 0,
            released: 0,
        }
    }

    /// Register `blob` and return a fresh handle for it.
    pub fn allocate(&mut self, blob: B) -> ResourceHandle {
        let handle = ResourceHandle(Uuid::now_v7());
        self.live.insert(handle, blob);
        self.allocated += 1;
        log::trace!("Allocated preview handle {}", handle);
        handle
    }

    /// Invalidate `handle`. Returns `false` if it was already released.
    pub fn release(&mut self, handle: &ResourceHandle) -> bool {
        if self.live.remove(handle).is_some() {
            self.released += 1;
            log::trace!("Released preview handle {}", handle);
            true
        } else {
            false
        }
    }

    pub fn resolve(&self, handle: &ResourceHandle) -> Option<&B> {
        self.live.get(handle)
    }

    /// Handles allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn allocated_total(&self) -> u64 {
        self.allocated
    }

    pub fn released_total(&self) -> u64 {
        self.released
    }
}
