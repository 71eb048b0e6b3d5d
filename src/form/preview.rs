//! Scoped local image previews.
//!
//! A [`LocalPreview`] holds a reference into a [`PreviewStore`] and releases
//! it when dropped, so replacing an image or closing the form never leaves a
//! stale preview behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

const LOCAL_SCHEME: &str = "local-preview:";

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    live: HashMap<u64, Bytes>,
}

/// Issues and tracks local preview references.
#[derive(Debug, Clone, Default)]
pub struct PreviewStore {
    inner: Arc<Mutex<Registry>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the owning preview reference.
    pub fn create(&self, bytes: Bytes) -> LocalPreview {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.live.insert(id, bytes);
        LocalPreview {
            id,
            store: self.clone(),
        }
    }

    /// Number of preview references not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn release(&self, id: u64) {
        self.lock().live.remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live local preview; released on drop.
#[derive(Debug)]
pub struct LocalPreview {
    id: u64,
    store: PreviewStore,
}

impl LocalPreview {
    /// The `local-preview:<n>` URL naming this preview.
    pub fn url(&self) -> String {
        format!("{LOCAL_SCHEME}{}", self.id)
    }
}

impl Drop for LocalPreview {
    fn drop(&mut self) {
        self.store.release(self.id);
    }
}

/// What the form shows as the cover image.
#[derive(Debug)]
pub enum Preview {
    /// A freshly picked image, owned by the form.
    Local(LocalPreview),
    /// The image already stored on the trip.
    Remote(String),
}

impl Preview {
    pub fn url(&self) -> String {
        match self {
            Preview::Local(local) => local.url(),
            Preview::Remote(url) => url.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Preview::Local(_))
    }
}
