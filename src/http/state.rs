use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::audio::{CanonicalClip, Ingestor};
use crate::config::PlotConfig;
use crate::pipeline::EmotionPipeline;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EmotionPipeline>,
    pub ingestor: Arc<Ingestor>,
    pub clips: Arc<ClipStore>,
    pub plot: Arc<PlotConfig>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: EmotionPipeline, ingestor: Ingestor, plot: PlotConfig) -> Self {
        let capacity = ingestor.config().max_pending_clips;
        Self {
            pipeline: Arc::new(pipeline),
            ingestor: Arc::new(ingestor),
            clips: Arc::new(ClipStore::new(capacity)),
            plot: Arc::new(plot),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.ingestor.config().max_upload_bytes
    }
}

/// Uploaded clips waiting for a prediction request
///
/// Bounded; inserting into a full store evicts the oldest clip. A clip's file
/// is deleted once the store and every in-flight request have let go of it.
pub struct ClipStore {
    clips: Mutex<VecDeque<Arc<CanonicalClip>>>,
    capacity: usize,
}

impl ClipStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            clips: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<CanonicalClip>>> {
        self.clips.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn insert(&self, clip: CanonicalClip) -> Uuid {
        let id = clip.id();
        let evicted = {
            let mut clips = self.lock();
            let evicted = if clips.len() >= self.capacity {
                clips.pop_front()
            } else {
                None
            };
            clips.push_back(Arc::new(clip));
            evicted
        };
        if let Some(old) = evicted {
            tracing::info!(clip = %old.id(), "evicting oldest pending clip");
        }
        id
    }

    /// Remove a clip; the caller owns its file from here on
    pub fn take(&self, id: Uuid) -> Option<Arc<CanonicalClip>> {
        let mut clips = self.lock();
        let idx = clips.iter().position(|clip| clip.id() == id)?;
        clips.remove(idx)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().iter().any(|clip| clip.id() == id)
    }

    /// Shared handle to a pending clip, released before any file I/O
    pub fn get(&self, id: Uuid) -> Option<Arc<CanonicalClip>> {
        self.lock().iter().find(|clip| clip.id() == id).cloned()
    }
}
