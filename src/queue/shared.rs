//! Async handle that keeps queue disk I/O off the caller's thread.
//!
//! The queue sits behind a mutex and every call runs inside
//! `spawn_blocking`, so a UI event loop never waits on a PNG encode.
//! Calls awaited one after another take effect in that order.

use super::capture_queue::CaptureQueue;
use crate::capture::{CaptureMode, ImageArtifact};
use crate::config::QueueSettings;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable async front for a [`CaptureQueue`].
pub struct SharedCaptureQueue<A> {
    inner: Arc<Mutex<CaptureQueue<A>>>,
}

impl<A> Clone for SharedCaptureQueue<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: ImageArtifact + Send + 'static> SharedCaptureQueue<A> {
    pub fn new(queue: CaptureQueue<A>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }

    /// Builds the queue on the blocking pool, including the recovery scan.
    pub async fn open(settings: QueueSettings, persist_dir: Option<PathBuf>) -> Result<Self, QueueError> {
        let queue = tokio::task::spawn_blocking(move || CaptureQueue::with_settings(settings, persist_dir))
            .await
            .map_err(|e| QueueError::Worker(e.to_string()))?;
        Ok(Self::new(queue))
    }

    /// Runs `op` against the queue on the blocking pool.
    pub async fn with_queue<T, F>(&self, op: F) -> Result<T, QueueError>
    where
        F: FnOnce(&mut CaptureQueue<A>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            // Every op leaves the queue consistent before it can panic
            let mut queue = inner.lock().unwrap_or_else(PoisonError::into_inner);
            op(&mut *queue)
        })
        .await
        .map_err(|e| QueueError::Worker(e.to_string()))
    }

    pub async fn add(&self, artifact: A, mode: CaptureMode) -> Result<usize, QueueError> {
        self.with_queue(move |q| q.add(artifact, mode)).await
    }

    pub async fn pop_all(&self) -> Result<Vec<A>, QueueError> {
        self.with_queue(|q| q.pop_all()).await
    }

    pub async fn remove(&self, index: usize) -> Result<bool, QueueError> {
        self.with_queue(move |q| q.remove(index)).await
    }

    pub async fn clear(&self) -> Result<(), QueueError> {
        self.with_queue(|q| q.clear()).await
    }

    pub async fn count(&self) -> Result<usize, QueueError> {
        self.with_queue(|q| q.count()).await
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        self.with_queue(|q| q.is_empty()).await
    }
}

impl<A: ImageArtifact + Clone + Send + 'static> SharedCaptureQueue<A> {
    /// Copies of the queued artifacts, in order.
    pub async fn get_all(&self) -> Result<Vec<A>, QueueError> {
        self.with_queue(|q| q.get_all().into_iter().cloned().collect())
            .await
    }

    pub async fn get_at(&self, index: usize) -> Result<Option<A>, QueueError> {
        self.with_queue(move |q| q.get_at(index).cloned()).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue worker task failed: {0}")]
    Worker(String),
}
