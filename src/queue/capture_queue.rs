//! The capture queue proper: an ordered, bounded collection of captures.
//!
//! This is the only place queue state changes. It keeps three promises:
//! the queue never holds more than `max_size` items, items stay in the
//! order they were added, and a backing file never outlives its item.
//! Disk trouble is logged and absorbed here, so no method fails because
//! of it.

use super::persistence::FileStore;
use super::recovery::RecoveryReport;
use super::store::{DeleteOutcome, QueueStore};
use super::timestamp::{CaptureClock, CaptureTimestamp};
use crate::capture::{CaptureMode, ImageArtifact};
use crate::config::{ConfigProvider, QueueSettings};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

type BoxedStore<A> = Box<dyn QueueStore<A> + Send>;

/// One capture waiting in the queue.
#[derive(Debug, Clone)]
pub struct QueuedItem<A> {
    artifact: A,
    created_at: CaptureTimestamp,
    mode: CaptureMode,
    persisted_path: Option<PathBuf>,
}

impl<A> QueuedItem<A> {
    pub fn artifact(&self) -> &A {
        &self.artifact
    }

    pub fn created_at(&self) -> CaptureTimestamp {
        self.created_at
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Backing file, if the item was persisted.
    pub fn persisted_path(&self) -> Option<&Path> {
        self.persisted_path.as_deref()
    }
}

/// Bounded FIFO of captures awaiting batch editing.
///
/// Driven from one control thread; for async callers see
/// [`SharedCaptureQueue`](super::SharedCaptureQueue).
pub struct CaptureQueue<A> {
    items: VecDeque<QueuedItem<A>>,
    max_size: NonZeroUsize,
    store: Option<BoxedStore<A>>,
    clock: CaptureClock,
    recovery: Option<RecoveryReport>,
}

impl<A: ImageArtifact> CaptureQueue<A> {
    /// Queue with no persistence.
    pub fn in_memory(max_size: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
            store: None,
            clock: CaptureClock::new(),
            recovery: None,
        }
    }

    /// Queue backed by PNG files in `dir`, seeded from whatever a previous
    /// run left there.
    pub fn persistent(max_size: NonZeroUsize, dir: impl Into<PathBuf>) -> Self {
        Self::with_store(max_size, FileStore::new(dir))
    }

    /// Queue sized from `settings`, persistent when `persist_dir` is given.
    pub fn with_settings(settings: QueueSettings, persist_dir: Option<PathBuf>) -> Self {
        match persist_dir {
            Some(dir) => Self::persistent(settings.max_size, dir),
            None => Self::in_memory(settings.max_size),
        }
    }

    /// Reads `queue_max_size` from `provider` once, then builds the queue.
    pub fn from_config<P: ConfigProvider>(provider: &P, persist_dir: Option<PathBuf>) -> Self {
        Self::with_settings(QueueSettings::from_provider(provider), persist_dir)
    }

    /// Queue backed by an arbitrary store. Runs recovery immediately.
    pub fn with_store<S>(max_size: NonZeroUsize, store: S) -> Self
    where
        S: QueueStore<A> + Send + 'static,
    {
        let recovered = store.recover(max_size);
        let mut queue = Self {
            items: VecDeque::with_capacity(recovered.items.len().min(max_size.get())),
            max_size,
            store: Some(Box::new(store)),
            clock: CaptureClock::new(),
            recovery: None,
        };

        for item in recovered.items {
            queue.clock.observe(item.created_at);
            queue.items.push_back(QueuedItem {
                artifact: item.artifact,
                created_at: item.created_at,
                // Not stored on disk
                mode: CaptureMode::default(),
                persisted_path: Some(item.path),
            });
        }

        let mut report = recovered.report;
        while queue.items.len() > queue.max_size.get() {
            if let Some(oldest) = queue.items.pop_front() {
                queue.discard(oldest);
                report.evicted += 1;
            }
        }

        log::info!(
            "[QUEUE] Recovered {} captures ({} corrupt removed, {} partial removed, {} over capacity evicted)",
            queue.items.len(),
            report.corrupt_removed,
            report.partials_removed,
            report.evicted
        );
        queue.recovery = Some(report);
        queue
    }

    /// Appends a capture and returns its index, which is always the last one.
    ///
    /// At capacity the oldest item (index 0) is evicted first. If the new
    /// item cannot be persisted it is kept in memory only.
    pub fn add(&mut self, artifact: A, mode: CaptureMode) -> usize {
        if self.items.len() >= self.max_size.get() {
            if let Some(oldest) = self.items.pop_front() {
                log::debug!("[QUEUE] At capacity ({}), evicting {}", self.max_size, oldest.created_at);
                self.discard(oldest);
            }
        }

        let created_at = self.clock.next();
        let persisted_path = self.store.as_ref().and_then(|store| {
            match store.persist(&artifact, created_at) {
                Ok(path) => Some(path),
                Err(e) => {
                    log::warn!("[QUEUE] Keeping capture {} in memory only: {}", created_at, e);
                    None
                }
            }
        });

        self.items.push_back(QueuedItem {
            artifact,
            created_at,
            mode,
            persisted_path,
        });
        self.items.len() - 1
    }

    /// Artifacts in queue order.
    pub fn get_all(&self) -> Vec<&A> {
        self.items.iter().map(|item| &item.artifact).collect()
    }

    /// Takes every artifact out, in queue order, and empties the queue.
    pub fn pop_all(&mut self) -> Vec<A> {
        let drained = std::mem::take(&mut self.items);
        let artifacts: Vec<A> = drained.into_iter().map(|item| self.discard(item)).collect();
        log::debug!("[QUEUE] Popped {} captures", artifacts.len());
        artifacts
    }

    /// Artifact at `index`; `None` for negative or out-of-range indices.
    pub fn get_at<I: TryInto<usize>>(&self, index: I) -> Option<&A> {
        self.item_at(index).map(|item| &item.artifact)
    }

    pub fn item_at<I: TryInto<usize>>(&self, index: I) -> Option<&QueuedItem<A>> {
        let index = index.try_into().ok()?;
        self.items.get(index)
    }

    /// Removes the item at `index`. Returns `false`, changing nothing, when
    /// the index is out of range.
    pub fn remove<I: TryInto<usize>>(&mut self, index: I) -> bool {
        let Ok(index) = index.try_into() else {
            return false;
        };
        match self.items.remove(index) {
            Some(item) => {
                self.discard(item);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        let drained = std::mem::take(&mut self.items);
        for item in drained {
            self.discard(item);
        }
    }

    pub fn items(&self) -> impl ExactSizeIterator<Item = &QueuedItem<A>> + '_ {
        self.items.iter()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_size(&self) -> NonZeroUsize {
        self.max_size
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// What startup recovery did, for persistent queues.
    pub fn recovery_report(&self) -> Option<&RecoveryReport> {
        self.recovery.as_ref()
    }

    /// Releases the item's backing file and hands back its artifact.
    fn discard(&self, item: QueuedItem<A>) -> A {
        if let (Some(store), Some(path)) = (&self.store, &item.persisted_path) {
            match store.delete(path) {
                Ok(DeleteOutcome::Removed) => {}
                Ok(DeleteOutcome::AlreadyGone) => {
                    log::debug!("[QUEUE] Backing file {} was already gone", path.display());
                }
                Err(e) => log::warn!("[QUEUE] {}", e),
            }
        }
        item.artifact
    }
}
