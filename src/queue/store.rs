//! Backing-store seam between the queue and whatever keeps items on disk.

use super::persistence::PersistError;
use super::recovery::Recovered;
use super::timestamp::CaptureTimestamp;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Durable backing for queued artifacts.
///
/// The queue owns every handle a store returns and is the only caller that
/// deletes one. Implementations must not touch a handle on their own.
pub trait QueueStore<A> {
    /// Writes `artifact` and returns the handle that now backs it.
    fn persist(&self, artifact: &A, created_at: CaptureTimestamp) -> Result<PathBuf, PersistError>;

    /// Removes the backing for `handle`. Deleting twice is not an error.
    fn delete(&self, handle: &Path) -> Result<DeleteOutcome, PersistError>;

    /// The newest `limit` readable items from a previous run, oldest first.
    ///
    /// Unreadable entries are removed rather than returned. Older readable
    /// entries beyond `limit` are removed without being read.
    fn recover(&self, limit: NonZeroUsize) -> Recovered<A>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    AlreadyGone,
}
