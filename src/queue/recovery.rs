//! Startup recovery of a persisted queue directory.
//!
//! Runs once, before the queue accepts any call. Files that cannot be turned
//! back into an item are deleted on the spot, so nothing half-readable is
//! ever handed to the caller and the directory heals itself.

use super::persistence::{self, PARTIAL_FILE, QUEUE_FILE};
use super::timestamp::CaptureTimestamp;
use crate::capture::{ArtifactError, ImageArtifact};
use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// One item read back from disk.
pub struct RecoveredItem<A> {
    pub artifact: A,
    pub created_at: CaptureTimestamp,
    pub path: PathBuf,
}

/// Result of a recovery scan.
pub struct Recovered<A> {
    /// Oldest first.
    pub items: Vec<RecoveredItem<A>>,
    pub report: RecoveryReport,
}

impl<A> Recovered<A> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            report: RecoveryReport::default(),
        }
    }
}

/// What recovery did to the directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub loaded: usize,
    pub corrupt_removed: usize,
    pub partials_removed: usize,
    /// Oldest items dropped because the directory held more than the capacity.
    pub evicted: usize,
}

#[derive(Debug, thiserror::Error)]
enum EntryError {
    #[error("filename does not carry a valid timestamp")]
    BadName,
}

/// Scans `dir` and decodes the newest `limit` queue files.
///
/// Candidates are walked newest first. Once `limit` items are in hand, older
/// well-named files are evicted unread, so startup never holds more than
/// `limit` decoded images.
pub(crate) fn load_dir<A: ImageArtifact>(dir: &Path, limit: NonZeroUsize) -> Recovered<A> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("[RECOVERY] No queue directory at {}", dir.display());
            return Recovered::empty();
        }
        Err(e) => {
            log::warn!("[RECOVERY] Cannot read {}: {}", dir.display(), e);
            return Recovered::empty();
        }
    };

    let mut report = RecoveryReport::default();
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("[RECOVERY] Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };

        if PARTIAL_FILE.is_match(&name) {
            // Interrupted write from a previous run
            discard(&entry.path(), &mut report.partials_removed);
        } else if QUEUE_FILE.is_match(&name) {
            candidates.push((name, entry.path()));
        }
    }

    candidates.sort();

    let mut items = Vec::with_capacity(candidates.len().min(limit.get()));
    for (name, path) in candidates.into_iter().rev() {
        let Some(created_at) = timestamp_of(&name) else {
            log::warn!("[RECOVERY] Removing {}: {}", path.display(), EntryError::BadName);
            discard(&path, &mut report.corrupt_removed);
            continue;
        };

        if items.len() >= limit.get() {
            log::debug!("[RECOVERY] Over capacity, evicting {}", path.display());
            discard(&path, &mut report.evicted);
            continue;
        }

        match read_entry::<A>(created_at, &path) {
            Ok(item) => items.push(item),
            Err(e) => {
                log::warn!("[RECOVERY] Removing {}: {}", path.display(), e);
                discard(&path, &mut report.corrupt_removed);
            }
        }
    }

    items.reverse();
    report.loaded = items.len();
    Recovered { items, report }
}

fn timestamp_of(name: &str) -> Option<CaptureTimestamp> {
    QUEUE_FILE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|key| CaptureTimestamp::parse_key(key.as_str()))
}

fn read_entry<A: ImageArtifact>(
    created_at: CaptureTimestamp,
    path: &Path,
) -> Result<RecoveredItem<A>, ArtifactError> {
    let artifact = A::decode_from(path)?;

    Ok(RecoveredItem {
        artifact,
        created_at,
        path: path.to_path_buf(),
    })
}

fn discard(path: &Path, counter: &mut usize) {
    match persistence::remove_file(path) {
        Ok(_) => *counter += 1,
        Err(e) => log::warn!("[RECOVERY] {}", e),
    }
}
