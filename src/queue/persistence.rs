//! File-per-item persistence.
//!
//! Each persisted item is one PNG named `queue_<YYYYMMDD>_<HHMMSS>_<ffffff>.png`
//! in the queue directory. The filename is the only ordering record; there
//! is no index or manifest. Writes go to `<name>.partial` first and are
//! renamed into place, so a final name never points at half a file.

use super::recovery::{self, Recovered};
use super::store::{DeleteOutcome, QueueStore};
use super::timestamp::CaptureTimestamp;
use crate::capture::{ArtifactError, ImageArtifact};
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub(crate) const FILE_PREFIX: &str = "queue_";
pub(crate) const FILE_EXTENSION: &str = "png";
pub(crate) const PARTIAL_SUFFIX: &str = ".partial";

/// Anything shaped like a queue file. The timestamp itself is validated
/// separately so a malformed name can be cleaned up instead of ignored.
pub(crate) static QUEUE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^queue_(.*)\.png$").unwrap());

pub(crate) static PARTIAL_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^queue_.*\.png\.partial$").unwrap());

/// Filename for an item captured at `created_at`.
pub fn file_name_for(created_at: CaptureTimestamp) -> String {
    format!("{}{}.{}", FILE_PREFIX, created_at.to_key(), FILE_EXTENSION)
}

/// Queue directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, created_at: CaptureTimestamp) -> PathBuf {
        self.dir.join(file_name_for(created_at))
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Removes `path`, treating an already-missing file as success.
pub(crate) fn remove_file(path: &Path) -> Result<DeleteOutcome, PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(DeleteOutcome::Removed),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyGone),
        Err(e) => Err(PersistError::DeleteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

impl<A: ImageArtifact> QueueStore<A> for FileStore {
    fn persist(&self, artifact: &A, created_at: CaptureTimestamp) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistError::CreateDir {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;

        let path = self.path_for(created_at);
        let partial = partial_path(&path);

        if let Err(source) = artifact.encode_to(&partial) {
            let _ = fs::remove_file(&partial);
            return Err(PersistError::Encode { path, source });
        }

        if let Err(e) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(PersistError::Finalize {
                path,
                reason: e.to_string(),
            });
        }

        log::debug!("[STORE] Persisted {}", path.display());
        Ok(path)
    }

    fn delete(&self, handle: &Path) -> Result<DeleteOutcome, PersistError> {
        let outcome = remove_file(handle)?;
        log::debug!("[STORE] Deleted {} ({:?})", handle.display(), outcome);
        Ok(outcome)
    }

    fn recover(&self, limit: NonZeroUsize) -> Recovered<A> {
        recovery::load_dir(&self.dir, limit)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to create queue directory {}: {reason}", path.display())]
    CreateDir { path: PathBuf, reason: String },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },

    #[error("Failed to move {} into place: {reason}", path.display())]
    Finalize { path: PathBuf, reason: String },

    #[error("Failed to delete {}: {reason}", path.display())]
    DeleteFailed { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn ts(key: &str) -> CaptureTimestamp {
        CaptureTimestamp::parse_key(key).unwrap()
    }

    fn tiny() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(4, 4))
    }

    #[test]
    fn file_name_has_fixed_pattern() {
        let name = file_name_for(ts("20260114_093015_004217"));
        assert_eq!(name, "queue_20260114_093015_004217.png");
        assert!(QUEUE_FILE.is_match(&name));
        assert!(!PARTIAL_FILE.is_match(&name));
        assert!(PARTIAL_FILE.is_match(&format!("{name}.partial")));
    }

    #[test]
    fn persist_creates_directory_and_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path().join("nested").join("queue"));

        let path = QueueStore::<DynamicImage>::persist(&store, &tiny(), ts("20260114_093015_004217"))
            .unwrap();

        assert!(path.is_file());
        assert_eq!(path, store.path_for(ts("20260114_093015_004217")));
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn persist_into_unwritable_location_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();
        let store = FileStore::new(&blocker);

        let result = QueueStore::<DynamicImage>::persist(&store, &tiny(), CaptureTimestamp::now());
        assert!(matches!(result, Err(PersistError::CreateDir { .. })));
    }

    #[test]
    fn delete_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());
        let path = QueueStore::<DynamicImage>::persist(&store, &tiny(), CaptureTimestamp::now())
            .unwrap();

        let first = QueueStore::<DynamicImage>::delete(&store, &path).unwrap();
        let second = QueueStore::<DynamicImage>::delete(&store, &path).unwrap();
        assert_eq!(first, DeleteOutcome::Removed);
        assert_eq!(second, DeleteOutcome::AlreadyGone);
        assert!(!path.exists());
    }
}
