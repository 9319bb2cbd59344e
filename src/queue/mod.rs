//! Capture queue domain: public API.
//!
//! - `capture_queue` holds the in-memory state and enforces its rules.
//! - `persistence` writes one PNG per item and deletes it again.
//! - `recovery` rebuilds the queue from that directory at startup.
//! - `shared` runs the same queue on tokio's blocking pool.

mod capture_queue;
mod persistence;
mod recovery;
mod shared;
mod store;
mod timestamp;

pub use capture_queue::{CaptureQueue, QueuedItem};
pub use persistence::{file_name_for, FileStore, PersistError};
pub use recovery::{Recovered, RecoveredItem, RecoveryReport};
pub use shared::{QueueError, SharedCaptureQueue};
pub use store::{DeleteOutcome, QueueStore};
pub use timestamp::CaptureTimestamp;
