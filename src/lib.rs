//! snip-queue — holds screenshots awaiting batch editing.
//!
//! The crate wires together:
//! - Capture artifacts and modes (capture/)
//! - Queue settings and their providers (config/)
//! - The bounded capture queue with on-disk persistence (queue/)
//!
//! ```no_run
//! use image::DynamicImage;
//! use snip_queue::{CaptureMode, CaptureQueue, JsonConfig, default_queue_dir};
//!
//! let config = JsonConfig::load_from(&JsonConfig::default_path());
//! let mut queue: CaptureQueue<DynamicImage> =
//!     CaptureQueue::from_config(&config, Some(default_queue_dir()));
//!
//! # let screenshot = DynamicImage::new_rgba8(1, 1);
//! queue.add(screenshot, CaptureMode::Region);
//! for image in queue.pop_all() {
//!     // hand each capture to the editor
//!     # let _ = image;
//! }
//! ```

pub mod capture;
pub mod config;
pub mod queue;

pub use capture::{ArtifactError, CaptureMode, ImageArtifact};
pub use config::{default_queue_dir, ConfigProvider, JsonConfig, MapConfig, QueueSettings};
pub use queue::{CaptureQueue, QueuedItem, SharedCaptureQueue};
