//! Capture domain: the artifacts that flow into the queue.
//!
//! The queue never looks at pixels. It only needs an artifact that can
//! write itself to a file and be read back from one, plus the tag saying
//! how the screenshot was produced.

mod artifact;
mod mode;

pub use artifact::{ArtifactError, ImageArtifact};
pub use mode::{CaptureMode, ParseModeError};
