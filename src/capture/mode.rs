use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a screenshot was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Region,
    Fullscreen,
    Window,
    Scroll,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Region,
        CaptureMode::Fullscreen,
        CaptureMode::Window,
        CaptureMode::Scroll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureMode::Region => "region",
            CaptureMode::Fullscreen => "fullscreen",
            CaptureMode::Window => "window",
            CaptureMode::Scroll => "scroll",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown capture mode: {0}")]
pub struct ParseModeError(String);

impl FromStr for CaptureMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaptureMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}
