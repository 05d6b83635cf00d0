use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Frame rate passed to the capture tool
pub const CAPTURE_FPS: u32 = 25;

/// Target bitrate passed to the capture tool (15 Mbps)
pub const CAPTURE_BITRATE: u32 = 15_000_000;

/// Video frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

impl FromStr for FrameSize {
    type Err = ConfigError;

    /// Parse `"WIDTH,HEIGHT"`, both strictly positive integers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSize(s.to_string());

        let (w, h) = s.split_once(',').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;

        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(FrameSize { width, height })
    }
}

/// Parameters of one recording cycle
///
/// Built once at startup and handed to the pipeline on every trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineJob {
    pub size: FrameSize,
    /// Capture duration in milliseconds
    pub duration_ms: u64,
    pub fps: u32,
    /// Target bitrate in bits per second
    pub bitrate: u32,
}

impl PipelineJob {
    /// Create a job with the fixed frame rate and bitrate policy
    pub fn new(size: FrameSize, duration_ms: u64) -> Self {
        Self {
            size,
            duration_ms,
            fps: CAPTURE_FPS,
            bitrate: CAPTURE_BITRATE,
        }
    }

    #[cfg(test)]
    pub(crate) fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.duration_ms)
    }
}
