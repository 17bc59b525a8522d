// Common data models shared by the queue, the session and the UI boundary

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One pending download request. The URL is the dedup key; the title is
/// cached at add time for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub url: String,
    pub title: String,
}

impl QueueEntry {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Metadata returned by a yt-dlp probe (no media fetched).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub uploader: String,
    /// "m:ss" for display
    pub duration: String,
    pub formats: Vec<VideoFormat>,
}

/// One entry of the probed formats list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFormat {
    pub format_id: String,
    pub ext: String,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
}

/// Options handed to the backend for a single download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// yt-dlp format-selector expression
    pub selector: String,
    /// Extract audio to MP3 instead of remuxing a video container
    pub extract_audio: bool,
    /// Destination folder for `%(title)s.%(ext)s`
    pub destination: PathBuf,
    /// Directory containing the ffmpeg binary
    pub ffmpeg_location: PathBuf,
}

/// Where a progress record sits in the per-URL stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Downloading,
    Finished,
    Error,
}

/// One record of the progress-event stream. Exactly one terminal record
/// (`Finished` or `Error`) is emitted per URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub url: String,
    /// Negative when the total size is unknown (indeterminate)
    pub percent: f32,
    pub status: String,
    pub state: ProgressState,
}

impl DownloadProgress {
    pub fn downloading(url: &str, percent: f32, status: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            percent,
            status: status.into(),
            state: ProgressState::Downloading,
        }
    }

    pub fn finished(url: &str, status: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            percent: 100.0,
            status: status.into(),
            state: ProgressState::Finished,
        }
    }

    pub fn error(url: &str, status: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            percent: 0.0,
            status: status.into(),
            state: ProgressState::Error,
        }
    }
}

/// Per-URL result of a session run. Not persisted anywhere; the frontend
/// renders it once and forgets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub url: String,
    pub title: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl SessionOutcome {
    pub fn success(entry: &QueueEntry) -> Self {
        Self {
            url: entry.url.clone(),
            title: entry.title.clone(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(entry: &QueueEntry, error: impl Into<String>) -> Self {
        Self {
            url: entry.url.clone(),
            title: entry.title.clone(),
            succeeded: false,
            error: Some(error.into()),
        }
    }
}
