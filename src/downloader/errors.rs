// Error types for queue, probe and session operations

use std::fmt;
use std::path::PathBuf;

/// Everything that can go wrong between the UI and the external tools.
///
/// All of these are recovered locally and surfaced as a single status
/// line; none of them abort the application.
#[derive(Debug, Clone)]
pub enum AppError {
    /// URL field was empty or whitespace-only
    EmptyInput,

    /// URL is already in the queue
    DuplicateUrl(String),

    /// yt-dlp metadata probe failed (bad URL, unreachable, unsupported site)
    Resolution(String),

    /// FFmpeg binary missing at the resolved location (session-fatal)
    BinaryNotFound(PathBuf),

    /// FFmpeg is present but the version check failed (session-fatal)
    BinaryUnusable(String),

    /// A single download failed; the rest of the session continues
    Download(String),

    /// A session is already running
    SessionBusy,

    /// The user cancelled the running session
    Cancelled,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Please enter a URL"),
            Self::DuplicateUrl(_) => write!(f, "URL already added"),
            Self::Resolution(msg) => write!(f, "Error: {}", msg),
            Self::BinaryNotFound(path) => write!(
                f,
                "Error: FFmpeg not found at {}. Please install FFmpeg.",
                path.display()
            ),
            Self::BinaryUnusable(stderr) => write!(f, "FFmpeg error: {}", stderr),
            Self::Download(msg) => write!(f, "Error downloading: {}", msg),
            Self::SessionBusy => write!(f, "A download session is already running"),
            Self::Cancelled => write!(f, "Download cancelled"),
        }
    }
}

impl std::error::Error for AppError {}

/// Compress raw yt-dlp stderr into one status-line-sized message.
///
/// Prefers `ERROR:` lines and HTTP failures; falls back to the last
/// non-empty line, truncated.
pub fn stderr_summary(stderr: &str) -> String {
    let important: Vec<&str> = stderr
        .lines()
        .map(|l| l.trim())
        .filter(|s| {
            s.starts_with("ERROR:")
                || s.contains("HTTP Error")
                || s.contains("Unsupported URL")
                || s.contains("is not a valid URL")
        })
        .take(2)
        .collect();

    if !important.is_empty() {
        return important.join(" | ");
    }

    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Unknown error")
        .trim()
        .chars()
        .take(160)
        .collect()
}
