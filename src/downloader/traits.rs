// Downloader backend trait - the seam between the session and yt-dlp

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::AppError;
use super::models::{DownloadOptions, DownloadProgress, VideoInfo};

/// The two operations the session needs from the external downloader.
/// Production uses [`super::ytdlp::YtDlpBackend`]; tests script a fake.
#[async_trait]
pub trait DownloaderBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Metadata-only probe: title, uploader, duration, formats list.
    /// No media is fetched.
    async fn probe(&self, url: &str) -> Result<VideoInfo, AppError>;

    /// Download one URL with the given options, reporting progress
    /// through `progress` and honouring `cancel`.
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &ProgressEmitter,
        cancel: &CancelFlag,
    ) -> Result<(), AppError>;
}

/// Progress sink handed to backends. The tauri layer wraps an
/// `AppHandle` emit; tests collect records into a Vec.
pub struct ProgressEmitter {
    sink: Box<dyn Fn(DownloadProgress) + Send + Sync>,
}

impl ProgressEmitter {
    pub fn new(sink: impl Fn(DownloadProgress) + Send + Sync + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn emit(&self, progress: DownloadProgress) {
        (self.sink)(progress);
    }
}

/// Shared cancellation flag. Set from the UI thread, checked between
/// queue entries and while streaming yt-dlp output.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
