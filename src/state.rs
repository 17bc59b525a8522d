// Application state - one struct instead of ad-hoc window globals

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::downloader::{CancelFlag, UrlQueue, YtDlpBackend};

/// Everything the command handlers share, managed by tauri and handed to
/// each handler. The queue and the chosen folder sit behind mutexes;
/// async commands run off the webview thread.
pub struct AppState {
    pub backend: YtDlpBackend,
    pub queue: Mutex<UrlQueue>,
    pub cancel: CancelFlag,
    download_dir: Mutex<PathBuf>,
    session_active: AtomicBool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            backend: YtDlpBackend::new(),
            queue: Mutex::new(UrlQueue::new()),
            cancel: CancelFlag::new(),
            download_dir: Mutex::new(
                dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            ),
            session_active: AtomicBool::new(false),
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.lock().unwrap().clone()
    }

    pub fn set_download_dir(&self, dir: PathBuf) {
        *self.download_dir.lock().unwrap() = dir;
    }

    /// Claim the single session slot. Returns false when a session is
    /// already running.
    pub fn try_begin_session(&self) -> bool {
        self.session_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn end_session(&self) {
        self.session_active.store(false, Ordering::SeqCst);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
