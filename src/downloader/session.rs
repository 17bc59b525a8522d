// Download session - drain the queue through the backend, one URL at a time
//
// Failures are isolated per URL: a dead link or a transcoder error skips
// that entry and the session keeps going. The queue is cleared once every
// entry has been attempted, whatever the individual outcomes were.

use std::path::PathBuf;
use std::sync::Mutex;

use super::errors::AppError;
use super::formats::FormatPreset;
use super::models::{DownloadOptions, DownloadProgress, SessionOutcome};
use super::queue::UrlQueue;
use super::traits::{CancelFlag, DownloaderBackend, ProgressEmitter};

/// Session-wide settings: one preset, one destination, one transcoder.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub preset: FormatPreset,
    pub destination: PathBuf,
    pub ffmpeg_location: PathBuf,
}

impl SessionConfig {
    fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            selector: self.preset.selector.to_string(),
            extract_audio: self.preset.is_audio_only(),
            destination: self.destination.clone(),
            ffmpeg_location: self.ffmpeg_location.clone(),
        }
    }
}

/// Attempt every queued entry in insertion order, exactly once each.
///
/// Post-condition: the queue is empty, regardless of per-entry outcomes.
/// Cancellation stops before the next entry; entries never attempted do
/// not appear in the outcomes.
pub async fn run(
    backend: &dyn DownloaderBackend,
    queue: &Mutex<UrlQueue>,
    config: &SessionConfig,
    progress: &ProgressEmitter,
    cancel: &CancelFlag,
) -> Vec<SessionOutcome> {
    let entries = queue.lock().unwrap().snapshot();
    let options = config.download_options();
    let mut outcomes = Vec::with_capacity(entries.len());

    eprintln!(
        "[Session] Starting: {} entries, preset \"{}\", destination {}",
        entries.len(),
        config.preset.label,
        config.destination.display()
    );

    for entry in &entries {
        if cancel.is_cancelled() {
            eprintln!("[Session] Cancelled before {}", entry.url);
            break;
        }

        progress.emit(DownloadProgress::downloading(
            &entry.url,
            -1.0,
            format!("Downloading: {}", entry.url),
        ));

        // Full metadata pass before the download proper; a URL that no
        // longer resolves is caught here before anything touches the disk.
        let info = match backend.probe(&entry.url).await {
            Ok(info) => info,
            Err(e) => {
                let message = format!("Error downloading {}: {}", entry.url, e);
                eprintln!("[Session] {}", message);
                progress.emit(DownloadProgress::error(&entry.url, message.clone()));
                outcomes.push(SessionOutcome::failure(entry, e.to_string()));
                continue;
            }
        };
        eprintln!(
            "[Session] {} formats available for \"{}\"",
            info.formats.len(),
            info.title
        );

        match backend.download(&entry.url, &options, progress, cancel).await {
            Ok(()) => {
                progress.emit(DownloadProgress::finished(
                    &entry.url,
                    format!("Finished: {}", entry.title),
                ));
                outcomes.push(SessionOutcome::success(entry));
            }
            Err(AppError::Cancelled) => {
                let message = AppError::Cancelled.to_string();
                progress.emit(DownloadProgress::error(&entry.url, message.clone()));
                outcomes.push(SessionOutcome::failure(entry, message));
                break;
            }
            Err(e) => {
                let message = format!("Error downloading {}: {}", entry.url, e);
                eprintln!("[Session] {}", message);
                progress.emit(DownloadProgress::error(&entry.url, message));
                outcomes.push(SessionOutcome::failure(entry, e.to_string()));
            }
        }
    }

    // Clear-always: failed entries are not re-queued
    queue.lock().unwrap().clear();

    let failed = outcomes.iter().filter(|o| !o.succeeded).count();
    eprintln!(
        "[Session] Done: {} attempted, {} failed",
        outcomes.len(),
        failed
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::formats;
    use crate::downloader::models::{QueueEntry, VideoInfo};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Scripted stand-in for yt-dlp: records call order and options,
    /// fails where told to.
    #[derive(Default)]
    struct FakeBackend {
        fail_probe: HashSet<String>,
        fail_download: HashSet<String>,
        calls: Mutex<Vec<String>>,
        options_seen: Mutex<Vec<DownloadOptions>>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DownloaderBackend for FakeBackend {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn probe(&self, url: &str) -> Result<VideoInfo, AppError> {
            self.calls.lock().unwrap().push(format!("probe {}", url));
            if self.fail_probe.contains(url) {
                return Err(AppError::Resolution("Video unavailable".to_string()));
            }
            Ok(VideoInfo {
                title: format!("title of {}", url),
                uploader: "someone".to_string(),
                duration: "1:00".to_string(),
                formats: Vec::new(),
            })
        }

        async fn download(
            &self,
            url: &str,
            options: &DownloadOptions,
            progress: &ProgressEmitter,
            _cancel: &CancelFlag,
        ) -> Result<(), AppError> {
            self.calls.lock().unwrap().push(format!("download {}", url));
            self.options_seen.lock().unwrap().push(options.clone());
            progress.emit(DownloadProgress::downloading(url, 50.0, "Downloading: 50.0%"));
            if self.fail_download.contains(url) {
                return Err(AppError::Download("HTTP Error 403: Forbidden".to_string()));
            }
            Ok(())
        }
    }

    fn queue_of(urls: &[&str]) -> Mutex<UrlQueue> {
        let mut queue = UrlQueue::new();
        for url in urls {
            queue.add(QueueEntry::new(*url, format!("title of {}", url))).unwrap();
        }
        Mutex::new(queue)
    }

    fn config(label: &str) -> SessionConfig {
        SessionConfig {
            preset: *formats::find(label).unwrap(),
            destination: PathBuf::from("/downloads"),
            ffmpeg_location: PathBuf::from("/opt/ffmpeg/bin"),
        }
    }

    fn collecting_emitter() -> (ProgressEmitter, Arc<Mutex<Vec<DownloadProgress>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = records.clone();
        (
            ProgressEmitter::new(move |p| sink.lock().unwrap().push(p)),
            records,
        )
    }

    #[tokio::test]
    async fn test_entries_attempted_in_order_with_chosen_selector() {
        let backend = FakeBackend::default();
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, _) = collecting_emitter();

        let outcomes = run(
            &backend,
            &queue,
            &config("720p"),
            &emitter,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(
            backend.calls(),
            vec![
                "probe https://example.com/a",
                "download https://example.com/a",
                "probe https://example.com/b",
                "download https://example.com/b",
            ]
        );
        assert!(outcomes.iter().all(|o| o.succeeded));

        let options = backend.options_seen.lock().unwrap();
        for opts in options.iter() {
            assert_eq!(
                opts.selector,
                "bestvideo[height<=720]+bestaudio/best[height<=720]"
            );
            assert!(!opts.extract_audio);
        }
    }

    #[tokio::test]
    async fn test_queue_is_cleared_after_run() {
        let backend = FakeBackend::default();
        let queue = queue_of(&["https://example.com/a"]);
        let (emitter, _) = collecting_emitter();

        run(&backend, &queue, &config("720p"), &emitter, &CancelFlag::new()).await;

        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_is_isolated() {
        let backend = FakeBackend {
            fail_download: HashSet::from(["https://example.com/a".to_string()]),
            ..Default::default()
        };
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, _) = collecting_emitter();

        let outcomes = run(
            &backend,
            &queue,
            &config("720p"),
            &emitter,
            &CancelFlag::new(),
        )
        .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[1].succeeded);
        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_skips_download_but_not_session() {
        let backend = FakeBackend {
            fail_probe: HashSet::from(["https://example.com/a".to_string()]),
            ..Default::default()
        };
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, _) = collecting_emitter();

        let outcomes = run(
            &backend,
            &queue,
            &config("720p"),
            &emitter,
            &CancelFlag::new(),
        )
        .await;

        let calls = backend.calls();
        assert!(!calls.contains(&"download https://example.com/a".to_string()));
        assert!(calls.contains(&"download https://example.com/b".to_string()));
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[1].succeeded);
    }

    #[tokio::test]
    async fn test_queue_cleared_even_when_everything_fails() {
        let backend = FakeBackend {
            fail_download: HashSet::from([
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ]),
            ..Default::default()
        };
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, _) = collecting_emitter();

        let outcomes = run(
            &backend,
            &queue,
            &config("720p"),
            &emitter,
            &CancelFlag::new(),
        )
        .await;

        assert!(outcomes.iter().all(|o| !o.succeeded));
        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audio_preset_requests_audio_extraction() {
        let backend = FakeBackend::default();
        let queue = queue_of(&["https://example.com/a"]);
        let (emitter, _) = collecting_emitter();

        run(
            &backend,
            &queue,
            &config("Audio Only (MP3)"),
            &emitter,
            &CancelFlag::new(),
        )
        .await;

        let options = backend.options_seen.lock().unwrap();
        assert!(options[0].extract_audio);
        assert_eq!(options[0].selector, "bestaudio/best");
    }

    #[tokio::test]
    async fn test_cancel_before_start_attempts_nothing() {
        let backend = FakeBackend::default();
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, _) = collecting_emitter();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcomes = run(&backend, &queue, &config("720p"), &emitter, &cancel).await;

        assert!(backend.calls().is_empty());
        assert!(outcomes.is_empty());
        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_terminal_progress_record_per_url() {
        let backend = FakeBackend {
            fail_download: HashSet::from(["https://example.com/b".to_string()]),
            ..Default::default()
        };
        let queue = queue_of(&["https://example.com/a", "https://example.com/b"]);
        let (emitter, records) = collecting_emitter();

        run(&backend, &queue, &config("720p"), &emitter, &CancelFlag::new()).await;

        use crate::downloader::models::ProgressState;
        let records = records.lock().unwrap();
        for url in ["https://example.com/a", "https://example.com/b"] {
            let terminal = records
                .iter()
                .filter(|p| p.url == url && p.state != ProgressState::Downloading)
                .count();
            assert_eq!(terminal, 1, "url {}", url);
        }
    }
}
