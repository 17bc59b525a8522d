// yt-dlp backend - binary discovery, metadata probe, streaming download
//
// Everything protocol-related is delegated to the yt-dlp executable; this
// module only builds argument lists, parses `--dump-json` output and
// turns `--newline` progress lines into progress records.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::{interval, Duration};

use super::errors::{stderr_summary, AppError};
use super::formats::{AUDIO_CODEC, AUDIO_QUALITY, MERGE_CONTAINER};
use super::models::{DownloadOptions, DownloadProgress, VideoFormat, VideoInfo};
use super::traits::{CancelFlag, DownloaderBackend, ProgressEmitter};
use super::utils::run_output_with_timeout;

const PROBE_TIMEOUT_SECS: u64 = 30;

/// Backend driving the native yt-dlp binary.
pub struct YtDlpBackend {
    path: PathBuf,
}

impl YtDlpBackend {
    pub fn new() -> Self {
        Self {
            path: find_ytdlp(),
        }
    }

    #[cfg(test)]
    fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for YtDlpBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the yt-dlp binary in common install locations, then PATH.
fn find_ytdlp() -> PathBuf {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return PathBuf::from(path);
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
        }
    }

    // Last resort: hope it's in PATH
    PathBuf::from("yt-dlp")
}

/// Parse one `--newline` progress line like:
/// `[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59`
/// Returns `(percent, status)`; percent is `None` when the total size is
/// unknown and only an indeterminate "downloading" state can be shown.
fn parse_progress_line(line: &str) -> Option<(Option<f32>, String)> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*[\d.]+\s*\w+"
        ).unwrap();
        static ref UNKNOWN_RE: Regex =
            Regex::new(r"\[download\]\s+\d+\.?\d*\s*\w+\s+at\s").unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger\]\s+Merging").unwrap();
        static ref EXTRACT_RE: Regex = Regex::new(r"\[ExtractAudio\]\s+Destination").unwrap();
        static ref REMUX_RE: Regex = Regex::new(r"\[VideoRemuxer\]\s+Remuxing").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        return Some((Some(percent), format!("Downloading: {:.1}%", percent)));
    }

    // Size-unknown variant: yt-dlp prints downloaded bytes without a total
    if UNKNOWN_RE.is_match(line) {
        return Some((None, "Downloading...".to_string()));
    }

    if DEST_RE.is_match(line) {
        return Some((None, "Downloading...".to_string()));
    }

    if MERGE_RE.is_match(line) || EXTRACT_RE.is_match(line) || REMUX_RE.is_match(line) {
        return Some((None, "Processing download...".to_string()));
    }

    if ALREADY_RE.is_match(line) {
        return Some((Some(100.0), "File already downloaded".to_string()));
    }

    None
}

/// Argument list for a single download: selector, output template rooted
/// at the destination, ffmpeg location, post-processing directives.
fn build_download_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        options.selector.clone(),
        "--newline".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--socket-timeout".to_string(),
        "30".to_string(),
        "-P".to_string(),
        options.destination.to_string_lossy().to_string(),
        // yt-dlp's default template is "%(title)s [%(id)s].%(ext)s"; drop the [id]
        "-o".to_string(),
        "%(title)s.%(ext)s".to_string(),
        "--ffmpeg-location".to_string(),
        options.ffmpeg_location.to_string_lossy().to_string(),
    ];

    if options.extract_audio {
        args.push("-x".to_string());
        args.push("--audio-format".to_string());
        args.push(AUDIO_CODEC.to_string());
        args.push("--audio-quality".to_string());
        args.push(AUDIO_QUALITY.to_string());
    } else {
        args.push("--merge-output-format".to_string());
        args.push(MERGE_CONTAINER.to_string());
        args.push("--remux-video".to_string());
        args.push(MERGE_CONTAINER.to_string());
    }

    args.push(url.to_string());
    args
}

fn parse_video_info(stdout: &[u8], url: &str) -> Result<VideoInfo, AppError> {
    let json_str = String::from_utf8_lossy(stdout);
    let json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| AppError::Resolution(format!("Failed to parse yt-dlp output: {}", e)))?;

    let duration_secs = json["duration"].as_f64().unwrap_or(0.0) as i64;
    let duration = format!("{}:{:02}", duration_secs / 60, duration_secs % 60);

    let formats = json["formats"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|f| VideoFormat {
                    format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                    ext: f["ext"].as_str().unwrap_or("").to_string(),
                    height: f["height"].as_u64().map(|h| h as u32),
                    filesize: f["filesize"]
                        .as_u64()
                        .or_else(|| f["filesize_approx"].as_u64()),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(VideoInfo {
        // Remote sources without a title fall back to the raw URL
        title: json["title"].as_str().unwrap_or(url).to_string(),
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
        duration,
        formats,
    })
}

#[async_trait]
impl DownloaderBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<VideoInfo, AppError> {
        let args = [
            "--dump-json",
            "--no-playlist",
            "--no-warnings",
            "--socket-timeout",
            "15",
            url,
        ];

        let output = run_output_with_timeout(&self.path, &args, PROBE_TIMEOUT_SECS)
            .await
            .map_err(AppError::Resolution)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Resolution(stderr_summary(&stderr)));
        }

        parse_video_info(&output.stdout, url)
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &ProgressEmitter,
        cancel: &CancelFlag,
    ) -> Result<(), AppError> {
        let args = build_download_args(url, options);
        eprintln!("[yt-dlp] Starting download: {}", url);

        let mut child = TokioCommand::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::Download(format!("Failed to start yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Download("Failed to capture stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Download("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut cancel_tick = interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                next = lines.next_line() => {
                    match next {
                        Ok(Some(line)) => {
                            if let Some((percent, status)) = parse_progress_line(&line) {
                                progress.emit(DownloadProgress::downloading(
                                    url,
                                    percent.unwrap_or(-1.0),
                                    status,
                                ));
                            }
                            if line.contains("[download]")
                                || line.contains("[Merger]")
                                || line.contains("[ExtractAudio]")
                            {
                                eprintln!("[yt-dlp] {}", line);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = child.kill().await;
                            stderr_task.abort();
                            return Err(AppError::Download(format!("Failed to read output: {}", e)));
                        }
                    }
                }
                _ = cancel_tick.tick() => {
                    if cancel.is_cancelled() {
                        eprintln!("[yt-dlp] Cancelled, killing child process");
                        let _ = child.kill().await;
                        stderr_task.abort();
                        return Err(AppError::Cancelled);
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| AppError::Download(format!("Process error: {}", e)))?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Download(stderr_summary(&stderr_output)))
        }
    }
}
