// Downloader core - queue, format catalog, probe and session around
// yt-dlp and FFmpeg

pub mod errors;
pub mod ffmpeg;
pub mod formats;
pub mod models;
pub mod queue;
pub mod session;
pub mod traits;
pub mod utils;
pub mod ytdlp;

pub use errors::AppError;
pub use models::{DownloadProgress, QueueEntry, SessionOutcome, VideoInfo};
pub use queue::UrlQueue;
pub use traits::{CancelFlag, DownloaderBackend, ProgressEmitter};
pub use ytdlp::YtDlpBackend;
