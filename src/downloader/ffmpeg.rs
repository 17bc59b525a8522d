// FFmpeg locator - resolve the transcoder directory and prove it runs
//
// Packaged builds ship ffmpeg inside the bundle's resource directory;
// everything else expects a fixed installation path. Both checks happen
// before a session starts: a missing or broken ffmpeg is session-fatal.

use std::path::{Path, PathBuf};

use super::errors::AppError;
use super::utils::{first_line, run_output_with_timeout};

#[cfg(windows)]
pub const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
pub const FFMPEG_BINARY: &str = "ffmpeg";

const VERSION_TIMEOUT_SECS: u64 = 10;

fn install_candidates() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![PathBuf::from("C:/ffmpeg/bin")]
    } else {
        vec![
            PathBuf::from("/opt/homebrew/bin"), // Homebrew on Apple Silicon
            PathBuf::from("/usr/local/bin"),    // Homebrew on Intel Mac
            PathBuf::from("/usr/bin"),          // System installation
        ]
    }
}

/// Resolve the directory holding the ffmpeg binary.
///
/// `bundled` is the app's resource directory when running from a packaged
/// bundle; a bundle without ffmpeg never falls back to the system paths.
pub fn locate(bundled: Option<&Path>) -> Result<PathBuf, AppError> {
    locate_in(bundled, &install_candidates())
}

fn locate_in(bundled: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf, AppError> {
    if let Some(dir) = bundled {
        let binary = dir.join(FFMPEG_BINARY);
        if binary.exists() {
            return Ok(dir.to_path_buf());
        }
        return Err(AppError::BinaryNotFound(binary));
    }

    for dir in candidates {
        if dir.join(FFMPEG_BINARY).exists() {
            return Ok(dir.clone());
        }
    }

    let expected = candidates
        .first()
        .map(|d| d.join(FFMPEG_BINARY))
        .unwrap_or_else(|| PathBuf::from(FFMPEG_BINARY));
    Err(AppError::BinaryNotFound(expected))
}

/// Execute `ffmpeg -version` in the located directory. A failing
/// invocation means the binary is present but unusable (wrong
/// architecture, broken install) and the session must not start.
pub async fn verify(dir: &Path) -> Result<(), AppError> {
    let binary = dir.join(FFMPEG_BINARY);
    let output = run_output_with_timeout(&binary, &["-version"], VERSION_TIMEOUT_SECS)
        .await
        .map_err(AppError::BinaryUnusable)?;

    if !output.status.success() {
        return Err(AppError::BinaryUnusable(first_line(&output.stderr)));
    }

    eprintln!("[FFmpeg] {}", first_line(&output.stdout));
    Ok(())
}
