mod downloader;
mod state;

use tauri::{Emitter, Manager, State};
use tauri_plugin_opener::OpenerExt;

use downloader::formats::{self, FormatPreset};
use downloader::queue::validate_new_url;
use downloader::session::{self, SessionConfig};
use downloader::{ffmpeg, AppError, DownloaderBackend, ProgressEmitter, QueueEntry, SessionOutcome};
use state::AppState;

/// Resolve metadata for a URL and append it to the queue.
/// Returns the updated queue snapshot.
#[tauri::command]
async fn add_url(url: String, state: State<'_, AppState>) -> Result<Vec<QueueEntry>, String> {
    let url = {
        let queue = state.queue.lock().unwrap();
        validate_new_url(&queue, &url).map_err(|e| e.to_string())?
    };

    // Metadata-only probe; failures keep the URL out of the queue
    let info = state.backend.probe(&url).await.map_err(|e| e.to_string())?;

    let mut queue = state.queue.lock().unwrap();
    queue
        .add(QueueEntry::new(url, info.title))
        .map_err(|e| e.to_string())?;
    Ok(queue.snapshot())
}

#[tauri::command]
fn remove_url(url: String, state: State<'_, AppState>) -> Vec<QueueEntry> {
    let mut queue = state.queue.lock().unwrap();
    queue.remove(&url);
    queue.snapshot()
}

#[tauri::command]
fn list_queue(state: State<'_, AppState>) -> Vec<QueueEntry> {
    state.queue.lock().unwrap().snapshot()
}

#[tauri::command]
fn format_presets() -> Vec<FormatPreset> {
    formats::catalog().to_vec()
}

#[tauri::command]
fn download_folder(state: State<'_, AppState>) -> String {
    state.download_dir().to_string_lossy().to_string()
}

#[tauri::command]
fn set_download_folder(path: String, state: State<'_, AppState>) -> Result<String, String> {
    let dir = std::path::PathBuf::from(path);
    if !dir.is_dir() {
        return Err(format!("Not a folder: {}", dir.display()));
    }
    state.set_download_dir(dir.clone());
    Ok(dir.to_string_lossy().to_string())
}

/// Validate the transcoder, then drain the queue through yt-dlp.
/// Progress arrives on the `download-progress` event channel; the queue
/// is cleared once every entry has been attempted.
#[tauri::command]
async fn start_session(
    preset: String,
    state: State<'_, AppState>,
    app: tauri::AppHandle,
) -> Result<Vec<SessionOutcome>, String> {
    let preset = *formats::find(&preset).ok_or_else(|| format!("Unknown preset: {}", preset))?;
    if state.queue.lock().unwrap().is_empty() {
        return Err("Please add URLs first".to_string());
    }
    if !state.try_begin_session() {
        return Err(AppError::SessionBusy.to_string());
    }
    state.cancel.reset();

    let result = run_session(preset, &state, &app).await;
    state.end_session();
    result.map_err(|e| e.to_string())
}

async fn run_session(
    preset: FormatPreset,
    state: &AppState,
    app: &tauri::AppHandle,
) -> Result<Vec<SessionOutcome>, AppError> {
    // Packaged bundles carry ffmpeg in their resource directory;
    // dev builds expect a system install
    let bundled = if cfg!(debug_assertions) {
        None
    } else {
        app.path().resource_dir().ok()
    };
    let ffmpeg_location = ffmpeg::locate(bundled.as_deref())?;
    ffmpeg::verify(&ffmpeg_location).await?;

    let config = SessionConfig {
        preset,
        destination: state.download_dir(),
        ffmpeg_location,
    };
    let emitter = {
        let app = app.clone();
        ProgressEmitter::new(move |progress| {
            let _ = app.emit("download-progress", &progress);
        })
    };

    Ok(session::run(&state.backend, &state.queue, &config, &emitter, &state.cancel).await)
}

#[tauri::command]
fn cancel_session(state: State<'_, AppState>) {
    state.cancel.cancel();
}

#[tauri::command]
fn open_download_folder(state: State<'_, AppState>, app: tauri::AppHandle) -> Result<(), String> {
    let dir = state.download_dir();
    app.opener()
        .open_path(dir.to_string_lossy().to_string(), None::<&str>)
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new())
        .invoke_handler(tauri::generate_handler![
            add_url,
            remove_url,
            list_queue,
            format_presets,
            download_folder,
            set_download_folder,
            start_session,
            cancel_session,
            open_download_folder,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
