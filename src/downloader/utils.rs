// Subprocess helpers shared by the probe and the FFmpeg liveness check

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

/// Run a command to completion with a hard timeout, capturing stdout and
/// stderr. The child is killed when the deadline passes.
pub async fn run_output_with_timeout(
    program: &std::path::Path,
    args: &[&str],
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program.display(), e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| format!("Failed to capture stdout from {}", program.display()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| format!("Failed to capture stderr from {}", program.display()))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stderr: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status =
                status_res.map_err(|e| format!("Failed to wait for {}: {}", program.display(), e))?;
            let stdout = stdout_task
                .await
                .map_err(|e| format!("stdout task failed: {}", e))??;
            let stderr = stderr_task
                .await
                .map_err(|e| format!("stderr task failed: {}", e))??;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(format!("Timed out after {}s", timeout_secs))
        }
    }
}

/// First non-empty line of a byte buffer, for version banners.
pub fn first_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}
