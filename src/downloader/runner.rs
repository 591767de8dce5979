// yt-dlp process runner with live progress streaming

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use super::errors::DownloadError;
use super::progress::ProgressObserver;
use super::traits::{Invocation, ToolReport, ToolRunner};
use super::utils::spawn_error;

/// Spawns yt-dlp, feeds stdout to a fresh `ProgressObserver`, and keeps the
/// stderr tail for the failure description.
#[derive(Debug, Default, Clone, Copy)]
pub struct YtDlpRunner;

impl YtDlpRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for YtDlpRunner {
    async fn execute(
        &self,
        invocation: &Invocation,
        method: &str,
    ) -> Result<ToolReport, DownloadError> {
        tracing::debug!(method, command = %invocation.summary(), "starting yt-dlp");

        let mut child = TokioCommand::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&invocation.program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Execution("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Execution("failed to capture stderr".to_string()))?;

        // Collect stderr in the background so a chatty tool never blocks on a full pipe
        let stderr_method = method.to_string();
        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut last = None;
            loop {
                match read_lossy_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::debug!(method = %stderr_method, "yt-dlp: {}", trimmed);
                        last = Some(trimmed.to_string());
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(
                            method = %stderr_method,
                            error = %e,
                            "stopped reading yt-dlp stderr"
                        );
                        break;
                    }
                }
            }
            last
        });

        let mut observer = ProgressObserver::new(method);
        {
            // Dropped before waiting so an unread pipe can never block the child
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                match read_lossy_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) => {
                        tracing::trace!(method, "{}", line);
                        observer.observe(&line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(method, error = %e, "stopped reading yt-dlp output");
                        break;
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|e| {
            DownloadError::Execution(format!("failed to wait for yt-dlp: {}", e))
        })?;
        let error_tail = stderr_task.await.unwrap_or_default();

        Ok(ToolReport {
            success: status.success(),
            exit_code: status.code(),
            output_file: observer.output_file().cloned(),
            completed: observer.completed(),
            error_tail,
        })
    }
}

/// Next line with invalid UTF-8 replaced; `None` at end of stream.
/// yt-dlp echoes titles in the console code page, which is not always UTF-8.
async fn read_lossy_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
