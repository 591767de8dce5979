// yt-dlp discovery and one-time auto-install

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::DownloadError;
use super::utils::run_output_with_timeout;

const BINARY_NAME: &str = "yt-dlp";
const INSTALL_TIMEOUT_SECS: u64 = 300;
const VERSION_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolInfo {
    pub path: PathBuf,
    pub version: Option<String>,
}

pub struct ToolManager {
    configured: Option<PathBuf>,
    python: String,
}

impl ToolManager {
    pub fn new(configured: Option<PathBuf>, python: impl Into<String>) -> Self {
        Self {
            configured,
            python: python.into(),
        }
    }

    /// Locate yt-dlp: configured path, common install locations, then PATH
    pub async fn detect(&self) -> Option<ToolInfo> {
        if let Some(path) = &self.configured {
            // An explicit path is authoritative; do not silently pick another binary
            return self.probe(path).await;
        }

        let common_paths = [
            PathBuf::from(format!("/opt/homebrew/bin/{}", BINARY_NAME)),
            PathBuf::from(format!("/usr/local/bin/{}", BINARY_NAME)),
            PathBuf::from(format!("/usr/bin/{}", BINARY_NAME)),
        ];

        let user_bin = dirs::home_dir().map(|h| h.join(".local/bin").join(BINARY_NAME));

        for path in common_paths.iter().chain(user_bin.iter()) {
            if path.exists() {
                if let Some(info) = self.probe(path).await {
                    return Some(info);
                }
            }
        }

        // Bare name, resolved through PATH by the OS
        self.probe(Path::new(BINARY_NAME)).await
    }

    async fn probe(&self, path: &Path) -> Option<ToolInfo> {
        let args = ["--version".to_string()];
        match run_output_with_timeout(path, &args, VERSION_TIMEOUT_SECS).await {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Some(ToolInfo {
                    path: path.to_path_buf(),
                    version: (!version.is_empty()).then_some(version),
                })
            }
            Ok(output) => {
                tracing::debug!(path = %path.display(), status = %output.status, "yt-dlp --version failed");
                None
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "yt-dlp not runnable");
                None
            }
        }
    }

    /// Detect yt-dlp, installing it through pip once if it is missing
    pub async fn ensure_available(&self, auto_install: bool) -> Result<ToolInfo, DownloadError> {
        if let Some(info) = self.detect().await {
            tracing::info!(
                path = %info.path.display(),
                version = info.version.as_deref().unwrap_or("unknown"),
                "yt-dlp found"
            );
            return Ok(info);
        }

        tracing::warn!("yt-dlp is not installed");

        if !auto_install {
            return Err(DownloadError::ToolNotFound(
                "yt-dlp not found and auto-install is disabled".to_string(),
            ));
        }
        if self.configured.is_some() {
            return Err(DownloadError::ToolNotFound(
                "configured yt-dlp path is not runnable".to_string(),
            ));
        }

        self.install().await?;

        self.detect().await.ok_or_else(|| {
            DownloadError::ToolNotFound(
                "yt-dlp still not found after install; make sure pip's bin directory is on PATH"
                    .to_string(),
            )
        })
    }

    async fn install(&self) -> Result<(), DownloadError> {
        tracing::info!(python = %self.python, "installing yt-dlp via pip");

        let args: Vec<String> = ["-m", "pip", "install", "--upgrade", BINARY_NAME]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let output =
            run_output_with_timeout(Path::new(&self.python), &args, INSTALL_TIMEOUT_SECS).await?;

        if output.status.success() {
            tracing::info!("yt-dlp installed");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("pip failed")
                .trim()
                .to_string();
            Err(DownloadError::ToolNotFound(format!("install failed: {}", last)))
        }
    }
}

/// Interpreter used for the pip install; `YTDLP_PYTHON` overrides the default
pub fn default_python() -> String {
    std::env::var("YTDLP_PYTHON").unwrap_or_else(|_| "python3".to_string())
}
