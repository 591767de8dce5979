//! Configuration: built-in defaults, then `config.toml`, then CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::downloader::{RetryPolicy, ToolSettings};

pub const APP_DIR: &str = "ytfetch";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Retry policy parameters (optional `[retry]` section).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Attempts per strategy, including the first.
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_secs: 2.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Settings loaded from `~/.config/ytfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Where media and `download_result.json` are written.
    pub output_dir: PathBuf,
    /// Netscape-format cookie file for the first strategy.
    pub cookies_file: PathBuf,
    /// Explicit yt-dlp binary; auto-detected when unset.
    pub ytdlp_path: Option<PathBuf>,
    /// Interpreter used for the one-time pip install.
    pub python: String,
    pub ffmpeg_path: Option<PathBuf>,
    /// Browser order for the browser-cookie strategy.
    pub browsers: Vec<String>,
    pub subtitle_langs: Vec<String>,
    pub proxy: Option<String>,
    pub socket_timeout_secs: Option<u32>,
    pub probe_timeout_secs: u64,
    pub auto_install: bool,
    pub log_file: Option<PathBuf>,
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: dirs::download_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("downloads")),
            cookies_file: app_config_dir().join("cookies.txt"),
            ytdlp_path: None,
            python: crate::downloader::tools::default_python(),
            ffmpeg_path: None,
            browsers: ["chrome", "edge", "firefox", "brave"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            subtitle_langs: vec!["zh-Hans".to_string(), "en".to_string()],
            proxy: None,
            socket_timeout_secs: None,
            probe_timeout_secs: 30,
            auto_install: true,
            log_file: None,
            retry: RetryConfig::default(),
        }
    }
}

/// `<config_dir>/ytfetch`, or `./.ytfetch` when the platform has no config dir
pub fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".ytfetch"))
}

pub fn default_config_path() -> PathBuf {
    app_config_dir().join(CONFIG_FILE)
}

/// Values given on the command line win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub cookies_file: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub proxy: Option<String>,
    pub log_file: Option<PathBuf>,
    pub no_auto_install: bool,
}

impl AppConfig {
    /// Load from an explicit path (must exist) or the default path (optional).
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.cookies_file {
            self.cookies_file = v;
        }
        if let Some(v) = overrides.ytdlp_path {
            self.ytdlp_path = Some(v);
        }
        if let Some(v) = overrides.ffmpeg_path {
            self.ffmpeg_path = Some(v);
        }
        if let Some(v) = overrides.proxy {
            self.proxy = Some(v);
        }
        if let Some(v) = overrides.log_file {
            self.log_file = Some(v);
        }
        if overrides.no_auto_install {
            self.auto_install = false;
        }
    }

    /// Startup checks. Creates the output directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "output_dir is not a directory: {}",
                self.output_dir.display()
            )));
        }

        if let Some(path) = &self.ytdlp_path {
            if !path.exists() {
                return Err(ConfigError::Invalid(format!(
                    "ytdlp_path does not exist: {}",
                    path.display()
                )));
            }
        }

        if let Some(path) = &self.ffmpeg_path {
            if !path.exists() {
                return Err(ConfigError::Invalid(format!(
                    "ffmpeg_path does not exist: {}",
                    path.display()
                )));
            }
        }

        check_list("browsers", &self.browsers)?;
        check_list("subtitle_langs", &self.subtitle_langs)?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.base_delay_secs.is_finite() || self.retry.base_delay_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "retry.base_delay_secs must be a non-negative number".to_string(),
            ));
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_secs must be positive".to_string(),
            ));
        }

        if !self.cookies_file.is_file() {
            tracing::warn!(
                path = %self.cookies_file.display(),
                "cookie file not found; the cookies-file strategy will be skipped"
            );
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Shared tool settings once the binary is known
    pub fn tool_settings(&self, program: PathBuf) -> ToolSettings {
        ToolSettings {
            program,
            output_dir: self.output_dir.clone(),
            ffmpeg_path: self.ffmpeg_path.clone(),
            subtitle_langs: self.subtitle_langs.clone(),
            proxy: self.proxy.clone(),
            socket_timeout_secs: self.socket_timeout_secs,
        }
    }
}

fn check_list(key: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{} contains a blank entry", key)));
    }
    Ok(())
}
