// Common data models for the download session

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;

/// Quality ceiling requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    #[serde(rename = "1080")]
    P1080,
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "480")]
    P480,
    Best,
}

impl Quality {
    /// Height ceiling in pixels; `None` for `best`
    pub fn max_height(&self) -> Option<u32> {
        match self {
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::Best => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_height() {
            Some(h) => write!(f, "{}", h),
            None => write!(f, "best"),
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().trim_end_matches('p') {
            "1080" => Ok(Self::P1080),
            "720" => Ok(Self::P720),
            "480" => Ok(Self::P480),
            "best" => Ok(Self::Best),
            other => Err(format!(
                "unsupported quality '{}' (expected 1080, 720, 480 or best)",
                other
            )),
        }
    }
}

/// What to fetch. Built once from CLI input and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub quality: Quality,
    pub subtitles: bool,
}

impl Target {
    pub fn new(url: impl Into<String>, quality: Quality, subtitles: bool) -> Self {
        Self {
            url: url.into().trim().to_string(),
            quality,
            subtitles,
        }
    }
}

/// Successful attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSuccess {
    pub method: String,
    pub file_path: Option<PathBuf>,
    pub file_size_mb: Option<f64>,
}

/// Failed attempt, kept for the exhaustion summary
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub method: String,
    pub error: DownloadError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.error)
    }
}

/// Outcome of running one strategy once
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(DownloadSuccess),
    Failure(AttemptFailure),
}

impl AttemptOutcome {
    pub fn failure(method: impl Into<String>, error: DownloadError) -> Self {
        Self::Failure(AttemptFailure {
            method: method.into(),
            error,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Final result of a sequencer run
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResult {
    /// First strategy that worked
    Succeeded(DownloadSuccess),
    /// Every strategy failed; one entry per strategy, in chain order
    Exhausted(Vec<AttemptFailure>),
}

impl SessionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            Self::Succeeded(_) => &[],
            Self::Exhausted(failures) => failures,
        }
    }
}

/// Metadata from the pre-flight `--dump-json` probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Seconds; yt-dlp reports this as a float for some extractors
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<ProbeFormat>,
}

/// One entry of the probe's `formats` array; only what format checks need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
}

impl VideoInfo {
    pub fn duration_secs(&self) -> u64 {
        self.duration.map_or(0, |d| d.max(0.0) as u64)
    }

    /// `m:ss` or `h:mm:ss`
    pub fn duration_label(&self) -> String {
        let total = self.duration_secs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{}:{:02}", m, s)
        }
    }

    pub fn is_long(&self) -> bool {
        self.duration_secs() > 3600
    }
}
