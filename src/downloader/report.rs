// Result record written once at the end of a run

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Iso8601;
use time::OffsetDateTime;

use super::models::{Quality, SessionResult, Target};

pub const RESULT_FILE: &str = "download_result.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureEntry {
    pub method: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub success: bool,
    pub method: Option<String>,
    pub file_path: Option<String>,
    pub file_size_mb: Option<f64>,
    /// ISO-8601, UTC
    pub timestamp: String,
    pub video_url: String,
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureEntry>,
}

impl ResultRecord {
    pub fn from_session(target: &Target, result: &SessionResult) -> Self {
        Self::at(target, result, OffsetDateTime::now_utc())
    }

    pub fn at(target: &Target, result: &SessionResult, when: OffsetDateTime) -> Self {
        let timestamp = when
            .format(&Iso8601::DEFAULT)
            .unwrap_or_else(|_| when.unix_timestamp().to_string());

        let (success, method, file_path, file_size_mb) = match result {
            SessionResult::Succeeded(s) => (
                true,
                Some(s.method.clone()),
                s.file_path.as_ref().map(|p| p.display().to_string()),
                s.file_size_mb.map(round2),
            ),
            SessionResult::Exhausted(_) => (false, None, None, None),
        };

        Self {
            success,
            method,
            file_path,
            file_size_mb,
            timestamp,
            video_url: target.url.clone(),
            quality: target.quality,
            failures: result
                .failures()
                .iter()
                .map(|f| FailureEntry {
                    method: f.method.clone(),
                    reason: f.error.to_string(),
                })
                .collect(),
        }
    }

    /// Pretty JSON into `<dir>/download_result.json`
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(RESULT_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
