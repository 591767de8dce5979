// Error types for download attempts

use thiserror::Error;

use super::diagnostics::{diagnose_error, BlockingReason};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DownloadError {
    /// yt-dlp is not installed (or the auto-install attempt failed)
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Credential source for this strategy is missing
    #[error("authentication unavailable: {0}")]
    AuthUnavailable(String),

    /// URL shape not recognized by a URL-rewriting strategy
    #[error("cannot rewrite URL: {0}")]
    MalformedTarget(String),

    /// yt-dlp ran and exited non-zero
    #[error("yt-dlp exited with {}: {detail}", exit_label(.code))]
    ExtractionFailed { code: Option<i32>, detail: String },

    /// Process could not be started, waited on, or read from
    #[error("execution error: {0}")]
    Execution(String),

    /// A nested strategy chain (e.g. browser cookies) ran out of options
    #[error("all variants failed: {0}")]
    ChainExhausted(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "signal".to_string(),
    }
}

impl DownloadError {
    /// Skips never reached the external tool.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::AuthUnavailable(_) | Self::MalformedTarget(_))
    }

    /// Blocking reason inferred from yt-dlp's error text, when there is one.
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::ExtractionFailed { detail, .. } => diagnose_error(detail),
            Self::Execution(msg) => diagnose_error(msg),
            _ => None,
        }
    }

    /// Only transient failures are worth another attempt of the same strategy.
    pub fn is_retryable(&self) -> bool {
        self.blocking_reason()
            .map_or(false, |reason| reason.is_transient())
    }
}
