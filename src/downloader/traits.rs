// Seams of the sequencer: strategies and the external tool

use std::path::PathBuf;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{AttemptOutcome, Target};

/// One fallback variant. Stateless; the same instance may run many targets.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Method name (for logging and the result record)
    fn name(&self) -> &str;

    /// Run once against the target
    async fn attempt(&self, target: &Target) -> AttemptOutcome;
}

/// Fully assembled yt-dlp command line
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// URL actually passed to the tool (may be rewritten by the strategy)
    pub url: String,
}

impl Invocation {
    /// Short form for logs; cookie paths and URLs stay, nothing secret is in argv
    pub fn summary(&self) -> String {
        format!("{} {}", self.program.display(), self.args.join(" "))
    }
}

/// What the tool run reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolReport {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Final file as announced on stdout
    pub output_file: Option<PathBuf>,
    pub completed: bool,
    /// Last non-empty stderr line, used as the failure detail
    pub error_tail: Option<String>,
}

/// Black-box runner for the external tool
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn execute(&self, invocation: &Invocation, method: &str)
        -> Result<ToolReport, DownloadError>;
}
