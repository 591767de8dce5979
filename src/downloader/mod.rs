// Downloader module - strategy-chain sequencer around yt-dlp

pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod invocation;
pub mod models;
pub mod probe;
pub mod progress;
pub mod report;
pub mod retry;
pub mod runner;
pub mod sequencer;
pub mod strategies;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use invocation::{build_invocation, AuthSource, StrategyTraits, ToolSettings, UrlForm};
pub use models::{AttemptFailure, AttemptOutcome, DownloadSuccess, Quality, SessionResult, Target};
pub use report::ResultRecord;
pub use retry::RetryPolicy;
pub use runner::YtDlpRunner;
pub use sequencer::FallbackSequencer;
pub use strategies::{standard_chain, BrowserCookieStrategy, ToolStrategy};
pub use traits::{Invocation, Strategy, ToolReport, ToolRunner};
