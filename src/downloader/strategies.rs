// Concrete download strategies and the standard chain

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::invocation::{build_invocation, StrategyTraits, ToolSettings};
use super::models::{AttemptOutcome, DownloadSuccess, SessionResult, Target};
use super::retry::RetryPolicy;
use super::sequencer::FallbackSequencer;
use super::traits::{Strategy, ToolReport, ToolRunner};
use super::utils::{file_size_mb, find_latest_media};

pub const COOKIES_FILE: &str = "cookies-file";
pub const BROWSER_COOKIES: &str = "browser-cookies";
pub const ANDROID_CLIENT: &str = "android-client";
pub const IOS_CLIENT: &str = "ios-client";
pub const EMBED_URL: &str = "embed-url";

/// A strategy that is nothing more than a set of traits applied to the shared
/// invocation, run once through the tool runner.
pub struct ToolStrategy {
    name: String,
    traits: StrategyTraits,
    settings: Arc<ToolSettings>,
    runner: Arc<dyn ToolRunner>,
}

impl ToolStrategy {
    pub fn new(
        name: impl Into<String>,
        traits: StrategyTraits,
        settings: Arc<ToolSettings>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            traits,
            settings,
            runner,
        }
    }

    fn into_outcome(&self, report: ToolReport) -> AttemptOutcome {
        if !report.success {
            return AttemptOutcome::failure(
                &self.name,
                DownloadError::ExtractionFailed {
                    code: report.exit_code,
                    detail: report
                        .error_tail
                        .unwrap_or_else(|| "no error output".to_string()),
                },
            );
        }

        if !report.completed {
            tracing::debug!(method = %self.name, "exit 0 without a completion marker");
        }

        let file_path = self.resolve_output(report.output_file);
        let file_size_mb = file_path.as_deref().and_then(file_size_mb);

        match (&file_path, file_size_mb) {
            (Some(path), Some(size)) => {
                tracing::info!(method = %self.name, path = %path.display(), "file size {:.2} MB", size)
            }
            (None, _) => tracing::warn!(method = %self.name, "downloaded file could not be located"),
            _ => {}
        }

        AttemptOutcome::Success(DownloadSuccess {
            method: self.name.clone(),
            file_path,
            file_size_mb,
        })
    }

    /// Announced file if it exists, else the newest mp4 in the output directory
    fn resolve_output(&self, announced: Option<PathBuf>) -> Option<PathBuf> {
        announced
            .filter(|p| p.is_file())
            .or_else(|| find_latest_media(&self.settings.output_dir, "mp4"))
    }
}

#[async_trait]
impl Strategy for ToolStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, target: &Target) -> AttemptOutcome {
        let invocation = match build_invocation(target, &self.traits, &self.settings) {
            Ok(inv) => inv,
            Err(e) => return AttemptOutcome::failure(&self.name, e),
        };

        if invocation.url != target.url {
            tracing::info!(method = %self.name, url = %invocation.url, "using rewritten URL");
        }

        match self.runner.execute(&invocation, &self.name).await {
            Ok(report) => self.into_outcome(report),
            Err(e) => AttemptOutcome::failure(&self.name, e),
        }
    }
}

/// Browser cookies, tried browser by browser through a nested sequencer
pub struct BrowserCookieStrategy {
    chain: FallbackSequencer,
}

impl BrowserCookieStrategy {
    pub fn new(
        browsers: &[String],
        settings: Arc<ToolSettings>,
        runner: Arc<dyn ToolRunner>,
        retry: RetryPolicy,
    ) -> Self {
        let mut chain = FallbackSequencer::new()
            .with_label(BROWSER_COOKIES)
            .with_retry(retry);
        for browser in browsers {
            chain.add_strategy(Box::new(ToolStrategy::new(
                format!("{} ({})", BROWSER_COOKIES, browser),
                StrategyTraits::browser(browser.as_str()),
                settings.clone(),
                runner.clone(),
            )));
        }
        Self { chain }
    }

    /// Same nesting with arbitrary inner strategies
    pub fn from_chain(chain: FallbackSequencer) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Strategy for BrowserCookieStrategy {
    fn name(&self) -> &str {
        BROWSER_COOKIES
    }

    async fn attempt(&self, target: &Target) -> AttemptOutcome {
        match self.chain.run(target).await {
            SessionResult::Succeeded(success) => AttemptOutcome::Success(success),
            SessionResult::Exhausted(failures) if failures.is_empty() => AttemptOutcome::failure(
                BROWSER_COOKIES,
                DownloadError::AuthUnavailable("no browsers configured".to_string()),
            ),
            SessionResult::Exhausted(failures) => {
                let summary = failures
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                AttemptOutcome::failure(BROWSER_COOKIES, DownloadError::ChainExhausted(summary))
            }
        }
    }
}

/// The standard five-step chain:
/// cookie file, browser cookies, android client, ios client, embed URL.
pub fn standard_chain(
    settings: ToolSettings,
    cookies_file: PathBuf,
    browsers: &[String],
    runner: Arc<dyn ToolRunner>,
    retry: RetryPolicy,
) -> FallbackSequencer {
    let settings = Arc::new(settings);
    let tool = |name: &str, traits: StrategyTraits| -> Box<dyn Strategy> {
        Box::new(ToolStrategy::new(name, traits, settings.clone(), runner.clone()))
    };

    let mut chain = FallbackSequencer::new().with_retry(retry);
    chain.add_strategy(tool(COOKIES_FILE, StrategyTraits::cookie_file(cookies_file)));
    chain.add_strategy(Box::new(BrowserCookieStrategy::new(
        browsers,
        settings.clone(),
        runner.clone(),
        retry,
    )));
    chain.add_strategy(tool(ANDROID_CLIENT, StrategyTraits::player_client("android")));
    chain.add_strategy(tool(IOS_CLIENT, StrategyTraits::player_client("ios")));
    chain.add_strategy(tool(EMBED_URL, StrategyTraits::embed()));
    chain
}
