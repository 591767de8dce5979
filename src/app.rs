//! One download session: validate, locate yt-dlp, probe, run the chain, record.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::downloader::diagnostics::{collect_reasons, BlockingReason};
use crate::downloader::probe::{log_video_info, probe_video};
use crate::downloader::tools::ToolManager;
use crate::downloader::{
    standard_chain, AttemptFailure, ResultRecord, SessionResult, Target, YtDlpRunner,
};

pub async fn run(config: &AppConfig, target: &Target) -> Result<SessionResult> {
    config.validate().context("invalid configuration")?;

    let tool = ToolManager::new(config.ytdlp_path.clone(), config.python.clone())
        .ensure_available(config.auto_install)
        .await
        .context("yt-dlp is required")?;

    tracing::info!(url = %target.url, quality = %target.quality, subtitles = target.subtitles, "starting download");

    match probe_video(
        &tool.path,
        &target.url,
        config.proxy.as_deref(),
        config.probe_timeout_secs,
    )
    .await
    {
        Ok(info) => log_video_info(&info, target),
        Err(e) => tracing::warn!("could not fetch video info, continuing: {}", e),
    }

    let chain = standard_chain(
        config.tool_settings(tool.path),
        config.cookies_file.clone(),
        &config.browsers,
        Arc::new(YtDlpRunner::new()),
        config.retry.policy(),
    );
    tracing::debug!(strategies = ?chain.strategy_names(), "strategy chain ready");

    let result = chain.run(target).await;

    match ResultRecord::from_session(target, &result).write_to(&config.output_dir) {
        Ok(path) => tracing::info!(path = %path.display(), "result record written"),
        Err(e) => tracing::warn!("could not write result record: {}", e),
    }

    log_summary(&result, &config.cookies_file);
    Ok(result)
}

fn log_summary(result: &SessionResult, cookies_file: &Path) {
    match result {
        SessionResult::Succeeded(success) => {
            let path = success
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            match success.file_size_mb {
                Some(mb) => tracing::info!(method = %success.method, path = %path, "download complete ({:.2} MB)", mb),
                None => tracing::info!(method = %success.method, path = %path, "download complete"),
            }
        }
        SessionResult::Exhausted(failures) => {
            tracing::error!("all {} strategies failed", failures.len());
            for failure in failures {
                tracing::error!(method = %failure.method, "{}", failure.error);
            }
            for line in remediation(failures, cookies_file) {
                tracing::warn!("{}", line);
            }
        }
    }
}

/// Advice for an exhausted run: what the failure texts point at, then the
/// generic steps. Permanent blocks get no generic steps.
pub fn remediation(failures: &[AttemptFailure], cookies_file: &Path) -> Vec<String> {
    let texts: Vec<String> = failures
        .iter()
        .filter(|f| !f.error.is_skip())
        .map(|f| f.error.to_string())
        .collect();

    let mut reasons = collect_reasons(texts.iter().map(String::as_str));
    if reasons.len() > 1 {
        reasons.retain(|r| *r != BlockingReason::Unknown);
    }

    let mut lines: Vec<String> = reasons
        .iter()
        .map(|r| format!("{}: {}", r.description(), r.suggestion()))
        .collect();

    if reasons.iter().any(BlockingReason::is_permanent) {
        lines.push("no download method can get around this; retrying will not help".to_string());
        return lines;
    }

    lines.push("wait a few minutes and retry, or switch network".to_string());
    lines.push("close browser windows so their cookie databases are readable".to_string());

    let cookies_help = reasons.is_empty()
        || reasons
            .iter()
            .any(|r| r.cookies_might_help() || *r == BlockingReason::Unknown);
    if cookies_help {
        lines.push(format!(
            "export cookies from a logged-in browser to {}",
            cookies_file.display()
        ));
    }
    lines
}
