// Pre-flight metadata probe (`yt-dlp --dump-json`)
//
// Informational only: a failed probe is logged and the chain runs anyway.

use std::path::Path;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::models::{Target, VideoInfo};
use super::utils::run_output_with_timeout;

pub async fn probe_video(
    program: &Path,
    url: &str,
    proxy: Option<&str>,
    timeout_secs: u64,
) -> Result<VideoInfo, DownloadError> {
    let mut args = vec![
        "--dump-json".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
    ];
    if let Some(p) = proxy {
        args.push("--proxy".to_string());
        args.push(p.to_string());
    }
    args.push(url.to_string());

    let output = run_output_with_timeout(program, &args, timeout_secs).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("probe failed")
            .trim()
            .to_string();
        return Err(DownloadError::ExtractionFailed {
            code: output.status.code(),
            detail,
        });
    }

    parse_video_info(&output.stdout)
}

pub fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, DownloadError> {
    // --dump-json prints one object per line; the first one is the video
    let text = String::from_utf8_lossy(stdout);
    let first = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| DownloadError::Execution("empty probe output".to_string()))?;

    serde_json::from_str(first)
        .map_err(|e| DownloadError::Execution(format!("invalid probe JSON: {}", e)))
}

/// Log what the probe learned about the target
pub fn log_video_info(info: &VideoInfo, target: &Target) {
    tracing::info!(
        id = %info.id,
        uploader = info.uploader.as_deref().unwrap_or("unknown"),
        "title: {} ({})",
        info.title,
        info.duration_label()
    );

    if info.is_long() {
        tracing::warn!(
            minutes = info.duration_secs() / 60,
            "long video, the download may take a while"
        );
    }

    if let Some(available) = FormatSelector::falls_short(target.quality, &info.formats) {
        tracing::info!(
            requested = %target.quality,
            available,
            "requested quality not offered, yt-dlp will pick the best below it"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dump_json_line() {
        let stdout = br#"
{"id": "jKr9Omaf3Gs", "title": "Market talk", "uploader": "Chan", "duration": 5400, "formats": [{"format_id": "137", "ext": "mp4", "height": 1080, "vcodec": "avc1.640028"}, {"format_id": "140", "ext": "m4a", "height": null, "vcodec": "none"}], "webpage_url": "https://www.youtube.com/watch?v=jKr9Omaf3Gs"}
"#;
        let info = parse_video_info(stdout).unwrap();
        assert_eq!(info.id, "jKr9Omaf3Gs");
        assert_eq!(info.title, "Market talk");
        assert_eq!(info.duration_label(), "1:30:00");
        assert!(info.is_long());
        assert_eq!(info.formats.len(), 2);
        assert_eq!(FormatSelector::best_available_height(&info.formats), Some(1080));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_video_info(b"not json"),
            Err(DownloadError::Execution(_))
        ));
        assert!(matches!(parse_video_info(b"\n\n"), Err(DownloadError::Execution(_))));
    }
}
