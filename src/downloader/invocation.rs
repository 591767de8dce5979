// Invocation builder - one place that assembles yt-dlp arguments
//
// Strategies only declare how they differ (auth source, player client, URL
// form); everything else is shared.

use std::path::PathBuf;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::models::Target;
use super::traits::Invocation;
use super::utils::embed_url;

/// Output template inside the output directory
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Credential source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSource {
    None,
    CookieFile(PathBuf),
    Browser(String),
}

/// URL handed to the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlForm {
    Original,
    Embed,
}

/// The per-strategy diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTraits {
    pub auth: AuthSource,
    pub player_client: Option<String>,
    pub url_form: UrlForm,
}

impl StrategyTraits {
    pub fn cookie_file(path: PathBuf) -> Self {
        Self {
            auth: AuthSource::CookieFile(path),
            player_client: None,
            url_form: UrlForm::Original,
        }
    }

    pub fn browser(name: impl Into<String>) -> Self {
        Self {
            auth: AuthSource::Browser(name.into()),
            player_client: None,
            url_form: UrlForm::Original,
        }
    }

    pub fn player_client(client: impl Into<String>) -> Self {
        Self {
            auth: AuthSource::None,
            player_client: Some(client.into()),
            url_form: UrlForm::Original,
        }
    }

    pub fn embed() -> Self {
        Self {
            auth: AuthSource::None,
            player_client: None,
            url_form: UrlForm::Embed,
        }
    }
}

/// Settings shared by every strategy, resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub program: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg_path: Option<PathBuf>,
    pub subtitle_langs: Vec<String>,
    pub proxy: Option<String>,
    pub socket_timeout_secs: Option<u32>,
}

impl ToolSettings {
    pub fn new(program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
            ffmpeg_path: None,
            subtitle_langs: vec!["zh-Hans".to_string(), "en".to_string()],
            proxy: None,
            socket_timeout_secs: None,
        }
    }
}

/// Build the command line for a target under one strategy's traits.
///
/// Fails without touching the filesystem beyond a cookie-file existence check:
/// a missing cookie file is `AuthUnavailable`, an unrewritable URL is
/// `MalformedTarget`.
pub fn build_invocation(
    target: &Target,
    traits: &StrategyTraits,
    settings: &ToolSettings,
) -> Result<Invocation, DownloadError> {
    let url = match traits.url_form {
        UrlForm::Original => target.url.clone(),
        UrlForm::Embed => embed_url(&target.url)
            .ok_or_else(|| DownloadError::MalformedTarget(target.url.clone()))?,
    };

    let mut args = Vec::new();

    match &traits.auth {
        AuthSource::None => {}
        AuthSource::CookieFile(path) => {
            if !path.is_file() {
                return Err(DownloadError::AuthUnavailable(format!(
                    "cookie file not found: {}",
                    path.display()
                )));
            }
            args.push("--cookies".to_string());
            args.push(path.display().to_string());
        }
        AuthSource::Browser(name) => {
            args.push("--cookies-from-browser".to_string());
            args.push(name.clone());
        }
    }

    if let Some(client) = &traits.player_client {
        args.push("--extractor-args".to_string());
        args.push(format!("youtube:player_client={}", client));
    }

    args.push("--format".to_string());
    args.push(FormatSelector::format_spec(target.quality));
    args.push("--output".to_string());
    args.push(settings.output_dir.join(OUTPUT_TEMPLATE).display().to_string());
    args.push("--merge-output-format".to_string());
    args.push("mp4".to_string());

    if let Some(ffmpeg) = &settings.ffmpeg_path {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.display().to_string());
    }

    if target.subtitles {
        args.extend(FormatSelector::subtitle_args(&settings.subtitle_langs));
    }

    if let Some(proxy) = &settings.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    if let Some(timeout) = settings.socket_timeout_secs {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }

    args.extend(
        ["--no-playlist", "--progress", "--newline"]
            .iter()
            .map(|s| s.to_string()),
    );
    args.push(url.clone());

    Ok(Invocation {
        program: settings.program.clone(),
        args,
        url,
    })
}
