use std::path::PathBuf;

use clap::Parser;

use crate::config::Overrides;
use crate::downloader::Quality;

/// Download a single YouTube video, falling back through several
/// authentication and client strategies until one works.
#[derive(Debug, Parser)]
#[command(name = "ytfetch", version)]
#[command(about = "Resilient single-video downloader built on yt-dlp", long_about = None)]
pub struct Cli {
    /// Video URL (watch?v=, youtu.be/, shorts, ...).
    pub url: String,

    /// Maximum video height: 1080, 720, 480 or best.
    #[arg(short, long, default_value_t = Quality::P1080)]
    pub quality: Quality,

    /// Download and embed subtitles.
    #[arg(short, long)]
    pub subtitles: bool,

    /// Config file (default: <config dir>/ytfetch/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Netscape-format cookie file.
    #[arg(long, value_name = "PATH")]
    pub cookies: Option<PathBuf>,

    /// yt-dlp binary to use instead of auto-detection.
    #[arg(long, value_name = "PATH")]
    pub ytdlp: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Also append logs to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Never try to pip-install yt-dlp.
    #[arg(long)]
    pub no_auto_install: bool,

    /// Debug-level logging for ytfetch.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            output_dir: self.output_dir.clone(),
            cookies_file: self.cookies.clone(),
            ytdlp_path: self.ytdlp.clone(),
            ffmpeg_path: self.ffmpeg.clone(),
            proxy: self.proxy.clone(),
            log_file: self.log_file.clone(),
            no_auto_install: self.no_auto_install,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["ytfetch", "https://youtu.be/abc"]).unwrap();
        assert_eq!(cli.url, "https://youtu.be/abc");
        assert_eq!(cli.quality, Quality::P1080);
        assert!(!cli.subtitles);
        assert!(!cli.overrides().no_auto_install);
    }

    #[test]
    fn parses_quality_and_overrides() {
        let cli = Cli::try_parse_from([
            "ytfetch",
            "--quality",
            "720",
            "--subtitles",
            "--cookies",
            "/tmp/c.txt",
            "--no-auto-install",
            "https://www.youtube.com/watch?v=abc",
        ])
        .unwrap();
        assert_eq!(cli.quality, Quality::P720);
        assert!(cli.subtitles);

        let o = cli.overrides();
        assert_eq!(o.cookies_file, Some(PathBuf::from("/tmp/c.txt")));
        assert!(o.no_auto_install);
    }

    #[test]
    fn rejects_unknown_quality() {
        assert!(Cli::try_parse_from(["ytfetch", "-q", "4k", "https://youtu.be/abc"]).is_err());
    }
}
