// Progress observer for yt-dlp `--newline` output
//
// Lines that match nothing are ignored; yt-dlp interleaves plenty of
// informational chatter with the progress lines.

use std::path::PathBuf;

use regex::Regex;

/// Minimum advance, in percentage points, between two logged progress events
pub const PROGRESS_STEP: f32 = 5.0;

/// One recognized line of yt-dlp output
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// `[download]  42.0% of ~ 310.04MiB at 374.36KiB/s ETA 11:59`
    Percent(f32),
    /// `[download] Destination: /path/file.f137.mp4`
    Destination(PathBuf),
    /// `[Merger] Merging formats into "/path/file.mp4"`
    Merging(PathBuf),
    /// `[download] /path/file.mp4 has already been downloaded`
    AlreadyDownloaded(PathBuf),
}

lazy_static::lazy_static! {
    static ref PERCENT_RE: Regex =
        Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").unwrap();
    static ref DEST_RE: Regex = Regex::new(r"^\[download\]\s+Destination:\s+(.+)$").unwrap();
    static ref MERGE_RE: Regex =
        Regex::new(r#"^\[Merger\]\s+Merging formats into\s+"(.+)"$"#).unwrap();
    static ref ALREADY_RE: Regex =
        Regex::new(r"^\[download\]\s+(.+?)\s+has already been downloaded").unwrap();
}

/// Parse a single output line
pub fn parse_line(line: &str) -> Option<ProgressLine> {
    let line = line.trim();

    if let Some(caps) = PERCENT_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        return Some(ProgressLine::Percent(percent));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        return Some(ProgressLine::Destination(PathBuf::from(caps.get(1)?.as_str().trim())));
    }

    if let Some(caps) = MERGE_RE.captures(line) {
        return Some(ProgressLine::Merging(PathBuf::from(caps.get(1)?.as_str())));
    }

    if let Some(caps) = ALREADY_RE.captures(line) {
        return Some(ProgressLine::AlreadyDownloaded(PathBuf::from(caps.get(1)?.as_str())));
    }

    None
}

/// Per-attempt progress state. Create a fresh one for every tool invocation.
#[derive(Debug, Default)]
pub struct ProgressObserver {
    method: String,
    last_emitted: f32,
    destination: Option<PathBuf>,
    merged: Option<PathBuf>,
    completed: bool,
}

impl ProgressObserver {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Feed one line; returns the percentage when it crossed the logging step
    pub fn observe(&mut self, line: &str) -> Option<f32> {
        match parse_line(line)? {
            ProgressLine::Percent(percent) => {
                if percent >= 100.0 && !self.completed {
                    self.completed = true;
                    tracing::info!(method = %self.method, "download complete");
                }
                if percent - self.last_emitted >= PROGRESS_STEP {
                    self.last_emitted = percent;
                    tracing::info!(method = %self.method, percent, "progress {:.1}%", percent);
                    return Some(percent);
                }
                None
            }
            ProgressLine::Destination(path) => {
                tracing::info!(method = %self.method, path = %path.display(), "destination file");
                self.destination = Some(path);
                None
            }
            ProgressLine::Merging(path) => {
                tracing::info!(method = %self.method, path = %path.display(), "merging formats");
                self.merged = Some(path);
                None
            }
            ProgressLine::AlreadyDownloaded(path) => {
                tracing::info!(method = %self.method, path = %path.display(), "already downloaded");
                self.completed = true;
                self.destination = Some(path);
                None
            }
        }
    }

    /// Final file as announced by yt-dlp; the merge target wins over stream destinations
    pub fn output_file(&self) -> Option<&PathBuf> {
        self.merged.as_ref().or(self.destination.as_ref())
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_line(pct: &str) -> String {
        format!("[download]  {}% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)", pct)
    }

    #[test]
    fn emits_only_after_five_points() {
        let mut observer = ProgressObserver::new("cookies-file");
        let emitted: Vec<f32> = ["1", "2", "3", "6", "11"]
            .iter()
            .filter_map(|p| observer.observe(&progress_line(p)))
            .collect();
        assert_eq!(emitted, vec![6.0, 11.0]);
    }

    #[test]
    fn threshold_is_monotonic() {
        let mut observer = ProgressObserver::new("ios-client");
        assert_eq!(observer.observe(&progress_line("50.0")), Some(50.0));
        // audio stream restarts at 0; nothing logged until it passes 55
        assert_eq!(observer.observe(&progress_line("0.5")), None);
        assert_eq!(observer.observe(&progress_line("54.9")), None);
        assert_eq!(observer.observe(&progress_line("55.0")), Some(55.0));
    }

    #[test]
    fn fresh_observer_resets_threshold() {
        let mut first = ProgressObserver::new("a");
        first.observe(&progress_line("90"));
        let mut second = ProgressObserver::new("b");
        assert_eq!(second.observe(&progress_line("7.5")), Some(7.5));
    }

    #[test]
    fn parses_recorded_lines() {
        assert_eq!(
            parse_line("[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)"),
            Some(ProgressLine::Percent(6.2))
        );
        assert_eq!(
            parse_line("[download] 100% of   12.01MiB in 00:00:03 at 3.52MiB/s"),
            Some(ProgressLine::Percent(100.0))
        );
        assert_eq!(
            parse_line("[download] Destination: /tmp/out/Talk.f137.mp4"),
            Some(ProgressLine::Destination(PathBuf::from("/tmp/out/Talk.f137.mp4")))
        );
        assert_eq!(
            parse_line(r#"[Merger] Merging formats into "/tmp/out/Talk.mp4""#),
            Some(ProgressLine::Merging(PathBuf::from("/tmp/out/Talk.mp4")))
        );
        assert_eq!(
            parse_line("[download] /tmp/out/Talk.mp4 has already been downloaded"),
            Some(ProgressLine::AlreadyDownloaded(PathBuf::from("/tmp/out/Talk.mp4")))
        );
    }

    #[test]
    fn ignores_noise() {
        for line in [
            "",
            "[youtube] Extracting URL: https://youtu.be/abc",
            "[info] abc: Downloading 1 format(s): 137+140",
            "[download] Got error: HTTP Error 403",
            "WARNING: [youtube] nsig extraction failed",
            "[download] NaN% of unknown",
        ] {
            assert_eq!(parse_line(line), None, "line: {:?}", line);
        }
    }

    #[test]
    fn tracks_output_file_and_completion() {
        let mut observer = ProgressObserver::new("android-client");
        observer.observe("[download] Destination: /o/Talk.f137.mp4");
        assert_eq!(observer.output_file(), Some(&PathBuf::from("/o/Talk.f137.mp4")));
        assert!(!observer.completed());

        observer.observe(&progress_line("100"));
        observer.observe(r#"[Merger] Merging formats into "/o/Talk.mp4""#);
        assert!(observer.completed());
        assert_eq!(observer.output_file(), Some(&PathBuf::from("/o/Talk.mp4")));
    }
}
