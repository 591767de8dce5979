// FormatSelector - quality preference to yt-dlp format expression
//
// Non-`best` qualities cap the height and prefer an mp4 video stream with
// m4a audio so the merged file plays everywhere. Each alternative in the
// expression is tried by yt-dlp left to right, with plain `best` as the
// last resort.

use super::models::{ProbeFormat, Quality};

pub struct FormatSelector;

impl FormatSelector {
    /// yt-dlp `--format` expression for a quality preference
    pub fn format_spec(quality: Quality) -> String {
        match quality.max_height() {
            Some(h) => format!(
                "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}][ext=mp4]/best",
                h = h
            ),
            None => "bestvideo+bestaudio/best".to_string(),
        }
    }

    /// Subtitle arguments; languages are joined the way `--sub-lang` expects
    pub fn subtitle_args(langs: &[String]) -> Vec<String> {
        let langs: Vec<&str> = langs
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if langs.is_empty() {
            return Vec::new();
        }
        vec![
            "--write-subs".to_string(),
            "--sub-lang".to_string(),
            langs.join(","),
            "--embed-subs".to_string(),
        ]
    }

    /// Tallest video stream the probe reported
    pub fn best_available_height(formats: &[ProbeFormat]) -> Option<u32> {
        formats
            .iter()
            .filter(|f| f.vcodec.as_deref().map_or(true, |v| v != "none"))
            .filter_map(|f| f.height)
            .max()
    }

    /// Whether yt-dlp will have to settle for less than the requested ceiling
    pub fn falls_short(quality: Quality, formats: &[ProbeFormat]) -> Option<u32> {
        let wanted = quality.max_height()?;
        let available = Self::best_available_height(formats)?;
        (available < wanted).then_some(available)
    }
}
