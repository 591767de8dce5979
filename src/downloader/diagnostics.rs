// Blocking diagnostics - classifies yt-dlp failure text
//
// Used for two things:
// - deciding whether a failed strategy is worth retrying
// - building remediation guidance once every strategy has failed

use serde::{Deserialize, Serialize};

/// Reasons why YouTube refused a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// "Sign in to confirm you're not a bot"
    BotDetection,

    /// Browser cookie store could not be read (browser still running, keyring locked)
    CookiesUnreadable,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Private video requiring authorization
    PrivateVideo,

    /// Members-only content (requires channel membership)
    MembersOnly,

    /// DRM-protected or paid content, never downloadable
    DrmProtected,

    /// Geographic restriction
    GeoBlocked,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Requested quality/format combination missing
    FormatUnavailable,

    /// HTTP 429 or similar throttling
    RateLimited,

    /// HTTP 403 Forbidden
    Http403Forbidden,

    /// Network timeout or unreachable host
    NetworkTimeout,

    /// Non-empty error text that matched nothing above
    Unknown,
}

impl BlockingReason {
    /// Worth retrying the same strategy after a pause
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkTimeout)
    }

    /// No strategy can work around this
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    /// Fresh cookies from a logged-in account might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::BotDetection
                | Self::CookiesUnreadable
                | Self::AgeRestricted
                | Self::PrivateVideo
                | Self::MembersOnly
                | Self::Http403Forbidden
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::BotDetection => "YouTube bot check triggered",
            Self::CookiesUnreadable => "Browser cookie store could not be read",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::MembersOnly => "Members-only content",
            Self::DrmProtected => "DRM-protected or paid content",
            Self::GeoBlocked => "Not available in this region",
            Self::VideoUnavailable => "Video unavailable",
            Self::FormatUnavailable => "Requested format not available",
            Self::RateLimited => "Rate limited by YouTube",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::NetworkTimeout => "Network timeout",
            Self::Unknown => "Unrecognized failure",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::BotDetection => {
                "Export fresh cookies from a logged-in browser, or switch network/IP"
            }
            Self::CookiesUnreadable => {
                "Close all browser windows so the cookie database is not locked, then retry"
            }
            Self::AgeRestricted => "Use cookies from an 18+ logged-in account",
            Self::PrivateVideo => "Use cookies from an account that was granted access",
            Self::MembersOnly => "Use cookies from a browser logged in as a channel member",
            Self::DrmProtected => "Protected content cannot be downloaded as a file",
            Self::GeoBlocked => "Use a VPN or proxy located in an allowed region",
            Self::VideoUnavailable => "The video was removed or made private",
            Self::FormatUnavailable => "Retry with --quality best",
            Self::RateLimited => "Wait 10-15 minutes or use a different IP",
            Self::Http403Forbidden => "Update yt-dlp, refresh cookies, or try a proxy",
            Self::NetworkTimeout => "Check the connection or configure a proxy",
            Self::Unknown => "Check the URL and retry later",
        }
    }
}

/// Analyze yt-dlp error text and return the blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    if lower.trim().is_empty() {
        return None;
    }

    // Permanent restrictions first
    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("requires purchase")
        || lower.contains("rental")
        || lower.contains("youtube premium")
    {
        return Some(BlockingReason::DrmProtected);
    }

    if (lower.contains("could not copy") && lower.contains("cookie"))
        || lower.contains("failed to decrypt")
        || (lower.contains("could not find") && lower.contains("cookies database"))
    {
        return Some(BlockingReason::CookiesUnreadable);
    }

    if lower.contains("members only")
        || lower.contains("members-only")
        || lower.contains("join this channel")
    {
        return Some(BlockingReason::MembersOnly);
    }

    // Age check before bot check, both start with "sign in to confirm"
    if lower.contains("confirm your age") || lower.contains("age-restricted") {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("not available in your country")
        || lower.contains("blocked in your country")
        || lower.contains("geo restrict")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("requested format is not available") {
        return Some(BlockingReason::FormatUnavailable);
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit")
    {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    Some(BlockingReason::Unknown)
}

/// Distinct reasons across several failure texts, in first-seen order
pub fn collect_reasons<'a, I>(errors: I) -> Vec<BlockingReason>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut reasons = Vec::new();
    for reason in errors.into_iter().filter_map(diagnose_error) {
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }
    reasons
}
