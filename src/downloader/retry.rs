// Per-strategy retry with capped exponential backoff

use std::time::Duration;

use super::errors::DownloadError;

/// Decision returned by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per strategy, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// One attempt per strategy
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn single() -> Self {
        Self::default()
    }

    /// `attempt` is 1-based. Only transient failures are retried.
    pub fn decide(&self, attempt: u32, error: &DownloadError) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return RetryDecision::NoRetry;
        }
        // base * 2^(attempt-1), capped
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttled() -> DownloadError {
        DownloadError::ExtractionFailed {
            code: Some(1),
            detail: "HTTP Error 429: Too Many Requests".to_string(),
        }
    }

    #[test]
    fn default_never_retries() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, &throttled()), RetryDecision::NoRetry);
    }

    #[test]
    fn skips_are_never_retried() {
        let p = RetryPolicy {
            max_attempts: 5,
            ..RetryPolicy::default()
        };
        let skip = DownloadError::AuthUnavailable("no cookies".to_string());
        assert_eq!(p.decide(1, &skip), RetryDecision::NoRetry);
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let p = RetryPolicy {
            max_attempts: 20,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(p.decide(1, &throttled()), RetryDecision::RetryAfter(Duration::from_secs(2)));
        assert_eq!(p.decide(2, &throttled()), RetryDecision::RetryAfter(Duration::from_secs(4)));
        assert_eq!(p.decide(3, &throttled()), RetryDecision::RetryAfter(Duration::from_secs(8)));
        assert_eq!(p.decide(10, &throttled()), RetryDecision::RetryAfter(Duration::from_secs(30)));
    }

    #[test]
    fn respects_max_attempts() {
        let p = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(matches!(p.decide(2, &throttled()), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3, &throttled()), RetryDecision::NoRetry);
    }
}
