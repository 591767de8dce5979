// Fallback sequencer - ordered strategies, first success wins

use super::models::{AttemptOutcome, SessionResult, Target};
use super::retry::{RetryDecision, RetryPolicy};
use super::traits::Strategy;

pub struct FallbackSequencer {
    strategies: Vec<Box<dyn Strategy>>,
    retry: RetryPolicy,
    label: &'static str,
}

impl FallbackSequencer {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            retry: RetryPolicy::single(),
            label: "sequencer",
        }
    }

    /// Name used in log lines; nested chains set their own
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try every strategy in order until one succeeds.
    ///
    /// On exhaustion the result holds exactly one failure per strategy, in
    /// the order the strategies were added.
    pub async fn run(&self, target: &Target) -> SessionResult {
        let mut failures = Vec::with_capacity(self.strategies.len());
        let total = self.strategies.len();

        for (index, strategy) in self.strategies.iter().enumerate() {
            tracing::info!(
                chain = self.label,
                method = strategy.name(),
                "trying strategy {}/{}",
                index + 1,
                total
            );

            match self.attempt_with_retry(strategy.as_ref(), target).await {
                AttemptOutcome::Success(success) => {
                    tracing::info!(chain = self.label, method = strategy.name(), "strategy succeeded");
                    return SessionResult::Succeeded(success);
                }
                AttemptOutcome::Failure(failure) => {
                    if failure.error.is_skip() {
                        tracing::warn!(chain = self.label, method = strategy.name(), "skipped: {}", failure.error);
                    } else {
                        tracing::warn!(chain = self.label, method = strategy.name(), "failed: {}", failure.error);
                    }
                    failures.push(failure);
                }
            }
        }

        SessionResult::Exhausted(failures)
    }

    async fn attempt_with_retry(&self, strategy: &dyn Strategy, target: &Target) -> AttemptOutcome {
        let mut attempt = 1;
        loop {
            let outcome = strategy.attempt(target).await;
            let AttemptOutcome::Failure(failure) = &outcome else {
                return outcome;
            };

            match self.retry.decide(attempt, &failure.error) {
                RetryDecision::NoRetry => return outcome,
                RetryDecision::RetryAfter(delay) => {
                    tracing::info!(
                        method = strategy.name(),
                        attempt,
                        "transient failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for FallbackSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::DownloadError;
    use crate::downloader::models::{DownloadSuccess, Quality};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replays scripted outcomes, one per call
    struct Scripted {
        name: &'static str,
        script: Mutex<Vec<AttemptOutcome>>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new(name: &'static str, mut script: Vec<AttemptOutcome>) -> (Box<Self>, Arc<AtomicUsize>) {
            script.reverse();
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Box::new(Self {
                    name,
                    script: Mutex::new(script),
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    #[async_trait]
    impl Strategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt(&self, _target: &Target) -> AttemptOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| fail(self.name, "script exhausted"))
        }
    }

    fn fail(method: &str, detail: &str) -> AttemptOutcome {
        AttemptOutcome::failure(
            method,
            DownloadError::ExtractionFailed {
                code: Some(1),
                detail: detail.to_string(),
            },
        )
    }

    fn ok(method: &str) -> AttemptOutcome {
        AttemptOutcome::Success(DownloadSuccess {
            method: method.to_string(),
            file_path: None,
            file_size_mb: None,
        })
    }

    fn target() -> Target {
        Target::new("https://youtu.be/abc", Quality::P1080, false)
    }

    #[tokio::test]
    async fn empty_chain_is_exhausted() {
        let result = FallbackSequencer::new().run(&target()).await;
        assert_eq!(result, SessionResult::Exhausted(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_moves_on() {
        let (flaky, flaky_calls) = Scripted::new(
            "flaky",
            vec![fail("flaky", "HTTP Error 429"), fail("flaky", "HTTP Error 429")],
        );
        let (next, next_calls) = Scripted::new("next", vec![ok("next")]);

        let mut seq = FallbackSequencer::new().with_retry(RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        });
        seq.add_strategy(flaky);
        seq.add_strategy(next);

        let result = seq.run(&target()).await;
        assert!(result.is_success());
        assert_eq!(flaky_calls.load(Ordering::SeqCst), 2);
        assert_eq!(next_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_can_recover_same_strategy() {
        let (flaky, calls) = Scripted::new("flaky", vec![fail("flaky", "timed out"), ok("flaky")]);
        let mut seq = FallbackSequencer::new().with_retry(RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        });
        seq.add_strategy(flaky);

        let result = seq.run(&target()).await;
        assert_eq!(
            result,
            SessionResult::Succeeded(DownloadSuccess {
                method: "flaky".to_string(),
                file_path: None,
                file_size_mb: None,
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_transient_failure_is_not_retried() {
        let (bot, calls) = Scripted::new("bot", vec![fail("bot", "confirm you're not a bot")]);
        let mut seq = FallbackSequencer::new().with_retry(RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        });
        seq.add_strategy(bot);

        let result = seq.run(&target()).await;
        assert_eq!(result.failures().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
