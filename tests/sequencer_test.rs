use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ytfetch::downloader::{
    standard_chain, AttemptOutcome, BrowserCookieStrategy, DownloadError, DownloadSuccess,
    FallbackSequencer, Invocation, Quality, RetryPolicy, SessionResult, Strategy, StrategyTraits,
    Target, ToolReport, ToolRunner, ToolSettings, ToolStrategy,
};

/// Strategy with a fixed outcome that counts its invocations
struct Fixed {
    name: String,
    succeed: bool,
    calls: Arc<AtomicUsize>,
}

impl Fixed {
    fn boxed(name: &str, succeed: bool) -> (Box<dyn Strategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Fixed {
            name: name.to_string(),
            succeed,
            calls: calls.clone(),
        };
        (Box::new(strategy), calls)
    }
}

#[async_trait]
impl Strategy for Fixed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, _target: &Target) -> AttemptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            AttemptOutcome::Success(DownloadSuccess {
                method: self.name.clone(),
                file_path: None,
                file_size_mb: None,
            })
        } else {
            AttemptOutcome::failure(
                &self.name,
                DownloadError::ExtractionFailed {
                    code: Some(1),
                    detail: format!("{} refused", self.name),
                },
            )
        }
    }
}

/// Runner that records every invocation and always fails
#[derive(Default)]
struct RecordingRunner {
    seen: Mutex<Vec<(String, Invocation)>>,
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    async fn execute(
        &self,
        invocation: &Invocation,
        method: &str,
    ) -> Result<ToolReport, DownloadError> {
        self.seen
            .lock()
            .unwrap()
            .push((method.to_string(), invocation.clone()));
        Ok(ToolReport {
            success: false,
            exit_code: Some(1),
            error_tail: Some("ERROR: Sign in to confirm you're not a bot".to_string()),
            ..ToolReport::default()
        })
    }
}

fn target(url: &str) -> Target {
    Target::new(url, Quality::P1080, false)
}

#[tokio::test]
async fn stops_at_first_success() {
    let (first, first_calls) = Fixed::boxed("one", false);
    let (second, second_calls) = Fixed::boxed("two", true);
    let (third, third_calls) = Fixed::boxed("three", true);

    let mut chain = FallbackSequencer::new();
    chain.add_strategy(first);
    chain.add_strategy(second);
    chain.add_strategy(third);

    match chain.run(&target("https://youtu.be/abc")).await {
        SessionResult::Succeeded(success) => assert_eq!(success.method, "two"),
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhaustion_keeps_one_failure_per_strategy_in_order() {
    let mut chain = FallbackSequencer::new();
    for name in ["a", "b", "c", "d"] {
        chain.add_strategy(Fixed::boxed(name, false).0);
    }

    let result = chain.run(&target("https://youtu.be/abc")).await;
    assert!(!result.is_success());
    let methods: Vec<&str> = result.failures().iter().map(|f| f.method.as_str()).collect();
    assert_eq!(methods, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn nested_chain_acts_as_one_strategy() {
    let mut inner = FallbackSequencer::new().with_label("browser-cookies");
    inner.add_strategy(Fixed::boxed("browser-cookies (chrome)", false).0);
    inner.add_strategy(Fixed::boxed("browser-cookies (firefox)", true).0);

    let (after, after_calls) = Fixed::boxed("android-client", true);

    let mut outer = FallbackSequencer::new();
    outer.add_strategy(Fixed::boxed("cookies-file", false).0);
    outer.add_strategy(Box::new(BrowserCookieStrategy::from_chain(inner)));
    outer.add_strategy(after);

    match outer.run(&target("https://youtu.be/abc")).await {
        SessionResult::Succeeded(success) => {
            assert_eq!(success.method, "browser-cookies (firefox)")
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn embed_strategy_skips_unrecognized_url_without_running_tool() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let settings = Arc::new(ToolSettings::new("yt-dlp", dir.path()));

    let mut chain = FallbackSequencer::new();
    chain.add_strategy(Box::new(ToolStrategy::new(
        "embed-url",
        StrategyTraits::embed(),
        settings,
        runner.clone(),
    )));

    let result = chain.run(&target("lofi hip hop radio")).await;
    assert_eq!(result.failures().len(), 1);
    assert!(matches!(
        result.failures()[0].error,
        DownloadError::MalformedTarget(_)
    ));
    assert!(runner.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn standard_chain_reports_every_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let browsers = vec!["chrome".to_string(), "firefox".to_string()];

    let chain = standard_chain(
        ToolSettings::new("yt-dlp", dir.path()),
        dir.path().join("missing-cookies.txt"),
        &browsers,
        runner.clone(),
        RetryPolicy::single(),
    );

    let result = chain
        .run(&target("https://www.youtube.com/watch?v=jKr9Omaf3Gs&t=30"))
        .await;

    let methods: Vec<&str> = result.failures().iter().map(|f| f.method.as_str()).collect();
    assert_eq!(
        methods,
        vec![
            "cookies-file",
            "browser-cookies",
            "android-client",
            "ios-client",
            "embed-url"
        ]
    );
    assert!(matches!(
        result.failures()[0].error,
        DownloadError::AuthUnavailable(_)
    ));

    let seen = runner.seen.lock().unwrap();
    let ran: Vec<&str> = seen.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        ran,
        vec![
            "browser-cookies (chrome)",
            "browser-cookies (firefox)",
            "android-client",
            "ios-client",
            "embed-url"
        ]
    );

    let (_, embed) = seen.last().unwrap();
    assert_eq!(embed.url, "https://www.youtube.com/embed/jKr9Omaf3Gs");
    assert_eq!(embed.args.last().map(String::as_str), Some(embed.url.as_str()));
}
