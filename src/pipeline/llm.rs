//! Completion client: send a [`Request`] to the model, retrying transient failures.
//!
//! The retry loop is separated from the transport. A [`Completer`] performs
//! exactly one attempt and reports an explicit [`Attempt`] outcome;
//! [`CompletionClient`] owns the policy of what to do with it. That keeps the
//! policy testable with a scripted completer and no network.
//!
//! ## Retry Strategy
//!
//! Only outcomes classified [`Attempt::Transient`] are retried, up to
//! [`RetryPolicy::max_attempts`] attempts in total. The delay after failed
//! attempt `n` grows linearly (`base × n`); with the default 3 s base and 3
//! attempts the wait sequence is 3 s → 6 s. A [`Attempt::Fatal`] outcome ends
//! the loop immediately.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::progress::ProgressCallback;
use crate::request::Request;
use edgequake_llm::{CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use once_cell::unsync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Outcome of a single completion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The full generated text.
    Success(String),
    /// Retry-eligible failure (rate limit, overload, timeout, network).
    Transient(String),
    /// Failure that retrying will not fix (auth, bad request, unknown model).
    Fatal(String),
}

/// Performs one completion attempt.
pub trait Completer {
    fn attempt(&self, request: &Request) -> Attempt;
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(3_000),
        }
    }
}

/// Blocking sleep used between attempts. Injected so tests can record delays.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

fn thread_sleeper() -> Sleeper {
    Arc::new(std::thread::sleep)
}

/// Drives a [`Completer`] under a [`RetryPolicy`].
pub struct CompletionClient {
    completer: Box<dyn Completer>,
    policy: RetryPolicy,
    request_delay: Duration,
    sleeper: Sleeper,
    progress: Option<ProgressCallback>,
}

impl CompletionClient {
    pub fn new(completer: Box<dyn Completer>, policy: RetryPolicy) -> Self {
        Self {
            completer,
            policy,
            request_delay: Duration::ZERO,
            sleeper: thread_sleeper(),
            progress: None,
        }
    }

    /// Client with the policy, cool-down and progress callback from `config`.
    pub fn from_config(completer: Box<dyn Completer>, config: &SyncConfig) -> Self {
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.retry_backoff_ms),
        };
        let mut client = Self::new(completer, policy)
            .with_request_delay(Duration::from_secs(config.request_delay_secs));
        client.progress = config.progress_callback.clone();
        client
    }

    /// Pause before the first attempt of every call.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Return the generated text, or the fatal error that ended the loop.
    ///
    /// There is no partial result: either a full response comes back or the
    /// caller gets [`SyncError::LlmApiError`] / [`SyncError::RetriesExhausted`].
    pub fn complete(&self, request: &Request) -> Result<String, SyncError> {
        if !self.request_delay.is_zero() {
            info!("Waiting {:?} before calling the model", self.request_delay);
            (self.sleeper)(self.request_delay);
        }
        if let Some(ref cb) = self.progress {
            cb.on_generation_start(request.content_chars());
        }

        let max = self.policy.max_attempts.max(1);
        let mut last_error: Option<String> = None;

        for attempt in 1..=max {
            match self.completer.attempt(request) {
                Attempt::Success(text) => {
                    debug!("Attempt {}: {} chars generated", attempt, text.len());
                    if let Some(ref cb) = self.progress {
                        cb.on_generation_complete(text.chars().count(), false);
                    }
                    return Ok(text);
                }
                Attempt::Fatal(message) => {
                    warn!("Attempt {}: non-transient failure: {}", attempt, message);
                    if let Some(ref cb) = self.progress {
                        cb.on_generation_error(&message);
                    }
                    return Err(SyncError::LlmApiError { message });
                }
                Attempt::Transient(message) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max, message);
                    if attempt < max {
                        let delay = self.policy.delay_after(attempt);
                        if let Some(ref cb) = self.progress {
                            cb.on_generation_retry(attempt, max, &message);
                        }
                        debug!("Backing off {:?}", delay);
                        (self.sleeper)(delay);
                    }
                    last_error = Some(message);
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| "Unknown error".to_string());
        if let Some(ref cb) = self.progress {
            cb.on_generation_error(&last_error);
        }
        Err(SyncError::RetriesExhausted {
            attempts: max,
            last_error,
        })
    }
}

// ── edgequake-llm transport ──────────────────────────────────────────────

/// [`Completer`] backed by an edgequake-llm provider.
///
/// The provider API is async; each attempt is driven to completion on a
/// private current-thread runtime, so callers stay fully synchronous. Do not
/// call [`Completer::attempt`] from inside another tokio runtime.
pub struct ProviderCompleter {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
    runtime: tokio::runtime::Runtime,
}

impl ProviderCompleter {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &SyncConfig) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::Internal(format!("Failed to create tokio runtime: {}", e)))?;

        Ok(Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
            runtime,
        })
    }
}

impl Completer for ProviderCompleter {
    fn attempt(&self, request: &Request) -> Attempt {
        let messages = request.to_chat_messages();
        let call = self.provider.chat(&messages, Some(&self.options));
        let outcome = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, call).await });

        match outcome {
            Ok(Ok(response)) => {
                debug!(
                    "{} input tokens, {} output tokens",
                    response.prompt_tokens, response.completion_tokens
                );
                Attempt::Success(response.content)
            }
            Ok(Err(e)) => classify(&e),
            Err(_) => Attempt::Transient(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }
}

/// [`ProviderCompleter`] built on the first attempt.
///
/// Resolving a provider needs credentials. Deferring it lets cache hits and
/// shell commands that never reach the model run without any. A resolution
/// failure is fatal for that attempt and for every later one.
pub struct LazyProviderCompleter {
    config: SyncConfig,
    inner: OnceCell<Result<ProviderCompleter, String>>,
}

impl LazyProviderCompleter {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl Completer for LazyProviderCompleter {
    fn attempt(&self, request: &Request) -> Attempt {
        let inner = self.inner.get_or_init(|| {
            debug!("Resolving LLM provider on first model call");
            resolve_provider(&self.config)
                .and_then(|provider| ProviderCompleter::new(provider, &self.config))
                .map_err(|e| e.to_string())
        });
        match inner {
            Ok(completer) => completer.attempt(request),
            Err(message) => Attempt::Fatal(message.clone()),
        }
    }
}

/// Sort a provider error into retry-eligible or fatal.
///
/// Only generic API failures, rate limiting, network errors and timeouts are
/// retried. Authentication, invalid requests and everything else fail fast.
/// A content-filter refusal arrives as an `ApiError` but is fatal: the same
/// input gets the same refusal.
pub fn classify(err: &LlmError) -> Attempt {
    let message = err.to_string();
    match err {
        LlmError::ApiError(detail) if is_content_filter(detail) => Attempt::Fatal(message),
        LlmError::ApiError(_)
        | LlmError::RateLimited(_)
        | LlmError::NetworkError(_)
        | LlmError::Timeout => Attempt::Transient(message),
        _ => Attempt::Fatal(message),
    }
}

fn is_content_filter(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    detail.contains("content filter") || detail.contains("content_filter")
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &SyncConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SyncError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SyncError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) — created with
///    `config.model` (or [`DEFAULT_MODEL`]); the factory reads the matching
///    API key variable.
/// 3. **Auto-detection** (`ProviderFactory::from_env`) — the first provider
///    whose API key is present.
pub fn resolve_provider(config: &SyncConfig) -> Result<Arc<dyn LLMProvider>, SyncError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        info!("Using provider {} with model {}", name, model);
        return create_provider(name, model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SyncError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY (or another provider key) in the environment or .env,\n\
                or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Message;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::Mutex;

    struct Scripted {
        outcomes: RefCell<VecDeque<Attempt>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Attempt>) -> Self {
            Self {
                outcomes: RefCell::new(outcomes.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl Completer for Rc<Scripted> {
        fn attempt(&self, _request: &Request) -> Attempt {
            *self.calls.borrow_mut() += 1;
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Attempt::Fatal("script exhausted".into()))
        }
    }

    fn recording_client(script: Rc<Scripted>) -> (CompletionClient, Arc<Mutex<Vec<Duration>>>) {
        let delays = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delays);
        let client = CompletionClient::new(Box::new(script), RetryPolicy::default())
            .with_sleeper(Arc::new(move |d: Duration| sink.lock().unwrap().push(d)));
        (client, delays)
    }

    fn request() -> Request {
        Request::new(vec![Message::system("s"), Message::user("u")])
    }

    #[test]
    fn success_on_first_attempt() {
        let script = Rc::new(Scripted::new(vec![Attempt::Success("<html>".into())]));
        let (client, delays) = recording_client(Rc::clone(&script));
        assert_eq!(client.complete(&request()).unwrap(), "<html>");
        assert_eq!(*script.calls.borrow(), 1);
        assert!(delays.lock().unwrap().is_empty());
    }

    #[test]
    fn two_transient_failures_then_success() {
        let script = Rc::new(Scripted::new(vec![
            Attempt::Transient("429".into()),
            Attempt::Transient("503".into()),
            Attempt::Success("third".into()),
        ]));
        let (client, delays) = recording_client(Rc::clone(&script));

        assert_eq!(client.complete(&request()).unwrap(), "third");
        assert_eq!(*script.calls.borrow(), 3);

        let delays = delays.lock().unwrap();
        assert_eq!(delays.len(), 2);
        assert!(delays[1] > delays[0]);
        assert_eq!(delays[0], Duration::from_secs(3));
        assert_eq!(delays[1], Duration::from_secs(6));
    }

    #[test]
    fn fatal_stops_immediately() {
        let script = Rc::new(Scripted::new(vec![
            Attempt::Fatal("401 invalid key".into()),
            Attempt::Success("never".into()),
        ]));
        let (client, delays) = recording_client(Rc::clone(&script));

        let err = client.complete(&request()).unwrap_err();
        assert!(matches!(err, SyncError::LlmApiError { ref message } if message.contains("401")));
        assert_eq!(*script.calls.borrow(), 1);
        assert!(delays.lock().unwrap().is_empty());
    }

    #[test]
    fn exhausting_retries_reports_last_error() {
        let script = Rc::new(Scripted::new(vec![
            Attempt::Transient("first".into()),
            Attempt::Transient("second".into()),
            Attempt::Transient("third".into()),
        ]));
        let (client, delays) = recording_client(Rc::clone(&script));

        match client.complete(&request()).unwrap_err() {
            SyncError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "third");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*script.calls.borrow(), 3);
        assert_eq!(delays.lock().unwrap().len(), 2);
    }

    #[test]
    fn request_delay_precedes_first_attempt() {
        let script = Rc::new(Scripted::new(vec![Attempt::Success("ok".into())]));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delays);
        let client = CompletionClient::new(Box::new(script), RetryPolicy::default())
            .with_request_delay(Duration::from_secs(15))
            .with_sleeper(Arc::new(move |d: Duration| sink.lock().unwrap().push(d)));

        client.complete(&request()).unwrap();
        assert_eq!(*delays.lock().unwrap(), vec![Duration::from_secs(15)]);
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(2000));
    }

    #[test]
    fn from_config_copies_policy() {
        let config = SyncConfig::builder()
            .max_attempts(5)
            .retry_backoff_ms(10)
            .build()
            .unwrap();
        let script = Rc::new(Scripted::new(vec![]));
        let client = CompletionClient::from_config(Box::new(script), &config);
        assert_eq!(client.policy().max_attempts, 5);
        assert_eq!(client.policy().base_delay, Duration::from_millis(10));
    }

    #[test]
    fn classify_marks_throttling_transient() {
        assert!(matches!(
            classify(&LlmError::RateLimited("slow down".into())),
            Attempt::Transient(_)
        ));
        assert!(matches!(classify(&LlmError::Timeout), Attempt::Transient(_)));
        assert!(matches!(
            classify(&LlmError::ApiError("502 bad gateway".into())),
            Attempt::Transient(_)
        ));
    }

    #[test]
    fn classify_content_filter_refusal_is_fatal() {
        let err = LlmError::ApiError(
            "Response blocked by OpenAI content filter (finish_reason=content_filter)".into(),
        );
        assert!(matches!(classify(&err), Attempt::Fatal(_)));
        let azure = LlmError::ApiError("Response blocked by Azure content filter".into());
        assert!(matches!(classify(&azure), Attempt::Fatal(_)));
    }

    #[test]
    fn classify_auth_and_config_errors_are_fatal() {
        assert!(matches!(
            classify(&LlmError::AuthError("invalid key".into())),
            Attempt::Fatal(_)
        ));
        assert!(matches!(
            classify(&LlmError::ConfigError("no key".into())),
            Attempt::Fatal(_)
        ));
    }

    #[test]
    fn lazy_completer_defers_resolution() {
        let config = SyncConfig::builder()
            .provider_name("no-such-provider")
            .build()
            .unwrap();
        let completer = LazyProviderCompleter::new(config);
        assert!(!completer.is_resolved());

        match completer.attempt(&request()) {
            Attempt::Fatal(message) => assert!(message.contains("no-such-provider")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(completer.is_resolved());
    }

    #[test]
    fn build_options_defaults() {
        let config = SyncConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.max_tokens, Some(12_000));
        assert_eq!(opts.temperature, None);
    }
}
