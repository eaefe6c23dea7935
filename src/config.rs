//! Configuration types for an HTML-from-PDF resume update.
//!
//! All behaviour is controlled through [`SyncConfig`], built via its
//! [`SyncConfigBuilder`]. The binary maps CLI flags (and `.env` values) onto
//! the builder; library code never reads the environment for settings, so
//! every knob can be set explicitly in tests.

use crate::error::SyncError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Suffix appended to the target path to form its single backup slot.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak_aiagent";

/// Cache file name, resolved against the current working directory.
pub const DEFAULT_CACHE_FILENAME: &str = ".resume_ai_cache.json";

/// Location of the source-of-truth PDF under the project root.
pub const DEFAULT_PDF_RELATIVE_PATH: &str = "assets/resume/resume.pdf";

/// Paths tried, in order, by `update resume`.
pub const DEFAULT_RESUME_CANDIDATES: [&str; 4] = [
    "resume.html",
    "index.html",
    "templates/resume.html",
    "pages/resume.html",
];

/// Configuration for a resume update.
///
/// Built via [`SyncConfig::builder()`] or using [`SyncConfig::default()`].
///
/// # Example
/// ```rust
/// use resume_sync::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_attempts(3)
///     .request_delay_secs(0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SyncConfig {
    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "openrouter", "anthropic").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum tokens the model may generate. Default: 12000.
    ///
    /// The model returns the whole HTML file, so this must comfortably exceed
    /// the size of the page being updated.
    pub max_tokens: usize,

    /// Sampling temperature. Default: provider default.
    pub temperature: Option<f32>,

    /// Wall-clock timeout for one completion attempt, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Total completion attempts before giving up. Default: 3.
    pub max_attempts: u32,

    /// Base backoff in milliseconds. Default: 3000.
    ///
    /// The delay after failed attempt `n` is `retry_backoff_ms × n`.
    pub retry_backoff_ms: u64,

    /// Pause before the first remote attempt of an uncached request. Default: 15.
    ///
    /// Free-tier endpoints throttle bursts; cache hits skip the pause.
    pub request_delay_secs: u64,

    /// Backup slot suffix. Default: [`DEFAULT_BACKUP_SUFFIX`].
    pub backup_suffix: String,

    /// Response cache file. Default: [`DEFAULT_CACHE_FILENAME`].
    pub cache_path: PathBuf,

    /// PDF location relative to the project root. Default: [`DEFAULT_PDF_RELATIVE_PATH`].
    pub pdf_relative_path: PathBuf,

    /// Candidate HTML paths for `update resume`, first existing wins.
    pub resume_candidates: Vec<PathBuf>,

    /// Characters of the candidate shown before confirmation. Default: 1000.
    pub preview_chars: usize,

    /// Characters of unusable output shown on validation failure. Default: 500.
    pub diagnostic_chars: usize,

    /// Leading characters searched for a root marker before a full scan. Default: 200.
    pub marker_window: usize,

    /// Candidates shorter than this produce a warning. Default: 5000.
    pub min_output_chars: usize,

    /// Substrings whose absence from the candidate produces a warning.
    pub expected_markers: Vec<String>,

    /// Substrings reported present/absent after a successful write. If empty,
    /// the first line of the PDF text (usually the name) is checked.
    pub success_markers: Vec<String>,

    /// Edit checklist embedded in the user message. If None, uses the built-in one.
    pub checklist: Option<String>,

    /// Explicit path to libpdfium. If None, binds to the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional generation progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            max_tokens: 12_000,
            temperature: None,
            api_timeout_secs: 120,
            max_attempts: 3,
            retry_backoff_ms: 3_000,
            request_delay_secs: 15,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILENAME),
            pdf_relative_path: PathBuf::from(DEFAULT_PDF_RELATIVE_PATH),
            resume_candidates: DEFAULT_RESUME_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .collect(),
            preview_chars: 1000,
            diagnostic_chars: 500,
            marker_window: 200,
            min_output_chars: 5000,
            expected_markers: Vec::new(),
            success_markers: Vec::new(),
            checklist: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("request_delay_secs", &self.request_delay_secs)
            .field("backup_suffix", &self.backup_suffix)
            .field("cache_path", &self.cache_path)
            .field("pdf_relative_path", &self.pdf_relative_path)
            .field("resume_candidates", &self.resume_candidates)
            .field("expected_markers", &self.expected_markers)
            .field("success_markers", &self.success_markers)
            .field("checklist", &self.checklist.as_ref().map(|c| c.len()))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl SyncConfig {
    /// Create a new builder for `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SyncConfig`].
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn request_delay_secs(mut self, secs: u64) -> Self {
        self.config.request_delay_secs = secs;
        self
    }

    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.backup_suffix = suffix.into();
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    pub fn pdf_relative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdf_relative_path = path.into();
        self
    }

    pub fn resume_candidates<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.resume_candidates = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn diagnostic_chars(mut self, n: usize) -> Self {
        self.config.diagnostic_chars = n;
        self
    }

    pub fn marker_window(mut self, n: usize) -> Self {
        self.config.marker_window = n;
        self
    }

    pub fn min_output_chars(mut self, n: usize) -> Self {
        self.config.min_output_chars = n;
        self
    }

    pub fn expected_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.expected_markers.push(marker.into());
        self
    }

    pub fn success_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.success_markers.push(marker.into());
        self
    }

    pub fn checklist(mut self, checklist: impl Into<String>) -> Self {
        self.config.checklist = Some(checklist.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        let c = &self.config;
        if c.max_attempts == 0 {
            return Err(SyncError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.preview_chars == 0 || c.marker_window == 0 {
            return Err(SyncError::InvalidConfig(
                "preview_chars and marker_window must be ≥ 1".into(),
            ));
        }
        if c.backup_suffix.is_empty() {
            return Err(SyncError::InvalidConfig(
                "backup_suffix must not be empty".into(),
            ));
        }
        if c.pdf_relative_path.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig(
                "pdf_relative_path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
