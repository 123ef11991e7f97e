use crate::ready::ReadinessState;
use pagefetch_common::{FetchError, OutputMode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Check that `raw` is an absolute `http`/`https` URL with a host.
///
/// The `http://` or `https://` prefix must be spelled out; inputs the URL
/// parser would repair, such as `http:example.com`, are rejected.
///
/// ```
/// use pagefetch_web::validate_url;
///
/// assert!(validate_url("  https://example.com/a?b=c ").is_ok());
/// assert!(validate_url("example.com").is_err());
/// assert!(validate_url("ftp://example.com").is_err());
/// assert!(validate_url("http:example.com").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidInput("empty_url".into()));
    }
    if !has_web_scheme_prefix(trimmed) {
        return Err(FetchError::InvalidInput(
            "url_must_start_with_http_or_https".into(),
        ));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| FetchError::InvalidInput(format!("malformed url {trimmed:?}: {e}")))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidInput(format!(
            "url {trimmed:?} has no host"
        )));
    }
    Ok(url)
}

fn has_web_scheme_prefix(raw: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Everything one fetch needs. Built with the `with_*` methods:
///
/// ```
/// use pagefetch_common::OutputMode;
/// use pagefetch_web::FetchRequest;
/// use std::time::Duration;
///
/// let request = FetchRequest::new("https://example.com")
///     .with_timeout(Duration::from_secs(10))
///     .with_selector(Some("main".into()))
///     .with_mode(OutputMode::Text);
///
/// assert_eq!(request.load_timeout(), Duration::from_secs(10));
/// assert_eq!(request.selector(), Some("main"));
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: String,
    navigation_timeout: Duration,
    load_timeout: Duration,
    selector_timeout: Duration,
    settle_delay: Option<Duration>,
    selector: Option<String>,
    mode: OutputMode,
    screenshot: Option<PathBuf>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            navigation_timeout: DEFAULT_TIMEOUT,
            load_timeout: DEFAULT_TIMEOUT,
            selector_timeout: DEFAULT_TIMEOUT,
            settle_delay: None,
            selector: None,
            mode: OutputMode::Markup,
            screenshot: None,
        }
    }

    /// Set the navigation timeout and both wait deadlines at once.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            navigation_timeout: timeout,
            load_timeout: timeout,
            selector_timeout: timeout,
            ..self
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    /// Fixed pause after the load wait. Zero means none.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// Blank selectors are treated as absent.
    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        self.selector = selector.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }

    /// The URL as given, without surrounding whitespace.
    pub fn url(&self) -> &str {
        self.url.trim()
    }

    pub fn navigation_timeout(&self) -> Duration {
        self.navigation_timeout
    }

    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    pub fn selector_timeout(&self) -> Duration {
        self.selector_timeout
    }

    pub fn settle_delay(&self) -> Option<Duration> {
        self.settle_delay
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn screenshot(&self) -> Option<&Path> {
        self.screenshot.as_deref()
    }
}

/// Successful result of a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub url: Url,
    pub content: String,
    pub snapshot_written: bool,
    /// Outcome of the document-readiness wait.
    pub readiness: ReadinessState,
    /// `Some(false)` when a selector was given but nothing matched and the
    /// whole document was used instead.
    pub selector_matched: Option<bool>,
}
