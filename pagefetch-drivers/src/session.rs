use anyhow::Result;
use async_trait::async_trait;
use pagefetch_common::FetchError;
use std::time::Duration;
use url::Url;

/// One live browser page driven over a control channel.
///
/// A session belongs to exactly one fetch. Every method except
/// [`close`](PageSession::close) reports driver faults as `anyhow` errors and
/// leaves their classification to the caller.
#[async_trait]
pub trait PageSession: Send {
    /// Handle to a matched DOM element.
    type Element: Send + Sync;

    /// Identifier used in log fields.
    fn id(&self) -> &str;

    /// Load `url` in the current tab. `timeout` is passed down so the
    /// backend can enforce it as well; callers still bound the future.
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()>;

    /// Current `document.readyState`.
    async fn ready_state(&mut self) -> Result<String>;

    /// All elements matching a CSS selector, in document order.
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Serialized markup of the element, including the element itself.
    async fn outer_html(&mut self, element: &Self::Element) -> Result<String>;

    /// Rendered text of the element.
    async fn visible_text(&mut self, element: &Self::Element) -> Result<String>;

    /// Rendered text of `<body>`, or `None` when there is no body to read.
    async fn body_text(&mut self) -> Result<Option<String>>;

    /// Serialized markup of the whole document.
    async fn page_source(&mut self) -> Result<String>;

    /// PNG capture of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    /// Tear the session down. Idempotent; teardown faults are logged and
    /// dropped.
    async fn close(&mut self);
}

/// Starts browser sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: PageSession;

    /// Bring up a fresh, unshared session. Failures are always
    /// [`FetchError::SessionStart`].
    async fn launch(&self) -> std::result::Result<Self::Session, FetchError>;
}
