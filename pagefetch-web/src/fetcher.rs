use crate::extract::extract;
use crate::ready::{ReadinessState, settle, wait_for_load, wait_for_selector};
use crate::request::{FetchOutput, FetchRequest, validate_url};
use pagefetch_common::{FetchError, Result};
use pagefetch_drivers::{PageSession, SessionLauncher};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Release a session. Never fails and may be called again on the same
/// session.
pub async fn release<S: PageSession>(session: &mut S) {
    session.close().await;
}

/// Runs one bounded page fetch per [`fetch`](Fetcher::fetch) call.
///
/// The fetcher keeps no per-request state, so it can be shared between
/// concurrent calls; each call launches and owns its own session.
pub struct Fetcher<L> {
    launcher: L,
    poll_interval: Duration,
}

impl<L: SessionLauncher> Fetcher<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll_interval = poll.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Validate, launch, navigate, wait, extract, release.
    ///
    /// Invalid URLs are rejected before any session exists. Once a session
    /// is launched it is released before this returns, whatever the outcome.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutput> {
        let url = validate_url(request.url())?;
        let started = Instant::now();

        let mut session = self.launcher.launch().await?;
        let session_id = session.id().to_string();
        info!(
            target: "pagefetch.fetch",
            %url,
            %session_id,
            mode = request.mode().label(),
            selector = request.selector().unwrap_or_default(),
            "fetch started"
        );

        let outcome = self.drive(&mut session, &url, request).await;
        release(&mut session).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(out) => info!(
                target: "pagefetch.fetch",
                %url,
                %session_id,
                elapsed_ms,
                bytes = out.content.len(),
                readiness = ?out.readiness,
                "fetch finished"
            ),
            Err(e) => warn!(
                target: "pagefetch.fetch",
                %url,
                %session_id,
                elapsed_ms,
                kind = e.kind(),
                error = %e.detail(),
                "fetch failed"
            ),
        }
        outcome
    }

    /// Everything between acquire and release. Returning early from here
    /// never skips the release in [`fetch`](Self::fetch).
    async fn drive(
        &self,
        session: &mut L::Session,
        url: &Url,
        request: &FetchRequest,
    ) -> Result<FetchOutput> {
        let timeout = request.navigation_timeout();
        match tokio::time::timeout(timeout, session.navigate(url, timeout)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FetchError::Navigation(format!("{e:#}"))),
            Err(_) => {
                return Err(FetchError::Navigation(format!(
                    "page load exceeded {}ms",
                    timeout.as_millis()
                )));
            }
        }

        let readiness = wait_for_load(session, request.load_timeout(), self.poll_interval).await;
        if readiness == ReadinessState::TimedOut {
            debug!(target: "pagefetch.fetch", %url, "document not ready in time; continuing");
        }
        if let Some(delay) = request.settle_delay() {
            settle(delay).await;
        }

        if let Some(selector) = request.selector() {
            let present = wait_for_selector(
                session,
                selector,
                request.selector_timeout(),
                self.poll_interval,
            )
            .await;
            if !present {
                debug!(target: "pagefetch.fetch", %selector, "selector wait elapsed; continuing");
            }
        }

        let extraction = extract(
            session,
            request.selector(),
            request.mode(),
            request.screenshot(),
        )
        .await
        .map_err(|e| FetchError::Navigation(format!("{e:#}")))?;

        Ok(FetchOutput {
            url: url.clone(),
            content: extraction.content,
            snapshot_written: extraction.snapshot_written,
            readiness,
            selector_matched: extraction.selector_matched,
        })
    }
}
