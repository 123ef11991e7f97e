//! Readiness waits. None of these fail: a missed deadline is reported as a
//! value and the fetch carries on with whatever the page holds.
use pagefetch_drivers::PageSession;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Stand-in deadline for timeouts too large to add to the clock, about
/// thirty years out.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, saturating to [`FAR_FUTURE`] instead of overflowing.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Document readiness as observed by [`wait_for_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Loading,
    Ready,
    TimedOut,
}

impl ReadinessState {
    /// Map a `document.readyState` value. `interactive` already counts as
    /// ready; single-page apps may never report `complete`.
    pub fn from_document_state(state: &str) -> Self {
        match state {
            "interactive" | "complete" => Self::Ready,
            _ => Self::Loading,
        }
    }
}

/// Poll `document.readyState` until the page is interactive or `timeout`
/// elapses. The state is read at least once, even with a zero timeout.
pub async fn wait_for_load<S: PageSession>(
    session: &mut S,
    timeout: Duration,
    poll: Duration,
) -> ReadinessState {
    let deadline = deadline_after(timeout);
    loop {
        let observed = match session.ready_state().await {
            Ok(state) => ReadinessState::from_document_state(&state),
            Err(e) => {
                debug!(target: "pagefetch.ready", error = %e, "readyState probe failed");
                ReadinessState::Loading
            }
        };
        if observed == ReadinessState::Ready {
            return observed;
        }
        let now = Instant::now();
        if now >= deadline {
            return ReadinessState::TimedOut;
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// Poll for at least one element matching `selector`. Returns `false` once
/// `timeout` elapses without a match.
///
/// The first failed lookup is logged at `warn`: a selector the browser
/// rejects fails every lookup, and the wait then runs to its deadline.
pub async fn wait_for_selector<S: PageSession>(
    session: &mut S,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let deadline = deadline_after(timeout);
    let mut failures = 0usize;
    loop {
        match session.find_elements(selector).await {
            Ok(found) if !found.is_empty() => return true,
            Ok(_) => {}
            Err(e) => {
                failures += 1;
                if failures == 1 {
                    warn!(
                        target: "pagefetch.ready",
                        %selector,
                        error = %e,
                        "selector lookup failed; is the selector valid?"
                    );
                } else {
                    debug!(
                        target: "pagefetch.ready",
                        %selector,
                        failures,
                        error = %e,
                        "selector lookup failed"
                    );
                }
            }
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// Fixed pause letting client-side rendering settle.
pub async fn settle(delay: Duration) {
    sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_and_complete_are_ready() {
        assert_eq!(ReadinessState::from_document_state("interactive"), ReadinessState::Ready);
        assert_eq!(ReadinessState::from_document_state("complete"), ReadinessState::Ready);
        assert_eq!(ReadinessState::from_document_state("loading"), ReadinessState::Loading);
        assert_eq!(ReadinessState::from_document_state(""), ReadinessState::Loading);
    }

    #[tokio::test]
    async fn huge_timeouts_saturate_instead_of_overflowing() {
        let now = Instant::now();
        let deadline = deadline_after(Duration::from_secs(u64::MAX));
        assert!(deadline > now + Duration::from_secs(86_400 * 365));
        assert!(deadline_after(Duration::ZERO) <= Instant::now());
    }
}
