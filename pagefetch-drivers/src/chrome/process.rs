//! chromedriver child process management.
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::net::{Ipv4Addr, TcpListener};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use url::Url;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    value: DriverStatus,
}

/// Body of the WebDriver `GET /status` response.
#[derive(Debug, Deserialize)]
pub struct DriverStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

/// Ask a WebDriver endpoint whether it accepts new sessions.
pub async fn probe_status(http: &reqwest::Client, endpoint: &Url) -> Result<DriverStatus> {
    let status_url = endpoint.join("status")?;
    let envelope: StatusEnvelope = http
        .get(status_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(envelope.value)
}

/// Poll [`probe_status`] until the driver reports ready or `timeout` passes.
pub async fn wait_for_ready(
    http: &reqwest::Client,
    endpoint: &Url,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let last = match probe_status(http, endpoint).await {
            Ok(status) if status.ready => return Ok(()),
            Ok(status) => status.message,
            Err(e) => e.to_string(),
        };
        let now = Instant::now();
        if now >= deadline {
            bail!(
                "driver at {endpoint} not ready after {}ms: {last}",
                timeout.as_millis()
            );
        }
        sleep(poll.min(deadline - now)).await;
    }
}

/// A chromedriver listening on a private loopback port.
///
/// The child is killed on drop, so a cancelled fetch never leaks it;
/// [`shutdown`](DriverProcess::shutdown) is the orderly path.
#[derive(Debug)]
pub struct DriverProcess {
    child: Option<Child>,
    endpoint: Url,
}

impl DriverProcess {
    /// Spawn `binary --port=<free port>` and wait for it to report ready.
    pub async fn spawn(binary: &Path, startup: Duration, poll: Duration) -> Result<Self> {
        let port = free_port().context("failed to reserve a loopback port")?;
        let endpoint = Url::parse(&format!("http://127.0.0.1:{port}/"))?;

        let mut child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", binary.display()))?;

        debug!(
            target: "pagefetch.session",
            binary = %binary.display(),
            %port,
            pid = child.id(),
            "chromedriver spawned"
        );

        let http = reqwest::Client::builder()
            .timeout(poll.max(Duration::from_millis(500)))
            .build()?;

        tokio::select! {
            ready = wait_for_ready(&http, &endpoint, startup, poll) => ready?,
            exited = child.wait() => {
                let status = exited.context("failed to poll chromedriver")?;
                return Err(anyhow!("{} exited during startup with {status}", binary.display()));
            }
        }

        Ok(Self {
            child: Some(child),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Kill the process and reap it. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.start_kill() {
            warn!(target: "pagefetch.session", error = %e, "failed to signal chromedriver");
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(target: "pagefetch.session", %status, "chromedriver exited"),
            Ok(Err(e)) => warn!(target: "pagefetch.session", error = %e, "failed to reap chromedriver"),
            Err(_) => warn!(target: "pagefetch.session", "chromedriver did not exit in time"),
        }
    }
}

fn free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_port_is_nonzero() {
        assert_ne!(free_port().unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let err = DriverProcess::spawn(
            Path::new("/nonexistent/chromedriver"),
            Duration::from_secs(1),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
