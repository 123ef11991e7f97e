use crate::chrome::process::DriverProcess;
use crate::chrome::session::ChromeSession;
use crate::chrome::stealth::build_capabilities;
use crate::session::{PageSession, SessionLauncher};
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use pagefetch_common::FetchError;
use pagefetch_config::{BrowserConfig, PageFetchConfig};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;
use uuid::Uuid;

const DEFAULT_DRIVER_BINARY: &str = "chromedriver";

/// Starts one Chrome per [`launch`](SessionLauncher::launch) call.
///
/// By default every launch spawns its own chromedriver on a free port, so
/// concurrent fetches never share a browser. When
/// [`BrowserConfig::webdriver_url`] is set the launcher connects there
/// instead and leaves that endpoint running on release.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    browser: BrowserConfig,
    startup_timeout: Duration,
    poll_interval: Duration,
}

impl ChromeLauncher {
    pub fn new(browser: BrowserConfig, startup_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            browser,
            startup_timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &PageFetchConfig) -> Self {
        Self::new(
            config.browser.clone(),
            Duration::from_secs(config.driver_startup_timeout_secs),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn browser(&self) -> &BrowserConfig {
        &self.browser
    }

    async fn start_driver(&self) -> Result<(Url, Option<DriverProcess>), FetchError> {
        if let Some(remote) = &self.browser.webdriver_url {
            let url = Url::parse(remote).map_err(|e| {
                FetchError::SessionStart(format!("invalid webdriver url {remote:?}: {e}"))
            })?;
            return Ok((url, None));
        }

        let binary = self
            .browser
            .chromedriver_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_DRIVER_BINARY));
        let driver = DriverProcess::spawn(binary, self.startup_timeout, self.poll_interval)
            .await
            .map_err(|e| FetchError::SessionStart(format!("{e:#}")))?;
        Ok((driver.endpoint().clone(), Some(driver)))
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, FetchError> {
        let id = Uuid::new_v4().to_string();
        let (endpoint, mut driver) = self.start_driver().await?;

        let mut builder = ClientBuilder::native();
        builder.capabilities(build_capabilities(&self.browser));
        let connect = builder.connect(endpoint.as_str());
        let client = match tokio::time::timeout(self.startup_timeout, connect).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(e)) => Err(format!("browser session refused: {e}")),
            Err(_) => Err(format!(
                "browser did not start within {}s",
                self.startup_timeout.as_secs()
            )),
        };
        let client = match client {
            Ok(client) => client,
            Err(detail) => {
                if let Some(driver) = driver.as_mut() {
                    driver.shutdown().await;
                }
                return Err(FetchError::SessionStart(detail));
            }
        };

        let session = ChromeSession::new(id, client, driver, endpoint, self.startup_timeout);
        session.install_webdriver_override().await;

        info!(
            target: "pagefetch.session",
            session_id = %session.id(),
            headless = self.browser.headless,
            "browser session started"
        );
        Ok(session)
    }
}
