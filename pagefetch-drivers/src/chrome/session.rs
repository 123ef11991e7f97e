use crate::chrome::process::DriverProcess;
use crate::chrome::stealth::WEBDRIVER_OVERRIDE;
use crate::session::PageSession;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, Locator};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// A WebDriver session on Chrome, plus the chromedriver it runs through
/// when that driver was spawned for this session.
pub struct ChromeSession {
    id: String,
    client: Option<Client>,
    driver: Option<DriverProcess>,
    endpoint: Url,
    command_timeout: Duration,
}

impl ChromeSession {
    pub(crate) fn new(
        id: String,
        client: Client,
        driver: Option<DriverProcess>,
        endpoint: Url,
        command_timeout: Duration,
    ) -> Self {
        Self {
            id,
            client: Some(client),
            driver,
            endpoint,
            command_timeout,
        }
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("session {} is already closed", self.id))
    }

    /// Register [`WEBDRIVER_OVERRIDE`] to run before any page script.
    ///
    /// Uses chromedriver's CDP passthrough; any failure is logged and ignored.
    pub(crate) async fn install_webdriver_override(&self) {
        if let Err(e) = self.try_install_webdriver_override().await {
            debug!(
                target: "pagefetch.session",
                session_id = %self.id,
                error = %e,
                "webdriver override not installed"
            );
        }
    }

    async fn try_install_webdriver_override(&self) -> Result<()> {
        let session = self
            .client()?
            .session_id()
            .await?
            .context("driver did not report a session id")?;
        add_script_on_new_document(
            &self.endpoint,
            &session,
            WEBDRIVER_OVERRIDE,
            self.command_timeout,
        )
        .await
    }
}

/// Ask chromedriver to run `source` before every page script, through its
/// `goog/cdp/execute` passthrough. The whole request is bounded by `timeout`.
pub async fn add_script_on_new_document(
    endpoint: &Url,
    session_id: &str,
    source: &str,
    timeout: Duration,
) -> Result<()> {
    let cdp_url = endpoint.join(&format!("session/{session_id}/goog/cdp/execute"))?;
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("building CDP http client")?;
    http.post(cdp_url)
        .json(&json!({
            "cmd": "Page.addScriptToEvaluateOnNewDocument",
            "params": { "source": source },
        }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[async_trait]
impl PageSession for ChromeSession {
    type Element = Element;

    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        let client = self.client()?;
        if let Err(e) = client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timeout), None))
            .await
        {
            debug!(target: "pagefetch.session", error = %e, "page load timeout not applied");
        }
        client.goto(url.as_str()).await?;
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<String> {
        let value = self
            .client()?
            .execute("return document.readyState;", vec![])
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("unexpected readyState value: {value}"))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.client()?.find_all(Locator::Css(selector)).await?)
    }

    async fn outer_html(&mut self, element: &Element) -> Result<String> {
        Ok(element.html(false).await?)
    }

    async fn visible_text(&mut self, element: &Element) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn body_text(&mut self) -> Result<Option<String>> {
        let body = match self.client()?.find(Locator::Css("body")).await {
            Ok(body) => body,
            Err(e) => {
                debug!(target: "pagefetch.session", error = %e, "no body element");
                return Ok(None);
            }
        };
        Ok(Some(body.text().await?))
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.client()?.source().await?)
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        Ok(self.client()?.screenshot().await?)
    }

    async fn close(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        if let Err(e) = client.close().await {
            warn!(
                target: "pagefetch.session",
                session_id = %self.id,
                error = %e,
                "browser session did not close cleanly"
            );
        }
        if let Some(driver) = self.driver.as_mut() {
            driver.shutdown().await;
        }
        info!(target: "pagefetch.session", session_id = %self.id, "session released");
    }
}
