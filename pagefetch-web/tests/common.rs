//! Scripted in-memory browser used by the fetch integration tests.
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use pagefetch_common::FetchError;
use pagefetch_common::observability::{LogConfig, init_logging};
use pagefetch_drivers::{PageSession, SessionLauncher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "pagefetch-tests",
            log_dir: Some(std::env::temp_dir().join("pagefetch-tests")),
            default_filter: "debug",
            ..LogConfig::default()
        };
        init_logging(config).unwrap_or_default()
    });
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub markup: String,
    pub text: String,
}

pub fn element(markup: &str, text: &str) -> FakeElement {
    FakeElement {
        markup: markup.to_string(),
        text: text.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NavigationScript {
    Succeed,
    Fail,
    Hang,
}

/// What every session launched from a [`ScriptedLauncher`] looks like.
#[derive(Debug, Clone)]
pub struct PageScript {
    pub navigation: NavigationScript,
    /// `document.readyState` values returned in order; the last one repeats.
    pub ready_states: Vec<&'static str>,
    pub elements: HashMap<String, Vec<FakeElement>>,
    /// Selector probes that come back empty before elements show up.
    pub selector_misses: usize,
    pub body_text: Option<String>,
    pub source: String,
    pub screenshot_png: Vec<u8>,
    /// Make element reads fail as if the driver connection dropped.
    pub broken_reads: bool,
    /// Make every element lookup fail as the browser does for bad CSS.
    pub reject_selectors: bool,
}

impl Default for PageScript {
    fn default() -> Self {
        Self {
            navigation: NavigationScript::Succeed,
            ready_states: vec!["complete"],
            elements: HashMap::new(),
            selector_misses: 0,
            body_text: Some("Example body".to_string()),
            source: "<html><body>Example body</body></html>".to_string(),
            screenshot_png: b"\x89PNG\r\n\x1a\nfake".to_vec(),
            broken_reads: false,
            reject_selectors: false,
        }
    }
}

impl PageScript {
    pub fn with_elements(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub starts: AtomicUsize,
    pub closes: AtomicUsize,
    pub navigations: AtomicUsize,
    pub ready_probes: AtomicUsize,
    pub selector_probes: AtomicUsize,
}

impl Counters {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }
    pub fn ready_probes(&self) -> usize {
        self.ready_probes.load(Ordering::SeqCst)
    }
    pub fn selector_probes(&self) -> usize {
        self.selector_probes.load(Ordering::SeqCst)
    }
}

pub struct ScriptedLauncher {
    pub script: PageScript,
    pub counters: Arc<Counters>,
    pub fail_launch: bool,
}

impl ScriptedLauncher {
    pub fn new(script: PageScript) -> Self {
        Self {
            script,
            counters: Arc::new(Counters::default()),
            fail_launch: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(PageScript::default())
        }
    }
}

#[async_trait]
impl SessionLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    async fn launch(&self) -> Result<ScriptedSession, FetchError> {
        if self.fail_launch {
            return Err(FetchError::SessionStart(
                "chromedriver: No such file or directory".into(),
            ));
        }
        let n = self.counters.starts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ScriptedSession {
            id: format!("scripted-{n}"),
            script: self.script.clone(),
            counters: self.counters.clone(),
            ready_index: 0,
            closed: false,
        })
    }
}

pub struct ScriptedSession {
    id: String,
    script: PageScript,
    counters: Arc<Counters>,
    ready_index: usize,
    closed: bool,
}

impl ScriptedSession {
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(anyhow!("session {} is closed", self.id));
        }
        Ok(())
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    type Element = FakeElement;

    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&mut self, _url: &Url, _timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        match self.script.navigation {
            NavigationScript::Succeed => Ok(()),
            NavigationScript::Fail => Err(anyhow!("net::ERR_NAME_NOT_RESOLVED")),
            NavigationScript::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn ready_state(&mut self) -> Result<String> {
        self.ensure_open()?;
        self.counters.ready_probes.fetch_add(1, Ordering::SeqCst);
        let states = &self.script.ready_states;
        let state = states
            .get(self.ready_index)
            .or(states.last())
            .copied()
            .unwrap_or("loading");
        self.ready_index += 1;
        Ok(state.to_string())
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<FakeElement>> {
        self.ensure_open()?;
        let probe = self.counters.selector_probes.fetch_add(1, Ordering::SeqCst);
        if self.script.reject_selectors {
            return Err(anyhow!("invalid selector: {selector}"));
        }
        if probe < self.script.selector_misses {
            return Ok(Vec::new());
        }
        Ok(self.script.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn outer_html(&mut self, element: &FakeElement) -> Result<String> {
        self.ensure_open()?;
        if self.script.broken_reads {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(element.markup.clone())
    }

    async fn visible_text(&mut self, element: &FakeElement) -> Result<String> {
        self.ensure_open()?;
        if self.script.broken_reads {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(element.text.clone())
    }

    async fn body_text(&mut self) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.script.body_text.clone())
    }

    async fn page_source(&mut self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.script.source.clone())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        Ok(self.script.screenshot_png.clone())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}
