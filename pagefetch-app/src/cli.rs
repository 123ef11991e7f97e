use clap::Parser;
use pagefetch_common::OutputMode;
use pagefetch_config::PageFetchConfig;
use pagefetch_web::FetchRequest;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for every seconds-valued flag: one day.
const MAX_SECONDS: u64 = 86_400;

/// Fetch rendered page content using headless Chrome.
#[derive(Debug, Parser)]
#[command(name = "pagefetch", version, about)]
pub struct Cli {
    /// Target URL (http/https)
    pub url: String,

    /// Page load / wait timeout in seconds (default: SELENIUM_TIMEOUT or 20)
    #[arg(long, value_parser = clap::value_parser!(u64).range(..=MAX_SECONDS))]
    pub timeout: Option<u64>,

    /// Document-ready wait in seconds (default: --timeout)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(..=MAX_SECONDS))]
    pub load_timeout: Option<u64>,

    /// Selector wait in seconds (default: --timeout)
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(..=MAX_SECONDS))]
    pub selector_timeout: Option<u64>,

    /// Fixed sleep in seconds after the document is ready (useful for SPAs)
    #[arg(long, default_value = "0", value_parser = parse_seconds)]
    pub wait: Duration,

    /// CSS selector to scope output (e.g. 'main', '#content', '.article')
    #[arg(long)]
    pub selector: Option<String>,

    /// Output visible text instead of HTML
    #[arg(long)]
    pub text: bool,

    /// Save a PNG screenshot to this path
    #[arg(long, value_name = "PATH")]
    pub screenshot: Option<PathBuf>,

    /// Settings file (default: ./pagefetch.yaml and the user config dir)
    #[arg(long, env = "PAGEFETCH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use a running WebDriver endpoint instead of spawning chromedriver
    #[arg(long, value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Mirror logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|e| format!("{raw:?} is not a number: {e}"))?;
    let delay = Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("{raw:?} must be a non-negative number of seconds"))?;
    if delay > Duration::from_secs(MAX_SECONDS) {
        return Err(format!("{raw:?} exceeds the {MAX_SECONDS}s limit"));
    }
    Ok(delay)
}

impl Cli {
    /// Fold command-line overrides into the loaded settings.
    pub fn apply_overrides(&self, config: &mut PageFetchConfig) {
        if let Some(url) = &self.webdriver_url {
            config.browser.webdriver_url = Some(url.clone());
        }
        if self.headed {
            config.browser.headless = false;
        }
    }

    pub fn to_request(&self, config: &PageFetchConfig) -> FetchRequest {
        let timeout = Duration::from_secs(self.timeout.unwrap_or(config.default_timeout_secs));
        FetchRequest::new(self.url.clone())
            .with_timeout(timeout)
            .with_load_timeout(self.load_timeout.map_or(timeout, Duration::from_secs))
            .with_selector_timeout(self.selector_timeout.map_or(timeout, Duration::from_secs))
            .with_settle_delay(self.wait)
            .with_selector(self.selector.clone())
            .with_mode(OutputMode::from_text_flag(self.text))
            .with_screenshot(self.screenshot.clone())
    }
}
