use pagefetch_config::BrowserConfig;
use serde_json::{json, Value};
use webdriver::capabilities::Capabilities;

/// Page-load script hiding the most obvious automation signal.
pub const WEBDRIVER_OVERRIDE: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
"#;

/// Chrome command-line arguments for an unattended, containerized run.
pub fn build_chrome_arguments(config: &BrowserConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(16 + config.extra_args.len());
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(
        [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--disable-background-networking",
            "--disable-default-apps",
            "--disable-sync",
            "--metrics-recording-only",
            "--no-first-run",
            "--password-store=basic",
            "--use-mock-keychain",
        ]
        .map(String::from),
    );
    args.push(format!(
        "--window-size={},{}",
        config.window_width, config.window_height
    ));
    args.extend(config.extra_args.iter().cloned());
    args
}

/// The `goog:chromeOptions` object sent with the new-session request.
pub fn chrome_options(config: &BrowserConfig) -> Value {
    let mut opts = json!({
        "args": build_chrome_arguments(config),
        "excludeSwitches": ["enable-automation"],
        "useAutomationExtension": false,
        "prefs": {
            "download.prompt_for_download": false,
            "download.directory_upgrade": true,
            "safebrowsing.enabled": true,
        },
    });
    if let Some(binary) = &config.chrome_binary {
        opts["binary"] = json!(binary.to_string_lossy());
    }
    opts
}

/// W3C capabilities for a Chrome session.
pub fn build_capabilities(config: &BrowserConfig) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));
    caps.insert("goog:chromeOptions".to_string(), chrome_options(config));
    caps
}
