//! Settings loader: defaults, optional YAML files, then environment.
//!
//! Precedence, lowest to highest:
//!
//! 1. serde defaults on [`PageFetchConfig`] / [`BrowserConfig`]
//! 2. `<config_dir>/pagefetch/pagefetch.yaml`, then `./pagefetch.yaml`
//!    (both optional), or a single explicit file passed by the caller
//! 3. `PAGEFETCH__`-prefixed variables, nested with `__`
//!    (`PAGEFETCH__BROWSER__HEADLESS=false`)
//! 4. the legacy variables `CHROME_BINARY`, `CHROMEDRIVER_PATH` and
//!    `SELENIUM_TIMEOUT`
//!
//! String values may reference `${VAR}` or `~`; they are expanded after the
//! sources are merged.
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const ENV_PREFIX: &str = "PAGEFETCH";
pub const CHROME_BINARY_ENV: &str = "CHROME_BINARY";
pub const CHROMEDRIVER_PATH_ENV: &str = "CHROMEDRIVER_PATH";
pub const TIMEOUT_ENV: &str = "SELENIUM_TIMEOUT";
pub const CONFIG_FILE_NAME: &str = "pagefetch.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageFetchConfig {
    /// Navigation timeout, and the default for each readiness wait.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,
    /// Interval between readiness probes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long chromedriver may take to answer `/status` and open a session.
    #[serde(default = "default_driver_startup_timeout_secs")]
    pub driver_startup_timeout_secs: u64,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for PageFetchConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            driver_startup_timeout_secs: default_driver_startup_timeout_secs(),
            browser: BrowserConfig::default(),
        }
    }
}

/// Everything the session manager needs to bring up Chrome.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Chrome executable; chromedriver's own discovery is used when unset.
    #[serde(default)]
    pub chrome_binary: Option<PathBuf>,
    /// chromedriver executable; resolved from `PATH` when unset.
    #[serde(default)]
    pub chromedriver_path: Option<PathBuf>,
    /// Connect to an already running WebDriver endpoint instead of spawning one.
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Appended after the built-in Chrome flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_binary: None,
            chromedriver_path: None,
            webdriver_url: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            extra_args: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_driver_startup_timeout_secs() -> u64 {
    15
}
fn default_headless() -> bool {
    true
}
fn default_window_width() -> u32 {
    1365
}
fn default_window_height() -> u32 {
    768
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') || s.starts_with('~') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = match shellexpand::full(&cur) {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => break,
                };
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Location of the per-user settings file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pagefetch").join(CONFIG_FILE_NAME))
}

/// Builder over the `config` crate sources.
pub struct PageFetchConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for PageFetchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetchConfigLoader {
    /// Start with no file sources; environment layers are added by [`load`](Self::load).
    ///
    /// ```
    /// use pagefetch_config::PageFetchConfigLoader;
    ///
    /// let config = PageFetchConfigLoader::new()
    ///     .with_yaml_str("poll_interval_ms: 100")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.poll_interval_ms, 100);
    /// assert!(config.browser.headless);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Standard discovery: an explicit path is required to exist; otherwise
    /// the user and working-directory files are read if present.
    pub fn discover(explicit: Option<&Path>) -> Self {
        let loader = Self::new();
        if let Some(path) = explicit {
            return loader.with_file(path);
        }
        let loader = match user_config_path() {
            Some(path) => loader.with_optional_file(path),
            None => loader,
        };
        loader.with_optional_file(CONFIG_FILE_NAME)
    }

    /// Attach a YAML/TOML/JSON file that must exist; format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use pagefetch_config::PageFetchConfigLoader;
    ///
    /// let cfg = PageFetchConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// default_timeout_secs: 45
    /// browser:
    ///   headless: false
    ///   extra_args: ["--lang=en-US"]
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.default_timeout_secs, 45);
    /// assert!(!cfg.browser.headless);
    /// assert_eq!(cfg.browser.window_width, 1365);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Add the environment layers, merge, expand `${VAR}` and deserialize.
    pub fn load(self) -> Result<PageFetchConfig, ConfigError> {
        let timeout = match non_empty_env(TIMEOUT_ENV) {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                ConfigError::Message(format!("{TIMEOUT_ENV}={raw:?} is not a number of seconds: {e}"))
            })?),
            None => None,
        };

        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("browser.chrome_binary", non_empty_env(CHROME_BINARY_ENV))?
            .set_override_option("browser.chromedriver_path", non_empty_env(CHROMEDRIVER_PATH_ENV))?
            .set_override_option("default_timeout_secs", timeout)?
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
