use pagefetch_config::PageFetchConfigLoader;
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::fs;
use tempfile::TempDir;

const LEGACY_VARS: [&str; 3] = ["CHROME_BINARY", "CHROMEDRIVER_PATH", "SELENIUM_TIMEOUT"];

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

fn without_legacy_vars<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars(LEGACY_VARS.map(|k| (k, None::<&str>)), f)
}

#[test]
#[serial]
fn file_values_are_loaded() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "pagefetch.yaml",
        r#"
default_timeout_secs: 30
poll_interval_ms: 50
browser:
  headless: false
  chromedriver_path: /usr/local/bin/chromedriver
  window_width: 1920
  window_height: 1080
"#,
    );

    let cfg = without_legacy_vars(|| PageFetchConfigLoader::new().with_file(&p).load())
        .expect("load config");

    assert_eq!(cfg.default_timeout_secs, 30);
    assert_eq!(cfg.poll_interval_ms, 50);
    assert!(!cfg.browser.headless);
    assert_eq!(
        cfg.browser.chromedriver_path.as_deref(),
        Some(Path::new("/usr/local/bin/chromedriver"))
    );
    assert_eq!(cfg.browser.window_width, 1920);
}

#[test]
#[serial]
fn legacy_env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "pagefetch.yaml",
        "default_timeout_secs: 30\nbrowser:\n  chrome_binary: /from/file\n",
    );

    let cfg = temp_env::with_vars(
        [
            ("SELENIUM_TIMEOUT", Some("7")),
            ("CHROME_BINARY", Some("/opt/chrome/chrome")),
            ("CHROMEDRIVER_PATH", Some("  ")),
        ],
        || PageFetchConfigLoader::new().with_file(&p).load(),
    )
    .expect("load config");

    assert_eq!(cfg.default_timeout_secs, 7);
    assert_eq!(
        cfg.browser.chrome_binary.as_deref(),
        Some(Path::new("/opt/chrome/chrome"))
    );
    assert_eq!(cfg.browser.chromedriver_path, None);
}

#[test]
#[serial]
fn prefixed_env_overrides_nested_keys() {
    let cfg = temp_env::with_vars(
        [
            ("PAGEFETCH__BROWSER__HEADLESS", Some("false")),
            ("PAGEFETCH__POLL_INTERVAL_MS", Some("125")),
            ("SELENIUM_TIMEOUT", None),
            ("CHROME_BINARY", None),
            ("CHROMEDRIVER_PATH", None),
        ],
        || PageFetchConfigLoader::new().load(),
    )
    .expect("load config");

    assert!(!cfg.browser.headless);
    assert_eq!(cfg.poll_interval_ms, 125);
}

#[test]
#[serial]
fn non_numeric_timeout_is_rejected() {
    let err = temp_env::with_var("SELENIUM_TIMEOUT", Some("soon"), || {
        PageFetchConfigLoader::new().load()
    })
    .unwrap_err();
    assert!(err.to_string().contains("SELENIUM_TIMEOUT"));
}

#[test]
#[serial]
fn explicit_missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.yaml");
    let result = without_legacy_vars(|| PageFetchConfigLoader::discover(Some(&missing)).load());
    assert!(result.is_err());
}

#[test]
#[serial]
fn discovery_without_files_uses_defaults() {
    let cfg = without_legacy_vars(|| PageFetchConfigLoader::discover(None).load())
        .expect("defaults load");
    assert_eq!(cfg.driver_startup_timeout_secs, 15);
}
