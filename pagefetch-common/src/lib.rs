//! Common types shared across pagefetch crates.
//!
//! This crate holds the error taxonomy reported by a fetch, the output mode
//! enum, and the logging initializer. It stays dependency-light so that the
//! driver, orchestration and binary crates can all depend on it.
//!
//! - [`FetchError`] and [`Result`]: the three fatal failure kinds of a fetch
//! - [`OutputMode`]: markup vs. visible text
//! - [`observability`]: `tracing` setup for binaries and tests
//!
//! # Examples
//!
//! ```rust
//! use pagefetch_common::{FetchError, OutputMode};
//!
//! let err = FetchError::Navigation("timed out after 20s".into());
//! assert_eq!(err.kind(), "navigation");
//! assert_eq!(err.to_string(), "navigation: timed out after 20s");
//! assert_eq!(OutputMode::default().label(), "html");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// What the extractor returns for the page (or the selected elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Serialized HTML.
    #[default]
    Markup,
    /// Rendered, visible text.
    Text,
}

impl OutputMode {
    pub fn from_text_flag(text: bool) -> Self {
        if text {
            Self::Text
        } else {
            Self::Markup
        }
    }

    /// Label printed in report headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Markup => "html",
            Self::Text => "text",
        }
    }
}

/// Fatal outcomes of a single fetch.
///
/// Wait deadlines (document readiness, selector presence) are deliberately
/// absent: they degrade extraction instead of failing it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The target URL was rejected before any browser was started.
    #[error("invalid_input: {0}")]
    InvalidInput(String),

    /// The driver or browser process could not be brought up.
    #[error("session_start: {0}")]
    SessionStart(String),

    /// Navigation timed out, or the driver connection failed afterwards.
    #[error("navigation: {0}")]
    Navigation(String),
}

impl FetchError {
    /// Stable tag used on the CLI error line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::SessionStart(_) => "session_start",
            Self::Navigation(_) => "navigation",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidInput(d) | Self::SessionStart(d) | Self::Navigation(d) => d,
        }
    }
}

/// Convenient alias for results that use [`FetchError`].
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_tags() {
        let cases = [
            (FetchError::InvalidInput("empty_url".into()), "invalid_input"),
            (FetchError::SessionStart("no binary".into()), "session_start"),
            (FetchError::Navigation("reset".into()), "navigation"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.to_string(), format!("{kind}: {}", err.detail()));
        }
    }

    #[test]
    fn output_mode_deserializes_lowercase() {
        let mode: OutputMode = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(mode, OutputMode::Text);
        assert_eq!(OutputMode::from_text_flag(false), OutputMode::Markup);
    }
}
