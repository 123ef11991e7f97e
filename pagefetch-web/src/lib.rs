//! Single-page fetch orchestration.
//!
//! - [`request`]: the validated input of one fetch
//! - [`ready`]: bounded readiness waits (document state, selector presence)
//! - [`extract`]: markup / visible-text extraction and snapshots
//! - [`fetcher`]: the [`Fetcher`] that strings them together and always
//!   releases the browser session
//!
//! Wait deadlines are tolerated; only session start and navigation failures
//! are returned as errors.

pub mod extract;
pub mod fetcher;
pub mod ready;
pub mod request;

pub use fetcher::{Fetcher, release};
pub use ready::ReadinessState;
pub use request::{FetchOutput, FetchRequest, validate_url};
