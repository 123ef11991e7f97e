//! Browser session layer.
//!
//! The orchestrator in `pagefetch-web` only talks to the traits in
//! [`session`]; this crate also ships the Chrome implementation that backs
//! them in production.
//!
//! - [`session::SessionLauncher`] / [`session::PageSession`]: the capability boundary
//! - [`chrome::ChromeLauncher`]: spawns chromedriver and opens a WebDriver session
//! - [`chrome::ChromeSession`]: `fantoccini` client bound to that driver process
//! - [`chrome::stealth`]: Chrome flags and the `navigator.webdriver` override
pub mod chrome;
pub mod session;

pub use session::{PageSession, SessionLauncher};
