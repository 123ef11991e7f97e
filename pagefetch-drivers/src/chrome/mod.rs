//! Chrome backend: chromedriver process, WebDriver session, launch flags.
pub mod launcher;
pub mod process;
pub mod session;
pub mod stealth;

pub use launcher::ChromeLauncher;
pub use session::ChromeSession;
