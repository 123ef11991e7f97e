use pagefetch_web::{FetchOutput, FetchRequest};
use std::fmt::{self, Write};

const TAG: &str = "[pagefetch]";
const RULE_WIDTH: usize = 80;

/// Header block followed by the extracted content, verbatim.
pub fn render(request: &FetchRequest, output: &FetchOutput) -> String {
    let mut out = String::with_capacity(output.content.len() + 256);
    let _ = writeln!(out, "{TAG} url={}", request.url());
    let mode = request.mode().label();
    match request.selector() {
        Some(selector) => {
            let _ = writeln!(out, "{TAG} selector={selector} mode={mode}");
        }
        None => {
            let _ = writeln!(out, "{TAG} mode={mode}");
        }
    }
    if let Some(path) = request.screenshot() {
        let _ = writeln!(out, "{TAG} screenshot={}", path.display());
    }
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    out.push_str(&output.content);
    out.push('\n');
    out
}

/// Stderr line for a logging setup failure. Only shown with `--verbose`;
/// otherwise the fetch runs without a log file and says nothing.
pub fn logging_notice(error: &dyn fmt::Display, verbose: bool) -> Option<String> {
    verbose.then(|| format!("{TAG} logging disabled: {error:#}"))
}
