//! Content extraction from the current page state.
//!
//! A selector that matches nothing falls back to the whole document rather
//! than producing an error, which also hides typos in the selector. The
//! fallback is logged and reported through [`Extraction::selector_matched`].
use anyhow::{Context, Result};
use pagefetch_common::OutputMode;
use pagefetch_drivers::PageSession;
use std::path::Path;
use tracing::{debug, info};

/// Separator placed between the blocks of a multi-element extraction.
pub const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub content: String,
    pub snapshot_written: bool,
    pub selector_matched: Option<bool>,
}

/// Join per-element blocks in document order. Empty blocks are dropped when
/// `skip_empty` is set.
pub fn join_blocks<I>(blocks: I, skip_empty: bool) -> String
where
    I: IntoIterator<Item = String>,
{
    blocks
        .into_iter()
        .filter(|b| !(skip_empty && b.is_empty()))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Write a PNG of the viewport to `path`.
pub async fn capture_snapshot<S: PageSession>(session: &mut S, path: &Path) -> Result<()> {
    let png = session.screenshot().await.context("screenshot failed")?;
    tokio::fs::write(path, &png)
        .await
        .with_context(|| format!("failed to write screenshot to {}", path.display()))?;
    debug!(
        target: "pagefetch.extract",
        path = %path.display(),
        bytes = png.len(),
        "snapshot written"
    );
    Ok(())
}

/// Snapshot (if requested) then read content for `selector` or the whole
/// document.
pub async fn extract<S: PageSession>(
    session: &mut S,
    selector: Option<&str>,
    mode: OutputMode,
    snapshot: Option<&Path>,
) -> Result<Extraction> {
    let snapshot_written = match snapshot {
        Some(path) => {
            capture_snapshot(session, path).await?;
            true
        }
        None => false,
    };

    let mut selector_matched = None;
    if let Some(selector) = selector {
        let elements = session.find_elements(selector).await?;
        selector_matched = Some(!elements.is_empty());
        if !elements.is_empty() {
            let mut blocks = Vec::with_capacity(elements.len());
            for element in &elements {
                blocks.push(match mode {
                    OutputMode::Text => session.visible_text(element).await?,
                    OutputMode::Markup => session.outer_html(element).await?,
                });
            }
            debug!(
                target: "pagefetch.extract",
                %selector,
                matched = elements.len(),
                "extracted selected elements"
            );
            return Ok(Extraction {
                content: join_blocks(blocks, mode == OutputMode::Text),
                snapshot_written,
                selector_matched,
            });
        }
        info!(
            target: "pagefetch.extract",
            %selector,
            "selector matched nothing; using the whole document"
        );
    }

    Ok(Extraction {
        content: whole_document(session, mode).await?,
        snapshot_written,
        selector_matched,
    })
}

/// Body text in text mode (page source if there is no body), page source
/// otherwise.
pub async fn whole_document<S: PageSession>(session: &mut S, mode: OutputMode) -> Result<String> {
    if mode == OutputMode::Text {
        if let Some(text) = session.body_text().await? {
            return Ok(text);
        }
    }
    session.page_source().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_blocks_keep_document_order() {
        let joined = join_blocks(vec!["<p>A</p>".to_string(), "<p>B</p>".to_string()], false);
        assert_eq!(joined, "<p>A</p>\n\n<p>B</p>");
    }

    #[test]
    fn empty_text_blocks_leave_no_separator() {
        let joined = join_blocks(vec![String::new(), "Hello".to_string(), String::new()], true);
        assert_eq!(joined, "Hello");
    }

    #[test]
    fn nothing_to_join_is_empty() {
        assert_eq!(join_blocks(Vec::<String>::new(), true), "");
    }
}
