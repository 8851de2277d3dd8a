use crate::engine::BrowserEngine;
use crate::error::{BrowserError, Result};
use crate::session::{BrowserSession, SessionHandle};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Renders captured page HTML into a durable artifact.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render `html` into a PDF at `path`.
    async fn render_to_file(&self, html: &str, path: &Path) -> Result<()>;
}

/// PDF renderer backed by the same Chromium instance used for lookups.
///
/// Chromium prints from a navigated page, so the HTML is staged in a scratch
/// file and loaded over `file://` before printing.
pub struct ChromiumRenderer {
    engine: Arc<BrowserEngine>,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(engine: Arc<BrowserEngine>) -> Self {
        Self { engine }
    }

    async fn print_pdf(session: &SessionHandle, url: &str, path: &Path) -> Result<()> {
        session.navigate(url).await?;
        let bytes = session.print_to_pdf().await?;
        std::fs::write(path, bytes).map_err(|e| BrowserError::Render(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for ChromiumRenderer {
    async fn render_to_file(&self, html: &str, path: &Path) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("rdfetch-render-")
            .suffix(".html")
            .tempfile()
            .map_err(|e| BrowserError::Render(e.to_string()))?;
        std::fs::write(scratch.path(), html).map_err(|e| BrowserError::Render(e.to_string()))?;

        let file_url = format!("file://{}", scratch.path().display());
        let session = self.engine.new_session().await?;
        let result = Self::print_pdf(&session, &file_url, path).await;
        session.close().await;
        result
    }
}
