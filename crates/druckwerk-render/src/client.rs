// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gotenberg-compatible rendering client.
//
// Two conversion routes are used:
//   - /forms/chromium/convert/html   (HTML → PDF via headless Chromium)
//   - /forms/libreoffice/convert     (office formats → PDF via LibreOffice)

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::Orientation;

/// Wait budget granted to the HTML renderer before capture.
const HTML_WAIT_DELAY: &str = "3s";

/// A4 paper dimensions in inches, as the chromium route expects them.
const A4_WIDTH_IN: &str = "8.27";
const A4_HEIGHT_IN: &str = "11.7";

/// Normal margins in inches.
const MARGIN_IN: &str = "0.39";

/// External document-to-PDF rendering.
///
/// Both methods take the full document body and return the rendered PDF
/// bytes; the resulting content type is always `application/pdf`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_html(
        &self,
        name: &str,
        body: Vec<u8>,
        orientation: Orientation,
    ) -> Result<Vec<u8>>;

    async fn render_office(
        &self,
        name: &str,
        body: Vec<u8>,
        orientation: Orientation,
    ) -> Result<Vec<u8>>;
}

/// HTTP client for a Gotenberg-compatible rendering service.
pub struct RenderClient {
    base_url: String,
    http: reqwest::Client,
}

impl RenderClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn send(&self, route: &str, form: Form) -> Result<Vec<u8>> {
        let url = format!("{}{route}", self.base_url);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DruckwerkError::Render(format!("POST {route}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DruckwerkError::Render(format!(
                "POST {route} returned {status}: {detail}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DruckwerkError::Render(format!("POST {route}: reading body: {e}")))?;

        debug!(route, size = bytes.len(), "document rendered");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentRenderer for RenderClient {
    /// Render an HTML document to PDF.
    ///
    /// Waits a fixed delay instead of the network-idle event, and fails the
    /// conversion when the page reports console errors.
    #[instrument(skip(self, body), fields(name = %name, size = body.len()))]
    async fn render_html(
        &self,
        name: &str,
        body: Vec<u8>,
        orientation: Orientation,
    ) -> Result<Vec<u8>> {
        // The chromium route renders whatever file is named index.html; the
        // original document name only survives as part metadata.
        let form = Form::new()
            .part("files", Part::bytes(body).file_name("index.html"))
            .text("waitDelay", HTML_WAIT_DELAY)
            .text("skipNetworkIdleEvent", "true")
            .text("failOnConsoleExceptions", "true")
            .text("paperWidth", A4_WIDTH_IN)
            .text("paperHeight", A4_HEIGHT_IN)
            .text("marginTop", MARGIN_IN)
            .text("marginBottom", MARGIN_IN)
            .text("marginLeft", MARGIN_IN)
            .text("marginRight", MARGIN_IN)
            .text(
                "landscape",
                if orientation == Orientation::Landscape {
                    "true"
                } else {
                    "false"
                },
            );

        debug!(name, "rendering HTML document");
        self.send("/forms/chromium/convert/html", form).await
    }

    /// Render an office document (docx, odt, xlsx, ...) to PDF.
    #[instrument(skip(self, body), fields(name = %name, size = body.len()))]
    async fn render_office(
        &self,
        name: &str,
        body: Vec<u8>,
        orientation: Orientation,
    ) -> Result<Vec<u8>> {
        // LibreOffice picks the import filter from the file extension, so the
        // original name must be preserved here.
        let form = Form::new()
            .part("files", Part::bytes(body).file_name(name.to_string()))
            .text(
                "landscape",
                if orientation == Orientation::Landscape {
                    "true"
                } else {
                    "false"
                },
            );

        debug!(name, "rendering office document");
        self.send("/forms/libreoffice/convert", form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = RenderClient::new("http://gotenberg.internal:3000/");
        assert_eq!(client.base_url, "http://gotenberg.internal:3000");
    }
}
