// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion dispatch: decide per document whether the rendering service
// must turn it into PDF before submission.

use tracing::{debug, info};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::Orientation;
use druckwerk_render::DocumentRenderer;

/// File extensions routed through the office conversion path.
pub const OFFICE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "ppt", "pptx", "odt", "xls", "xlsx", "fodt", "ods", "fods", "odp", "fodp",
    "odf", "epub",
];

/// MIME type of every conversion result.
const PDF: &str = "application/pdf";

/// Strip MIME parameters: `text/html; charset=utf-8` → `text/html`.
fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// Whether `name` carries an office-format extension.
pub fn is_office_document(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            OFFICE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Convert `body` to PDF when its type requires it, else pass it through.
///
/// Returns the authoritative content type and payload of whatever gets
/// submitted. Needing conversion without a configured renderer is an
/// `Unavailable` error, not silent passthrough.
pub async fn maybe_convert(
    renderer: Option<&dyn DocumentRenderer>,
    name: &str,
    content_type: &str,
    body: Vec<u8>,
    orientation: Orientation,
) -> Result<(String, Vec<u8>)> {
    match essence(content_type) {
        // Directly printable; CUPS handles these natively.
        "application/pdf" | "application/postscript" | "text/plain" => {
            debug!(name, content_type, "document is directly printable");
            Ok((content_type.to_string(), body))
        }
        "text/html" => {
            let renderer = require_renderer(renderer, content_type)?;
            info!(name, "converting HTML document to PDF");
            let pdf = renderer.render_html(name, body, orientation).await?;
            Ok((PDF.to_string(), pdf))
        }
        _ if is_office_document(name) => {
            let renderer = require_renderer(renderer, content_type)?;
            info!(name, content_type, "converting office document to PDF");
            let pdf = renderer.render_office(name, body, orientation).await?;
            Ok((PDF.to_string(), pdf))
        }
        _ => {
            debug!(name, content_type, "no conversion route, passing through");
            Ok((content_type.to_string(), body))
        }
    }
}

fn require_renderer<'a>(
    renderer: Option<&'a dyn DocumentRenderer>,
    content_type: &str,
) -> Result<&'a dyn DocumentRenderer> {
    renderer.ok_or_else(|| {
        DruckwerkError::Unavailable(format!(
            "converting {content_type:?} requires a configured rendering service"
        ))
    })
}
