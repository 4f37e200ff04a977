// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-type detection from a bounded stream prefix.
//
// Only runs when the caller declared no content type. The consumed prefix is
// stitched back in front of the remainder, so downstream readers always see
// the complete document.

use std::io::Cursor;

use tokio::io::AsyncReadExt;
use tracing::debug;

use druckwerk_core::error::{DruckwerkError, Result};

use crate::resolve::ContentStream;

/// Number of leading bytes examined for detection.
pub const DETECTION_PREFIX_LEN: usize = 512;

/// Detect the content type of `stream` and return it together with an
/// equivalent stream that still yields every byte.
///
/// An empty stream is an error: there is nothing to print and nothing to
/// detect.
pub async fn detect(mut stream: ContentStream) -> Result<(String, ContentStream)> {
    let mut prefix = vec![0u8; DETECTION_PREFIX_LEN];
    let mut filled = 0;

    while filled < prefix.len() {
        let n = stream.read(&mut prefix[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    prefix.truncate(filled);

    if prefix.is_empty() {
        return Err(DruckwerkError::InvalidArgument(
            "empty document content".into(),
        ));
    }

    let content_type = detect_content_type(&prefix);
    debug!(content_type, prefix_len = prefix.len(), "detected content type");

    Ok((
        content_type.to_string(),
        Box::new(Cursor::new(prefix).chain(stream)),
    ))
}

/// Magic-byte detection over a document prefix.
///
/// Covers the formats the service actually routes on; everything
/// unrecognized that still looks like text becomes `text/plain`, the rest
/// `application/octet-stream`.
pub fn detect_content_type(prefix: &[u8]) -> &'static str {
    if prefix.starts_with(b"%PDF-") {
        return "application/pdf";
    }
    if prefix.starts_with(b"%!") {
        return "application/postscript";
    }
    if prefix.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if prefix.starts_with(b"\xff\xd8\xff") {
        return "image/jpeg";
    }
    if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        return "image/gif";
    }
    // OOXML containers (docx, xlsx, pptx, odt, ...) are zip archives; the
    // office formats are dispatched by extension, not by this type.
    if prefix.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }
    // Legacy OLE compound documents (doc, xls, ppt).
    if prefix.starts_with(b"\xd0\xcf\x11\xe0") {
        return "application/x-ole-storage";
    }
    if looks_like_html(prefix) {
        return "text/html; charset=utf-8";
    }
    if looks_like_text(prefix) {
        return "text/plain; charset=utf-8";
    }
    "application/octet-stream"
}

fn looks_like_html(prefix: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(prefix) else {
        return false;
    };
    let trimmed = text.trim_start().as_bytes();

    const MARKERS: &[&[u8]] = &[
        b"<!doctype html",
        b"<html",
        b"<head",
        b"<body",
        b"<!--",
    ];

    MARKERS.iter().any(|marker| {
        trimmed.len() >= marker.len()
            && trimmed[..marker.len()].eq_ignore_ascii_case(marker)
    })
}

/// UTF-8 without control characters (tabs and newlines excepted) reads as
/// plain text.
fn looks_like_text(prefix: &[u8]) -> bool {
    // A prefix cut mid-codepoint must not disqualify the document.
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(e) if e.valid_up_to() > 0 && e.error_len().is_none() => {
            std::str::from_utf8(&prefix[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return false,
    };

    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}
