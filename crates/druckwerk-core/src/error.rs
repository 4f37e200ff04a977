// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckwerk.

use thiserror::Error;

/// Top-level error type for all Druckwerk operations.
///
/// The first four variants map one-to-one onto the error conditions the
/// service reports to callers; the rest describe failures of external
/// collaborators (CUPS, the rendering service, the operation tracker).
#[derive(Debug, Error)]
pub enum DruckwerkError {
    // -- Request errors --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    // -- Collaborator errors --
    #[error("print backend error: {0}")]
    Backend(String),

    #[error("document rendering failed: {0}")]
    Render(String),

    #[error("operation service error: {0}")]
    Operations(String),

    #[error("content download failed: {0}")]
    Download(String),

    // -- Infrastructure --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DruckwerkError>;
