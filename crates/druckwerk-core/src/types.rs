// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckwerk print orchestration service.

use serde::{Deserialize, Serialize};

/// Operational state of a physical printer as reported by CUPS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterState {
    #[default]
    Unknown,
    Idle,
    Processing,
    Stopped,
}

impl std::fmt::Display for PrinterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Lifecycle states of a CUPS print job (RFC 8011 §5.3.7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[default]
    Unknown,
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Complete,
}

impl JobState {
    /// Whether this state ends the polling loop.
    ///
    /// Pending, held, and processing jobs are still moving; everything else
    /// (including `Unknown`) is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Held | Self::Processing)
    }

    /// Collapse the full job state machine into the coarse state exposed to
    /// external consumers.
    ///
    /// Total over all variants: every job state maps to exactly one public
    /// state. Consumers only need "still going / succeeded / failed"
    /// granularity; the richer internal states exist to drive the polling
    /// loop.
    pub fn to_public(&self) -> PrintState {
        match self {
            Self::Pending | Self::Held => PrintState::Pending,
            Self::Processing => PrintState::Printing,
            Self::Stopped | Self::Canceled | Self::Aborted => PrintState::Cancelled,
            Self::Complete => PrintState::Completed,
            Self::Unknown => PrintState::Unspecified,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Pending => "pending",
            Self::Held => "held",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
            Self::Canceled => "canceled",
            Self::Aborted => "aborted",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Coarse print-job state exposed to external consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintState {
    #[default]
    Unspecified,
    Pending,
    Printing,
    Cancelled,
    Completed,
}

/// A physical printer known to the CUPS backend.
///
/// Read-only snapshot per query; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Printer {
    pub name: String,
    pub uri: String,
    pub state: PrinterState,
    pub state_reason: String,
    pub state_message: String,
    pub location: String,
    pub info: String,
    pub model: String,
}

/// A print job as observed on the CUPS backend.
///
/// All fields are owned by the backend; the orchestrator observes them but
/// never writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    /// Backend-assigned job id, unique within the backend's lifetime.
    pub id: i32,
    pub name: String,
    pub state: JobState,
    pub printer_uri: String,
    /// Friendly printer name resolved from the uri.
    pub printer_name: String,
    /// Media progress percentage.
    pub progress: i32,
    /// Correlation token linking this job to the long-running operation that
    /// submitted it. Set once at submission, immutable afterwards.
    pub operation_id: String,
}

/// Color mode requested for a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Color,
    Grayscale,
}

impl ColorMode {
    /// IPP `print-color-mode` keyword.
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Color => "color",
            Self::Grayscale => "grayscale",
        }
    }
}

/// Page orientation requested for a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// IPP `orientation-requested` keyword.
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Where a document's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Inline bytes supplied with the request.
    Data(Vec<u8>),
    /// Path relative to the configured storage root.
    FilePath(String),
    /// Remote URL, downloaded before printing.
    Url(String),
}

/// A unit of printable work as described by the caller.
///
/// Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    /// Declared MIME type. When absent the type is sniffed from the first
    /// bytes of the content.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Target printer name. When absent the backend's default printer is
    /// used.
    #[serde(default)]
    pub printer: Option<String>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub color_mode: ColorMode,
    pub source: DocumentSource,
}

/// Authenticated caller identity, provided by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub username: String,
}
