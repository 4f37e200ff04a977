// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The backend seam: everything the service and orchestrator need from a
// printing backend, object safe so tests can substitute a scripted fake.

use async_trait::async_trait;

use druckwerk_core::error::Result;
use druckwerk_core::types::{ColorMode, Job, Orientation, Printer};

/// A fully resolved, ready-to-submit document payload.
///
/// By this point all content resolution and conversion has happened;
/// `content_type` is the authoritative type of `payload`.
#[derive(Debug, Clone)]
pub struct SubmitDocument {
    pub name: String,
    pub content_type: String,
    pub payload: Vec<u8>,
}

/// Submission parameters beyond the document itself.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub requesting_user: String,
    pub orientation: Orientation,
    pub color_mode: ColorMode,
    /// Correlation id injected by the orchestrator after registration.
    pub operation_id: Option<String>,
}

/// Printing backend operations used by the service and the orchestrator.
///
/// Implementations must be safe for concurrent use from multiple in-flight
/// jobs; they hold no per-request mutable state.
#[async_trait]
pub trait PrintBackend: Send + Sync {
    async fn list_printers(&self) -> Result<Vec<Printer>>;

    /// Jobs on one printer, or across all printers when `printer` is `None`.
    async fn list_jobs(&self, printer: Option<&str>) -> Result<Vec<Job>>;

    async fn job_by_id(&self, id: i32) -> Result<Job>;

    /// Submit a print job, returning the backend-assigned job id.
    ///
    /// `printer` falls back to the backend's default printer when `None`;
    /// having neither is an error.
    async fn submit_job(
        &self,
        document: SubmitDocument,
        printer: Option<&str>,
        options: &SubmitOptions,
    ) -> Result<i32>;
}
