// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk CUPS — async IPP client for the CUPS backend plus the print
// orchestrator that bridges synchronous job submission with externally
// tracked long-running operations.

pub mod attrs;
pub mod backend;
pub mod client;
pub mod jobs;
pub mod print;
pub mod printer;

pub use backend::{PrintBackend, SubmitDocument, SubmitOptions};
pub use client::CupsClient;
pub use print::PrintOrchestrator;
