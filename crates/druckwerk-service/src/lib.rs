// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Service — the print service core. Resolves document content from
// its source, sniffs and converts it where needed, and hands the resulting
// payload to the CUPS orchestrator as a tracked print operation.

pub mod convert;
pub mod providers;
pub mod resolve;
pub mod service;
pub mod sniff;
pub mod storage;

pub use providers::Providers;
pub use resolve::{ContentResolver, ContentStream, ResolvedContent};
pub use service::PrintService;
pub use storage::StorageRoot;
