// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Ops — client for the external long-running-operation service.
// Every print submission is tracked end-to-end as one operation: registered
// before the job exists, updated while it prints, completed exactly once.

pub mod client;
pub mod types;

pub use client::{HttpOperationsClient, OperationsClient};
pub use types::*;
