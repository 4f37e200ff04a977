// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Render — client for the external document-rendering service.
// Druckwerk never renders documents itself; HTML and office formats are
// shipped to a Gotenberg-compatible service and come back as PDF bytes.

pub mod client;

pub use client::{DocumentRenderer, RenderClient};
