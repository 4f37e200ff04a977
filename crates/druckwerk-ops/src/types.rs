// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types for the long-running-operation service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracking state of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    #[default]
    Pending,
    Running,
    Complete,
}

/// An externally tracked long-running operation.
///
/// The auth token is NOT part of the operation record — it is a separate
/// capability returned once at registration (see [`Registration`]) and is
/// required for every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    pub unique_id: String,
    pub owner: String,
    pub creator: String,
    pub kind: String,
    pub description: String,
    pub state: OperationState,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of registering a new operation: the record plus the mutation
/// capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub operation: Operation,
    pub auth_token: String,
}

/// Request to register a new operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOperation {
    pub owner: String,
    pub creator: String,
    pub kind: String,
    pub description: String,
    pub initial_state: OperationState,
    /// Seconds without an update before the service expires the operation.
    pub ttl_secs: u64,
    /// Extra seconds granted after the TTL lapses.
    pub grace_period_secs: u64,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Authenticated status update for an in-flight operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOperation {
    pub unique_id: String,
    pub auth_token: String,
    pub running: bool,
    pub annotations: HashMap<String, String>,
}

/// Terminal outcome of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Success {
        message: String,
        /// Free-form result payload; for print jobs this is a serialized
        /// [`PrintOperationResult`].
        result: serde_json::Value,
    },
    Error {
        message: String,
    },
}

/// Authenticated, exactly-once completion of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteOperation {
    pub unique_id: String,
    pub auth_token: String,
    pub result: OperationResult,
}

/// Success payload describing the final state of a print submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintOperationResult {
    pub state: druckwerk_core::PrintState,
    pub document: PrintedDocument,
}

/// The document/printer pair a completed operation refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintedDocument {
    pub name: String,
    pub content_type: String,
    pub printer: String,
}
