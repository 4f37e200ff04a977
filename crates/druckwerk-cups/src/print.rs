// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print orchestration: submit a document, register a long-running operation,
// and mirror job progress into the operation from a detached polling task.
//
// Lifecycle: Registered → Submitting → Tracking → Completed(success|error).
// The operation is registered BEFORE any backend interaction, so no job ever
// exists without a tracked operation. Completion happens exactly once: on
// submission failure the loop never starts; otherwise only the terminal
// branch of the loop completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use druckwerk_core::error::Result;
use druckwerk_core::types::{Job, JobState};
use druckwerk_ops::{
    CompleteOperation, Operation, OperationResult, OperationState, OperationsClient,
    PrintOperationResult, PrintedDocument, RegisterOperation, Registration, UpdateOperation,
};

use crate::backend::{PrintBackend, SubmitDocument, SubmitOptions};

/// Fixed interval between job state fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Operation TTL and grace period registered for every print job.
pub const OPERATION_TTL: Duration = Duration::from_secs(30);

const OPERATION_OWNER: &str = "druckwerk.v1.PrintService";
const OPERATION_KIND: &str = "druckwerk.v1/print-job";

/// Drives the submit → poll → complete lifecycle of one print request.
pub struct PrintOrchestrator {
    backend: Arc<dyn PrintBackend>,
    operations: Arc<dyn OperationsClient>,
    poll_interval: Duration,
}

impl PrintOrchestrator {
    pub fn new(backend: Arc<dyn PrintBackend>, operations: Arc<dyn OperationsClient>) -> Self {
        Self {
            backend,
            operations,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the polling interval (tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Submit `document` and track it as a long-running operation.
    ///
    /// Returns the registered operation as soon as the backend accepts the
    /// job; the caller never blocks on job completion. Tracking continues in
    /// a detached task that deliberately outlives the request.
    #[instrument(skip(self, document, options), fields(name = %document.name))]
    pub async fn print_with_operation(
        &self,
        document: SubmitDocument,
        printer: Option<&str>,
        mut options: SubmitOptions,
    ) -> Result<Operation> {
        // Step 1: the operation exists before anything touches the backend.
        let registration = self
            .operations
            .register(RegisterOperation {
                owner: OPERATION_OWNER.into(),
                creator: options.requesting_user.clone(),
                kind: OPERATION_KIND.into(),
                description: document.name.clone(),
                initial_state: OperationState::Pending,
                ttl_secs: OPERATION_TTL.as_secs(),
                grace_period_secs: OPERATION_TTL.as_secs(),
                annotations: HashMap::new(),
            })
            .await?;

        // Step 2: the job carries the operation id so backend state can be
        // correlated back to the operation.
        options.operation_id = Some(registration.operation.unique_id.clone());

        let document_info = PrintedDocument {
            name: document.name.clone(),
            content_type: document.content_type.clone(),
            printer: String::new(),
        };

        // Step 3: synchronous submission.
        let job_id = match self.backend.submit_job(document, printer, &options).await {
            Ok(id) => id,
            Err(err) => {
                // Fail the operation here; no orphaned pending operations
                // and no polling loop.
                let complete = CompleteOperation {
                    unique_id: registration.operation.unique_id.clone(),
                    auth_token: registration.auth_token.clone(),
                    result: OperationResult::Error {
                        message: err.to_string(),
                    },
                };
                if let Err(complete_err) = self.operations.complete(complete).await {
                    error!(%complete_err, "failed to complete operation");
                }
                return Err(err);
            }
        };

        info!(job_id, operation_id = %registration.operation.unique_id, "job submitted, tracking started");

        // Steps 4-5: hand the caller the operation and keep tracking from a
        // fire-and-forget task. No join handle, no cancellation path: the
        // operation must keep being tracked after the request returns.
        let operation = registration.operation.clone();
        tokio::spawn(track_job(
            Arc::clone(&self.backend),
            Arc::clone(&self.operations),
            registration,
            document_info,
            job_id,
            self.poll_interval,
        ));

        Ok(operation)
    }
}

/// Poll `job_id` until it reaches a terminal state, mirroring progress into
/// the operation, then complete the operation exactly once.
///
/// A failed state fetch ends tracking WITHOUT completing the operation; the
/// operation service's TTL/grace expiry reclaims it.
async fn track_job(
    backend: Arc<dyn PrintBackend>,
    operations: Arc<dyn OperationsClient>,
    registration: Registration,
    document: PrintedDocument,
    job_id: i32,
    interval: Duration,
) {
    let operation_id = registration.operation.unique_id;

    loop {
        tokio::time::sleep(interval).await;

        let job = match backend.job_by_id(job_id).await {
            Ok(job) => job,
            Err(err) => {
                error!(job_id, operation_id = %operation_id, %err, "failed to fetch job state, abandoning tracking");
                return;
            }
        };

        if !job.state.is_terminal() {
            let update = UpdateOperation {
                unique_id: operation_id.clone(),
                auth_token: registration.auth_token.clone(),
                running: job.state == JobState::Processing,
                annotations: annotation_snapshot(&job),
            };
            // Update failures are logged, never retried; the loop goes on.
            if let Err(err) = operations.update(update).await {
                error!(job_id, operation_id = %operation_id, %err, "failed to update job operation");
            }
            continue;
        }

        let result = terminal_result(&job, document);
        if let Err(err) = operations
            .complete(CompleteOperation {
                unique_id: operation_id.clone(),
                auth_token: registration.auth_token.clone(),
                result,
            })
            .await
        {
            error!(job_id, operation_id = %operation_id, %err, "failed to complete operation");
        }

        debug!(job_id, operation_id = %operation_id, state = %job.state, "tracking finished");
        return;
    }
}

/// Status snapshot pushed into the operation on every non-terminal poll.
fn annotation_snapshot(job: &Job) -> HashMap<String, String> {
    HashMap::from([
        ("state".to_string(), job.state.to_string()),
        ("percent".to_string(), format!("{}%", job.progress)),
        ("jobID".to_string(), job.id.to_string()),
        ("printer".to_string(), job.printer_name.clone()),
        ("printerUri".to_string(), job.printer_uri.clone()),
    ])
}

/// Build the completion payload for a terminal job state.
fn terminal_result(job: &Job, document: PrintedDocument) -> OperationResult {
    let state = job.state;
    let payload = PrintOperationResult {
        state: state.to_public(),
        document: PrintedDocument {
            printer: job.printer_name.clone(),
            ..document
        },
    };

    let payload = match serde_json::to_value(&payload) {
        Ok(value) => value,
        Err(err) => {
            error!(%err, "failed to serialize print result");
            serde_json::Value::Null
        }
    };

    if state == JobState::Complete {
        OperationResult::Success {
            message: state.to_string(),
            result: payload,
        }
    } else {
        OperationResult::Error {
            message: format!("print job ended in state {state}"),
        }
    }
}
