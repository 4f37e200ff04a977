// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operations-service client: the trait seam the orchestrator talks to, plus
// the HTTP JSON implementation used in production.

use async_trait::async_trait;
use tracing::{debug, instrument};

use druckwerk_core::error::{DruckwerkError, Result};

use crate::types::{CompleteOperation, RegisterOperation, Registration, UpdateOperation};

/// Client for the long-running-operation service.
///
/// Object safe so the orchestrator can hold it as `Arc<dyn OperationsClient>`
/// and tests can substitute a recording mock.
#[async_trait]
pub trait OperationsClient: Send + Sync {
    /// Register a new operation and obtain its auth token.
    async fn register(&self, request: RegisterOperation) -> Result<Registration>;

    /// Push an annotation snapshot into an in-flight operation.
    async fn update(&self, request: UpdateOperation) -> Result<()>;

    /// Finalize an operation with a success or error result.
    async fn complete(&self, request: CompleteOperation) -> Result<()>;
}

/// HTTP JSON implementation of [`OperationsClient`].
pub struct HttpOperationsClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpOperationsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn post<B: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DruckwerkError::Operations(format!("POST {path}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DruckwerkError::Operations(format!(
                "POST {path} returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DruckwerkError::Operations(format!("POST {path}: invalid response: {e}")))
    }
}

#[async_trait]
impl OperationsClient for HttpOperationsClient {
    #[instrument(skip_all, fields(description = %request.description))]
    async fn register(&self, request: RegisterOperation) -> Result<Registration> {
        let registration: Registration = self.post("/v1/operations/register", &request).await?;
        debug!(unique_id = %registration.operation.unique_id, "operation registered");
        Ok(registration)
    }

    #[instrument(skip_all, fields(unique_id = %request.unique_id))]
    async fn update(&self, request: UpdateOperation) -> Result<()> {
        let _: serde_json::Value = self.post("/v1/operations/update", &request).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(unique_id = %request.unique_id))]
    async fn complete(&self, request: CompleteOperation) -> Result<()> {
        let _: serde_json::Value = self.post("/v1/operations/complete", &request).await?;
        debug!("operation completed");
        Ok(())
    }
}
