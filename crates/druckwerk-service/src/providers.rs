// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provider wiring: build the fully configured service from `ServiceConfig`.
// Every setup failure here is fatal at process start; a half-configured
// print service is worse than no service.

use std::sync::Arc;

use tracing::{info, warn};

use druckwerk_core::config::ServiceConfig;
use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_cups::CupsClient;
use druckwerk_ops::{HttpOperationsClient, OperationsClient};
use druckwerk_render::{DocumentRenderer, RenderClient};

use crate::resolve::ContentResolver;
use crate::service::PrintService;
use crate::storage::StorageRoot;

/// The configured service and its collaborators.
pub struct Providers {
    pub service: PrintService,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

impl Providers {
    /// Wire up all collaborators from `config`.
    ///
    /// Requires a reachable CUPS server and a configured operations service.
    /// Storage and rendering are optional; their absence disables file-path
    /// sources and conversion respectively.
    pub async fn configure(config: &ServiceConfig) -> Result<Self> {
        let operations_url = config.operations_url.as_deref().ok_or_else(|| {
            DruckwerkError::Config("OPERATIONS_URL must be configured".into())
        })?;
        let operations: Arc<dyn OperationsClient> =
            Arc::new(HttpOperationsClient::new(operations_url));

        let backend = Arc::new(CupsClient::connect(&config.cups).await?);
        info!(host = %config.cups.host, port = config.cups.port, "connected to CUPS backend");

        let storage = match &config.storage_path {
            Some(path) => Some(StorageRoot::new(path)?),
            None => {
                warn!("no storage path configured, file_path document sources are disabled");
                None
            }
        };
        let resolver = ContentResolver::new(storage);

        let renderer: Option<Arc<dyn DocumentRenderer>> = match config.render_url.as_deref() {
            Some(url) => Some(Arc::new(RenderClient::new(url))),
            None => {
                warn!("no render URL configured, document conversion is disabled");
                None
            }
        };

        Ok(Self {
            service: PrintService::new(backend, operations, resolver, renderer),
        })
    }
}
