// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async CUPS client built on the `ipp` crate.
//
// Operations used:
//   - CUPS-Get-Printers       (listing)
//   - CUPS-Get-Default        (default printer snapshot at connect time)
//   - Get-Jobs                (RFC 8011 §4.2.6)
//   - Get-Job-Attributes      (RFC 8011 §4.3.4)
//   - Print-Job               (RFC 8011 §4.2.1)

use std::io::Cursor;

use async_trait::async_trait;
use ipp::model::Operation;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use druckwerk_core::config::CupsConfig;
use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::{Job, Printer};

use crate::attrs;
use crate::backend::{PrintBackend, SubmitDocument, SubmitOptions};
use crate::jobs::{self, REQUESTED_JOB_ATTRIBUTES};
use crate::printer::printer_from_group;

/// Async client bound to one CUPS server.
///
/// Shared and reused across concurrent requests; holds no per-request state.
pub struct CupsClient {
    host: String,
    port: u16,
    authority: String,
    base_uri: Uri,
    default_printer: Option<String>,
}

impl CupsClient {
    /// Connect to the CUPS server described by `config`.
    ///
    /// Probes the server immediately and snapshots the default printer
    /// (backend-advertised, falling back to the configured one). A missing
    /// default is not an error until a submission names no printer.
    #[instrument(skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: &CupsConfig) -> Result<Self> {
        let authority = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => format!("{user}:{pass}@{}:{}", config.host, config.port),
            (Some(user), None) => format!("{user}@{}:{}", config.host, config.port),
            _ => format!("{}:{}", config.host, config.port),
        };

        let base_uri = parse_uri(&format!("ipp://{authority}/"))?;

        let mut client = Self {
            host: config.host.clone(),
            port: config.port,
            authority,
            base_uri,
            default_printer: config.default_printer.clone(),
        };

        // Fail fast on unreachable servers; everything else can wait.
        client.ping().await?;

        match client.query_default_printer().await {
            Ok(Some(printer)) if !printer.name.is_empty() => {
                info!(printer = %printer.name, "using backend default printer");
                client.default_printer = Some(printer.name);
            }
            Ok(_) => debug!("backend advertises no default printer"),
            Err(err) => debug!(%err, "failed to query default printer"),
        }

        Ok(client)
    }

    /// Name of the printer used when a submission names none.
    pub fn default_printer(&self) -> Option<&str> {
        self.default_printer.as_deref()
    }

    /// Verify the server is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.send(self.base_uri.clone(), self.cups_get_printers_request())
            .await
            .map(|_| ())
    }

    /// Resolve a printer uri to its friendly name.
    ///
    /// Strips this server's `ipp://host[:port]/printers/` prefix (including
    /// the localhost spellings CUPS likes to report); anything else is
    /// returned unchanged.
    pub fn printer_name_for_uri(&self, uri: &str) -> String {
        let prefixes = [
            format!("ipp://{}:{}/printers/", self.host, self.port),
            format!("ipp://{}/printers/", self.host),
            format!("ipp://localhost:{}/printers/", self.port),
            "ipp://localhost/printers/".to_string(),
        ];

        for prefix in &prefixes {
            if let Some(name) = uri.strip_prefix(prefix.as_str()) {
                return name.to_string();
            }
        }

        uri.to_string()
    }

    fn printer_uri(&self, name: &str) -> Result<Uri> {
        parse_uri(&format!("ipp://{}/printers/{name}", self.authority))
    }

    /// The printer a submission actually targets: the requested one, else the
    /// default. Having neither is an error.
    fn target_printer(&self, requested: Option<&str>) -> Result<String> {
        requested
            .or(self.default_printer.as_deref())
            .map(str::to_string)
            .ok_or_else(|| {
                DruckwerkError::Backend(
                    "no printer specified and no default printer available".into(),
                )
            })
    }

    fn cups_get_printers_request(&self) -> IppRequestResponse {
        IppRequestResponse::new(IppVersion::v1_1(), Operation::CupsGetPrinters, None)
    }

    /// Ask CUPS which printer is the server default.
    async fn query_default_printer(&self) -> Result<Option<Printer>> {
        let request =
            IppRequestResponse::new(IppVersion::v1_1(), Operation::CupsGetDefault, None);
        let response = self.send(self.base_uri.clone(), request).await?;

        Ok(response
            .attributes()
            .groups_of(DelimiterTag::PrinterAttributes)
            .next()
            .map(|group| printer_from_group("", group.attributes())))
    }

    async fn send(&self, endpoint: Uri, request: IppRequestResponse) -> Result<IppRequestResponse> {
        let operation = request.header().operation_or_status;
        let client = AsyncIppClient::new(endpoint);

        let response = client
            .send(request)
            .await
            .map_err(|e| DruckwerkError::Backend(format!("IPP request {operation:#06x}: {e}")))?;

        if !response.header().status_code().is_success() {
            let code = response.header().status_code();
            error!(status = ?code, "IPP request failed");
            return Err(DruckwerkError::Backend(format!(
                "IPP request {operation:#06x} returned status {code:?}"
            )));
        }

        Ok(response)
    }

    fn job_query_request(&self, operation: Operation, uri: &Uri) -> IppRequestResponse {
        let mut request =
            IppRequestResponse::new(IppVersion::v1_1(), operation, Some(uri.clone()));
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                attrs::ATTR_REQUESTED_ATTRIBUTES,
                IppValue::Array(
                    REQUESTED_JOB_ATTRIBUTES
                        .iter()
                        .map(|name| IppValue::Keyword((*name).to_string()))
                        .collect(),
                ),
            ),
        );
        request
    }
}

#[async_trait]
impl PrintBackend for CupsClient {
    /// List all printers known to the server.
    ///
    /// Per-printer decode problems degrade to partially filled printers;
    /// the listing itself only fails when the request does.
    #[instrument(skip(self))]
    async fn list_printers(&self) -> Result<Vec<Printer>> {
        let response = self
            .send(self.base_uri.clone(), self.cups_get_printers_request())
            .await?;

        let printers: Vec<Printer> = response
            .attributes()
            .groups_of(DelimiterTag::PrinterAttributes)
            .map(|group| printer_from_group("", group.attributes()))
            .collect();

        debug!(count = printers.len(), "received printer list");
        Ok(printers)
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, printer: Option<&str>) -> Result<Vec<Job>> {
        let uri = match printer {
            Some(name) => self.printer_uri(name)?,
            None => self.base_uri.clone(),
        };

        let mut request = self.job_query_request(Operation::GetJobs, &uri);
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(attrs::ATTR_WHICH_JOBS, IppValue::Keyword("all".to_string())),
        );

        let response = self.send(uri, request).await?;

        let mut result = Vec::new();
        for group in response.attributes().groups_of(DelimiterTag::JobAttributes) {
            let group = group.attributes();
            let Some(id) = jobs::job_id_from_group(group) else {
                warn!("skipping job group without job-id");
                continue;
            };
            result.push(jobs::job_from_group(id, group, |uri| {
                self.printer_name_for_uri(uri)
            }));
        }

        debug!(count = result.len(), "received job list");
        Ok(result)
    }

    #[instrument(skip(self), fields(job_id = id))]
    async fn job_by_id(&self, id: i32) -> Result<Job> {
        let mut request =
            self.job_query_request(Operation::GetJobAttributes, &self.base_uri.clone());
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(attrs::ATTR_JOB_ID, IppValue::Integer(id)),
        );

        let response = self.send(self.base_uri.clone(), request).await?;

        let group = response
            .attributes()
            .groups_of(DelimiterTag::JobAttributes)
            .next()
            .ok_or_else(|| {
                DruckwerkError::Backend(format!("no attributes returned for job {id}"))
            })?;

        Ok(jobs::job_from_group(id, group.attributes(), |uri| {
            self.printer_name_for_uri(uri)
        }))
    }

    /// Submit a document as a Print-Job.
    #[instrument(skip(self, document, options), fields(name = %document.name, mime = %document.content_type))]
    async fn submit_job(
        &self,
        document: SubmitDocument,
        printer: Option<&str>,
        options: &SubmitOptions,
    ) -> Result<i32> {
        let printer = self.target_printer(printer)?;
        let uri = self.printer_uri(&printer)?;
        let payload = IppPayload::new(Cursor::new(document.payload));

        let mut builder = IppOperationBuilder::print_job(uri.clone(), payload)
            .user_name(&options.requesting_user)
            .job_title(&document.name)
            .document_format(&document.content_type)
            .attribute(attrs::keyword_attribute(
                attrs::ATTR_ORIENTATION_REQUESTED,
                options.orientation.as_keyword(),
            ))
            .attribute(attrs::keyword_attribute(
                attrs::ATTR_PRINT_COLOR_MODE,
                options.color_mode.as_keyword(),
            ));

        if let Some(operation_id) = &options.operation_id {
            builder = builder.attribute(attrs::operation_id_attribute(operation_id));
        }

        info!(printer = %printer, "sending Print-Job");
        let response = self.send(uri, builder.build().into()).await?;

        let job_id = response
            .attributes()
            .groups_of(DelimiterTag::JobAttributes)
            .next()
            .and_then(|group| jobs::job_id_from_group(group.attributes()))
            .ok_or_else(|| {
                DruckwerkError::Backend("Print-Job response missing job-id attribute".into())
            })?;

        info!(job_id, "print job accepted by backend");
        Ok(job_id)
    }
}

fn parse_uri(uri: &str) -> Result<Uri> {
    uri.parse()
        .map_err(|e| DruckwerkError::Backend(format!("invalid URI {uri:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CupsClient {
        CupsClient {
            host: "cups.internal".into(),
            port: 631,
            authority: "cups.internal:631".into(),
            base_uri: "ipp://cups.internal:631/".parse().expect("uri"),
            default_printer: None,
        }
    }

    #[test]
    fn printer_name_stripped_from_own_uri() {
        let client = test_client();
        assert_eq!(
            client.printer_name_for_uri("ipp://cups.internal:631/printers/office-laser"),
            "office-laser"
        );
        assert_eq!(
            client.printer_name_for_uri("ipp://cups.internal/printers/office-laser"),
            "office-laser"
        );
        assert_eq!(
            client.printer_name_for_uri("ipp://localhost:631/printers/office-laser"),
            "office-laser"
        );
        assert_eq!(
            client.printer_name_for_uri("ipp://localhost/printers/office-laser"),
            "office-laser"
        );
    }

    #[test]
    fn foreign_uri_passes_through() {
        let client = test_client();
        assert_eq!(
            client.printer_name_for_uri("ipp://elsewhere:631/printers/other"),
            "ipp://elsewhere:631/printers/other"
        );
    }

    #[test]
    fn submission_falls_back_to_default_printer() {
        let mut client = test_client();
        client.default_printer = Some("office-laser".into());

        assert_eq!(
            client.target_printer(Some("inkjet")).expect("requested"),
            "inkjet"
        );
        assert_eq!(
            client.target_printer(None).expect("default"),
            "office-laser"
        );
    }

    #[test]
    fn submission_without_any_printer_fails() {
        let client = test_client();
        let err = client.target_printer(None).expect_err("no printer");
        assert!(err.to_string().contains("no default printer"));
    }

    #[test]
    fn printer_uri_is_well_formed() {
        let client = test_client();
        let uri = client.printer_uri("office-laser").expect("uri");
        assert_eq!(
            uri.to_string(),
            "ipp://cups.internal:631/printers/office-laser"
        );
    }
}
