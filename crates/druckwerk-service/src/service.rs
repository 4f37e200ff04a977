// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The request-level print service: list printers, list jobs, and the full
// print pipeline (resolve → sniff → convert → submit-and-track).

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::{CallerIdentity, Document, Job, Printer};
use druckwerk_cups::{PrintBackend, PrintOrchestrator, SubmitDocument, SubmitOptions};
use druckwerk_ops::{Operation, OperationsClient};
use druckwerk_render::DocumentRenderer;

use crate::convert;
use crate::resolve::ContentResolver;
use crate::sniff;

/// The print service core, shared across concurrent requests.
pub struct PrintService {
    backend: Arc<dyn PrintBackend>,
    orchestrator: PrintOrchestrator,
    resolver: ContentResolver,
    renderer: Option<Arc<dyn DocumentRenderer>>,
}

impl PrintService {
    pub fn new(
        backend: Arc<dyn PrintBackend>,
        operations: Arc<dyn OperationsClient>,
        resolver: ContentResolver,
        renderer: Option<Arc<dyn DocumentRenderer>>,
    ) -> Self {
        let orchestrator = PrintOrchestrator::new(Arc::clone(&backend), operations);
        Self {
            backend,
            orchestrator,
            resolver,
            renderer,
        }
    }

    /// All printers known to the backend.
    pub async fn list_printers(&self) -> Result<Vec<Printer>> {
        self.backend.list_printers().await
    }

    /// Jobs on the named printers, concatenated; all printers when the list
    /// is empty.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, printers: &[String]) -> Result<Vec<Job>> {
        if printers.is_empty() {
            return self.backend.list_jobs(None).await;
        }

        let mut jobs = Vec::new();
        for printer in printers {
            jobs.extend(self.backend.list_jobs(Some(printer)).await?);
        }
        debug!(count = jobs.len(), "collected jobs across printers");
        Ok(jobs)
    }

    /// Resolve, convert, and submit `document` as a tracked print operation.
    ///
    /// Returns as soon as the backend accepts the job; the returned operation
    /// is tracked to completion in the background.
    #[instrument(skip(self, identity, document), fields(name = %document.name))]
    pub async fn print_document(
        &self,
        identity: Option<&CallerIdentity>,
        document: Document,
    ) -> Result<Operation> {
        let identity = identity.ok_or_else(|| {
            DruckwerkError::Unauthenticated("print requests require a caller identity".into())
        })?;

        let Document {
            name,
            content_type,
            printer,
            orientation,
            color_mode,
            source,
        } = document;

        let resolved = self.resolver.resolve(&name, source).await?;

        // Sniff only when the caller declared nothing; a declared type is
        // authoritative even when the bytes disagree.
        let (content_type, mut stream) = match content_type.filter(|ct| !ct.is_empty()) {
            Some(declared) => (declared, resolved.stream),
            None => sniff::detect(resolved.stream).await?,
        };

        let mut payload = Vec::with_capacity(resolved.size as usize);
        stream.read_to_end(&mut payload).await?;
        // Release the stream (and any self-deleting temp file) before the
        // potentially long conversion and submission steps.
        drop(stream);

        if payload.is_empty() {
            return Err(DruckwerkError::InvalidArgument(
                "empty document content".into(),
            ));
        }

        let (content_type, payload) = convert::maybe_convert(
            self.renderer.as_deref(),
            &name,
            &content_type,
            payload,
            orientation,
        )
        .await?;

        info!(
            user = %identity.username,
            content_type,
            size = payload.len(),
            "submitting print document"
        );

        let submission = SubmitDocument {
            name,
            content_type,
            payload,
        };
        let options = SubmitOptions {
            requesting_user: identity.username.clone(),
            orientation,
            color_mode,
            operation_id: None,
        };

        self.orchestrator
            .print_with_operation(submission, printer.as_deref(), options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use druckwerk_core::types::{ColorMode, DocumentSource, JobState, Orientation};
    use druckwerk_ops::{
        CompleteOperation, OperationState, RegisterOperation, Registration, UpdateOperation,
    };

    #[derive(Default)]
    struct FakeBackend {
        printers: Vec<Printer>,
        jobs_by_printer: HashMap<String, Vec<Job>>,
        submitted: Mutex<Vec<(SubmitDocument, Option<String>, SubmitOptions)>>,
    }

    #[async_trait]
    impl PrintBackend for FakeBackend {
        async fn list_printers(&self) -> Result<Vec<Printer>> {
            Ok(self.printers.clone())
        }

        async fn list_jobs(&self, printer: Option<&str>) -> Result<Vec<Job>> {
            match printer {
                Some(name) => Ok(self.jobs_by_printer.get(name).cloned().unwrap_or_default()),
                None => Ok(self.jobs_by_printer.values().flatten().cloned().collect()),
            }
        }

        async fn job_by_id(&self, id: i32) -> Result<Job> {
            // The detached tracker stops on the first terminal state.
            Ok(Job {
                id,
                state: JobState::Complete,
                ..Job::default()
            })
        }

        async fn submit_job(
            &self,
            document: SubmitDocument,
            printer: Option<&str>,
            options: &SubmitOptions,
        ) -> Result<i32> {
            self.submitted.lock().expect("lock").push((
                document,
                printer.map(str::to_string),
                options.clone(),
            ));
            Ok(41)
        }
    }

    #[derive(Default)]
    struct FakeOperations;

    #[async_trait]
    impl OperationsClient for FakeOperations {
        async fn register(&self, request: RegisterOperation) -> Result<Registration> {
            Ok(Registration {
                operation: Operation {
                    unique_id: "op-9".into(),
                    owner: request.owner,
                    creator: request.creator,
                    kind: request.kind,
                    description: request.description,
                    state: OperationState::Pending,
                    annotations: HashMap::new(),
                    created_at: None,
                },
                auth_token: "token-9".into(),
            })
        }

        async fn update(&self, _request: UpdateOperation) -> Result<()> {
            Ok(())
        }

        async fn complete(&self, _request: CompleteOperation) -> Result<()> {
            Ok(())
        }
    }

    struct FakeRenderer;

    #[async_trait]
    impl DocumentRenderer for FakeRenderer {
        async fn render_html(
            &self,
            _name: &str,
            _body: Vec<u8>,
            _orientation: Orientation,
        ) -> Result<Vec<u8>> {
            Ok(b"%PDF-rendered".to_vec())
        }

        async fn render_office(
            &self,
            _name: &str,
            _body: Vec<u8>,
            _orientation: Orientation,
        ) -> Result<Vec<u8>> {
            Ok(b"%PDF-rendered".to_vec())
        }
    }

    fn service(backend: Arc<FakeBackend>, renderer: Option<Arc<dyn DocumentRenderer>>) -> PrintService {
        PrintService::new(
            backend,
            Arc::new(FakeOperations),
            ContentResolver::new(None),
            renderer,
        )
    }

    fn identity() -> CallerIdentity {
        CallerIdentity {
            username: "alice".into(),
        }
    }

    fn pdf_document() -> Document {
        Document {
            name: "invoice.pdf".into(),
            content_type: Some("application/pdf".into()),
            printer: Some("office-laser".into()),
            orientation: Orientation::Portrait,
            color_mode: ColorMode::Grayscale,
            source: DocumentSource::Data(b"%PDF-1.7 body".to_vec()),
        }
    }

    #[tokio::test]
    async fn declared_pdf_is_submitted_untouched() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), None);

        let operation = service
            .print_document(Some(&identity()), pdf_document())
            .await
            .expect("print");
        assert_eq!(operation.unique_id, "op-9");

        let submitted = backend.submitted.lock().expect("lock");
        assert_eq!(submitted.len(), 1);
        let (document, printer, options) = &submitted[0];
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(document.payload, b"%PDF-1.7 body");
        assert_eq!(printer.as_deref(), Some("office-laser"));
        assert_eq!(options.requesting_user, "alice");
        assert_eq!(options.color_mode, ColorMode::Grayscale);
        assert_eq!(options.operation_id.as_deref(), Some("op-9"));
    }

    #[tokio::test]
    async fn missing_identity_is_unauthenticated() {
        let service = service(Arc::new(FakeBackend::default()), None);
        let err = service
            .print_document(None, pdf_document())
            .await
            .expect_err("no identity");
        assert!(matches!(err, DruckwerkError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn undeclared_type_is_sniffed() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), None);

        let document = Document {
            content_type: None,
            ..pdf_document()
        };
        service
            .print_document(Some(&identity()), document)
            .await
            .expect("print");

        let submitted = backend.submitted.lock().expect("lock");
        assert_eq!(submitted[0].0.content_type, "application/pdf");
        assert_eq!(submitted[0].0.payload, b"%PDF-1.7 body");
    }

    #[tokio::test]
    async fn html_is_converted_before_submission() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), Some(Arc::new(FakeRenderer)));

        let document = Document {
            name: "page.html".into(),
            content_type: None,
            source: DocumentSource::Data(b"<html><body>hi</body></html>".to_vec()),
            ..pdf_document()
        };
        service
            .print_document(Some(&identity()), document)
            .await
            .expect("print");

        let submitted = backend.submitted.lock().expect("lock");
        assert_eq!(submitted[0].0.content_type, "application/pdf");
        assert_eq!(submitted[0].0.payload, b"%PDF-rendered");
    }

    #[tokio::test]
    async fn stored_docx_is_converted_through_office_route() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("report.docx"), b"PK\x03\x04 fake docx").expect("write");

        let backend = Arc::new(FakeBackend::default());
        let service = PrintService::new(
            backend.clone(),
            Arc::new(FakeOperations),
            ContentResolver::new(Some(
                crate::storage::StorageRoot::new(dir.path()).expect("root"),
            )),
            Some(Arc::new(FakeRenderer)),
        );

        let document = Document {
            name: "report.docx".into(),
            content_type: None,
            source: DocumentSource::FilePath("report.docx".into()),
            ..pdf_document()
        };
        service
            .print_document(Some(&identity()), document)
            .await
            .expect("print");

        let submitted = backend.submitted.lock().expect("lock");
        assert_eq!(submitted[0].0.content_type, "application/pdf");
        assert_eq!(submitted[0].0.payload, b"%PDF-rendered");
    }

    #[tokio::test]
    async fn unspecified_printer_defers_to_backend_default() {
        let backend = Arc::new(FakeBackend::default());
        let service = service(backend.clone(), None);

        let document = Document {
            printer: None,
            ..pdf_document()
        };
        service
            .print_document(Some(&identity()), document)
            .await
            .expect("print");

        // The backend owns default-printer resolution; the service passes
        // the absence through untouched.
        let submitted = backend.submitted.lock().expect("lock");
        assert_eq!(submitted[0].1, None);
    }

    #[tokio::test]
    async fn html_without_renderer_is_unavailable() {
        let service = service(Arc::new(FakeBackend::default()), None);

        let document = Document {
            name: "page.html".into(),
            content_type: Some("text/html".into()),
            source: DocumentSource::Data(b"<html></html>".to_vec()),
            ..pdf_document()
        };
        let err = service
            .print_document(Some(&identity()), document)
            .await
            .expect_err("no renderer");
        assert!(matches!(err, DruckwerkError::Unavailable(_)));
    }

    #[tokio::test]
    async fn empty_declared_document_is_invalid() {
        let service = service(Arc::new(FakeBackend::default()), None);

        let document = Document {
            source: DocumentSource::Data(Vec::new()),
            ..pdf_document()
        };
        let err = service
            .print_document(Some(&identity()), document)
            .await
            .expect_err("empty");
        assert!(matches!(err, DruckwerkError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn list_jobs_concatenates_named_printers() {
        let mut backend = FakeBackend::default();
        backend.jobs_by_printer.insert(
            "laser".into(),
            vec![Job {
                id: 1,
                ..Job::default()
            }],
        );
        backend.jobs_by_printer.insert(
            "inkjet".into(),
            vec![Job {
                id: 2,
                ..Job::default()
            }],
        );
        let service = service(Arc::new(backend), None);

        let jobs = service
            .list_jobs(&["laser".into(), "inkjet".into()])
            .await
            .expect("list");
        let mut ids: Vec<i32> = jobs.iter().map(|j| j.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        let all = service.list_jobs(&[]).await.expect("list all");
        assert_eq!(all.len(), 2);
    }
}
