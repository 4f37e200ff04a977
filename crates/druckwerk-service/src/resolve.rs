// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content resolution: turn a document source into a readable byte stream.
//
// Three source kinds:
//   - inline bytes        (no I/O)
//   - storage-root path   (sandboxed, see storage.rs)
//   - remote URL          (downloaded to a self-deleting temp file)

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};
use tracing::{debug, instrument, warn};

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::DocumentSource;

use crate::storage::StorageRoot;

/// A readable, already-resolved document body.
pub type ContentStream = Box<dyn AsyncRead + Send + Unpin>;

/// A resolved document: its byte stream and total size.
pub struct ResolvedContent {
    pub stream: ContentStream,
    pub size: u64,
}

impl std::fmt::Debug for ResolvedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedContent")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Resolves document sources into byte streams.
pub struct ContentResolver {
    storage: Option<StorageRoot>,
    http: reqwest::Client,
}

impl ContentResolver {
    pub fn new(storage: Option<StorageRoot>) -> Self {
        Self {
            storage,
            http: reqwest::Client::new(),
        }
    }

    /// Resolve `source` into a stream. `name` is only used to label temp
    /// files created for URL sources.
    #[instrument(skip(self, source), fields(name = %name))]
    pub async fn resolve(&self, name: &str, source: DocumentSource) -> Result<ResolvedContent> {
        match source {
            DocumentSource::Data(bytes) => {
                let size = bytes.len() as u64;
                debug!(size, "resolved inline document content");
                Ok(ResolvedContent {
                    stream: Box::new(Cursor::new(bytes)),
                    size,
                })
            }
            DocumentSource::FilePath(relative) => self.open_stored(&relative).await,
            DocumentSource::Url(url) => self.download(name, &url).await,
        }
    }

    async fn open_stored(&self, relative: &str) -> Result<ResolvedContent> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            DruckwerkError::Unavailable(
                "file_path sources require a configured storage path".into(),
            )
        })?;

        let path = storage.resolve(relative)?;

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DruckwerkError::NotFound(format!("document {relative:?} does not exist"))
            } else {
                DruckwerkError::Io(e)
            }
        })?;

        let file = File::open(&path).await?;
        debug!(path = %path.display(), size = metadata.len(), "opened stored document");

        Ok(ResolvedContent {
            stream: Box::new(file),
            size: metadata.len(),
        })
    }

    /// Download `url` into a temp file and stream it back.
    ///
    /// The file lives in the storage root when one is configured, otherwise
    /// in the OS temp dir, and is deleted when the stream is dropped.
    async fn download(&self, name: &str, url: &str) -> Result<ResolvedContent> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DruckwerkError::Download(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DruckwerkError::Download(format!(
                "GET {url} returned {status}"
            )));
        }

        let prefix = temp_prefix(name);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let temp = match &self.storage {
            Some(root) => builder.tempfile_in(root.path()),
            None => builder.tempfile(),
        }?;

        // Detach the temp file from tempfile's own Drop deletion; the
        // SelfDeletingFile guard owns cleanup from here on.
        let (file, path) = temp.keep().map_err(|e| DruckwerkError::Io(e.error))?;
        let mut file = File::from_std(file);

        match fill_from_response(&mut file, response).await {
            Ok(size) => {
                debug!(url, size, path = %path.display(), "downloaded document");
                Ok(ResolvedContent {
                    stream: Box::new(SelfDeletingFile::new(file, path)),
                    size,
                })
            }
            Err(err) => {
                drop(file);
                remove_temp(&path);
                Err(err)
            }
        }
    }
}

/// Write the full response body into `file` and rewind it for reading.
async fn fill_from_response(file: &mut File, mut response: reqwest::Response) -> Result<u64> {
    let url = response.url().to_string();
    let mut size = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| DruckwerkError::Download(format!("GET {url}: reading body: {e}")))?
    {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }

    file.flush().await?;
    file.seek(std::io::SeekFrom::Start(0)).await?;
    Ok(size)
}

fn remove_temp(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        warn!(path = %path.display(), %err, "failed to remove temp file");
    }
}

/// Temp-file prefix derived from the document name.
fn temp_prefix(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .take(32)
        .collect();
    if prefix.is_empty() {
        prefix.push_str("document");
    }
    prefix.push('-');
    prefix
}

/// A readable temp file that removes itself when dropped.
///
/// Read errors do not leak the file; deletion happens on every drop path
/// and a failed deletion is logged, never surfaced.
pub struct SelfDeletingFile {
    file: File,
    path: PathBuf,
}

impl SelfDeletingFile {
    pub fn new(file: File, path: PathBuf) -> Self {
        Self { file, path }
    }
}

impl AsyncRead for SelfDeletingFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl Drop for SelfDeletingFile {
    fn drop(&mut self) {
        remove_temp(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn drain(mut stream: ContentStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.expect("read");
        out
    }

    /// Serve exactly one canned HTTP response, then close the connection.
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(response).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/document")
    }

    fn entries_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).expect("read_dir").count()
    }

    #[tokio::test]
    async fn inline_data_resolves_without_io() {
        let resolver = ContentResolver::new(None);
        let resolved = resolver
            .resolve("invoice.pdf", DocumentSource::Data(b"%PDF-1.7 data".to_vec()))
            .await
            .expect("resolve");

        assert_eq!(resolved.size, 13);
        assert_eq!(drain(resolved.stream).await, b"%PDF-1.7 data");
    }

    #[tokio::test]
    async fn stored_file_resolves_beneath_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("reports")).expect("mkdir");
        std::fs::write(dir.path().join("reports/q3.pdf"), b"%PDF-1.7 report").expect("write");

        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let resolved = resolver
            .resolve("q3.pdf", DocumentSource::FilePath("reports/q3.pdf".into()))
            .await
            .expect("resolve");
        assert_eq!(resolved.size, 15);
        assert_eq!(drain(resolved.stream).await, b"%PDF-1.7 report");
    }

    #[tokio::test]
    async fn missing_stored_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let err = resolver
            .resolve("x", DocumentSource::FilePath("nope.pdf".into()))
            .await
            .expect_err("missing");
        assert!(matches!(err, DruckwerkError::NotFound(_)));
    }

    #[tokio::test]
    async fn file_path_without_storage_root_is_unavailable() {
        let resolver = ContentResolver::new(None);
        let err = resolver
            .resolve("x", DocumentSource::FilePath("doc.pdf".into()))
            .await
            .expect_err("no storage");
        assert!(matches!(err, DruckwerkError::Unavailable(_)));
    }

    #[tokio::test]
    async fn escaping_file_path_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let err = resolver
            .resolve("x", DocumentSource::FilePath("../secret".into()))
            .await
            .expect_err("escape");
        assert!(matches!(err, DruckwerkError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn url_download_round_trips_through_temp_file() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\nConnection: close\r\n\r\n%PDF-1.7 body",
        )
        .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let resolved = resolver
            .resolve("invoice.pdf", DocumentSource::Url(url))
            .await
            .expect("resolve");
        assert_eq!(resolved.size, 13);
        // The backing temp file lives in the storage root while the stream
        // is open.
        assert_eq!(entries_in(dir.path()), 1);

        assert_eq!(drain(resolved.stream).await, b"%PDF-1.7 body");
        assert_eq!(entries_in(dir.path()), 0, "temp file must be gone after the stream");
    }

    #[tokio::test]
    async fn failed_download_is_a_download_error() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let err = resolver
            .resolve("x", DocumentSource::Url(url))
            .await
            .expect_err("404");
        assert!(matches!(err, DruckwerkError::Download(_)));
        assert!(err.to_string().contains("404"));
        assert_eq!(entries_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn aborted_download_removes_partial_temp_file() {
        // Advertise more bytes than are sent, then close: the body read
        // fails midway with part of the payload already on disk.
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial",
        )
        .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let root = StorageRoot::new(dir.path()).expect("root");
        let resolver = ContentResolver::new(Some(root));

        let err = resolver
            .resolve("x", DocumentSource::Url(url))
            .await
            .expect_err("truncated body");
        assert!(matches!(err, DruckwerkError::Download(_)));
        assert_eq!(
            entries_in(dir.path()),
            0,
            "partially written temp file must be removed"
        );
    }

    #[tokio::test]
    async fn self_deleting_file_is_gone_after_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scratch.bin");
        tokio::fs::write(&path, b"scratch bytes").await.expect("write");

        let file = File::open(&path).await.expect("open");
        let guard = SelfDeletingFile::new(file, path.clone());

        let contents = drain(Box::new(guard)).await;
        assert_eq!(contents, b"scratch bytes");
        assert!(!path.exists(), "temp file must be deleted on drop");
    }

    #[tokio::test]
    async fn self_deleting_file_deletes_even_when_unread() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("unread.bin");
        tokio::fs::write(&path, b"never read").await.expect("write");

        let file = File::open(&path).await.expect("open");
        drop(SelfDeletingFile::new(file, path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn temp_prefix_sanitizes_names() {
        assert_eq!(temp_prefix("invoice.pdf"), "invoice.pdf-");
        assert_eq!(temp_prefix("a/b c"), "a_b_c-");
        assert_eq!(temp_prefix(""), "document-");
    }
}
