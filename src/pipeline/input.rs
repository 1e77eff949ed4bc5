//! Input resolution: turn a user-supplied path or URL into a [`SourceDocument`].
//!
//! Documents are held in memory: pdfium can open a PDF from a byte slice and
//! images are forwarded to the model as-is, so no temp files are needed.
//! The type is sniffed from magic bytes rather than the file extension,
//! phone uploads are frequently misnamed.

use crate::error::ExamOracleError;
use futures::stream::{self, StreamExt};
use std::path::Path;
use tracing::{debug, info};

/// What kind of document an upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
}

/// One uploaded previous-year paper.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Display name (file name or last URL segment).
    pub name: String,
    pub kind: DocumentKind,
    /// MIME type sent alongside the inline data.
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl SourceDocument {
    /// Wrap raw bytes, detecting the document type from its content.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, ExamOracleError> {
        let name = name.into();

        if data.starts_with(b"%PDF") {
            return Ok(Self {
                name,
                kind: DocumentKind::Pdf,
                mime_type: "application/pdf".to_string(),
                data,
            });
        }

        match image::guess_format(&data) {
            Ok(format) => Ok(Self {
                name,
                kind: DocumentKind::Image,
                mime_type: format.to_mime_type().to_string(),
                data,
            }),
            Err(_) => Err(ExamOracleError::UnsupportedDocument {
                name,
                magic: data.iter().take(4).copied().collect(),
            }),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.kind == DocumentKind::Pdf
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load one input, either a local file or an HTTP/HTTPS URL.
pub async fn load_document(
    input: &str,
    timeout_secs: u64,
) -> Result<SourceDocument, ExamOracleError> {
    if input.trim().is_empty() {
        return Err(ExamOracleError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

/// Load several inputs, preserving their order.
///
/// At most `concurrency` inputs are read at once. The first failure aborts
/// the whole batch.
pub async fn load_documents<S: AsRef<str>>(
    inputs: &[S],
    timeout_secs: u64,
    concurrency: usize,
) -> Result<Vec<SourceDocument>, ExamOracleError> {
    let loaded: Vec<Result<SourceDocument, ExamOracleError>> =
        stream::iter(inputs.iter().map(|i| load_document(i.as_ref(), timeout_secs)))
            .buffered(concurrency.max(1))
            .collect()
            .await;

    loaded.into_iter().collect()
}

async fn load_local(path: &Path) -> Result<SourceDocument, ExamOracleError> {
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExamOracleError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExamOracleError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} ({} bytes)", path.display(), data.len());
    SourceDocument::from_bytes(name, data)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, ExamOracleError> {
    info!("Downloading paper from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExamOracleError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExamOracleError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExamOracleError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExamOracleError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExamOracleError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    SourceDocument::from_bytes(file_name_from_url(url), bytes.to_vec())
}

/// Extract a reasonable display name from the URL path.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded-paper".to_string()
}
