//! Error types for the exam-oracle library.
//!
//! A single fatal error type, [`ExamOracleError`], covers every failure an
//! analysis or paper export can hit. None of them are retried: an analysis
//! either produces a complete [`crate::model::AnalysisResult`] or stops with
//! one of these variants, and the message is shown to the user verbatim.
//!
//! The variants map onto four user-visible families:
//!
//! * **Configuration** — no provider or credential ([`ExamOracleError::ProviderNotConfigured`]).
//! * **Empty response** — the model answered with nothing ([`ExamOracleError::EmptyResponse`]).
//! * **Parse** — the answer is not the expected JSON ([`ExamOracleError::ParseFailed`]).
//! * **Network** — the provider call itself failed ([`ExamOracleError::LlmApiError`]).
//!
//! Everything else concerns reading the uploaded documents or writing the
//! exported paper.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the exam-oracle library.
#[derive(Debug, Error)]
pub enum ExamOracleError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The analysis was triggered without any document.
    #[error("No documents supplied.\nAdd at least one previous-year paper (PDF or image).")]
    NoDocuments,

    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file was read but is neither a PDF nor a recognised image.
    #[error("Unsupported document '{name}': expected a PDF or an image\nFirst bytes: {magic:?}")]
    UnsupportedDocument { name: String, magic: Vec<u8> },

    // ── PDF input errors ──────────────────────────────────────────────────
    /// The uploaded PDF cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page} of '{name}': {detail}")]
    RasterisationFailed {
        name: String,
        page: usize,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDF papers are rasterised with PDFium before being sent to the model.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Or place libpdfium next to the executable / in the working directory.\n\
Image uploads (PNG, JPEG, …) do not need PDFium."
    )]
    PdfiumBindingFailed(String),

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider call failed (transport, HTTP status, content filter…).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The provider answered but the content is empty.
    #[error("No response from the analysis model.")]
    EmptyResponse,

    /// The content is not JSON of the expected shape.
    #[error("Could not parse the analysis response: {detail}")]
    ParseFailed { detail: String },

    /// A second analysis was requested while one is still running.
    #[error("An analysis is already in progress for this session.")]
    AnalysisPending,

    /// A paper download was requested before any analysis completed.
    #[error("No analysis result available.\nAnalyse some papers before downloading the model paper.")]
    NoResult,

    // ── Output errors ─────────────────────────────────────────────────────
    /// The PDF writer rejected the laid-out document.
    #[error("Failed to build the model paper PDF: {0}")]
    PdfWrite(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExamOracleError {
    /// `true` for the failures of the model call itself, as opposed to input
    /// or output problems.
    pub fn is_analysis_failure(&self) -> bool {
        matches!(
            self,
            ExamOracleError::ProviderNotConfigured { .. }
                | ExamOracleError::LlmApiError { .. }
                | ExamOracleError::EmptyResponse
                | ExamOracleError::ParseFailed { .. }
        )
    }
}
