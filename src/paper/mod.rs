//! Model question paper: layout engine and PDF export.
//!
//! ```text
//! AnalysisResult ──▶ layout ──▶ PaperLayout ──▶ pdf ──▶ bytes ──▶ <Subject>_Model_Paper.pdf
//! ```
//!
//! [`layout`] is pure and deterministic: the same result and template always
//! produce the same pages. Only [`pdf`] serialisation and the final file
//! write can fail.

pub mod cursor;
pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod template;
pub mod wrap;

pub use layout::{item_label, layout_paper, partition_questions, PaperLayout, QuestionBlock};
pub use template::PaperTemplate;
pub use wrap::wrap_text;

use crate::error::ExamOracleError;
use crate::model::AnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

static RE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static regex is valid"));

static RE_UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("static regex is valid"));

/// File name of the exported paper: whitespace runs in the subject name
/// become `_`, then `_Model_Paper.pdf` is appended.
///
/// The subject name comes from the model, so path separators and characters
/// invalid in file names are replaced with `_` and leading dots are dropped.
/// The result always names a file directly inside the output directory.
///
/// ```
/// use exam_oracle::paper::paper_file_name;
///
/// assert_eq!(
///     paper_file_name("Digital Electronics 2"),
///     "Digital_Electronics_2_Model_Paper.pdf"
/// );
/// assert_eq!(
///     paper_file_name("C/C++ Programming"),
///     "C_C++_Programming_Model_Paper.pdf"
/// );
/// ```
pub fn paper_file_name(subject_name: &str) -> String {
    let spaced = RE_WHITESPACE.replace_all(subject_name, "_");
    let safe = RE_UNSAFE_CHARS.replace_all(&spaced, "_");
    format!("{}_Model_Paper.pdf", safe.trim_start_matches('.'))
}

/// Lay out and serialise the paper for `result`.
pub fn render_paper(
    result: &AnalysisResult,
    template: &PaperTemplate,
) -> Result<Vec<u8>, ExamOracleError> {
    let layout = layout_paper(result, template);
    let title = format!("{} Model Paper", result.subject_name);
    pdf::write_pdf(&layout, &title)
}

/// Render the paper and write it into `dir`. Returns the written path.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so an interrupted export never leaves a truncated PDF behind.
pub fn write_paper(
    result: &AnalysisResult,
    template: &PaperTemplate,
    dir: &Path,
) -> Result<PathBuf, ExamOracleError> {
    let bytes = render_paper(result, template)?;
    let path = dir.join(paper_file_name(&result.subject_name));

    let write_err = |source: std::io::Error| ExamOracleError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    info!("Model paper written to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
