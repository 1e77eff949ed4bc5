//! Post-processing: turn the raw model answer into an [`AnalysisResult`].
//!
//! Even when told to output strict JSON, models regularly wrap the answer in
//! a ```` ```json ```` fence, prepend a sentence, or leak a BOM. Those are
//! cleaned up deterministically here; anything that still fails to parse is a
//! [`ExamOracleError::ParseFailed`].
//!
//! ## Rule Order
//!
//! 1. Normalise line endings (CRLF → LF)
//! 2. Strip invisible Unicode (BOM, zero-width characters)
//! 3. Strip an outer code fence
//! 4. Cut the text down to the outermost `{ … }` object
//! 5. Parse with serde_json

use crate::error::ExamOracleError;
use crate::model::AnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Parse a raw model answer.
///
/// # Errors
/// - [`ExamOracleError::EmptyResponse`] when the answer is empty or blank
/// - [`ExamOracleError::ParseFailed`] when it is not the expected JSON
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ExamOracleError> {
    if raw.trim().is_empty() {
        return Err(ExamOracleError::EmptyResponse);
    }

    let cleaned = clean_response(raw);
    if cleaned.is_empty() {
        return Err(ExamOracleError::EmptyResponse);
    }

    let result: AnalysisResult =
        serde_json::from_str(&cleaned).map_err(|e| ExamOracleError::ParseFailed {
            detail: e.to_string(),
        })?;

    debug!(
        "Parsed analysis for '{}': {} repeated, {} predicted",
        result.subject_name,
        result.repeated_questions.len(),
        result.predicted_questions.len()
    );
    Ok(result)
}

/// Apply all cleanup rules to the raw model output.
pub fn clean_response(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = strip_code_fences(&s);
    extract_json_object(&s).trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").expect("static regex is valid")
});

fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCES.captures(trimmed) {
        caps[1].to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Rule 4: Keep only the outermost JSON object ──────────────────────────────

/// Slice from the first `{` to the last `}`. Text without braces is
/// returned unchanged so the parser reports a meaningful error.
fn extract_json_object(input: &str) -> &str {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => &input[start..=end],
        _ => input,
    }
}
