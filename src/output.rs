//! Output types of a completed analysis.

use crate::model::AnalysisResult;
use serde::{Deserialize, Serialize};

/// The parsed analysis plus bookkeeping about how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub stats: AnalysisStats,
}

/// Counters and timings for one analysis request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Uploaded documents.
    pub documents: usize,
    /// Inline parts sent to the model (one per image, one per PDF page).
    pub parts: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Time spent reading, rasterising and encoding the documents.
    pub prepare_duration_ms: u64,
    /// Time spent waiting for the model.
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
