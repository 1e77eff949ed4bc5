//! The structured analysis returned by the model.
//!
//! These types mirror the JSON contract the model is asked to produce (see
//! [`crate::prompts::RESPONSE_CONTRACT`]). Field names are camelCase on the
//! wire and snake_case in Rust.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder the model is told to use when no subject code is visible.
pub const UNKNOWN_SUBJECT_CODE: &str = "XXXXX";

/// Everything the model found in one batch of papers.
///
/// Produced once per analysis and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub subject_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
    #[serde(default)]
    pub repeated_questions: Vec<RepeatedQuestion>,
    #[serde(default)]
    pub predicted_questions: Vec<PredictedQuestion>,
}

impl AnalysisResult {
    /// The subject code, or `None` when it is missing, blank or the
    /// `XXXXX` placeholder.
    ///
    /// The prompt asks the model for `XXXXX` when no code is printed on the
    /// papers. It is treated the same as a missing code so the paper header
    /// shows `-----` rather than the placeholder.
    pub fn subject_code(&self) -> Option<&str> {
        self.subject_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty() && *code != UNKNOWN_SUBJECT_CODE)
    }

    /// Number of predicted questions tagged with the given probability.
    pub fn count_by_probability(&self, level: ProbabilityLevel) -> usize {
        self.predicted_questions
            .iter()
            .filter(|q| q.probability_level == level)
            .count()
    }
}

/// A question that appeared in more than one of the uploaded papers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedQuestion {
    pub question_text: String,
    /// Free text, e.g. "Appeared in 2022, 2023".
    #[serde(default)]
    pub frequency: String,
    /// Topic label.
    #[serde(default)]
    pub context: String,
}

/// A question the model expects in the upcoming exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedQuestion {
    pub question_text: String,
    #[serde(default)]
    pub reasoning: String,
    pub probability_level: ProbabilityLevel,
    pub marks: Marks,
}

impl PredictedQuestion {
    /// Short-answer questions are the 2-mark ones.
    pub fn is_short(&self) -> bool {
        self.marks == Marks::Two
    }
}

/// Coarse likelihood tag assigned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbabilityLevel {
    High,
    Medium,
    Low,
}

impl ProbabilityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbabilityLevel::High => "High",
            ProbabilityLevel::Medium => "Medium",
            ProbabilityLevel::Low => "Low",
        }
    }
}

impl fmt::Display for ProbabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated weightage of a predicted question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marks {
    #[serde(rename = "2 Marks")]
    Two,
    #[serde(rename = "4 Marks")]
    Four,
    #[serde(rename = "6 Marks")]
    Six,
}

impl Marks {
    pub fn value(self) -> u8 {
        match self {
            Marks::Two => 2,
            Marks::Four => 4,
            Marks::Six => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Marks::Two => "2 Marks",
            Marks::Four => "4 Marks",
            Marks::Six => "6 Marks",
        }
    }
}

impl fmt::Display for Marks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
