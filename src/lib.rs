//! # exam-oracle
//!
//! Analyse previous-year exam papers with a Vision Language Model and export
//! a predicted model question paper as PDF.
//!
//! Spotting repeated questions and predicting likely ones is delegated to the
//! model through a strict JSON contract. The crate handles everything around
//! that call: reading scans and PDFs, packaging them as inline images,
//! cleaning and parsing the answer, and laying out a paginated paper.
//!
//! ## Pipeline Overview
//!
//! ```text
//! papers (PDF / PNG / JPEG …)
//!  │
//!  ├─ 1. Input    read local files or download URLs, sniff the type
//!  ├─ 2. Render   rasterise PDF pages via pdfium (spawn_blocking)
//!  ├─ 3. Encode   base64 ImageData parts
//!  ├─ 4. VLM      one request: system prompt + every page
//!  ├─ 5. Parse    strip fences / BOM, serde_json into AnalysisResult
//!  └─ 6. Paper    layout engine → lopdf → <Subject>_Model_Paper.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exam_oracle::{analyze, paper, AnalysisConfig, PaperTemplate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = AnalysisConfig::default();
//!     let output = analyze(&["2022-summer.pdf", "2023-winter.jpg"], &config).await?;
//!     for q in &output.result.predicted_questions {
//!         println!("[{}] {} ({})", q.probability_level, q.question_text, q.marks);
//!     }
//!     let path = paper::write_paper(&output.result, &PaperTemplate::default(), ".".as_ref())?;
//!     eprintln!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `exam-oracle` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! PDF uploads need a pdfium shared library at run time (`PDFIUM_LIB_PATH`,
//! the working directory, or the system library path). Image uploads and
//! paper export do not.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod paper;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, FixtureAnalyzer, LlmAnalyzer, PaperAnalyzer};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::ExamOracleError;
pub use model::{AnalysisResult, Marks, PredictedQuestion, ProbabilityLevel, RepeatedQuestion};
pub use output::{AnalysisOutput, AnalysisStats};
pub use paper::{PaperLayout, PaperTemplate};
pub use pipeline::input::SourceDocument;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::Session;
