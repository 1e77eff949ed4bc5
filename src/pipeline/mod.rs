//! Pipeline stages for paper analysis.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//! (path/URL) (pdfium)  (base64)  (VLM)   (JSON cleanup + parse)
//! ```
//!
//! 1. [`input`]  — read a local path or download a URL, detect PDF vs. image
//! 2. [`render`] — rasterise PDF pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`] — base64-wrap page images and image uploads for the
//!    multimodal request body
//! 4. [`llm`]    — the single model call; the only stage with network I/O
//!    towards the provider
//! 5. [`postprocess`] — strip fences and invisible characters, then parse the
//!    JSON contract into an [`crate::model::AnalysisResult`]

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
