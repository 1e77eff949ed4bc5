//! Analysis entry points.
//!
//! [`PaperAnalyzer`] is the seam between the session and whatever produces an
//! [`AnalysisResult`]. [`LlmAnalyzer`] is the live implementation: it turns
//! the uploaded papers into inline image parts, sends them to the model in a
//! single request and parses the JSON answer. [`FixtureAnalyzer`] replays a
//! stored result without touching the network.

use crate::config::AnalysisConfig;
use crate::error::ExamOracleError;
use crate::model::AnalysisResult;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::input::{self, DocumentKind, SourceDocument};
use crate::pipeline::{encode, llm, postprocess, render};
use edgequake_llm::{ImageData, LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Something that can analyse a batch of uploaded papers.
pub trait PaperAnalyzer: Send + Sync {
    /// Analyse `documents` and return the structured result.
    ///
    /// # Errors
    /// [`ExamOracleError::NoDocuments`] for an empty batch, otherwise whatever
    /// the implementation hits.
    fn analyze(
        &self,
        documents: &[SourceDocument],
    ) -> impl Future<Output = Result<AnalysisOutput, ExamOracleError>> + Send;
}

// ── Live analyzer ────────────────────────────────────────────────────────

/// Analyzer backed by a vision-capable LLM provider.
#[derive(Clone)]
pub struct LlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    config: AnalysisConfig,
}

impl LlmAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: AnalysisConfig) -> Self {
        Self { provider, config }
    }

    /// Build an analyzer, resolving the provider from `config` and the
    /// environment.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, ExamOracleError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(provider, config))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    async fn run(&self, documents: &[SourceDocument]) -> Result<AnalysisOutput, ExamOracleError> {
        let total_start = Instant::now();

        // ── Step 1: Prepare inline parts ─────────────────────────────────
        let prepare_start = Instant::now();
        let parts = prepare_parts(documents, &self.config).await?;
        let prepare_duration_ms = prepare_start.elapsed().as_millis() as u64;
        info!(
            "Prepared {} part(s) from {} document(s) in {}ms",
            parts.len(),
            documents.len(),
            prepare_duration_ms
        );

        // ── Step 2: Single model request ─────────────────────────────────
        let part_count = parts.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_request_sent(part_count);
        }
        let reply =
            llm::request_analysis(&self.provider, parts, documents.len(), &self.config).await?;

        // ── Step 3: Parse ────────────────────────────────────────────────
        let result = postprocess::parse_analysis(&reply.content)?;

        let stats = AnalysisStats {
            documents: documents.len(),
            parts: part_count,
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            prepare_duration_ms,
            llm_duration_ms: reply.duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Analysis complete for '{}': {} repeated, {} predicted, {}ms total",
            result.subject_name,
            result.repeated_questions.len(),
            result.predicted_questions.len(),
            stats.total_duration_ms
        );

        Ok(AnalysisOutput { result, stats })
    }
}

impl PaperAnalyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        documents: &[SourceDocument],
    ) -> Result<AnalysisOutput, ExamOracleError> {
        if documents.is_empty() {
            return Err(ExamOracleError::NoDocuments);
        }

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_analysis_start(documents.len());
        }

        let outcome = self.run(documents).await;
        if let Err(ref e) = outcome {
            warn!("Analysis failed: {}", e);
        }

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_analysis_complete(outcome.is_ok());
        }
        outcome
    }
}

/// Turn every document into inline parts, keeping upload order.
async fn prepare_parts(
    documents: &[SourceDocument],
    config: &AnalysisConfig,
) -> Result<Vec<ImageData>, ExamOracleError> {
    let total = documents.len();
    let pending: Vec<futures::future::BoxFuture<'_, Result<Vec<ImageData>, ExamOracleError>>> =
        documents.iter().enumerate().map(|(idx, doc)| {
            // Boxed: `PaperAnalyzer::analyze` must return a Send future.
            async move {
                let parts = prepare_document(doc, config).await?;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_prepared(idx + 1, total, &doc.name, parts.len());
                }
                Ok::<_, ExamOracleError>(parts)
            }
            .boxed()
        }).collect();
    let prepared: Vec<Result<Vec<ImageData>, ExamOracleError>> =
        stream::iter(pending)
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut parts = Vec::new();
    for doc_parts in prepared {
        parts.extend(doc_parts?);
    }
    Ok(parts)
}

async fn prepare_document(
    doc: &SourceDocument,
    config: &AnalysisConfig,
) -> Result<Vec<ImageData>, ExamOracleError> {
    match doc.kind {
        DocumentKind::Image => Ok(vec![encode::encode_image_document(doc)]),
        DocumentKind::Pdf => {
            let pages = render::rasterise_pdf(doc, config).await?;
            debug!("{}: rasterised {} page(s)", doc.name, pages.len());
            encode::encode_pages(&doc.name, &pages)
        }
    }
}

// ── Fixture analyzer ─────────────────────────────────────────────────────

/// Returns a stored result for every request.
///
/// Used to re-render a saved analysis (`--from-json`) and in tests. Counts how
/// often it was asked so callers can assert that no request was made.
#[derive(Debug)]
pub struct FixtureAnalyzer {
    result: AnalysisResult,
    calls: AtomicUsize,
}

impl FixtureAnalyzer {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    /// Parse a saved analysis. Accepts the raw model answer as well as a
    /// serialised [`AnalysisOutput`].
    pub fn from_json_str(json: &str) -> Result<Self, ExamOracleError> {
        if let Ok(output) = serde_json::from_str::<AnalysisOutput>(json) {
            return Ok(Self::new(output.result));
        }
        postprocess::parse_analysis(json).map(Self::new)
    }

    pub fn from_file(path: &Path) -> Result<Self, ExamOracleError> {
        let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ExamOracleError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ExamOracleError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;
        Self::from_json_str(&json)
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    /// Number of `analyze` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaperAnalyzer for FixtureAnalyzer {
    async fn analyze(
        &self,
        documents: &[SourceDocument],
    ) -> Result<AnalysisOutput, ExamOracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if documents.is_empty() {
            return Err(ExamOracleError::NoDocuments);
        }
        Ok(AnalysisOutput {
            result: self.result.clone(),
            stats: AnalysisStats {
                documents: documents.len(),
                parts: documents.len(),
                ..Default::default()
            },
        })
    }
}

// ── Top-level entry points ───────────────────────────────────────────────

/// Analyse previous-year papers given as local paths or URLs.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - [`ExamOracleError::NoDocuments`] when `inputs` is empty (checked before
///   any provider is resolved)
/// - input errors for unreadable, missing or unsupported documents
/// - [`ExamOracleError::ProviderNotConfigured`] without usable credentials
/// - [`ExamOracleError::LlmApiError`], [`ExamOracleError::EmptyResponse`] or
///   [`ExamOracleError::ParseFailed`] from the model call
pub async fn analyze<S: AsRef<str>>(
    inputs: &[S],
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ExamOracleError> {
    if inputs.is_empty() {
        return Err(ExamOracleError::NoDocuments);
    }
    info!("Starting analysis of {} input(s)", inputs.len());

    let documents =
        input::load_documents(inputs, config.download_timeout_secs, config.concurrency).await?;
    let analyzer = LlmAnalyzer::from_config(config.clone())?;
    analyzer.analyze(&documents).await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, ExamOracleError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExamOracleError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze(inputs, config))
}

/// Default model for a provider name.
pub fn default_model_for(provider_name: &str) -> &'static str {
    match provider_name.to_ascii_lowercase().as_str() {
        "gemini" | "google" | "vertexai" => "gemini-2.5-flash",
        "anthropic" | "claude" => "claude-sonnet-4-20250514",
        _ => "gpt-4.1-mini",
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExamOracleError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExamOracleError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or the
///    provider's default model. The API key comes from the environment.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, ExamOracleError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model_for(name));
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(default_model_for("openai"));
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExamOracleError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Marks, PredictedQuestion, ProbabilityLevel};

    fn sample() -> AnalysisResult {
        AnalysisResult {
            subject_name: "Data Structures".to_string(),
            subject_code: Some("22317".to_string()),
            repeated_questions: vec![],
            predicted_questions: vec![PredictedQuestion {
                question_text: "Define a stack.".to_string(),
                reasoning: "Asked every year".to_string(),
                probability_level: ProbabilityLevel::High,
                marks: Marks::Two,
            }],
        }
    }

    fn png_document() -> SourceDocument {
        SourceDocument::from_bytes("page.png", b"\x89PNG\r\n\x1a\n0000".to_vec()).unwrap()
    }

    #[test]
    fn default_models() {
        assert_eq!(default_model_for("gemini"), "gemini-2.5-flash");
        assert_eq!(default_model_for("Anthropic"), "claude-sonnet-4-20250514");
        assert_eq!(default_model_for("openai"), "gpt-4.1-mini");
        assert_eq!(default_model_for("ollama"), "gpt-4.1-mini");
    }

    #[tokio::test]
    async fn empty_inputs_fail_before_provider_lookup() {
        let inputs: &[&str] = &[];
        let err = analyze(inputs, &AnalysisConfig::default()).await.unwrap_err();
        assert!(matches!(err, ExamOracleError::NoDocuments));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = analyze(&["/no/such/paper.pdf"][..], &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExamOracleError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn fixture_returns_stored_result() {
        let fixture = FixtureAnalyzer::new(sample());
        let output = fixture.analyze(&[png_document()]).await.unwrap();
        assert_eq!(output.result, sample());
        assert_eq!(output.stats.documents, 1);
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn fixture_rejects_empty_batch() {
        let fixture = FixtureAnalyzer::new(sample());
        assert!(matches!(
            fixture.analyze(&[]).await,
            Err(ExamOracleError::NoDocuments)
        ));
    }

    #[test]
    fn fixture_reads_raw_answer_and_saved_output() {
        let raw = serde_json::to_string(&sample()).unwrap();
        let from_raw = FixtureAnalyzer::from_json_str(&format!("```json\n{raw}\n```")).unwrap();
        assert_eq!(from_raw.result(), &sample());

        let saved = serde_json::to_string(&AnalysisOutput {
            result: sample(),
            stats: AnalysisStats::default(),
        })
        .unwrap();
        assert_eq!(FixtureAnalyzer::from_json_str(&saved).unwrap().result(), &sample());
    }

    #[test]
    fn fixture_file_not_found() {
        let err = FixtureAnalyzer::from_file(Path::new("/no/such/analysis.json")).unwrap_err();
        assert!(matches!(err, ExamOracleError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn image_documents_become_one_part_each() {
        let docs = vec![png_document(), png_document()];
        let parts = prepare_parts(&docs, &AnalysisConfig::default()).await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn llm_analyzer_runs_inside_tokio_spawn() {
        let provider = edgequake_llm::MockProvider::new();
        provider
            .add_response(serde_json::to_string(&sample()).unwrap())
            .await;
        let analyzer = Arc::new(LlmAnalyzer::new(
            Arc::new(provider),
            AnalysisConfig::default(),
        ));

        let task_analyzer = Arc::clone(&analyzer);
        let output = tokio::spawn(async move {
            task_analyzer
                .analyze(&[png_document(), png_document()])
                .await
        })
        .await
        .expect("spawn must succeed")
        .expect("mock analysis succeeds");

        assert_eq!(output.result, sample());
        assert_eq!(output.stats.documents, 2);
        assert_eq!(output.stats.parts, 2);
    }

    #[tokio::test]
    async fn llm_analyzer_reports_unparseable_reply() {
        // With an empty queue the mock answers with plain prose.
        let analyzer = LlmAnalyzer::new(
            Arc::new(edgequake_llm::MockProvider::new()),
            AnalysisConfig::default(),
        );
        let err = analyzer.analyze(&[png_document()]).await.unwrap_err();
        assert!(err.is_analysis_failure());
    }
}
