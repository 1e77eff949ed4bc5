//! VLM interaction: build the analysis messages and call the provider once.
//!
//! There is deliberately no retry loop here. An analysis is a single
//! request; when it fails the caller gets the provider's error as an
//! [`ExamOracleError::LlmApiError`] and decides whether to try again.

use crate::config::AnalysisConfig;
use crate::error::ExamOracleError;
use crate::prompts;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Raw model answer plus usage numbers.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Build the message list for one analysis request.
///
/// 1. **System message** — analysis instructions + JSON contract
/// 2. **User message** — a short instruction with every page attached
pub fn build_messages(
    parts: Vec<ImageData>,
    documents: usize,
    config: &AnalysisConfig,
) -> Vec<ChatMessage> {
    let system = prompts::system_prompt(config.system_prompt.as_deref());
    let instruction = prompts::user_instruction(documents, parts.len());

    vec![
        ChatMessage::system(system),
        ChatMessage::user_with_images(&instruction, parts),
    ]
}

/// Send the analysis request.
pub async fn request_analysis(
    provider: &Arc<dyn LLMProvider>,
    parts: Vec<ImageData>,
    documents: usize,
    config: &AnalysisConfig,
) -> Result<LlmReply, ExamOracleError> {
    let start = Instant::now();
    let part_count = parts.len();
    let messages = build_messages(parts, documents, config);
    let options = build_options(config);

    debug!("Sending analysis request with {} inline parts", part_count);

    let response = provider
        .chat(&messages, Some(&options))
        .await
        .map_err(|e| {
            warn!("Analysis request failed — {}", e);
            ExamOracleError::LlmApiError {
                message: e.to_string(),
            }
        })?;

    let duration = start.elapsed();
    debug!(
        "Analysis reply: {} input tokens, {} output tokens, {:?}",
        response.prompt_tokens, response.completion_tokens, duration
    );

    Ok(LlmReply {
        content: response.content,
        input_tokens: response.prompt_tokens as u64,
        output_tokens: response.completion_tokens as u64,
        duration_ms: duration.as_millis() as u64,
    })
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
