//! Model interaction: build the chat request and call the provider.
//!
//! This is the only stage with network I/O. The prompt text lives in
//! [`crate::prompts`]; the answer is returned as-is for the extraction
//! pipeline.
//!
//! ## Retry Strategy
//!
//! Transient failures (429, 5xx, timeouts) are retried with exponential
//! backoff (`retry_backoff_ms * 2^attempt`): with the defaults the waits are
//! 500 ms then 1 s. Authentication failures are returned immediately.

use crate::config::GenerationConfig;
use crate::error::PixelGenError;
use crate::prompts::{user_message, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Raw model answer plus accounting.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Ask the model for pixel art of `prompt`.
///
/// ## Message Layout
///
/// 1. **System message**: the pixel-art rules (or the configured override)
/// 2. **User message**: the subject, quoted
///
/// # Errors
/// - [`PixelGenError::AuthError`] on a rejected API key (not retried)
/// - [`PixelGenError::ApiTimeout`] when the final attempt timed out
/// - [`PixelGenError::LlmApiError`] when the final attempt failed otherwise
pub async fn request_pixel_art(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<ModelResponse, PixelGenError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_message(prompt)),
    ];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err = PixelGenError::LlmApiError {
        message: "no attempt was made".to_string(),
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Model call: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let attempt_start = Instant::now();
        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "Model call: {} input tokens, {} output tokens, {} chars, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    response.content.len(),
                    duration
                );
                return Ok(ModelResponse {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                let message = format!("{}", e);
                warn!("Model call: attempt {} failed: {}", attempt + 1, message);
                if is_auth_failure(&message) {
                    return Err(PixelGenError::AuthError {
                        provider: provider_label(config),
                        detail: message,
                    });
                }
                last_err = PixelGenError::LlmApiError { message };
            }
            Err(_) => {
                let elapsed_ms = attempt_start.elapsed().as_millis() as u64;
                warn!("Model call: attempt {} timed out after {}ms", attempt + 1, elapsed_ms);
                last_err = PixelGenError::ApiTimeout { elapsed_ms };
            }
        }
    }

    Err(last_err)
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Heuristic on the provider's error text; the error type is provider-specific.
fn is_auth_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["401", "403", "unauthorized", "invalid api key", "incorrect api key", "authentication"]
        .iter()
        .any(|needle| lower.contains(needle))
}

fn provider_label(config: &GenerationConfig) -> String {
    config
        .provider_name
        .clone()
        .unwrap_or_else(|| "auto".to_string())
}
