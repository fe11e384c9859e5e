//! Generation entry points.
//!
//! [`generate_pixels_from_prompt`] is the primary API: validate the prompt,
//! resolve a provider, ask the model once, and run the extraction pipeline on
//! the answer. [`process_response`] runs only the pipeline, for callers that
//! already hold a model answer (saved transcripts, other clients, tests).

use crate::config::{GenerationConfig, DEFAULT_MODEL};
use crate::error::PixelGenError;
use crate::export;
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::{self, llm};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate 16×16 pixel art for a text prompt.
///
/// # Errors
/// Returns `Err(PixelGenError)` only for fatal errors, classified by
/// [`PixelGenError::kind`]:
/// - empty prompt → input validation
/// - no provider / rejected credentials → configuration
/// - model call failed, timed out or answered nothing → upstream
/// - no pixel data recoverable from the answer → extraction
///
/// Malformed or white records in the answer are not errors; they are dropped.
/// A low pixel count is reported through `output.warning`.
pub async fn generate_pixels_from_prompt(
    prompt: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, PixelGenError> {
    let total_start = Instant::now();
    let prompt = validate_prompt(prompt.as_ref())?;
    info!("Generating pixel art for: {:?}", prompt);

    // ── Step 1: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 2: Ask the model ────────────────────────────────────────────
    let response = llm::request_pixel_art(&provider, prompt, config).await?;
    if response.content.trim().is_empty() {
        return Err(PixelGenError::EmptyResponse);
    }
    debug!("Raw model output ({} chars)", response.content.len());

    // ── Step 3: Extract → sanitize → compose ─────────────────────────────
    let mut output = process_response(&response.content, config)?;

    output.stats.input_tokens = response.input_tokens;
    output.stats.output_tokens = response.output_tokens;
    output.stats.retries = response.retries;
    output.stats.duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Generated {} pixels in {}ms",
        output.stats.pixels, output.stats.duration_ms
    );
    Ok(output)
}

/// Run the extraction pipeline on an already-obtained model answer.
///
/// Needs no provider or API key.
pub fn process_response(
    raw: &str,
    config: &GenerationConfig,
) -> Result<GenerationOutput, PixelGenError> {
    let start = Instant::now();
    let mut output = pipeline::run(raw, config.min_pixels)?;
    output.stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Synchronous wrapper around [`generate_pixels_from_prompt`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    prompt: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, PixelGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PixelGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_pixels_from_prompt(prompt, config))
}

/// Generate pixel art and write it as a PNG.
///
/// Each grid cell becomes a `scale × scale` block.
pub async fn generate_to_png(
    prompt: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    scale: u32,
    config: &GenerationConfig,
) -> Result<GenerationStats, PixelGenError> {
    let output = generate_pixels_from_prompt(prompt, config).await?;
    export::write_png(&output.grid, scale, output_path)?;
    Ok(output.stats)
}

/// Outcome of one prompt in a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Position of the prompt in the input slice.
    pub index: usize,
    pub prompt: String,
    pub result: Result<GenerationOutput, PixelGenError>,
}

/// Generate several prompts concurrently (`config.concurrency` at a time).
///
/// Each prompt runs its own independent pipeline; one failure does not affect
/// the others. Results are returned in input order.
pub async fn generate_batch<S: AsRef<str>>(
    prompts: &[S],
    config: &GenerationConfig,
) -> Vec<BatchItem> {
    let total = prompts.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut items: Vec<BatchItem> = stream::iter(prompts.iter().enumerate().map(|(index, prompt)| {
        let prompt = prompt.as_ref().to_string();
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_prompt_start(index, total);
            }
            let result = generate_pixels_from_prompt(&prompt, config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result {
                    Ok(output) => cb.on_prompt_complete(index, total, output.pixels.len()),
                    Err(e) => cb.on_prompt_error(index, total, &e.to_string()),
                }
            }
            if let Err(ref e) = result {
                warn!("Prompt {} failed: {}", index + 1, e);
            }
            BatchItem {
                index,
                prompt,
                result,
            }
        }
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    items.sort_by_key(|item| item.index);

    let success = items.iter().filter(|item| item.result.is_ok()).count();
    info!("Batch complete: {}/{} prompts succeeded", success, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, success);
    }
    items
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn validate_prompt(prompt: &str) -> Result<&str, PixelGenError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PixelGenError::EmptyPrompt);
    }
    Ok(trimmed)
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PixelGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PixelGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, PixelGenError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, config.model.as_deref().unwrap_or(&model));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PixelGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY (https://platform.openai.com/api-keys), ANTHROPIC_API_KEY,\n\
                or GEMINI_API_KEY, or pass --provider/--model.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
