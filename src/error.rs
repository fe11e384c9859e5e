//! Error types for the pixelprompt library.
//!
//! Three layers of "something went wrong", kept apart:
//!
//! * [`PixelGenError`] — **Fatal**: the request cannot produce a grid at all
//!   (empty prompt, provider not configured, model output unusable). Returned
//!   as `Err(PixelGenError)` from the top-level `generate*` functions.
//!
//! * [`DropReason`] — **Routine**: one candidate record from the model was
//!   malformed or painted the background. The record is discarded and the
//!   rest of the response is still used.
//!
//! * [`crate::output::GenerationWarning`] — **Advisory**: the request
//!   succeeded but produced suspiciously few pixels.
//!
//! Callers at a transport boundary usually only need [`PixelGenError::kind`]
//! to pick a status code: input validation, configuration and extraction
//! failures are always distinguishable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pixelprompt library.
#[derive(Debug, Error)]
pub enum PixelGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The prompt was missing, empty, or whitespace only.
    #[error("Prompt is required: describe what to draw (e.g. \"a yellow duck\")")]
    EmptyPrompt,

    // ── Configuration errors ──────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API rejected the credentials (401/403); not retried.
    #[error("Authentication error from provider '{provider}': {detail}\nCheck the API key in your environment.")]
    AuthError { provider: String, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Upstream model errors ─────────────────────────────────────────────
    /// The model API returned an error on every attempt.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The model call did not answer within the configured timeout.
    #[error("API call timed out after {elapsed_ms}ms")]
    ApiTimeout { elapsed_ms: u64 },

    /// The model answered with no text at all.
    #[error("The model returned an empty response")]
    EmptyResponse,

    // ── Processing errors ─────────────────────────────────────────────────
    /// None of the extraction strategies recovered structured pixel data.
    #[error("No structured pixel data recoverable from model output (tried {strategies_tried} strategies)")]
    ExtractionFailed { strategies_tried: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PNG encoder rejected the image.
    #[error("Failed to encode image '{path}': {detail}")]
    ImageEncodeFailed { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`PixelGenError`] for boundary code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The prompt itself is unusable.
    InputValidation,
    /// Credentials or settings are missing or wrong.
    Configuration,
    /// The model answered but nothing could be extracted.
    Extraction,
    /// The model call failed (transport, API error, timeout, empty answer).
    Upstream,
    /// Writing the result somewhere failed.
    Output,
    Internal,
}

impl PixelGenError {
    /// Classify this error for transport-level shaping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PixelGenError::EmptyPrompt => ErrorKind::InputValidation,
            PixelGenError::ProviderNotConfigured { .. }
            | PixelGenError::AuthError { .. }
            | PixelGenError::InvalidConfig(_) => ErrorKind::Configuration,
            PixelGenError::ExtractionFailed { .. } => ErrorKind::Extraction,
            PixelGenError::LlmApiError { .. }
            | PixelGenError::ApiTimeout { .. }
            | PixelGenError::EmptyResponse => ErrorKind::Upstream,
            PixelGenError::OutputWriteFailed { .. } | PixelGenError::ImageEncodeFailed { .. } => {
                ErrorKind::Output
            }
            PixelGenError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Why the sanitizer discarded a candidate record.
///
/// Not an error in the request sense: drops are expected whenever a model
/// strays from the output format, and they are only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A required field (`hexCode`, `column` or `row`) is absent or null.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field is present with the wrong JSON type.
    #[error("field '{0}' has the wrong type")]
    WrongType(&'static str),

    /// The color is the background white, which is never drawn.
    #[error("background color")]
    Background,

    /// The color is not `#` followed by six hex digits.
    #[error("malformed color")]
    MalformedColor,
}
