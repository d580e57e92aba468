//! Text-generation seam.
//!
//! The pipeline only needs "prompt in, raw text out"; [`GeminiClient`] is
//! the production implementation.

mod gemini;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

use crate::error::GenerationError;
use crate::prompt::GenerationPrompt;
use async_trait::async_trait;

/// Produces raw model output for a prompt.
///
/// Implementations issue a single attempt; retries are not part of this contract.
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, GenerationError>;

    /// Short identifier for logs and health output.
    fn name(&self) -> &str;
}
