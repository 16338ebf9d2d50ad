//! Text generation backend trait.

use async_trait::async_trait;

use crate::error::Result;

/// A text generation backend that answers a fully rendered prompt.
///
/// Implementations live in `ragkit-model`. They report failures as
/// [`RagError::Generation`](crate::RagError::Generation).
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce a completion for `prompt` using at most `max_tokens` output tokens.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}
