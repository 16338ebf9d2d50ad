//! Canned-answer generator for tests and offline use.

use std::sync::Mutex;

use async_trait::async_trait;
use ragkit_core::{Generator, RagError, Result};

/// Returns a fixed answer and remembers every prompt it was given.
///
/// ```rust,ignore
/// let mock = MockGenerator::new("42");
/// assert_eq!(mock.generate("prompt", 10).await?, "42");
/// assert_eq!(mock.prompts(), ["prompt"]);
/// ```
#[derive(Debug)]
pub struct MockGenerator {
    answer: String,
    fail_with: Option<String>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl MockGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), fail_with: None, prompts: Mutex::new(Vec::new()) }
    }

    /// A generator whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { answer: String::new(), fail_with: Some(message.into()), prompts: Mutex::new(Vec::new()) }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(prompt, _)| prompt).collect()
    }

    /// `(prompt, max_tokens)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("This is a mock answer.")
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), max_tokens));
        }
        match &self.fail_with {
            Some(message) => Err(RagError::generation("mock", message.clone())),
            None => Ok(self.answer.clone()),
        }
    }
}
