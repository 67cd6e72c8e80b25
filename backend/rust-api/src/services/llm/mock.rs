//! Scripted provider for tests and offline runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmProvider, ProviderError};

/// Returns canned replies chosen by prompt substring.
pub struct MockProvider {
    /// (prompt substring, response) pairs, checked in order.
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    call_count: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new(responses: Vec<(String, String)>) -> Self {
        Self {
            responses,
            default_response: None,
            call_count: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: Some(response.to_string()),
            ..Self::new(Vec::new())
        }
    }

    /// Every call fails with a non-retryable API error.
    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(prompt.to_string());

        self.responses
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| ProviderError::ApiError {
                status: 400,
                message: "mock provider has no response for this prompt".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_prompt_substrings() {
        let mock = MockProvider::new(vec![
            ("related_topics".to_string(), "{\"related_topics\": []}".to_string()),
            ("quiz writer".to_string(), "[]".to_string()),
        ]);

        assert_eq!(mock.complete("You are an expert quiz writer").await.unwrap(), "[]");
        assert_eq!(mock.call_count(), 1);
        assert!(mock.complete("unrelated").await.is_err());
        assert_eq!(mock.last_prompt().as_deref(), Some("unrelated"));
    }

    #[tokio::test]
    async fn fixed_response_answers_everything() {
        let mock = MockProvider::with_fixed_response("ok");
        assert_eq!(mock.complete("a").await.unwrap(), "ok");
        assert_eq!(mock.complete("b").await.unwrap(), "ok");
        assert_eq!(mock.call_count(), 2);
    }
}
