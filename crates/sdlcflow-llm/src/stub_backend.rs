//! Deterministic offline backend
//!
//! Used when no API key is configured and in tests. Returns scripted responses in
//! order, then the fixed fallback message forever.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use sdlcflow_utils::error::LlmError;

use crate::types::{LlmBackend, LlmInvocation, LlmResult};

/// Message returned when no response is configured
pub const DEFAULT_STUB_RESPONSE: &str =
    "Stub response. Configure OPENAI_API_KEY to enable full LLM output.";

const PROVIDER: &str = "stub";

/// Backend that never touches the network.
#[derive(Debug)]
pub struct StubBackend {
    message: String,
    script: Mutex<VecDeque<String>>,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new(DEFAULT_STUB_RESPONSE)
    }
}

impl StubBackend {
    /// Always answer with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Answer with `responses` in order, then with the default message.
    #[must_use]
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        let script = responses.into_iter().map(Into::into).collect();
        Self {
            script: Mutex::new(script),
            ..backend
        }
    }

    fn next_response(&self) -> String {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        script.pop_front().unwrap_or_else(|| self.message.clone())
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        Ok(LlmResult::new(self.next_response(), PROVIDER, inv.model))
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}
