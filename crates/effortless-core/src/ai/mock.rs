//! Mock backend for testing
//!
//! Returns a canned insights payload by default. Can be configured to return
//! custom text, fail, or stall, so both assembler modes are testable without
//! a running model server.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::GenerateRequest;
use super::AIBackend;

/// Payload returned by the default mock
pub const MOCK_INSIGHTS_JSON: &str = r#"{"summary_text": "Mock summary of your rewards activity.", "top_insights": ["Mock insight about your spending", "Mock insight about your savings"]}"#;

#[derive(Debug, Clone, Default)]
enum MockReply {
    #[default]
    Insights,
    Text(String),
    Fail(String),
}

/// Mock AI backend for testing
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Reply with `text` instead of the canned payload
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.reply = MockReply::Text(text.into());
        self
    }

    /// Fail every generation with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.reply = MockReply::Fail(message.into());
        self
    }

    /// Sleep before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, _request: &GenerateRequest) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            MockReply::Insights => Ok(MOCK_INSIGHTS_JSON.to_string()),
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(Error::InvalidData(message.clone())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
