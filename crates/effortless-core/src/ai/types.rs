//! Types shared by the AI backends

use serde::{Deserialize, Serialize};

/// A rendered prompt ready to send to a backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateRequest {
    /// System instructions, sent separately when the backend supports it
    pub system: Option<String>,
    /// The user prompt
    pub prompt: String,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Summary text and insights returned by a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedInsights {
    pub summary_text: String,
    #[serde(default)]
    pub top_insights: Vec<String>,
}
