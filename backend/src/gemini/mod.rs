pub mod client;
pub mod models;

use async_trait::async_trait;

pub use client::GeminiClient;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Model response contained no text")]
    EmptyResponse,
    #[error("Model call timed out")]
    Timeout,
}

/// One piece of model input, kept in the order it was added.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Binary { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub parts: Vec<ContentPart>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(prompt.into())],
            ..Default::default()
        }
    }

    pub fn with_image(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.push(ContentPart::Binary {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Remote vision/text model. Implementations return the raw completion text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError>;
}
