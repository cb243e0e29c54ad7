use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client as HttpClient;
use url::Url;

use super::models::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use super::{ContentPart, GenerateRequest, ModelError, VisionModel};
use crate::config::ModelConfig;

#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    endpoint: Url,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let endpoint = Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.name
        ))?;

        let http_client = HttpClient::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http_client,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub(crate) fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => Part::Text { text: text.clone() },
            ContentPart::Binary { mime_type, data } => Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                },
            },
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part::Text { text: text.clone() }],
        }),
        generation_config: request.temperature.map(|temperature| GenerationConfig {
            temperature: Some(temperature),
        }),
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ModelError> {
        let body = build_body(&request);

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw)?;
        envelope.text().ok_or(ModelError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_embeds_model_name() {
        let config = ModelConfig {
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            api_key: Some("key".to_string()),
            ..ModelConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn image_request_body_uses_inline_data() {
        let request = GenerateRequest::text("analyze").with_image("image/png", vec![1, 2, 3]);
        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "analyze" },
                        { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn chat_request_body_carries_instruction_and_temperature() {
        let request = GenerateRequest::text("halo")
            .with_system_instruction("be nice")
            .with_temperature(0.5);
        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be nice");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let raw = json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Halo " }, { "text": "kak!" }] } },
                { "content": { "role": "model", "parts": [{ "text": "ignored" }] } }
            ]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("Halo kak!"));
    }

    #[test]
    fn blocked_response_has_no_text() {
        let raw = json!({
            "candidates": [{ "finishReason": "SAFETY" }],
            "promptFeedback": { "blockReason": "SAFETY" }
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert!(response.text().is_none());

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.text().is_none());
    }
}
