use actix_web::web;
use shared::{
    AnalyzeResponse, ChatResponse, Features, Palette, PaletteResponse, ResponseStatus,
};
use std::sync::Arc;
use std::time::Duration;

use super::normalizer::{ModelSchema, parse_model_json};
use super::prompts::{self, ANALYSIS_PROMPT, CHAT_TEMPERATURE};
use super::schema::fallback_palette;
use super::{AnalysisError, Classification};
use crate::gemini::{GenerateRequest, ModelError, VisionModel};
use crate::vision::{SkinMask, generate_skin_mask};

pub const ANALYSIS_COMPLETE: &str = "Hybrid Analysis Complete";
pub const DECLINE_REPLY: &str = "Maaf, saya tidak bisa menjawab itu. Yuk bahas fashion saja! 👗";
pub const TROUBLE_REPLY: &str = "Maaf, otak AI saya sedang gangguan.";

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Request orchestration for the analyzer, chatbot and palette endpoints.
#[derive(Clone)]
pub struct StylistService {
    model: Arc<dyn VisionModel>,
    model_timeout: Duration,
}

impl StylistService {
    pub fn new(model: Arc<dyn VisionModel>, model_timeout: Duration) -> Self {
        Self {
            model,
            model_timeout,
        }
    }

    async fn call_model(&self, request: GenerateRequest) -> Result<String, ModelError> {
        tokio::time::timeout(self.model_timeout, self.model.generate(request))
            .await
            .map_err(|_| ModelError::Timeout)?
    }

    async fn request_record<T: ModelSchema>(
        &self,
        request: GenerateRequest,
    ) -> Result<T, AnalysisError> {
        let text = self.call_model(request).await?;
        log::debug!("Raw model output: {}", text);
        Ok(parse_model_json(&text)?)
    }

    pub async fn classify(&self, image: Vec<u8>) -> Classification {
        let mime_type = image::guess_format(&image)
            .map(|format| format.to_mime_type())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        let request = GenerateRequest::text(ANALYSIS_PROMPT).with_image(mime_type, image);

        match self.request_record::<Classification>(request).await {
            Ok(classification) => classification,
            Err(e) => {
                log::error!("Classification failed, using fallback: {}", e);
                Classification::unknown()
            }
        }
    }

    async fn skin_mask(&self, image: Vec<u8>) -> Option<SkinMask> {
        match web::block(move || generate_skin_mask(&image)).await {
            Ok(mask) => mask,
            Err(e) => {
                log::error!("Skin mask task failed: {}", e);
                None
            }
        }
    }

    /// Runs the skin mask and the model classification concurrently and
    /// merges them. Failures of either side never affect the other.
    pub async fn analyze(&self, image: Vec<u8>) -> AnalyzeResponse {
        let (mask, classification) =
            futures::join!(self.skin_mask(image.clone()), self.classify(image));

        log::info!(
            "Analysis result: tone={} ({:?}), confidence={}, mask={}",
            classification.tone,
            classification.season(),
            classification.confidence,
            mask.is_some()
        );

        let (masked_image, rgb) = match mask {
            Some(mask) => (Some(mask.masked_image), mask.mean_rgb),
            None => (None, [0, 0, 0]),
        };

        AnalyzeResponse {
            status: ResponseStatus::Success,
            tone: classification.tone,
            confidence: classification.confidence,
            reason: classification.reason,
            features: Features { masked_image, rgb },
            message: ANALYSIS_COMPLETE.to_string(),
        }
    }

    pub async fn chat(&self, message: &str, season: &str) -> ChatResponse {
        let request = GenerateRequest::text(message)
            .with_system_instruction(prompts::stylist_instruction(season))
            .with_temperature(CHAT_TEMPERATURE);

        let reply = match self.call_model(request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(ModelError::EmptyResponse) => DECLINE_REPLY.to_string(),
            Err(e) => {
                log::error!("Chat error: {}", e);
                TROUBLE_REPLY.to_string()
            }
        };

        ChatResponse {
            status: ResponseStatus::Success,
            reply,
        }
    }

    pub async fn recommend_colors(&self, season: &str) -> PaletteResponse {
        let request = GenerateRequest::text(prompts::palette_prompt(season));

        match self.request_record::<Palette>(request).await {
            Ok(data) => PaletteResponse {
                status: ResponseStatus::Success,
                data,
            },
            Err(e) => {
                log::error!("Color generation error for season {:?}: {}", season, e);
                PaletteResponse {
                    status: ResponseStatus::Error,
                    data: fallback_palette(),
                }
            }
        }
    }
}
