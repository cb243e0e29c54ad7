use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Color season buckets used by the analyzer, chatbot and palette generator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Finds the season named inside a free-text label such as "Warm Autumn".
    ///
    /// Returns `None` when no season is named, or when the label names more
    /// than one distinct season.
    pub fn detect(label: &str) -> Option<Season> {
        let mut found = None;
        for word in label.split(|c: char| !c.is_ascii_alphabetic()) {
            if word.is_empty() {
                continue;
            }
            let Some(season) = Season::iter().find(|s| s.as_ref().eq_ignore_ascii_case(word)) else {
                continue;
            };
            match found {
                None => found = Some(season),
                Some(previous) if previous == season => {}
                Some(_) => return None,
            }
        }
        found
    }
}

pub const UNKNOWN_TONE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub season: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ColorRequest {
    pub season: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Features {
    /// Base64 JPEG of the skin-only visualization, `null` when the filter failed.
    pub masked_image: Option<String>,
    pub rgb: [u8; 3],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalyzeResponse {
    pub status: ResponseStatus,
    pub tone: String,
    pub confidence: u8,
    pub reason: String,
    pub features: Features,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatResponse {
    pub status: ResponseStatus,
    pub reply: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Palette {
    pub description: String,
    pub colors: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaletteResponse {
    pub status: ResponseStatus,
    pub data: Palette,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}
