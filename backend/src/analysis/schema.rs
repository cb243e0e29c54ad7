use serde::Deserialize;
use shared::{Palette, Season, UNKNOWN_TONE};

use super::normalizer::{ModelSchema, NormalizeError};

pub const DEFAULT_REASON: &str = "Tidak ada penjelasan.";
pub const FAILED_REASON: &str = "Maaf, analisis AI gagal memproses gambar. Coba lagi.";

pub const PALETTE_COLOR_COUNT: usize = 6;
pub const FALLBACK_DESCRIPTION: &str = "Gagal memuat AI. Ini rekomendasi standar.";
pub const FALLBACK_COLORS: [&str; PALETTE_COLOR_COUNT] = [
    "#333333", "#777777", "#999999", "#000000", "#FFFFFF", "#555555",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tone: String,
    pub confidence: u8,
    pub reason: String,
}

impl Classification {
    /// Sentinel used whenever the model call or its output fails.
    pub fn unknown() -> Self {
        Self {
            tone: UNKNOWN_TONE.to_string(),
            confidence: 0,
            reason: FAILED_REASON.to_string(),
        }
    }

    pub fn season(&self) -> Option<Season> {
        Season::detect(&self.tone)
    }
}

#[derive(Debug, Deserialize)]
pub struct RawClassification {
    tone: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

impl ModelSchema for Classification {
    type Raw = RawClassification;

    fn from_raw(raw: RawClassification) -> Result<Self, NormalizeError> {
        let tone = raw.tone.trim().to_string();
        if Season::detect(&tone).is_none() {
            return Err(NormalizeError::Schema(format!(
                "tone {:?} does not name a single season",
                tone
            )));
        }

        let confidence = raw.confidence.unwrap_or(0.0).round();
        if !(0.0..=100.0).contains(&confidence) {
            return Err(NormalizeError::Schema(format!(
                "confidence {} is outside 0..=100",
                confidence
            )));
        }

        let reason = raw
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string());

        Ok(Self {
            tone,
            confidence: confidence as u8,
            reason,
        })
    }
}

pub fn fallback_palette() -> Palette {
    Palette {
        description: FALLBACK_DESCRIPTION.to_string(),
        colors: FALLBACK_COLORS.iter().map(|c| c.to_string()).collect(),
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

impl ModelSchema for Palette {
    type Raw = Palette;

    fn from_raw(raw: Palette) -> Result<Self, NormalizeError> {
        let description = raw.description.trim().to_string();
        if description.is_empty() {
            return Err(NormalizeError::Schema("empty palette description".to_string()));
        }

        if raw.colors.len() != PALETTE_COLOR_COUNT {
            return Err(NormalizeError::Schema(format!(
                "expected {} colors, got {}",
                PALETTE_COLOR_COUNT,
                raw.colors.len()
            )));
        }

        let colors: Vec<String> = raw.colors.iter().map(|c| c.trim().to_string()).collect();
        if let Some(bad) = colors.iter().find(|c| !is_hex_color(c)) {
            return Err(NormalizeError::Schema(format!("invalid hex color {:?}", bad)));
        }

        Ok(Palette {
            description,
            colors,
        })
    }
}
