pub mod normalizer;
pub mod prompts;
pub mod schema;
pub mod service;

use crate::gemini::ModelError;
use normalizer::NormalizeError;

pub use schema::Classification;
pub use service::StylistService;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),
}
