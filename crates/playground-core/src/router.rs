//! Backend routing.
//!
//! A single logical send goes to one of two structurally different
//! backends (streamed chat completions vs one-shot image generation) in
//! one of two provider dialects. Both picks derive from the active model
//! id's capability pattern and the UI mode toggle.

use playground_types::model::ModelCapabilities;
use playground_types::session::ChatMode;
use serde::{Deserialize, Serialize};

/// The two mutually exclusive provider families. Their request/response
/// shapes are incompatible, so conversations never span a dialect switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiDialect {
    /// OpenAI-style `/v1/chat/completions` with SSE streaming.
    OpenAiCompat,
    /// Google `generateContent` family.
    Gemini,
}

impl ApiDialect {
    /// Dialect for a model id. Image-capable models are served by the
    /// Gemini API; everything else goes through the OpenAI-compatible
    /// gateway.
    pub fn for_model(model_id: &str) -> Self {
        if ModelCapabilities::infer(model_id).image_generation {
            ApiDialect::Gemini
        } else {
            ApiDialect::OpenAiCompat
        }
    }
}

/// Which backend family handles the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ChatStream,
    ImageOneShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub backend: BackendKind,
    pub dialect: ApiDialect,
}

/// Mode actually in effect for a model: `ImageGeneration` is meaningless
/// for a model that cannot generate images, so it is forced back to chat.
pub fn effective_mode(model_id: &str, mode: ChatMode) -> ChatMode {
    if ModelCapabilities::infer(model_id).image_generation {
        mode
    } else {
        ChatMode::Chat
    }
}

/// Pick the backend family and dialect for a request.
pub fn route(model_id: &str, mode: ChatMode) -> Route {
    let backend = match effective_mode(model_id, mode) {
        ChatMode::Chat => BackendKind::ChatStream,
        ChatMode::ImageGeneration => BackendKind::ImageOneShot,
    };
    Route {
        backend,
        dialect: ApiDialect::for_model(model_id),
    }
}
