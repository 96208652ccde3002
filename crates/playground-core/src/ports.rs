//! Port traits — the boundary between the engine and its backends.
//!
//! These traits are defined here in `playground-core` (pure Rust).
//! Implementations live in `playground-platform` (HTTP adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use playground_types::config::{ImageConfig, SamplingConfig};
use playground_types::message::TranscriptTurn;
use playground_types::model::ModelInfo;
use playground_types::Result;

use crate::router::ApiDialect;

// ─── Chat Stream Port ────────────────────────────────────────

/// One event from a chat completion stream.
///
/// A well-behaved stream yields zero or more `Delta`s strictly before
/// exactly one terminal `Done` or `Error`. A delta may carry visible
/// content, a reasoning-channel fragment, or both; dialects without a
/// separate reasoning channel leave `reasoning` empty and deliver inline
/// `<think>` delimiters inside `content` instead.
#[derive(Debug, Clone)]
pub enum ChatStreamEvent {
    Delta {
        content: Option<String>,
        reasoning: Option<String>,
    },
    Done,
    Error(String),
}

/// Request for a streamed chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub dialect: ApiDialect,
    pub transcript: Vec<TranscriptTurn>,
    pub sampling: SamplingConfig,
}

pub trait ChatStreamPort {
    /// Open a chat completion stream. Transport failures surface as a
    /// terminal `ChatStreamEvent::Error` on the stream itself.
    fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>>;
}

// ─── Image Generation Port ───────────────────────────────────

/// Request for a one-shot image generation. Carries only the current
/// prompt — image turns are independent contexts and never resend the
/// transcript.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub image: ImageConfig,
}

/// Response from the one-shot image call, candidate parts in wire order.
#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageCandidate {
    pub parts: Vec<ImagePart>,
}

#[derive(Debug, Clone)]
pub enum ImagePart {
    Text(String),
    InlineImage { data: String, mime_type: String },
}

#[async_trait(?Send)]
pub trait ImageGenPort {
    async fn generate_image(&self, req: ImageRequest) -> Result<ImageResponse>;
}

// ─── Model Catalog Port ──────────────────────────────────────

#[async_trait(?Send)]
pub trait ModelCatalogPort {
    /// List the models available to this session. Callers treat a failure
    /// as an empty catalog, not a fatal error.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}
