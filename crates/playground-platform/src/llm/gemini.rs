//! Gemini REST adapter.
//!
//! Speaks the `generateContent` family directly: one-shot
//! `generateContent` for image generation and `streamGenerateContent`
//! with `alt=sse` for chat on the same models. The API key rides in the
//! query string; request and response bodies are camelCase.

use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures::{Stream, StreamExt};
use log::debug;
use serde::{Deserialize, Serialize};

use playground_core::ports::{
    ChatRequest, ChatStreamEvent, ChatStreamPort, ImageCandidate, ImageGenPort, ImagePart,
    ImageRequest, ImageResponse,
};
use playground_types::config::{LlmConfig, DEFAULT_GEMINI_BASE_URL};
use playground_types::message::Role;
use playground_types::{EngineError, Result};

/// Adapter for the Gemini dialect.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config
            .gemini_api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url,
        }
    }
}

#[async_trait(?Send)]
impl ImageGenPort for GeminiProvider {
    async fn generate_image(&self, req: ImageRequest) -> Result<ImageResponse> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, req.model, self.api_key
        );
        let body = build_image_body(&req);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "HTTP {status}: {}",
                extract_error_message(&text)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        let result = parse_image_response(&body)?;

        // Reject malformed payloads here rather than handing the UI an
        // image it cannot decode.
        for part in result.candidates.iter().flat_map(|c| c.parts.iter()) {
            if let ImagePart::InlineImage { data, mime_type } = part {
                let bytes = BASE64_STANDARD
                    .decode(data)
                    .map_err(|e| EngineError::ResponseShape(format!("bad image payload: {e}")))?;
                debug!("received inline image: {} bytes ({mime_type})", bytes.len());
            }
        }

        Ok(result)
    }
}

impl ChatStreamPort for GeminiProvider {
    fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>> {
        let client = self.client.clone();
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, req.model, self.api_key
        );
        let body = build_chat_body(&req);

        Box::pin(stream! {
            let response = match client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    yield ChatStreamEvent::Error(format!("request failed: {e}"));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                yield ChatStreamEvent::Error(format!(
                    "HTTP {status}: {}",
                    extract_error_message(&text)
                ));
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();
            let mut lines = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield ChatStreamEvent::Error(format!("stream failed: {e}"));
                        return;
                    }
                };

                pending.extend_from_slice(&chunk);
                match String::from_utf8(std::mem::take(&mut pending)) {
                    Ok(s) => lines.push_str(&s),
                    Err(e) => {
                        let valid = e.utf8_error().valid_up_to();
                        let bytes = e.into_bytes();
                        lines.push_str(std::str::from_utf8(&bytes[..valid]).unwrap_or_default());
                        pending = bytes[valid..].to_vec();
                    }
                }

                while let Some(pos) = lines.find('\n') {
                    let line = lines[..pos].trim().to_string();
                    lines.drain(..=pos);
                    if let Some(event) = parse_sse_line(&line) {
                        yield event;
                    }
                }
            }

            // Flush a final frame cut off at connection close.
            if let Some(event) = parse_sse_line(lines.trim()) {
                yield event;
            }
            // No end-of-stream sentinel on this dialect; a clean close is
            // completion.
            yield ChatStreamEvent::Done;
        })
    }
}

// ─── Wire format ─────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfigWire>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfigWire {
    aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

pub(crate) fn build_image_body(req: &ImageRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![RequestPart {
                text: req.prompt.clone(),
            }],
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["TEXT", "IMAGE"]),
            image_config: Some(ImageConfigWire {
                aspect_ratio: req.image.aspect_ratio.as_str().to_string(),
                image_size: req.image.resolution.map(|r| r.as_str().to_string()),
            }),
            ..GenerationConfig::default()
        }),
    }
}

pub(crate) fn build_chat_body(req: &ChatRequest) -> GenerateContentRequest {
    let contents = req
        .transcript
        .iter()
        .map(|turn| Content {
            role: match turn.role {
                Role::User => "user".to_string(),
                Role::Assistant => "model".to_string(),
            },
            parts: vec![RequestPart {
                text: turn.content.as_text().to_string(),
            }],
        })
        .collect();

    GenerateContentRequest {
        contents,
        generation_config: Some(GenerationConfig {
            temperature: Some(req.sampling.temperature),
            max_output_tokens: Some(req.sampling.max_tokens),
            top_p: Some(req.sampling.top_p),
            ..GenerationConfig::default()
        }),
    }
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Parse a `generateContent` body into the port's response shape,
/// keeping candidate parts in wire order.
pub(crate) fn parse_image_response(body: &str) -> Result<ImageResponse> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| EngineError::ResponseShape(e.to_string()))?;
    let candidates = parsed
        .candidates
        .unwrap_or_default()
        .into_iter()
        .map(|candidate| {
            let parts = candidate
                .content
                .map(|content| content.parts)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|part| {
                    if let Some(inline) = part.inline_data {
                        Some(ImagePart::InlineImage {
                            data: inline.data,
                            mime_type: inline.mime_type,
                        })
                    } else {
                        part.text.map(ImagePart::Text)
                    }
                })
                .collect();
            ImageCandidate { parts }
        })
        .collect();
    Ok(ImageResponse { candidates })
}

/// Parse one SSE frame into a chat delta. Gemini sends no reasoning
/// channel and no end sentinel; frames without visible text yield
/// nothing.
pub(crate) fn parse_sse_line(line: &str) -> Option<ChatStreamEvent> {
    let data = line.strip_prefix("data: ")?;
    let parsed: GenerateContentResponse = serde_json::from_str(data).ok()?;
    let text: String = parsed
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        return None;
    }
    Some(ChatStreamEvent::Delta {
        content: Some(text),
        reasoning: None,
    })
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| w.error.message)
        .unwrap_or_else(|| body.to_string())
}
