//! OpenAI-compatible chat adapter.
//!
//! Works with OpenAI, DeepSeek, and any gateway speaking the
//! `/v1/chat/completions` protocol. Streaming goes over SSE: `data: `
//! frames carrying chunk deltas, closed by a `data: [DONE]` sentinel.
//! Thinking models on this dialect deliver their trace in the delta's
//! `reasoning_content` field.

use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};

use playground_core::ports::{ChatRequest, ChatStreamEvent, ChatStreamPort, ModelCatalogPort};
use playground_types::config::{LlmConfig, DEFAULT_OPENAI_BASE_URL};
use playground_types::model::ModelInfo;
use playground_types::{EngineError, Result};

/// Adapter for the OpenAI-compatible dialect.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: &LlmConfig) -> Self {
        let base_url = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url,
        }
    }
}

impl ChatStreamPort for OpenAiCompatProvider {
    fn stream_chat(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = build_chat_body(&req);

        Box::pin(stream! {
            let response = match client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield ChatStreamEvent::Error(format!("request failed: {e}"));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                yield ChatStreamEvent::Error(format!("HTTP {status}: {text}"));
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

                // A chunk boundary may fall inside a multi-byte character;
                // carry the incomplete tail over to the next chunk.
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
                    match parse_sse_line(&line) {
                        Some(ChatStreamEvent::Done) => {
                            yield ChatStreamEvent::Done;
                            return;
                        }
                        Some(event) => yield event,
                        None => {}
                    }
                }
            }

            // A conforming server newline-terminates every frame, but a
            // final frame cut off at connection close still counts.
            if let Some(event) = parse_sse_line(lines.trim()) {
                yield event;
            }
            // Connection closed without the [DONE] sentinel. The session
            // treats exhaustion as normal completion.
        })
    }
}

#[async_trait(?Send)]
impl ModelCatalogPort for OpenAiCompatProvider {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Transport(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| EngineError::ResponseShape(e.to_string()))?;

        let models = data["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str())
                    .map(ModelInfo::from_id)
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

// ─── Wire format ─────────────────────────────────────────────

pub(crate) fn build_chat_body(req: &ChatRequest) -> Value {
    json!({
        "model": req.model,
        "messages": req.transcript,
        "stream": true,
        "temperature": req.sampling.temperature,
        "max_tokens": req.sampling.max_tokens,
        "top_p": req.sampling.top_p,
        "frequency_penalty": req.sampling.frequency_penalty,
        "presence_penalty": req.sampling.presence_penalty,
    })
}

#[derive(Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    /// Some gateways name this field `reasoning` instead.
    #[serde(default, alias = "reasoning")]
    reasoning_content: Option<String>,
}

/// Parse one SSE line into a stream event. Blank lines, comments, and
/// frames without a delta payload yield nothing.
pub(crate) fn parse_sse_line(line: &str) -> Option<ChatStreamEvent> {
    let data = line.strip_prefix("data: ")?;
    if data == "[DONE]" {
        return Some(ChatStreamEvent::Done);
    }
    let chunk: ChatChunk = serde_json::from_str(data).ok()?;
    let delta = chunk.choices.into_iter().next()?.delta;
    if delta.content.is_none() && delta.reasoning_content.is_none() {
        return None;
    }
    Some(ChatStreamEvent::Delta {
        content: delta.content,
        reasoning: delta.reasoning_content,
    })
}
