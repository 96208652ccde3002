//! The session driver.
//!
//! Owns the conversation store and runs one outbound request end-to-end:
//! payload assembly, backend routing, stream ingestion (or the one-shot
//! image call), and lifecycle status. All mutation happens between await
//! points on the caller's thread; chunk arrival is the only suspension
//! point on the chat path.

use futures::StreamExt;
use log::{debug, info, warn};

use playground_types::config::{EngineConfig, ImageConfig, SamplingConfig};
use playground_types::message::{Attachment, GeneratedImage, Message, MessageKey, VersionId};
use playground_types::model::ModelInfo;
use playground_types::session::{ChatMode, SessionStatus};
use playground_types::{EngineError, Result};

use crate::assembler::{self, NonImagePolicy};
use crate::event_bus::{EventBus, SessionEvent};
use crate::ports::{
    ChatRequest, ChatStreamEvent, ChatStreamPort, ImageGenPort, ImagePart, ImageRequest,
};
use crate::router::{self, ApiDialect, BackendKind};
use crate::splitter::split_reasoning;
use crate::store::{ConversationStore, WriteLease};

const IMAGE_FAILURE_TEXT: &str = "Image generation failed. Please try again.";

/// One active conversation: message history, lifecycle status, the
/// selected model and mode, and the sampling/image parameters sent with
/// each request. State is ephemeral — nothing survives the session.
pub struct PlaygroundSession {
    store: ConversationStore,
    status: SessionStatus,
    active_model: Option<ModelInfo>,
    mode: ChatMode,
    sampling: SamplingConfig,
    image_config: ImageConfig,
    attachment_policy: NonImagePolicy,
    events: EventBus,
}

impl PlaygroundSession {
    pub fn new(events: EventBus) -> Self {
        Self {
            store: ConversationStore::new(),
            status: SessionStatus::Idle,
            active_model: None,
            mode: ChatMode::Chat,
            sampling: SamplingConfig::default(),
            image_config: ImageConfig::default(),
            attachment_policy: NonImagePolicy::default(),
            events,
        }
    }

    /// Session seeded with the sampling and image parameters from a full
    /// engine config.
    pub fn with_config(config: &EngineConfig, events: EventBus) -> Self {
        let mut session = Self::new(events);
        session.sampling = config.sampling.clone();
        session.image_config = config.image.clone();
        session
    }

    // ─── Read access ─────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn active_model(&self) -> Option<&ModelInfo> {
        self.active_model.as_ref()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    // ─── Configuration ───────────────────────────────────────

    pub fn sampling_mut(&mut self) -> &mut SamplingConfig {
        &mut self.sampling
    }

    pub fn image_config_mut(&mut self) -> &mut ImageConfig {
        &mut self.image_config
    }

    pub fn set_attachment_policy(&mut self, policy: NonImagePolicy) {
        self.attachment_policy = policy;
    }

    /// Switch the active model. Crossing to a model of the other API
    /// dialect clears the history: the two backends do not share a
    /// conversation context format. A model without image support forces
    /// the mode back to chat.
    pub fn select_model(&mut self, model: ModelInfo) -> Result<()> {
        if self.status.in_flight() {
            return Err(EngineError::Invariant(
                "cannot switch models while a response is in flight".to_string(),
            ));
        }

        let new_dialect = ApiDialect::for_model(&model.id);
        let old_dialect = self
            .active_model
            .as_ref()
            .map(|m| ApiDialect::for_model(&m.id));
        if old_dialect.is_some_and(|d| d != new_dialect) && !self.store.is_empty() {
            info!("model dialect changed, resetting conversation");
            self.store.reset();
            self.events.emit(SessionEvent::HistoryCleared);
        }

        if !model.capabilities.image_generation {
            self.mode = ChatMode::Chat;
        }
        self.active_model = Some(model);
        Ok(())
    }

    /// Toggle between chat and image generation. Image turns and chat
    /// turns never coexist in one transcript, so an actual switch clears
    /// the history.
    pub fn set_mode(&mut self, mode: ChatMode) -> Result<()> {
        if self.status.in_flight() {
            return Err(EngineError::Invariant(
                "cannot switch mode while a response is in flight".to_string(),
            ));
        }
        if mode == ChatMode::ImageGeneration {
            let image_capable = self
                .active_model
                .as_ref()
                .is_some_and(|m| m.capabilities.image_generation);
            if !image_capable {
                return Err(EngineError::Invariant(
                    "the selected model cannot generate images".to_string(),
                ));
            }
        }
        if mode != self.mode {
            self.mode = mode;
            if !self.store.is_empty() {
                self.store.reset();
                self.events.emit(SessionEvent::HistoryCleared);
            }
        }
        Ok(())
    }

    /// Explicitly drop the conversation. "We do not store your
    /// conversation" — there is nothing to restore afterwards.
    pub fn reset(&mut self) -> Result<()> {
        if self.status.in_flight() {
            return Err(EngineError::Invariant(
                "cannot reset while a response is in flight".to_string(),
            ));
        }
        self.store.reset();
        self.events.emit(SessionEvent::HistoryCleared);
        self.status = SessionStatus::Idle;
        self.events.emit(SessionEvent::StatusChanged { status: self.status });
        Ok(())
    }

    // ─── Send ────────────────────────────────────────────────

    /// Run one outbound request end-to-end.
    ///
    /// Appends the user message and an assistant placeholder, takes the
    /// write lease on the placeholder version, and drives either the chat
    /// stream or the one-shot image call to a terminal status. The lease
    /// is released on every exit path; on errors the partial content
    /// stays in place.
    pub async fn send(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
        chat: &dyn ChatStreamPort,
        image: &dyn ImageGenPort,
    ) -> Result<()> {
        if !self.status.accepts_send() {
            return Err(EngineError::Invariant(
                "a response is already in flight".to_string(),
            ));
        }
        let Some(model) = self.active_model.clone() else {
            self.notify_error("Select a model first");
            return Err(EngineError::Invariant("no model selected".to_string()));
        };
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(EngineError::Validation(
                "nothing to send".to_string(),
            ));
        }

        // Assemble the current turn before touching any state so a
        // rejected attachment leaves the session unchanged.
        let content = assembler::build(text, &attachments, self.attachment_policy)?;
        // Prior turns only — the current turn is appended to the wire
        // transcript separately, and the placeholder never belongs in it.
        let transcript = assembler::transcript(self.store.messages(), content);

        let user_key = self.store.append(Message::user(text, attachments));
        self.events.emit(SessionEvent::MessageAppended { key: user_key });

        let placeholder = Message::assistant_placeholder();
        let version_id = placeholder.versions[0].id.clone();
        let assistant_key = self.store.append(placeholder);
        self.events.emit(SessionEvent::MessageAppended {
            key: assistant_key.clone(),
        });

        let lease = self.store.acquire_lease(&assistant_key, &version_id)?;
        self.set_status(SessionStatus::Submitted);

        let route = router::route(&model.id, self.mode);
        let outcome = match route.backend {
            BackendKind::ChatStream => {
                let request = ChatRequest {
                    model: model.id.clone(),
                    dialect: route.dialect,
                    transcript,
                    sampling: self.sampling.clone(),
                };
                self.run_chat_stream(&lease, request, chat).await
            }
            BackendKind::ImageOneShot => {
                let request = ImageRequest {
                    model: model.id.clone(),
                    prompt: text.to_string(),
                    image: self.image_request_config(&model),
                };
                self.run_image_one_shot(&lease, request, image).await
            }
        };

        self.store.release_lease(lease);
        match outcome {
            Ok(()) => {
                self.set_status(SessionStatus::Ready);
                Ok(())
            }
            Err(e) => {
                self.notify_error(&format!("Request failed: {e}"));
                self.set_status(SessionStatus::Error);
                Err(e)
            }
        }
    }

    /// Ingest a chat completion stream into the leased version.
    ///
    /// Both text channels are re-derived from the full accumulated
    /// buffers on every chunk and written back as a full replace, so a
    /// delimiter pair straddling chunk boundaries resolves correctly.
    /// Reasoning delivered on a separate transport channel is kept ahead
    /// of any inline-delimited reasoning; in practice only one of the two
    /// is ever non-empty.
    async fn run_chat_stream(
        &mut self,
        lease: &WriteLease,
        request: ChatRequest,
        chat: &dyn ChatStreamPort,
    ) -> Result<()> {
        debug!("opening chat stream for model {}", request.model);
        let mut stream = chat.stream_chat(request);
        self.set_status(SessionStatus::Streaming);

        let mut content_buf = String::new();
        let mut channel_reasoning = String::new();
        let mut chunks = 0usize;

        while let Some(event) = stream.next().await {
            match event {
                ChatStreamEvent::Delta { content, reasoning } => {
                    chunks += 1;
                    if let Some(c) = content {
                        content_buf.push_str(&c);
                    }
                    if let Some(r) = reasoning {
                        channel_reasoning.push_str(&r);
                    }

                    let split = split_reasoning(&content_buf);
                    let mut reasoning_out = channel_reasoning.clone();
                    reasoning_out.push_str(&split.reasoning);
                    self.store
                        .apply_stream_update(lease, split.answer, Some(reasoning_out))?;
                    self.events.emit(SessionEvent::VersionUpdated {
                        key: lease.key().clone(),
                        version: lease.version().clone(),
                    });
                }
                ChatStreamEvent::Done => break,
                ChatStreamEvent::Error(message) => {
                    warn!("chat stream failed after {chunks} chunks: {message}");
                    return Err(EngineError::Transport(message));
                }
            }
        }

        debug!("chat stream complete after {chunks} chunks");
        Ok(())
    }

    /// Run the one-shot image call. The request carries only the current
    /// prompt; prior turns stay in the UI but are never sent.
    async fn run_image_one_shot(
        &mut self,
        lease: &WriteLease,
        request: ImageRequest,
        image: &dyn ImageGenPort,
    ) -> Result<()> {
        debug!("requesting image generation from model {}", request.model);
        let response = match image.generate_image(request).await {
            Ok(r) => r,
            Err(e) => {
                self.store
                    .set_failure_text(lease, IMAGE_FAILURE_TEXT.to_string())?;
                return Err(e);
            }
        };

        let mut caption = String::new();
        let mut generated: Option<GeneratedImage> = None;
        for part in response.candidates.iter().flat_map(|c| c.parts.iter()) {
            match part {
                ImagePart::Text(t) => caption.push_str(t),
                ImagePart::InlineImage { data, mime_type } if generated.is_none() => {
                    generated = Some(GeneratedImage {
                        data: data.clone(),
                        mime_type: mime_type.clone(),
                    });
                }
                ImagePart::InlineImage { .. } => {}
            }
        }

        match generated {
            Some(img) => {
                self.store.set_generated_image(lease, img, caption)?;
                self.events.emit(SessionEvent::VersionUpdated {
                    key: lease.key().clone(),
                    version: lease.version().clone(),
                });
                Ok(())
            }
            None => {
                self.store
                    .set_failure_text(lease, IMAGE_FAILURE_TEXT.to_string())?;
                Err(EngineError::ResponseShape("no image data".to_string()))
            }
        }
    }

    fn image_request_config(&self, model: &ModelInfo) -> ImageConfig {
        let mut config = self.image_config.clone();
        if !model.capabilities.resolution_control {
            config.resolution = None;
        }
        config
    }

    // ─── Edit / delete (store operations with events) ────────

    pub fn start_edit(&mut self, key: &MessageKey, version: &VersionId, seed: &str) -> Result<()> {
        self.store.start_edit(key, version, seed)
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.store.edit_buffer_mut()
    }

    pub fn save_edit(&mut self) -> Result<()> {
        let edited = self
            .store
            .editing_version()
            .map(|(k, v)| (k.clone(), v.clone()));
        self.store.save_edit()?;
        if let Some((key, version)) = edited {
            self.events.emit(SessionEvent::VersionUpdated { key, version });
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.store.cancel_edit();
    }

    pub fn delete_message(&mut self, key: &MessageKey) -> Result<()> {
        self.store.delete_message(key)?;
        self.events.emit(SessionEvent::MessageDeleted { key: key.clone() });
        Ok(())
    }

    // ─── Internal ────────────────────────────────────────────

    fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.events.emit(SessionEvent::StatusChanged { status });
    }

    fn notify_error(&self, message: &str) {
        self.events.emit(SessionEvent::ErrorNotice {
            message: message.to_string(),
        });
    }
}
