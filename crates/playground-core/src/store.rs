//! Conversation state.
//!
//! The store is the sole owner and sole writer of the message list.
//! Everything else holds read access plus, for exactly one in-flight
//! request at a time, a write lease scoped to a single version.

use log::debug;
use playground_types::message::{GeneratedImage, Message, MessageKey, Version, VersionId};
use playground_types::{EngineError, Result};

/// Exclusive right to mutate one version's content fields while a request
/// is in flight. Not cloneable; handing it back via `release_lease` is the
/// only way to end it.
#[derive(Debug, PartialEq, Eq)]
pub struct WriteLease {
    key: MessageKey,
    version: VersionId,
}

impl WriteLease {
    pub fn key(&self) -> &MessageKey {
        &self.key
    }

    pub fn version(&self) -> &VersionId {
        &self.version
    }
}

/// An edit session on one version: the scratch buffer the input layer
/// mutates until the edit is saved or cancelled.
#[derive(Debug, Clone)]
struct ActiveEdit {
    key: MessageKey,
    version: VersionId,
    buffer: String,
}

/// Ordered, versioned message history for one conversation.
///
/// State is ephemeral by design — created with the session, discarded
/// with it, never persisted.
#[derive(Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    lease: Option<(MessageKey, VersionId)>,
    edit: Option<ActiveEdit>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Read access ─────────────────────────────────────────

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, key: &MessageKey) -> Option<&Message> {
        self.messages.iter().find(|m| &m.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_lease(&self) -> bool {
        self.lease.is_some()
    }

    // ─── Append / reset ──────────────────────────────────────

    /// Append a message, returning its key.
    pub fn append(&mut self, message: Message) -> MessageKey {
        let key = message.key.clone();
        self.messages.push(message);
        key
    }

    /// Drop the whole history and any edit in progress. Callers must not
    /// reset while a lease is outstanding; the session's admission gate
    /// guarantees that.
    pub fn reset(&mut self) {
        debug!("clearing conversation history ({} messages)", self.messages.len());
        self.messages.clear();
        self.edit = None;
    }

    // ─── Write lease ─────────────────────────────────────────

    /// Take the write lease on a version. At most one lease exists at a
    /// time; a second request is rejected.
    pub fn acquire_lease(&mut self, key: &MessageKey, version: &VersionId) -> Result<WriteLease> {
        if self.lease.is_some() {
            return Err(EngineError::Invariant(
                "a response is already in flight".to_string(),
            ));
        }
        let msg = self
            .message(key)
            .ok_or_else(|| EngineError::Invariant("no such message".to_string()))?;
        if msg.version(version).is_none() {
            return Err(EngineError::Invariant("no such version".to_string()));
        }
        self.lease = Some((key.clone(), version.clone()));
        Ok(WriteLease {
            key: key.clone(),
            version: version.clone(),
        })
    }

    pub fn release_lease(&mut self, lease: WriteLease) {
        debug_assert_eq!(self.lease.as_ref(), Some(&(lease.key, lease.version)));
        self.lease = None;
    }

    /// Full-replace the leased version's text channels with the latest
    /// accumulated values. Replacement, not append: later corrections from
    /// the splitter must win.
    pub fn apply_stream_update(
        &mut self,
        lease: &WriteLease,
        content: String,
        reasoning: Option<String>,
    ) -> Result<()> {
        let version = self.leased_version_mut(lease)?;
        if version.generated_image.is_some() {
            return Err(EngineError::Invariant(
                "cannot stream text into an image version".to_string(),
            ));
        }
        version.content = content;
        version.reasoning_content = reasoning.filter(|r| !r.is_empty());
        Ok(())
    }

    /// Record a one-shot image result. Set at most once per version, and
    /// never on a version that has been streaming text.
    pub fn set_generated_image(
        &mut self,
        lease: &WriteLease,
        image: GeneratedImage,
        text: String,
    ) -> Result<()> {
        let version = self.leased_version_mut(lease)?;
        if version.generated_image.is_some() {
            return Err(EngineError::Invariant(
                "image result already set".to_string(),
            ));
        }
        version.generated_image = Some(image);
        version.content = text;
        Ok(())
    }

    /// Replace the leased version's content with a failure message
    /// (image-path transport errors).
    pub fn set_failure_text(&mut self, lease: &WriteLease, text: String) -> Result<()> {
        let version = self.leased_version_mut(lease)?;
        version.content = text;
        Ok(())
    }

    fn leased_version_mut(&mut self, lease: &WriteLease) -> Result<&mut Version> {
        if self.lease.as_ref() != Some(&(lease.key.clone(), lease.version.clone())) {
            return Err(EngineError::Invariant("stale write lease".to_string()));
        }
        self.messages
            .iter_mut()
            .find(|m| m.key == lease.key)
            .and_then(|m| m.version_mut(&lease.version))
            .ok_or_else(|| EngineError::Invariant("leased version vanished".to_string()))
    }

    // ─── Edit / delete ───────────────────────────────────────

    /// Begin editing a version, seeding the scratch buffer. Rejected while
    /// the version holds the write lease.
    pub fn start_edit(
        &mut self,
        key: &MessageKey,
        version: &VersionId,
        seed: impl Into<String>,
    ) -> Result<()> {
        if self.lease.as_ref().is_some_and(|(_, v)| v == version) {
            return Err(EngineError::Invariant(
                "cannot edit while the response is streaming".to_string(),
            ));
        }
        // Cancel a previous edit rather than stacking two.
        self.cancel_edit();

        let msg = self
            .messages
            .iter_mut()
            .find(|m| &m.key == key)
            .ok_or_else(|| EngineError::Invariant("no such message".to_string()))?;
        let v = msg
            .version_mut(version)
            .ok_or_else(|| EngineError::Invariant("no such version".to_string()))?;
        v.editing = true;
        self.edit = Some(ActiveEdit {
            key: key.clone(),
            version: version.clone(),
            buffer: seed.into(),
        });
        Ok(())
    }

    /// Scratch buffer of the active edit, mutated by the input layer.
    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.edit.as_mut().map(|e| &mut e.buffer)
    }

    pub fn editing_version(&self) -> Option<(&MessageKey, &VersionId)> {
        self.edit.as_ref().map(|e| (&e.key, &e.version))
    }

    /// Commit the active edit. Blank content is rejected and the edit
    /// stays open; otherwise the trimmed text replaces the version's
    /// content in place — no new branch, no undo.
    pub fn save_edit(&mut self) -> Result<()> {
        let edit = self
            .edit
            .as_ref()
            .ok_or_else(|| EngineError::Invariant("no edit in progress".to_string()))?;
        let trimmed = edit.buffer.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation(
                "message content cannot be empty".to_string(),
            ));
        }
        let content = trimmed.to_string();
        let (key, version) = (edit.key.clone(), edit.version.clone());

        let v = self
            .messages
            .iter_mut()
            .find(|m| m.key == key)
            .and_then(|m| m.version_mut(&version))
            .ok_or_else(|| EngineError::Invariant("edited version vanished".to_string()))?;
        v.content = content;
        v.editing = false;
        self.edit = None;
        Ok(())
    }

    /// Abandon the active edit, leaving the version's content untouched.
    pub fn cancel_edit(&mut self) {
        if let Some(edit) = self.edit.take() {
            if let Some(v) = self
                .messages
                .iter_mut()
                .find(|m| m.key == edit.key)
                .and_then(|m| m.version_mut(&edit.version))
            {
                v.editing = false;
            }
        }
    }

    /// Remove a whole message with all its versions. Rejected while any
    /// write lease is outstanding so an in-flight stream can never be
    /// orphaned.
    pub fn delete_message(&mut self, key: &MessageKey) -> Result<()> {
        if self.lease.is_some() {
            return Err(EngineError::Invariant(
                "cannot delete while a response is streaming".to_string(),
            ));
        }
        if self.edit.as_ref().is_some_and(|e| &e.key == key) {
            self.edit = None;
        }
        let before = self.messages.len();
        self.messages.retain(|m| &m.key != key);
        if self.messages.len() == before {
            return Err(EngineError::Invariant("no such message".to_string()));
        }
        Ok(())
    }
}
