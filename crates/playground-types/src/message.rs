use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Stable identity of a message, independent of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey(pub String);

impl MessageKey {
    pub fn new(role: Role) -> Self {
        let prefix = match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self(format!("{}-{}", prefix, Uuid::new_v4()))
    }
}

/// Identity of one version (branch) of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single message in the conversation.
///
/// Messages carry one or more versions (branches); only `active_version`
/// is rendered. Current flows only ever populate index 0, but the shape
/// leaves room for a regenerate-response feature without a schema change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub key: MessageKey,
    pub role: Role,
    /// User-side attachments, in submission order. Always empty for assistant messages.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    /// Never empty.
    pub versions: Vec<Version>,
    /// Branch pointer, defaults to 0.
    #[serde(default)]
    pub active_version: usize,
    pub created_at: String,
}

impl Message {
    /// A user message with the submitted text and attachments.
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            key: MessageKey::new(Role::User),
            role: Role::User,
            attachments,
            versions: vec![Version::text(text)],
            active_version: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// An assistant message with a single empty version, created when a
    /// request starts so streaming has a slot to write into.
    pub fn assistant_placeholder() -> Self {
        Self {
            key: MessageKey::new(Role::Assistant),
            role: Role::Assistant,
            attachments: Vec::new(),
            versions: vec![Version::text("")],
            active_version: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn version(&self, id: &VersionId) -> Option<&Version> {
        self.versions.iter().find(|v| &v.id == id)
    }

    pub fn version_mut(&mut self, id: &VersionId) -> Option<&mut Version> {
        self.versions.iter_mut().find(|v| &v.id == id)
    }
}

/// One branch of a message's content.
///
/// A version is either progressively growing text (content plus optional
/// reasoning trace) or a single generated-image result; it never moves
/// between the two kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    /// Visible answer text.
    pub content: String,
    /// Thinking trace, if the model produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    /// Result of a one-shot image generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image: Option<GeneratedImage>,
    /// True while the user is editing this version.
    #[serde(default)]
    pub editing: bool,
}

impl Version {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: VersionId::new(),
            content: content.into(),
            reasoning_content: None,
            generated_image: None,
            editing: false,
        }
    }
}

/// An inline generated image returned by the image backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes.
    pub data: String,
    pub mime_type: String,
}

/// A file attached to a user message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub media_type: String,
    pub filename: String,
}

impl Attachment {
    pub fn new(
        url: impl Into<String>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Outbound content of a single turn — plain text or multimodal parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl RequestContent {
    pub fn as_text(&self) -> &str {
        match self {
            RequestContent::Text(s) => s,
            RequestContent::Parts(parts) => parts
                .iter()
                .find_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .unwrap_or(""),
        }
    }
}

/// One part of a multimodal turn. Follows the OpenAI content-part schema
/// for broad provider compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A role-tagged prior turn as sent to a chat backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Role,
    pub content: RequestContent,
}

impl TranscriptTurn {
    pub fn new(role: Role, content: RequestContent) -> Self {
        Self { role, content }
    }
}
