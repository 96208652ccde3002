//! Outbound payload assembly.
//!
//! Builds the current turn's `RequestContent` from input text and
//! attachments, and flattens prior turns into the role-tagged transcript
//! a chat backend expects. The full history is resent every turn; there
//! is no truncation or windowing.

use log::warn;
use playground_types::message::{
    Attachment, ContentPart, ImageUrl, Message, RequestContent, TranscriptTurn,
};
use playground_types::{EngineError, Result};

/// What to do with attachments whose media type is not an image.
/// They are never representable on the wire; the question is whether the
/// submission still goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonImagePolicy {
    /// Keep the attachment visible in the UI but leave it out of the payload.
    #[default]
    Drop,
    /// Reject the submission with a validation error.
    Reject,
}

/// Build the wire content for one turn.
///
/// Without attachments the content is plain text. With attachments it is
/// an ordered parts list: the text part first (omitted when the text is
/// empty), then one image-reference part per image attachment in
/// submission order.
pub fn build(
    text: &str,
    attachments: &[Attachment],
    policy: NonImagePolicy,
) -> Result<RequestContent> {
    if attachments.is_empty() {
        return Ok(RequestContent::Text(text.to_string()));
    }

    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(ContentPart::Text {
            text: text.to_string(),
        });
    }

    for attachment in attachments {
        if attachment.is_image() {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: attachment.url.clone(),
                },
            });
        } else {
            match policy {
                NonImagePolicy::Drop => {
                    warn!(
                        "dropping non-image attachment from payload: {} ({})",
                        attachment.filename, attachment.media_type
                    );
                }
                NonImagePolicy::Reject => {
                    return Err(EngineError::Validation(format!(
                        "attachment type not supported: {}",
                        attachment.media_type
                    )));
                }
            }
        }
    }

    Ok(RequestContent::Parts(parts))
}

/// Flatten prior messages plus the newly built current turn into the full
/// request transcript. Every version's visible content is included in
/// version order, tagged with the message's role; reasoning traces are
/// never resent.
pub fn transcript(messages: &[Message], current: RequestContent) -> Vec<TranscriptTurn> {
    let mut turns: Vec<TranscriptTurn> = messages
        .iter()
        .flat_map(|msg| {
            msg.versions.iter().map(|v| {
                TranscriptTurn::new(msg.role, RequestContent::Text(v.content.clone()))
            })
        })
        .collect();
    turns.push(TranscriptTurn::new(
        playground_types::message::Role::User,
        current,
    ));
    turns
}
