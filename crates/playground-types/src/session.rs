use serde::{Deserialize, Serialize};

/// Request/response lifecycle of the session.
///
/// Transitions only along `Idle/Ready/Error -> Submitted -> Streaming ->
/// Ready | Error`; the one-shot image path skips `Streaming`. A new send
/// is admitted only from `Idle`, `Ready`, or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Submitted,
    Streaming,
    Ready,
    Error,
}

impl SessionStatus {
    /// Whether a new request may start from this status.
    pub fn accepts_send(&self) -> bool {
        matches!(
            self,
            SessionStatus::Idle | SessionStatus::Ready | SessionStatus::Error
        )
    }

    /// Whether a request is currently in flight.
    pub fn in_flight(&self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::Streaming)
    }
}

/// What a send does: converse with a chat model or generate an image.
/// `ImageGeneration` is only valid while an image-capable model is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatMode {
    #[default]
    Chat,
    ImageGeneration,
}
