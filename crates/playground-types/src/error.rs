use thiserror::Error;

/// Error taxonomy of the conversation engine.
///
/// None of these are fatal: validation and invariant errors leave session
/// state untouched, transport and response-shape errors put the session in
/// the `Error` status with partial content preserved. Recovery is always a
/// subsequent user action (edit, resend, reselect model).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Rejected synchronously before any state change (empty submission, empty edit).
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or stream failure. Partial content stays in place; no automatic retry.
    #[error("transport error: {0}")]
    Transport(String),

    /// Structurally valid response missing expected data (e.g. no image bytes).
    #[error("response error: {0}")]
    ResponseShape(String),

    /// Operation rejected by a session/store invariant (no model selected,
    /// second in-flight send, delete or edit against a leased version).
    #[error("{0}")]
    Invariant(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}
