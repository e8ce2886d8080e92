use bytes::Bytes;
use chatcast_core::error::{ChatcastError, Result};
use serde::{Deserialize, Serialize};

/// One chat record, as posted to `/chat/send` and pushed on `/chat/events`.
/// Wire: `{ "user_id": "u1", "message": "hi" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: String,
    pub message: String,
}

impl ChatMessage {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Re-serialize into the opaque payload handed to the broadcast registry.
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(ChatcastError::from)
    }
}

/// JSON error body returned by HTTP handlers.
/// Wire: `{ "error": "missing field `message`" }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }
}

impl From<&ChatcastError> for ErrorBody {
    fn from(err: &ChatcastError) -> Self {
        ErrorBody::new(err.to_string()).with_code(err.code())
    }
}
