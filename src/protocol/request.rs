// src/protocol/request.rs

//! Outbound request payloads.
//!
//! Commands form a closed tagged set: one variant per `command` value the
//! service understands, each with its own typed field set. The nested
//! program/file objects are deliberately untyped — their internal shape is
//! owned by the caller and forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the service should do with the prompt.
///
/// Serialized as the bare integer the service expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RequestType {
    Freestyle = 1,
    GenerateText = 2,
    Explain = 3,
    Summary = 4,
}

impl From<RequestType> for u8 {
    fn from(value: RequestType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for RequestType {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        // ---
        match value {
            1 => Ok(RequestType::Freestyle),
            2 => Ok(RequestType::GenerateText),
            3 => Ok(RequestType::Explain),
            4 => Ok(RequestType::Summary),
            other => Err(format!("unknown request_type: {other}")),
        }
    }
}

/// An outbound command payload.
///
/// Immutable once constructed and sent exactly once. `chat_id` correlates
/// multi-turn exchanges on the *server* side; the harness itself correlates
/// purely by "one request, next response".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    // ---
    /// Ask the service to run a prompt against the current document context.
    RequestPrompt {
        chat_id: i64,
        prompt: String,
        request_type: RequestType,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_program: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_program: Option<Value>,
    },

    /// Ask the service to retrieve context similar to an uploaded document.
    SearchSimilarContext {
        chat_id: i64,
        prompt: String,
        request_type: RequestType,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_program: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_program: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_data: Option<Value>,
    },
}

impl Request {
    // ---
    /// Minimal `request_prompt` command with no document context attached.
    pub fn prompt(chat_id: i64, prompt: impl Into<String>, request_type: RequestType) -> Self {
        // ---
        Request::RequestPrompt {
            chat_id,
            prompt: prompt.into(),
            request_type,
            current_program: None,
            target_program: None,
        }
    }

    /// Attach a `current_program` document context, forwarded verbatim.
    pub fn with_current_program(mut self, program: Value) -> Self {
        // ---
        match &mut self {
            Request::RequestPrompt {
                current_program, ..
            }
            | Request::SearchSimilarContext {
                current_program, ..
            } => *current_program = Some(program),
        }
        self
    }

    /// Attach a `target_program` document context, forwarded verbatim.
    pub fn with_target_program(mut self, program: Value) -> Self {
        // ---
        match &mut self {
            Request::RequestPrompt { target_program, .. }
            | Request::SearchSimilarContext { target_program, .. } => {
                *target_program = Some(program)
            }
        }
        self
    }

    /// Conversation identifier this request belongs to.
    pub fn chat_id(&self) -> i64 {
        // ---
        match self {
            Request::RequestPrompt { chat_id, .. }
            | Request::SearchSimilarContext { chat_id, .. } => *chat_id,
        }
    }

    /// Rebind this request to another conversation.
    ///
    /// Used when chaining a follow-up onto an earlier exchange.
    pub fn with_chat_id(mut self, id: i64) -> Self {
        // ---
        match &mut self {
            Request::RequestPrompt { chat_id, .. }
            | Request::SearchSimilarContext { chat_id, .. } => *chat_id = id,
        }
        self
    }
}
