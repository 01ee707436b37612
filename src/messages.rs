//! Conversation data model shared by the loop, translator and pruner.
//!
//! Messages are owned by the [`Session`](crate::agent::Session) for the
//! lifetime of one conversation: appended to, never mutated in place except
//! by the image pruner. Anything the translator does not recognize rides in
//! `ContentBlock::Other` and is passed through, never dropped.

use serde_json::Value;

/// Who contributed a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// A user turn holding a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// A tagged content item within a turn.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A standalone PNG image authored directly into a turn.
    Image {
        bytes: Vec<u8>,
    },
    /// Model-issued request to invoke a named capability.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Answer to a prior tool-use request with a matching id.
    ToolResult {
        tool_use_id: String,
        content: Vec<ResultItem>,
        status: ResultStatus,
    },
    /// Unrecognized payload, carried through untouched.
    Other(Value),
}

impl ContentBlock {
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentBlock::ToolUse { .. })
    }

    pub fn is_tool_result(&self) -> bool {
        matches!(self, ContentBlock::ToolResult { .. })
    }
}

/// Outcome marker on a tool result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Error,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Success => "success",
            ResultStatus::Error => "error",
        }
    }
}

/// A content item nested inside a tool result.
#[derive(Debug, Clone)]
pub enum ResultItem {
    Text(String),
    /// Structured payload; serialized to text on the wire.
    Json(Value),
    Image(ImageData),
}

impl ResultItem {
    pub fn is_image(&self) -> bool {
        matches!(self, ResultItem::Image(_))
    }
}

/// An image payload in whichever shape a tool or front-end handed it over.
/// Transport normalization lives in the wire translator.
#[derive(Debug, Clone)]
pub enum ImageData {
    /// `data:image/png;base64,...` URI.
    DataUri(String),
    /// Already base64-encoded transport form.
    Base64(String),
    /// Raw PNG bytes.
    Raw(Vec<u8>),
}
