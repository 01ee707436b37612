//! Translation between the internal message model and the Converse wire shape.
//!
//! Both directions are pure and total: well-formed input never fails, and
//! anything unrecognized is coerced to text (outbound) or carried through as
//! an opaque value (inbound) rather than dropped. `to_wire` is idempotent on
//! already-normalized input and never reorders blocks within a turn.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::{ContentBlock, ImageData, Message, ResultItem, ResultStatus};
use crate::tools::ToolExecutionResult;

/// Prefix carried by image payloads that arrive as data URIs.
pub const IMAGE_DATA_URI_PREFIX: &str = "data:image/";

/// One wire turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: Vec<WireBlock>,
}

/// A Converse content block. Externally tagged, so each variant renders as
/// the single-key object the API expects (`{"text": …}`, `{"toolUse": …}`).
/// The untagged tail variant keeps unknown block shapes intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireBlock {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "image")]
    Image(WireImage),
    #[serde(rename = "toolUse")]
    ToolUse(WireToolUse),
    #[serde(rename = "toolResult")]
    ToolResult(WireToolResult),
    #[serde(untagged)]
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireImage {
    pub format: String,
    pub source: WireImageSource,
}

impl WireImage {
    pub fn png(bytes: String) -> Self {
        Self {
            format: "png".into(),
            source: WireImageSource { bytes },
        }
    }
}

/// Image bytes, base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireImageSource {
    pub bytes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToolUse {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToolResult {
    pub tool_use_id: String,
    pub content: Vec<WireBlock>,
    pub status: String,
}

/// Translate the whole history into wire turns.
pub fn to_wire(history: &[Message]) -> Vec<WireMessage> {
    history
        .iter()
        .map(|msg| WireMessage {
            role: msg.role.as_str().into(),
            content: msg.content.iter().map(block_to_wire).collect(),
        })
        .collect()
}

fn block_to_wire(block: &ContentBlock) -> WireBlock {
    match block {
        ContentBlock::Text { text } => WireBlock::Text(text.clone()),
        ContentBlock::Image { bytes } => WireBlock::Image(WireImage::png(BASE64.encode(bytes))),
        ContentBlock::ToolUse { id, name, input } => WireBlock::ToolUse(WireToolUse {
            tool_use_id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            status,
        } => WireBlock::ToolResult(WireToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.iter().map(result_item_to_wire).collect(),
            status: status.as_str().into(),
        }),
        ContentBlock::Other(value) => coerce_to_text(value),
    }
}

fn result_item_to_wire(item: &ResultItem) -> WireBlock {
    match item {
        ResultItem::Text(text) => WireBlock::Text(text.clone()),
        ResultItem::Json(value) => WireBlock::Text(value.to_string()),
        ResultItem::Image(data) => WireBlock::Image(WireImage::png(normalize_image(data))),
    }
}

/// Normalize an image payload to its base64 transport form.
///
/// Order matters: a data-URI string loses its prefix, an already-encoded
/// payload passes through, raw bytes get encoded.
pub fn normalize_image(data: &ImageData) -> String {
    match data {
        ImageData::DataUri(uri) if uri.starts_with(IMAGE_DATA_URI_PREFIX) => uri
            .split_once(',')
            .map(|(_, b64)| b64.to_string())
            .unwrap_or_else(|| uri.clone()),
        ImageData::DataUri(s) | ImageData::Base64(s) => s.clone(),
        ImageData::Raw(bytes) => BASE64.encode(bytes),
    }
}

/// Unknown content becomes a plain text block via string coercion.
fn coerce_to_text(value: &Value) -> WireBlock {
    match value.as_str() {
        Some(s) => WireBlock::Text(s.to_string()),
        None => WireBlock::Text(value.to_string()),
    }
}

/// Map a wire block from a model response back into the internal model.
pub fn from_wire(block: &WireBlock) -> ContentBlock {
    match block {
        WireBlock::Text(text) => ContentBlock::Text { text: text.clone() },
        WireBlock::Image(img) => ContentBlock::Image {
            bytes: decode_image_bytes(&img.source.bytes),
        },
        WireBlock::ToolUse(tu) => ContentBlock::ToolUse {
            id: tu.tool_use_id.clone(),
            name: tu.name.clone(),
            input: tu.input.clone(),
        },
        WireBlock::ToolResult(tr) => ContentBlock::ToolResult {
            tool_use_id: tr.tool_use_id.clone(),
            content: tr.content.iter().map(result_item_from_wire).collect(),
            status: if tr.status == "error" {
                ResultStatus::Error
            } else {
                ResultStatus::Success
            },
        },
        WireBlock::Other(value) => ContentBlock::Other(value.clone()),
    }
}

fn result_item_from_wire(block: &WireBlock) -> ResultItem {
    match block {
        WireBlock::Text(text) => ResultItem::Text(text.clone()),
        WireBlock::Image(img) => ResultItem::Image(ImageData::Base64(img.source.bytes.clone())),
        other => ResultItem::Json(serde_json::to_value(other).unwrap_or(Value::Null)),
    }
}

fn decode_image_bytes(b64: &str) -> Vec<u8> {
    match BASE64.decode(b64) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("undecodable image bytes in response: {err}");
            Vec::new()
        }
    }
}

/// Package a tool execution outcome as the reply turn's tool-result block.
///
/// On error the content is a single annotated text block and the image, if
/// any, is not attached. On success text comes first, then the image; a
/// result with neither yields an empty content array (a content-less
/// success marker the model accepts).
pub fn tool_result_block(result: &ToolExecutionResult, tool_use_id: &str) -> ContentBlock {
    let mut content = Vec::new();
    let status;

    if let Some(error) = &result.error {
        status = ResultStatus::Error;
        content.push(ResultItem::Text(annotate(result, error)));
    } else {
        status = ResultStatus::Success;
        if let Some(output) = &result.output {
            content.push(ResultItem::Text(annotate(result, output)));
        }
        if let Some(image) = &result.base64_image {
            content.push(ResultItem::Image(ImageData::Base64(image.clone())));
        }
    }

    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.into(),
        content,
        status,
    }
}

/// Prepend the tool's system annotation, if any, wrapped in a system-note
/// marker.
fn annotate(result: &ToolExecutionResult, text: &str) -> String {
    match &result.system {
        Some(note) => format!("<system>{note}</system>\n{text}"),
        None => text.to_string(),
    }
}
