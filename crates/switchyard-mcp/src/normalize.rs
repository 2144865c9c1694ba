//! Recovery of structured data from provider responses.
//!
//! Nodes answer `tools/call` with a sequence of typed content blocks and
//! `tools/list` with tool metadata in a few different shapes. Both are
//! decoded into tagged unions with an explicit fallback variant.

use serde::Deserialize;
use serde_json::{json, Value};

use switchyard_core::{Error, ToolDescriptor};

/// Result of a provider's `tools/call`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProviderResponse {
    Content {
        content: Vec<Value>,
        /// Only boolean `true` marks a failure; `null` and other values do not.
        #[serde(rename = "isError", default)]
        is_error: Option<Value>,
    },
    Bare(Value),
}

/// Classification of a single content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentBlock<'a> {
    Text(&'a str),
    Other,
}

impl<'a> ContentBlock<'a> {
    #[must_use]
    pub fn classify(block: &'a Value) -> Self {
        match (
            block.get("type").and_then(Value::as_str),
            block.get("text").and_then(Value::as_str),
        ) {
            (Some("text"), Some(text)) if !text.is_empty() => Self::Text(text),
            _ => Self::Other,
        }
    }
}

impl ProviderResponse {
    /// Decode a raw `tools/call` result. Never fails: unknown shapes are `Bare`.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(Self::Bare(value))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Content {
                is_error: Some(Value::Bool(true)),
                ..
            }
        )
    }

    /// Text of the first textual block, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::Content { content, .. } => content.iter().find_map(|block| {
                match ContentBlock::classify(block) {
                    ContentBlock::Text(text) => Some(text),
                    ContentBlock::Other => None,
                }
            }),
            Self::Bare(_) => None,
        }
    }
}

/// Parse text as JSON, falling back to `{"text": <raw>}`.
#[must_use]
pub fn parse_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "text": text }))
}

/// Collapse a provider response into a single JSON value.
///
/// The first textual block is parsed as JSON (or wrapped as `{"text": ...}`);
/// without a textual block the content sequence is returned unchanged.
#[must_use]
pub fn normalize(response: ProviderResponse) -> Value {
    if let Some(text) = response.first_text() {
        return parse_text(text);
    }
    match response {
        ProviderResponse::Content { content, .. } => Value::Array(content),
        ProviderResponse::Bare(value) => value,
    }
}

/// One entry of a provider's `tools/list` result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProviderTool {
    /// MCP shape: `inputSchema` / `outputSchema`.
    Mcp {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(rename = "inputSchema")]
        input_schema: Value,
        #[serde(rename = "outputSchema", default)]
        output_schema: Option<Value>,
    },
    /// Catalog shape: `input_schema` / `output_schema`.
    Catalog {
        name: String,
        #[serde(default)]
        description: Option<String>,
        input_schema: Value,
        #[serde(default)]
        output_schema: Option<Value>,
    },
    /// A tool that takes no declared input.
    Named {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
    Opaque(Value),
}

impl ProviderTool {
    /// Convert into a uniform descriptor. `Opaque` entries yield `None`.
    #[must_use]
    pub fn into_descriptor(self) -> Option<ToolDescriptor> {
        match self {
            Self::Mcp {
                name,
                description,
                input_schema,
                output_schema,
            }
            | Self::Catalog {
                name,
                description,
                input_schema,
                output_schema,
            } => Some(ToolDescriptor {
                name,
                description: description.unwrap_or_default(),
                input_schema,
                output_schema,
            }),
            Self::Named { name, description } => Some(ToolDescriptor {
                name,
                description: description.unwrap_or_default(),
                input_schema: json!({"type": "object", "properties": {}}),
                output_schema: None,
            }),
            Self::Opaque(_) => None,
        }
    }
}

/// Extract tool descriptors from a provider's `tools/list` result.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] when the result has no `tools` array.
pub fn normalize_tools(result: Value) -> Result<Vec<ToolDescriptor>, Error> {
    let Value::Object(mut map) = result else {
        return Err(Error::MalformedResponse(
            "tools/list result is not an object".to_string(),
        ));
    };
    let Some(Value::Array(entries)) = map.remove("tools") else {
        return Err(Error::MalformedResponse(
            "tools/list result has no tools array".to_string(),
        ));
    };

    let tools = entries
        .into_iter()
        .filter_map(|entry| {
            let tool: ProviderTool =
                serde_json::from_value(entry.clone()).unwrap_or(ProviderTool::Opaque(entry));
            let descriptor = tool.clone().into_descriptor();
            if descriptor.is_none() {
                tracing::warn!(entry = ?tool, "skipping unrecognised tool descriptor");
            }
            descriptor
        })
        .collect();
    Ok(tools)
}
