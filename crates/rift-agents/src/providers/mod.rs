use async_trait::async_trait;
use rift_common::Result;
use serde::{Deserialize, Deserializer, Serialize};

pub mod anthropic;
pub use anthropic::AnthropicProvider;

/// Seam to the external model. Implementations perform exactly one request per call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier (e.g. "anthropic").
    fn provider_id(&self) -> &str;

    /// Send a completion request and return the response.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Check if the provider is available and configured.
    async fn health_check(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
        }
    }

    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: ChatRole::User,
            content: results,
        }
    }

    /// Ids of the `tool_use` blocks in call order.
    pub fn tool_use_ids(&self) -> Vec<String> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Accepts both the block-list form and the plain-string shorthand for `content`.
fn deserialize_content<'de, D>(deserializer: D) -> std::result::Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Content {
        Text(String),
        Blocks(Vec<ContentBlock>),
    }

    Ok(match Content::deserialize(deserializer)? {
        Content::Text(text) => vec![ContentBlock::Text { text }],
        Content::Blocks(blocks) => blocks,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub usage: Option<Usage>,
    pub stop_reason: Option<String>,
}

impl LlmResponse {
    /// Whether `tool_use` blocks in this response should be executed.
    ///
    /// Only an explicit `tool_use` stop reason, or none at all, qualifies; any other
    /// reason means the text is all there is.
    pub fn requests_tools(&self) -> bool {
        match self.stop_reason.as_deref() {
            None | Some("tool_use") => self
                .content
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. })),
            Some(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_blocks_use_wire_shape() {
        let message = ChatMessage::tool_results(vec![ContentBlock::ToolResult {
            tool_use_id: "toolu_1".into(),
            content: "ok".into(),
            is_error: false,
        }]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [{"type": "tool_result", "tool_use_id": "toolu_1", "content": "ok"}]
            })
        );
    }

    #[test]
    fn error_results_carry_flag() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_1".into(),
            content: "{\"error\":\"boom\"}".into(),
            is_error: true,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["is_error"], json!(true));
    }

    #[test]
    fn string_content_is_accepted() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(message, ChatMessage::user_text("hello"));
    }

    #[test]
    fn tool_use_needs_matching_stop_reason() {
        let mut response = LlmResponse {
            content: vec![ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "show_players".into(),
                input: json!({}),
            }],
            model: "m".into(),
            usage: None,
            stop_reason: Some("tool_use".into()),
        };
        assert!(response.requests_tools());

        response.stop_reason = None;
        assert!(response.requests_tools());

        response.stop_reason = Some("max_tokens".into());
        assert!(!response.requests_tools());

        response.stop_reason = Some("end_turn".into());
        assert!(!response.requests_tools());
    }
}
