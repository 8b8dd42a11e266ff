use super::{ContentBlock, LlmProvider, LlmRequest, LlmResponse, Usage};
use async_trait::async_trait;
use reqwest::Client;
use rift_common::{Error, Result};
use serde_json::json;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    client: Client,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Override the full messages endpoint URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn create_request_body(&self, request: &LlmRequest) -> Result<serde_json::Value> {
        // History blocks already use the Messages API shape.
        let mut body = json!({
            "model": request.model,
            "messages": serde_json::to_value(&request.messages)?,
            "max_tokens": request.max_tokens.unwrap_or(1024),
        });

        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::to_value(&request.tools)?;
        }

        Ok(body)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let body = self.create_request_body(request)?;

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "anthropic API error: status={}, body={}",
                status.as_u16(),
                error_text
            )));
        }

        let raw_response: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("malformed response: {e}")))?;

        let content_blocks = raw_response["content"]
            .as_array()
            .ok_or_else(|| Error::Provider("malformed response: missing content".to_string()))?
            .iter()
            .filter_map(|block| {
                let type_ = block["type"].as_str().unwrap_or_default();
                match type_ {
                    "text" => match block["text"].as_str() {
                        Some(text) if !text.trim().is_empty() => Some(Ok(ContentBlock::text(text))),
                        _ => None,
                    },
                    "tool_use" => Some(parse_tool_use(block)),
                    other => {
                        debug!("skipping unsupported content block type: {}", other);
                        None
                    }
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let usage = raw_response["usage"].as_object().map(|u| Usage {
            input_tokens: u["input_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["output_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(LlmResponse {
            content: content_blocks,
            model: raw_response["model"].as_str().unwrap_or_default().to_string(),
            usage,
            stop_reason: raw_response["stop_reason"].as_str().map(str::to_string),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let body = json!({
            "model": "claude-3-haiku-20240307",
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "ping"}]
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

fn parse_tool_use(block: &serde_json::Value) -> Result<ContentBlock> {
    let id = block["id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Provider("malformed response: tool_use without id".to_string()))?;
    let name = block["name"]
        .as_str()
        .ok_or_else(|| Error::Provider("malformed response: tool_use without name".to_string()))?;
    Ok(ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: match &block["input"] {
            serde_json::Value::Null => json!({}),
            input => input.clone(),
        },
    })
}
