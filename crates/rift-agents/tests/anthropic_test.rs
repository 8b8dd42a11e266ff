use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use rift_agents::providers::{
    AnthropicProvider, ChatMessage, ContentBlock, LlmProvider, LlmRequest, ToolDefinition,
};
use rift_common::{Error, Result};
use serde_json::{Value, json};
use tokio::sync::oneshot;

type Captured = Arc<Mutex<Vec<Value>>>;

async fn start_mock_server() -> (SocketAddr, Captured, oneshot::Sender<()>) {
    let (tx, rx) = oneshot::channel::<()>();
    let captured: Captured = Arc::default();

    let app = Router::new()
        .route("/v1/messages", post(mock_messages))
        .route("/v1/limited", post(rate_limited))
        .route("/v1/broken", post(broken_tool_use))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .unwrap();
    });

    (addr, captured, tx)
}

async fn mock_messages(
    State(captured): State<Captured>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    captured.lock().unwrap().push(payload);
    Json(json!({
        "id": "msg_123",
        "type": "message",
        "role": "assistant",
        "content": [
            {"type": "text", "text": ""},
            {"type": "text", "text": "Let me pull up your team."},
            {"type": "text", "text": " \n "},
            {"type": "text"},
            {"type": "tool_use", "id": "toolu_01", "name": "show_players", "input": {"filter": "my_team"}},
            {"type": "thinking", "thinking": "hidden"}
        ],
        "model": "claude-3-5-sonnet-20241022",
        "stop_reason": "tool_use",
        "usage": {"input_tokens": 120, "output_tokens": 30}
    }))
}

async fn rate_limited() -> impl IntoResponse {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({"type": "error", "error": {"type": "rate_limit_error"}})),
    )
}

async fn broken_tool_use() -> impl IntoResponse {
    Json(json!({
        "content": [{"type": "tool_use", "name": "show_players", "input": {}}],
        "model": "m",
        "stop_reason": "tool_use"
    }))
}

fn request() -> LlmRequest {
    LlmRequest {
        model: "claude-3-5-sonnet-20241022".to_string(),
        messages: vec![
            ChatMessage::user_text("show my team"),
            ChatMessage::assistant(vec![ContentBlock::ToolUse {
                id: "toolu_00".into(),
                name: "show_players".into(),
                input: json!({"filter": "all"}),
            }]),
            ChatMessage::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_00".into(),
                content: "{\"error\": \"boom\"}".into(),
                is_error: true,
            }]),
        ],
        system: Some("You are a match analyst.".to_string()),
        max_tokens: Some(256),
        temperature: Some(0.2),
        tools: vec![ToolDefinition {
            name: "show_players".into(),
            description: "List players".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }],
    }
}

#[tokio::test]
async fn parses_text_and_tool_use_blocks_skipping_blank_text() -> Result<()> {
    let (addr, captured, _shutdown) = start_mock_server().await;
    let provider = AnthropicProvider::new("test-key".to_string())
        .with_base_url(format!("http://{addr}/v1/messages"));

    let response = provider.complete(&request()).await?;

    assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
    assert!(response.requests_tools());
    assert_eq!(response.content.len(), 2);
    assert_eq!(response.content[0], ContentBlock::text("Let me pull up your team."));
    assert_eq!(
        response.content[1],
        ContentBlock::ToolUse {
            id: "toolu_01".into(),
            name: "show_players".into(),
            input: json!({"filter": "my_team"}),
        }
    );
    assert_eq!(response.usage.unwrap().input_tokens, 120);

    let body = captured.lock().unwrap()[0].clone();
    assert_eq!(body["system"], json!("You are a match analyst."));
    assert_eq!(body["max_tokens"], json!(256));
    assert_eq!(body["tools"][0]["input_schema"]["type"], json!("object"));
    assert_eq!(body["messages"][1]["content"][0]["type"], json!("tool_use"));
    assert_eq!(
        body["messages"][2]["content"][0],
        json!({
            "type": "tool_result",
            "tool_use_id": "toolu_00",
            "content": "{\"error\": \"boom\"}",
            "is_error": true
        })
    );
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_a_retryable_provider_error() {
    let (addr, _captured, _shutdown) = start_mock_server().await;
    let provider = AnthropicProvider::new("test-key".to_string())
        .with_base_url(format!("http://{addr}/v1/limited"));

    let err = provider.complete(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
    assert!(err.to_string().contains("status=429"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn tool_use_without_id_is_malformed() {
    let (addr, _captured, _shutdown) = start_mock_server().await;
    let provider = AnthropicProvider::new("test-key".to_string())
        .with_base_url(format!("http://{addr}/v1/broken"));

    let err = provider.complete(&request()).await.unwrap_err();
    assert!(err.to_string().contains("malformed response"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn health_check_reports_unreachable_endpoint() {
    let provider = AnthropicProvider::new("test-key".to_string())
        .with_base_url("http://127.0.0.1:9/v1/messages".to_string());
    assert!(!provider.health_check().await.unwrap());
}
