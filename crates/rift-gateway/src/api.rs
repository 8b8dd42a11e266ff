use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rift_agents::{Action, ConversationHistory, SessionContext, ToolDefinition, TurnOutcome, TurnRequest};
use rift_common::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub session_context: SessionContext,
    #[serde(default)]
    pub conversation_history: ConversationHistory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response_text: String,
    pub action: Option<Action>,
    pub conversation_history: ConversationHistory,
    pub outcome: TurnOutcome,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

/// Response for a turn that ended in an error rather than an outcome.
fn turn_failed(e: Error) -> (StatusCode, Json<Value>) {
    match e {
        Error::Cancelled => {
            warn!("chat turn cancelled");
            error_body(StatusCode::SERVICE_UNAVAILABLE, "request cancelled")
        }
        e => {
            error!(error = %e, "chat turn failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `POST /api/chat`: run one conversation turn.
pub async fn chat(
    State(state): State<SharedState>,
    Json(body): Json<ChatRequest>,
) -> (StatusCode, Json<Value>) {
    if body.user_message.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "userMessage is required");
    }

    // Dropping the handler future (client gone) cancels the turn.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let timeout = state.request_timeout();

    let request = TurnRequest {
        user_message: body.user_message,
        context: body.session_context,
        history: body.conversation_history,
    };
    let turn = state.engine.handle_turn(request, cancel.clone());

    match tokio::time::timeout(timeout, turn).await {
        Ok(Ok(turn)) => {
            info!(
                outcome = ?turn.outcome,
                iterations = turn.iterations,
                has_action = turn.action.is_some(),
                "chat turn finished"
            );
            let response = ChatResponse {
                response_text: turn.response_text,
                action: turn.action,
                conversation_history: turn.history,
                outcome: turn.outcome,
            };
            match serde_json::to_value(&response) {
                Ok(value) => (StatusCode::OK, Json(value)),
                Err(e) => {
                    error!(error = %e, "failed to serialize chat response");
                    error_body(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode response")
                }
            }
        }
        Ok(Err(e)) => turn_failed(e),
        Err(_) => {
            cancel.cancel();
            warn!(timeout_secs = timeout.as_secs(), "chat turn timed out");
            error_body(StatusCode::GATEWAY_TIMEOUT, "request timed out")
        }
    }
}

/// `GET /api/tools`: the tool catalog offered to the model.
pub async fn list_tools(State(state): State<SharedState>) -> Json<Vec<ToolDefinition>> {
    Json(state.engine.registry().definitions())
}
