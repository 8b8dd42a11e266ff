use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use rift_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::action::Action;
use crate::compose::compose;
use crate::context::SessionContext;
use crate::history::{ConversationHistory, append_user_text, repair_pairing};
use crate::prompt::build_system_prompt;
use crate::providers::{ChatMessage, ContentBlock, LlmProvider, LlmRequest, LlmResponse};
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};

/// Model round-trips allowed per turn unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

pub const GATEWAY_FAILURE_TEXT: &str =
    "I encountered an error processing your request. Please try again.";
pub const BUDGET_EXHAUSTED_TEXT: &str = "I need a bit more context to answer that. \
     Could you tell me more specifically what you'd like to see?";
pub const EMPTY_ANSWER_TEXT: &str =
    "I can help you analyze this match. What would you like to know?";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub max_iterations: usize,
    pub model_timeout: Duration,
    /// Run the tool calls of one round concurrently. Results keep call order either way.
    pub concurrent_tool_dispatch: bool,
    pub agent_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-5-sonnet-latest".to_string(),
            max_tokens: 1024,
            temperature: Some(0.7),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_timeout: Duration::from_secs(30),
            concurrent_tool_dispatch: true,
            agent_name: "Rift Copilot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub user_message: String,
    pub context: SessionContext,
    pub history: ConversationHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Answered,
    /// The model kept requesting tools until the iteration budget ran out.
    BudgetExhausted,
    /// The model call failed or timed out; history is returned as received.
    GatewayFailed,
}

#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub response_text: String,
    pub action: Option<Action>,
    pub history: ConversationHistory,
    pub outcome: TurnOutcome,
    /// Model calls made during the turn.
    pub iterations: usize,
}

struct ToolCall {
    id: String,
    name: String,
    input: Value,
}

/// Runs the ask-model / run-tools / feed-back loop for one user turn.
///
/// The engine holds no session state: history comes in with the request and a new
/// history goes out with the response.
pub struct ConversationEngine {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    config: EngineConfig,
}

impl ConversationEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.provider.health_check().await
    }

    /// Handle one user message.
    ///
    /// Returns `Err(Error::Cancelled)` when `cancel` fires; gateway failures and an
    /// exhausted budget are reported through [`TurnOutcome`] instead.
    #[instrument(
        skip(self, request, cancel),
        fields(
            match_id = request.context.match_id.as_deref().unwrap_or("-"),
            message_len = request.user_message.len(),
            provider = self.provider.provider_id(),
        )
    )]
    pub async fn handle_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnResponse> {
        let TurnRequest {
            user_message,
            context,
            history,
        } = request;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let received = history.clone();
        let mut messages = history.into_messages();
        repair_pairing(&mut messages);
        append_user_text(&mut messages, &user_message);

        let system = build_system_prompt(&self.config.agent_name, &context);
        let tools = self.registry.definitions();
        let tool_context = ToolContext::new(&context);
        let mut last_round: Vec<Action> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let request = LlmRequest {
                model: self.config.model.clone(),
                messages: messages.clone(),
                system: Some(system.clone()),
                max_tokens: Some(self.config.max_tokens),
                temperature: self.config.temperature,
                tools: tools.clone(),
            };

            let response = match self.call_model(&request, &cancel).await {
                Ok(response) => response,
                Err(Error::Cancelled) => {
                    info!(iteration, "turn cancelled during model call");
                    return Err(Error::Cancelled);
                }
                Err(e) => {
                    error!(iteration, error = %e, "model call failed");
                    return Ok(TurnResponse {
                        response_text: GATEWAY_FAILURE_TEXT.to_string(),
                        action: None,
                        history: received,
                        outcome: TurnOutcome::GatewayFailed,
                        iterations: iteration,
                    });
                }
            };

            if !response.requests_tools() {
                let text = extract_text(&response.content);
                let answer = if text.trim().is_empty() {
                    EMPTY_ANSWER_TEXT.to_string()
                } else {
                    text
                };
                messages.push(ChatMessage::assistant(vec![ContentBlock::text(answer.clone())]));

                let action = compose(last_round);
                let response_text = match &action {
                    Some(action) if !action.description().is_empty() => {
                        action.description().to_string()
                    }
                    _ => answer,
                };
                info!(
                    iteration,
                    has_action = action.is_some(),
                    "turn answered"
                );
                return Ok(TurnResponse {
                    response_text,
                    action,
                    history: messages.into(),
                    outcome: TurnOutcome::Answered,
                    iterations: iteration,
                });
            }

            let calls = tool_calls(&response.content);
            messages.push(ChatMessage::assistant(
                response
                    .content
                    .into_iter()
                    .filter(|block| match block {
                        ContentBlock::ToolResult { .. } => false,
                        ContentBlock::Text { text } => !text.trim().is_empty(),
                        ContentBlock::ToolUse { .. } => true,
                    })
                    .collect(),
            ));

            let outputs = self.dispatch_round(&calls, &tool_context, &cancel).await?;
            let mut results = Vec::with_capacity(outputs.len());
            last_round = Vec::new();
            for (call, output) in calls.into_iter().zip(outputs) {
                if let Some(action) = output.action {
                    last_round.push(action);
                }
                results.push(ContentBlock::ToolResult {
                    tool_use_id: call.id,
                    content: output.content,
                    is_error: output.is_error,
                });
            }
            messages.push(ChatMessage::tool_results(results));
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "iteration budget exhausted while the model was still calling tools"
        );
        Ok(TurnResponse {
            response_text: BUDGET_EXHAUSTED_TEXT.to_string(),
            action: None,
            history: messages.into(),
            outcome: TurnOutcome::BudgetExhausted,
            iterations: self.config.max_iterations,
        })
    }

    async fn call_model(
        &self,
        request: &LlmRequest,
        cancel: &CancellationToken,
    ) -> Result<LlmResponse> {
        let started = Instant::now();
        let timeout = self.config.model_timeout;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, self.provider.complete(request)) => {
                result.map_err(|_| Error::Timeout(timeout))??
            }
        };
        debug!(
            stop_reason = response.stop_reason.as_deref().unwrap_or("-"),
            blocks = response.content.len(),
            input_tokens = response.usage.as_ref().map(|u| u.input_tokens),
            output_tokens = response.usage.as_ref().map(|u| u.output_tokens),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model responded"
        );
        Ok(response)
    }

    async fn dispatch_round(
        &self,
        calls: &[ToolCall],
        context: &ToolContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ToolOutput>> {
        let run = async {
            if self.config.concurrent_tool_dispatch {
                join_all(calls.iter().map(|call| self.dispatch_one(call, context))).await
            } else {
                let mut outputs = Vec::with_capacity(calls.len());
                for call in calls {
                    outputs.push(self.dispatch_one(call, context).await);
                }
                outputs
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(calls = calls.len(), "turn cancelled during tool dispatch");
                Err(Error::Cancelled)
            }
            outputs = run => Ok(outputs),
        }
    }

    async fn dispatch_one(&self, call: &ToolCall, context: &ToolContext<'_>) -> ToolOutput {
        info!(tool = %call.name, id = %call.id, "executing tool call");
        self.registry
            .dispatch(&call.name, call.input.clone(), context)
            .await
    }
}

fn tool_calls(content: &[ContentBlock]) -> Vec<ToolCall> {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn extract_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
