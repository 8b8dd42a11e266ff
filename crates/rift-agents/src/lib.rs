pub mod action;
pub mod compose;
pub mod context;
pub mod history;
pub mod prompt;
pub mod providers;
pub mod resolver;
pub mod runtime;
pub mod summary;
pub mod tools;

pub use action::{Action, ActionKind, MultiAction, UiAction};
pub use compose::compose;
pub use context::{EventKind, EventRecord, SessionContext};
pub use history::{ConversationHistory, repair_pairing, verify_pairing};
pub use providers::{
    AnthropicProvider, ChatMessage, ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse,
    ToolDefinition, Usage,
};
pub use resolver::{ResolutionHint, resolve};
pub use runtime::{ConversationEngine, EngineConfig, TurnOutcome, TurnRequest, TurnResponse};
pub use tools::{Tool, ToolCategory, ToolContext, ToolOutput, ToolRegistry, match_tools};
