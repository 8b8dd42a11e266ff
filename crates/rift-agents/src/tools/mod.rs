use std::sync::Arc;

use async_trait::async_trait;
use rift_common::Result;
use rift_db::MatchRepository;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::action::{Action, ActionKind, UiAction};
use crate::context::{EventKind, SessionContext};
use crate::resolver::ResolutionHint;

pub mod cards;
pub mod display;
pub mod heatmap;
pub mod map_filter;
pub mod navigation;
pub mod registry;
pub mod schema;

pub use cards::{OpenEventCard, OpenFrameEventsCard, OpenPlayerCard};
pub use display::{ShowEventTimeline, ShowPlayers};
pub use heatmap::FilterHeatmap;
pub use map_filter::ToggleMapFilter;
pub use navigation::{NavigateToEvent, NavigateToTimestamp};
pub use registry::ToolRegistry;

/// Behavioural class of a tool. Fixes the default permission requirement of the
/// actions it produces and whether navigation pairs with a `toggle_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Navigation,
    Display,
    Card,
    MapFilter,
}

impl ToolCategory {
    pub fn requires_permission(self) -> bool {
        matches!(self, ToolCategory::Navigation)
    }

    pub fn pairs_with_toggle(self) -> bool {
        matches!(self, ToolCategory::Navigation)
    }

    /// Build an action with this category's default permission flag.
    pub fn action(self, kind: ActionKind, params: Value) -> UiAction {
        UiAction::new(kind, params, self.requires_permission())
    }
}

/// Per-call view of the session a tool runs against.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub session: &'a SessionContext,
}

impl<'a> ToolContext<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }
}

/// Result of one tool invocation: text for the model plus an optional UI action.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
    pub action: Option<Action>,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
            action: None,
        }
    }

    /// Error shaped as `{"error": message}` so the model can react to it.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: json!({ "error": message.into() }).to_string(),
            is_error: true,
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.action = Some(action.into());
        self
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the input, usually [`schema::schema_for`] of the struct
    /// `execute` parses with [`schema::parse_input`].
    fn input_schema(&self) -> Value;

    fn category(&self) -> ToolCategory;

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput>;
}

/// Registry holding the match analysis tool catalog.
///
/// `filter_heatmap` is only registered when a repository is available.
pub fn match_tools(repository: Option<Arc<dyn MatchRepository>>) -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(NavigateToTimestamp));
    registry.register(Arc::new(NavigateToEvent));
    registry.register(Arc::new(ShowPlayers));
    registry.register(Arc::new(ShowEventTimeline));
    registry.register(Arc::new(ToggleMapFilter));
    registry.register(Arc::new(OpenEventCard));
    registry.register(Arc::new(OpenPlayerCard));
    registry.register(Arc::new(OpenFrameEventsCard));
    if let Some(repository) = repository {
        registry.register(Arc::new(FilterHeatmap::new(repository)));
    }
    registry
}

/// Input shared by tools that pick one event of a kind.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct EventReference {
    /// Kind of event to pick.
    pub event_type: EventKind,
    /// 1-based position of the event in match order (1 = first).
    #[serde(default)]
    pub index: Option<i64>,
    /// Pick the first event after this timeline frame.
    #[serde(default)]
    pub after_frame_index: Option<i64>,
    /// Pick the first event after this game time, in minutes.
    #[serde(default)]
    pub after_time: Option<f64>,
}

impl EventReference {
    pub fn hint(&self) -> ResolutionHint {
        ResolutionHint {
            explicit_index: self.index,
            after_frame_index: self.after_frame_index,
            after_time_minutes: self.after_time,
        }
    }
}
