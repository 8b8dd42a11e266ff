use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use rift_common::Error;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Tool, ToolContext, ToolOutput};
use crate::providers::ToolDefinition;

type ToolSet = Arc<Vec<Arc<dyn Tool>>>;

/// Name-indexed tool catalog.
///
/// Registration swaps in a new snapshot, so a dispatch in flight keeps the set
/// it started with.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<ToolSet>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tool`, replacing any tool registered under the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut guard = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Arc<dyn Tool>> = guard
            .iter()
            .filter(|existing| existing.name() != tool.name())
            .cloned()
            .collect();
        let replaced = next.len() != guard.len();
        info!(tool = tool.name(), replaced, "registered tool");
        next.push(tool);
        *guard = Arc::new(next);
    }

    fn snapshot(&self) -> ToolSet {
        Arc::clone(&self.tools.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.snapshot().iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.snapshot().iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.snapshot()
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Run the named tool. Never fails: unknown tools, invalid input and handler
    /// errors all come back as error outputs.
    pub async fn dispatch(&self, name: &str, input: Value, context: &ToolContext<'_>) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "model requested unknown tool");
            return ToolOutput::error(format!("unknown tool: {name}"));
        };

        let started = Instant::now();
        let output = match tool.execute(context, input).await {
            Ok(output) => output,
            Err(e @ Error::Validation(_)) => {
                warn!(tool = name, error = %e, "rejected tool input");
                ToolOutput::error(e.to_string())
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                ToolOutput::error(e.to_string())
            }
        };
        debug!(
            tool = name,
            is_error = output.is_error,
            has_action = output.action.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool finished"
        );
        output
    }
}
