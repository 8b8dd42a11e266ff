use async_trait::async_trait;
use rift_common::{Error, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::schema::{parse_input, schema_for};
use super::{EventReference, Tool, ToolCategory, ToolContext, ToolOutput};
use crate::action::{Action, ActionKind, UiAction};
use crate::compose::compose;
use crate::resolver::resolve;
use crate::summary;

/// `12` for whole minutes, `12.5` otherwise.
fn minutes_label(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.0}")
    } else {
        format!("{minutes:.1}")
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct TimestampInput {
    /// Game time in minutes (e.g. 14.5).
    #[schemars(range(min = 0))]
    minutes: f64,
    /// Short explanation shown to the user.
    #[serde(default)]
    reason: Option<String>,
}

pub struct NavigateToTimestamp;

#[async_trait]
impl Tool for NavigateToTimestamp {
    fn name(&self) -> &'static str {
        "navigate_to_timestamp"
    }

    fn description(&self) -> &'static str {
        "Move the match timeline to a game time. Use when the user asks to see what \
         happened at a specific minute. The user is asked to allow the jump."
    }

    fn input_schema(&self) -> Value {
        schema_for::<TimestampInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Navigation
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let input: TimestampInput = parse_input(input)?;
        if input.minutes < 0.0 {
            return Err(Error::Validation(
                "field 'minutes' must be at least 0".to_string(),
            ));
        }
        let mut frame_index = input.minutes.floor() as i64;
        if let Some(duration) = context.session.duration_minutes {
            frame_index = frame_index.min(duration.floor() as i64);
        }

        let description = input
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("Navigate to {} minutes", minutes_label(input.minutes)));

        let action = self
            .category()
            .action(ActionKind::NavigateTimeline, json!({ "frameIndex": frame_index }))
            .with_description(description);

        Ok(ToolOutput::success(format!(
            "Prepared a jump to frame {frame_index} ({} minutes). The user must allow the navigation.",
            minutes_label(input.minutes)
        ))
        .with_action(action))
    }
}

pub struct NavigateToEvent;

#[async_trait]
impl Tool for NavigateToEvent {
    fn name(&self) -> &'static str {
        "navigate_to_event"
    }

    fn description(&self) -> &'static str {
        "Move the match timeline to one objective or kill. Give `index` for \"the second \
         dragon\", `after_frame_index` or `after_time` for \"the next baron after this\". \
         Without hints the latest event is chosen. The user is asked to allow the jump."
    }

    fn input_schema(&self) -> Value {
        schema_for::<EventReference>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Navigation
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let reference: EventReference = parse_input(input)?;
        let event_type = reference.event_type;
        let hint = reference.hint();
        let events = context.session.events.of_kind(event_type);
        let index = resolve(events, &hint).ok_or_else(|| {
            Error::Tool(format!("no {} events in this match", event_type.as_str()))
        })?;
        let event = &events[index];
        let minutes = event.timestamp.unwrap_or(event.frame_index as f64);
        let group = event_type.toggle_group();

        let mut description = format!(
            "Navigate to {} #{} at {:.1} minutes",
            event_type.as_str(),
            index + 1,
            minutes
        );
        let category = self.category();
        let mut actions: Vec<Action> = Vec::new();
        if category.pairs_with_toggle() {
            description.push_str(&format!(" (showing {group})"));
        }
        actions.push(
            category
                .action(ActionKind::NavigateTimeline, json!({ "frameIndex": event.frame_index }))
                .with_description(description.clone())
                .into(),
        );
        if category.pairs_with_toggle() {
            actions.push(
                UiAction::new(
                    ActionKind::ToggleEvent,
                    json!({ "eventType": group, "enabled": true }),
                    false,
                )
                .into(),
            );
        }

        let timeline = summary::event_timeline(event_type, events, context.session, Some(index));
        let mut output = ToolOutput::success(format!(
            "{timeline}\n\nPrepared: {description}. The user must allow the navigation."
        ));
        output.action = compose(actions);
        Ok(output)
    }
}
