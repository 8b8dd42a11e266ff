use async_trait::async_trait;
use rift_common::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::schema::{parse_input, schema_for};
use super::{Tool, ToolCategory, ToolContext, ToolOutput};
use crate::action::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum MapGroup {
    MyTeam,
    EnemyTeam,
    BlueTeam,
    RedTeam,
    All,
}

impl MapGroup {
    fn label(self) -> &'static str {
        match self {
            MapGroup::MyTeam => "my team",
            MapGroup::EnemyTeam => "enemy team",
            MapGroup::BlueTeam => "blue team",
            MapGroup::RedTeam => "red team",
            MapGroup::All => "all",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct MapFilterInput {
    /// Group of champions to change.
    filter: MapGroup,
    /// true to show the group, false to hide it. Defaults to true.
    #[serde(default = "default_show")]
    show: bool,
}

fn default_show() -> bool {
    true
}

/// Shows or hides a group of champions on the minimap.
pub struct ToggleMapFilter;

#[async_trait]
impl Tool for ToggleMapFilter {
    fn name(&self) -> &'static str {
        "toggle_map_filter"
    }

    fn description(&self) -> &'static str {
        "Show or hide a group of champions on the minimap, e.g. only the enemy team."
    }

    fn input_schema(&self) -> Value {
        schema_for::<MapFilterInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::MapFilter
    }

    async fn execute(&self, _context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let MapFilterInput { filter, show } = parse_input(input)?;
        let description = format!(
            "{} {} on map",
            if show { "Showing" } else { "Hiding" },
            filter.label()
        );
        let action = self
            .category()
            .action(ActionKind::ToggleMapFilter, json!({ "filter": filter, "show": show }))
            .with_description(description.clone());
        Ok(ToolOutput::success(format!("{description}.")).with_action(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::context::SessionContext;

    #[tokio::test]
    async fn show_defaults_to_true() {
        let session = SessionContext::default();
        let out = ToggleMapFilter
            .execute(&ToolContext::new(&session), json!({"filter": "enemy_team"}))
            .await
            .unwrap();
        let Some(Action::Single(action)) = out.action else {
            panic!("expected single action");
        };
        assert_eq!(action.kind, ActionKind::ToggleMapFilter);
        assert_eq!(action.params["show"], json!(true));
        assert!(!action.requires_permission);
        assert_eq!(action.description, "Showing enemy team on map");
    }

    #[tokio::test]
    async fn hiding_is_described() {
        let session = SessionContext::default();
        let out = ToggleMapFilter
            .execute(
                &ToolContext::new(&session),
                json!({"filter": "blue_team", "show": false}),
            )
            .await
            .unwrap();
        assert_eq!(out.content, "Hiding blue team on map.");
    }
}
