use std::sync::Arc;

use async_trait::async_trait;
use rift_common::{Error, Lane, Result};
use rift_db::{EventQuery, HeatmapEventKind, MatchRepository};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::schema::{parse_input, schema_for};
use super::{Tool, ToolCategory, ToolContext, ToolOutput};
use crate::action::ActionKind;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct HeatmapInput {
    /// Which interactions to plot.
    event_type: HeatmapEventKind,
    /// Only matches played on this champion.
    #[serde(default)]
    champion_name: Option<String>,
    /// Only matches in this role (TOP, JUNGLE, MIDDLE, BOTTOM, UTILITY).
    #[serde(default)]
    role: Option<String>,
    /// How many of the most recent matches to consider.
    #[serde(default)]
    #[schemars(range(min = 1))]
    match_count: Option<usize>,
    /// Earliest game time in minutes.
    #[serde(default)]
    #[schemars(range(min = 0))]
    game_time_start: Option<f64>,
    /// Latest game time in minutes.
    #[serde(default)]
    #[schemars(range(min = 0))]
    game_time_end: Option<f64>,
}

/// Plots where the session's player got kills, died, assisted or took objectives
/// across their imported match history.
pub struct FilterHeatmap {
    repository: Arc<dyn MatchRepository>,
}

impl FilterHeatmap {
    pub fn new(repository: Arc<dyn MatchRepository>) -> Self {
        Self { repository }
    }

    fn query(puuid: &str, input: HeatmapInput) -> Result<EventQuery> {
        let role = match input.role.as_deref() {
            Some(raw) => Some(
                Lane::parse(raw).ok_or_else(|| Error::Tool(format!("unknown role: {raw}")))?,
            ),
            None => None,
        };
        if input.match_count == Some(0) {
            return Err(Error::Validation(
                "field 'match_count' must be at least 1".to_string(),
            ));
        }
        for (field, minutes) in [
            ("game_time_start", input.game_time_start),
            ("game_time_end", input.game_time_end),
        ] {
            if minutes.is_some_and(|m| m < 0.0) {
                return Err(Error::Validation(format!("field '{field}' must be at least 0")));
            }
        }
        if let (Some(start), Some(end)) = (input.game_time_start, input.game_time_end) {
            if start > end {
                return Err(Error::Tool(format!(
                    "game_time_start ({start}) is after game_time_end ({end})"
                )));
            }
        }

        let mut query = EventQuery::new(puuid, input.event_type);
        query.champion_name = input.champion_name.filter(|c| !c.trim().is_empty());
        query.role = role;
        query.match_count = input.match_count;
        query.game_time_start = input.game_time_start;
        query.game_time_end = input.game_time_end;
        Ok(query)
    }
}

fn describe(query: &EventQuery, total: usize, matches: usize) -> String {
    let mut text = format!(
        "Showing {total} {} from {matches} matches",
        query.event_type.as_str()
    );
    if let Some(champion) = &query.champion_name {
        text.push_str(&format!(" as {champion}"));
    }
    if let Some(role) = query.role {
        text.push_str(&format!(" in {}", role.as_str()));
    }
    match (query.game_time_start, query.game_time_end) {
        (Some(start), Some(end)) => text.push_str(&format!(" between {start} and {end} minutes")),
        (Some(start), None) => text.push_str(&format!(" after {start} minutes")),
        (None, Some(end)) => text.push_str(&format!(" before {end} minutes")),
        (None, None) => {}
    }
    text
}

#[async_trait]
impl Tool for FilterHeatmap {
    fn name(&self) -> &'static str {
        "filter_heatmap"
    }

    fn description(&self) -> &'static str {
        "Show a heatmap of where the player got kills, died, assisted or took objectives \
         across their recent matches. Filters by champion, role, number of matches and \
         game time window."
    }

    fn input_schema(&self) -> Value {
        schema_for::<HeatmapInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Display
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let puuid = context
            .session
            .puuid
            .as_deref()
            .ok_or_else(|| Error::Tool("no player is linked to this session".to_string()))?;
        let query = Self::query(puuid, parse_input(input)?)?;

        let found = self.repository.player_events(&query).await?;
        let total = found.events.len();
        debug!(
            event_type = query.event_type.as_str(),
            total,
            matches = found.matches_analyzed,
            "heatmap events loaded"
        );

        let description = describe(&query, total, found.matches_analyzed);
        let action = self
            .category()
            .action(
                ActionKind::DisplayHeatmap,
                json!({
                    "events": found.events,
                    "totalEvents": total,
                    "matchesAnalyzed": found.matches_analyzed,
                    "filters": query,
                }),
            )
            .with_description(description.clone());

        let content = if total == 0 {
            format!("{description}. No matching events were found; suggest loosening the filters.")
        } else {
            format!("{description}.")
        };
        Ok(ToolOutput::success(content).with_action(action))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rift_db::{MatchSummary, PlayerEvent, PlayerEvents};

    use super::*;
    use crate::action::Action;
    use crate::tools::test_support::session;

    #[derive(Default)]
    struct RecordingRepository {
        queries: Mutex<Vec<EventQuery>>,
    }

    #[async_trait]
    impl MatchRepository for RecordingRepository {
        async fn recent_matches(&self, _puuid: &str, _limit: Option<usize>) -> Result<Vec<MatchSummary>> {
            Ok(Vec::new())
        }

        async fn player_events(&self, query: &EventQuery) -> Result<PlayerEvents> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(PlayerEvents {
                events: vec![PlayerEvent {
                    x: 1200,
                    y: 3400,
                    timestamp: 300_000,
                    match_id: "NA1_1".into(),
                    champion_name: "Ahri".into(),
                    role: "MIDDLE".into(),
                    killer_id: Some(4),
                    victim_id: Some(7),
                    monster_type: None,
                    building_type: None,
                }],
                matches_analyzed: 3,
            })
        }
    }

    #[tokio::test]
    async fn builds_query_and_heatmap_action() {
        let repository = Arc::new(RecordingRepository::default());
        let tool = FilterHeatmap::new(repository.clone());
        let session = session();

        let out = tool
            .execute(
                &ToolContext::new(&session),
                json!({
                    "event_type": "kills",
                    "champion_name": "Ahri",
                    "role": "mid",
                    "match_count": 5,
                    "game_time_start": 0,
                    "game_time_end": 15
                }),
            )
            .await
            .unwrap();

        let query = repository.queries.lock().unwrap()[0].clone();
        assert_eq!(query.puuid, "player-puuid");
        assert_eq!(query.role, Some(Lane::Middle));
        assert_eq!(query.match_count, Some(5));

        let Some(Action::Single(action)) = out.action else {
            panic!("expected single action");
        };
        assert_eq!(action.kind, ActionKind::DisplayHeatmap);
        assert!(!action.requires_permission);
        assert_eq!(action.params["totalEvents"], json!(1));
        assert_eq!(action.params["matchesAnalyzed"], json!(3));
        assert_eq!(action.params["filters"]["championName"], json!("Ahri"));
        assert_eq!(
            action.description,
            "Showing 1 kills from 3 matches as Ahri in MIDDLE between 0 and 15 minutes"
        );
    }

    #[tokio::test]
    async fn requires_a_linked_player() {
        let tool = FilterHeatmap::new(Arc::new(RecordingRepository::default()));
        let mut session = session();
        session.puuid = None;
        let err = tool
            .execute(&ToolContext::new(&session), json!({"event_type": "deaths"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no player is linked"));
    }

    #[tokio::test]
    async fn rejects_unknown_role_and_inverted_window() {
        let tool = FilterHeatmap::new(Arc::new(RecordingRepository::default()));
        let session = session();
        let err = tool
            .execute(
                &ToolContext::new(&session),
                json!({"event_type": "deaths", "role": "carry"}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown role: carry"));

        let err = tool
            .execute(
                &ToolContext::new(&session),
                json!({"event_type": "deaths", "game_time_start": 20, "game_time_end": 10}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is after"));

        let err = tool
            .execute(
                &ToolContext::new(&session),
                json!({"event_type": "kills", "game_time_start": -5}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'game_time_start' must be at least 0"));

        let err = tool
            .execute(
                &ToolContext::new(&session),
                json!({"event_type": "kills", "match_count": 0}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'match_count' must be at least 1"));
    }

    #[test]
    fn schema_comes_from_the_input_struct() {
        let tool = FilterHeatmap::new(Arc::new(RecordingRepository::default()));
        let schema = tool.input_schema();
        assert_eq!(schema["required"], json!(["event_type"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["event_type"]["enum"],
            json!(["kills", "deaths", "assists", "objectives"])
        );
        assert_eq!(schema["properties"]["match_count"]["minimum"].as_f64(), Some(1.0));
    }
}
