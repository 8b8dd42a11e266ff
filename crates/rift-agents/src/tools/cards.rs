use async_trait::async_trait;
use rift_common::{Error, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::schema::{parse_input, schema_for};
use super::{EventReference, Tool, ToolCategory, ToolContext, ToolOutput};
use crate::action::ActionKind;
use crate::context::{EventKind, Player};
use crate::resolver::resolve;
use crate::summary;

pub struct OpenEventCard;

#[async_trait]
impl Tool for OpenEventCard {
    fn name(&self) -> &'static str {
        "open_event_card"
    }

    fn description(&self) -> &'static str {
        "Open the detail card of one objective or kill without moving the timeline. \
         Picks the event the same way as navigate_to_event."
    }

    fn input_schema(&self) -> Value {
        schema_for::<EventReference>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Card
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

        let action = self
            .category()
            .action(
                ActionKind::OpenCard,
                json!({
                    "cardType": event_type.as_str(),
                    "index": index + 1,
                    "data": event,
                }),
            )
            .with_description(format!(
                "Opening {} #{} details",
                event_type.as_str(),
                index + 1
            ));

        Ok(
            ToolOutput::success(summary::describe_event(event_type, event, context.session))
                .with_action(action),
        )
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct PlayerCardInput {
    /// Participant id (1-10).
    #[serde(default)]
    player_id: Option<i64>,
    /// Summoner name or champion name.
    #[serde(default)]
    player_name: Option<String>,
}

pub struct OpenPlayerCard;

impl OpenPlayerCard {
    fn find<'a>(players: &'a [Player], input: &PlayerCardInput) -> Result<&'a Player> {
        if let Some(id) = input.player_id {
            return players
                .iter()
                .find(|p| p.id == Some(id))
                .ok_or_else(|| Error::Tool(format!("no player with id {id}")));
        }
        match input.player_name.as_deref() {
            Some(name) => players
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name) || p.champion.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::Tool(format!("no player named {name}"))),
            None => Err(Error::Tool(
                "player_id or player_name is required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Tool for OpenPlayerCard {
    fn name(&self) -> &'static str {
        "open_player_card"
    }

    fn description(&self) -> &'static str {
        "Open the profile card of a player in this match, by participant id or by \
         summoner or champion name."
    }

    fn input_schema(&self) -> Value {
        schema_for::<PlayerCardInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Card
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let input: PlayerCardInput = parse_input(input)?;
        let player = Self::find(&context.session.players, &input)?;
        let stats = &player.stats;

        let action = self
            .category()
            .action(
                ActionKind::OpenCard,
                json!({ "cardType": "player", "data": player }),
            )
            .with_description(format!("Opening profile for {}", player.name));

        Ok(ToolOutput::success(format!(
            "{} ({}) went {}/{}/{} with {:.0} damage and {:.0} gold.",
            player.name,
            player.champion,
            stats.kills,
            stats.deaths,
            stats.assists,
            stats.damage_dealt,
            stats.gold_earned
        ))
        .with_action(action))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct FrameCardInput {
    /// Timeline frame (one per minute). Defaults to the current frame.
    #[serde(default)]
    frame_index: Option<u32>,
}

pub struct OpenFrameEventsCard;

#[async_trait]
impl Tool for OpenFrameEventsCard {
    fn name(&self) -> &'static str {
        "open_frame_events_card"
    }

    fn description(&self) -> &'static str {
        "Open a card listing everything that happened in one timeline frame. \
         Defaults to the frame the user is looking at."
    }

    fn input_schema(&self) -> Value {
        schema_for::<FrameCardInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Card
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let FrameCardInput { frame_index } = parse_input(input)?;
        let session = context.session;
        let frame = frame_index
            .map(i64::from)
            .or(session.current_frame)
            .unwrap_or(0);

        let mut grouped = Map::new();
        let mut lines = Vec::new();
        let mut total = 0;
        for kind in EventKind::ALL {
            let in_frame: Vec<_> = session
                .events
                .of_kind(kind)
                .iter()
                .filter(|e| e.frame_index == frame)
                .collect();
            total += in_frame.len();
            lines.extend(
                in_frame
                    .iter()
                    .map(|e| format!("- {}", summary::describe_event(kind, e, session))),
            );
            grouped.insert(kind.collection().to_string(), json!(in_frame));
        }

        let description = format!("Showing {total} events at frame {frame}");
        let content = if lines.is_empty() {
            format!("Nothing notable happened at frame {frame}.")
        } else {
            format!("{description}:\n{}", lines.join("\n"))
        };

        let action = self
            .category()
            .action(
                ActionKind::OpenCard,
                json!({
                    "cardType": "frame_events",
                    "frameIndex": frame,
                    "data": grouped,
                }),
            )
            .with_description(description);

        Ok(ToolOutput::success(content).with_action(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, UiAction};
    use crate::tools::test_support::session;

    fn single(out: ToolOutput) -> UiAction {
        match out.action {
            Some(Action::Single(action)) => action,
            other => panic!("expected single action, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn event_card_resolves_by_index() {
        let session = session();
        let out = OpenEventCard
            .execute(
                &ToolContext::new(&session),
                json!({"event_type": "dragon", "index": 1}),
            )
            .await
            .unwrap();
        assert_eq!(out.content, "Blue team secured a Fire Dragon at 4.0 minutes.");
        let action = single(out);
        assert_eq!(action.kind, ActionKind::OpenCard);
        assert!(!action.requires_permission);
        assert_eq!(action.params["cardType"], json!("dragon"));
        assert_eq!(action.params["data"]["frameIndex"], json!(5));
        assert_eq!(action.params["index"], json!(1));
        assert_eq!(action.description, "Opening dragon #1 details");
    }

    #[tokio::test]
    async fn player_card_by_name_ignores_case() {
        let session = session();
        let out = OpenPlayerCard
            .execute(&ToolContext::new(&session), json!({"player_name": "red mid"}))
            .await
            .unwrap();
        let action = single(out);
        assert_eq!(action.params["data"]["id"], json!(8));
        assert_eq!(action.description, "Opening profile for Red Mid");
    }

    #[tokio::test]
    async fn player_card_by_id() {
        let session = session();
        let out = OpenPlayerCard
            .execute(&ToolContext::new(&session), json!({"player_id": 2}))
            .await
            .unwrap();
        assert!(out.content.starts_with("Blue Jungle (Champ2)"));
    }

    #[tokio::test]
    async fn player_card_needs_a_reference() {
        let session = session();
        let err = OpenPlayerCard
            .execute(&ToolContext::new(&session), json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("player_id or player_name"));

        let err = OpenPlayerCard
            .execute(&ToolContext::new(&session), json!({"player_name": "Nobody"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no player named Nobody"));
    }

    #[tokio::test]
    async fn frame_card_groups_events_of_the_frame() {
        let session = session();
        let out = OpenFrameEventsCard
            .execute(&ToolContext::new(&session), json!({"frame_index": 12}))
            .await
            .unwrap();
        let action = single(out);
        assert_eq!(action.description, "Showing 2 events at frame 12");
        assert_eq!(action.params["data"]["dragons"].as_array().unwrap().len(), 1);
        assert_eq!(action.params["data"]["towers"].as_array().unwrap().len(), 1);
        assert_eq!(action.params["data"]["kills"], json!([]));
    }

    #[tokio::test]
    async fn frame_card_defaults_to_current_frame() {
        let session = session();
        let out = OpenFrameEventsCard
            .execute(&ToolContext::new(&session), json!({}))
            .await
            .unwrap();
        assert_eq!(out.content, "Nothing notable happened at frame 10.");
        assert_eq!(single(out).params["frameIndex"], json!(10));
    }

    #[tokio::test]
    async fn frame_card_rejects_negative_frames() {
        let session = session();
        let err = OpenFrameEventsCard
            .execute(&ToolContext::new(&session), json!({"frame_index": -1}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid input"));
    }
}
