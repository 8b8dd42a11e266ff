use async_trait::async_trait;
use rift_common::{Error, Result, Team};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::schema::{parse_input, schema_for};
use super::{Tool, ToolCategory, ToolContext, ToolOutput};
use crate::action::ActionKind;
use crate::context::{EventKind, Player, SessionContext};
use crate::summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum TeamFilter {
    MyTeam,
    EnemyTeam,
    BlueTeam,
    RedTeam,
    All,
}

impl TeamFilter {
    fn as_str(self) -> &'static str {
        match self {
            TeamFilter::MyTeam => "my_team",
            TeamFilter::EnemyTeam => "enemy_team",
            TeamFilter::BlueTeam => "blue_team",
            TeamFilter::RedTeam => "red_team",
            TeamFilter::All => "all",
        }
    }

    /// Side selected by this filter; `None` means every side.
    fn side(self, session: &SessionContext) -> Result<Option<Team>> {
        let main_team = || {
            session
                .main_team()
                .ok_or_else(|| Error::Tool("the main player's team is unknown".to_string()))
        };
        Ok(match self {
            TeamFilter::MyTeam => Some(main_team()?),
            TeamFilter::EnemyTeam => Some(main_team()?.opponent()),
            TeamFilter::BlueTeam => Some(Team::Blue),
            TeamFilter::RedTeam => Some(Team::Red),
            TeamFilter::All => None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum SortKey {
    #[default]
    Kda,
    Kills,
    Damage,
    Gold,
}

impl SortKey {
    fn as_str(self) -> &'static str {
        match self {
            SortKey::Kda => "kda",
            SortKey::Kills => "kills",
            SortKey::Damage => "damage",
            SortKey::Gold => "gold",
        }
    }

    fn value(self, player: &Player) -> f64 {
        match self {
            SortKey::Kda => player.stats.kda,
            SortKey::Kills => f64::from(player.stats.kills),
            SortKey::Damage => player.stats.damage_dealt,
            SortKey::Gold => player.stats.gold_earned,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct ShowPlayersInput {
    /// Which players to show. my_team is the main player's side.
    filter: TeamFilter,
    /// Stat to sort by. Defaults to kda.
    #[serde(default)]
    sort_by: SortKey,
}

pub struct ShowPlayers;

#[async_trait]
impl Tool for ShowPlayers {
    fn name(&self) -> &'static str {
        "show_players"
    }

    fn description(&self) -> &'static str {
        "Show a list of players in the match, filtered by side and sorted by a stat \
         (highest first)."
    }

    fn input_schema(&self) -> Value {
        schema_for::<ShowPlayersInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Display
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let ShowPlayersInput { filter, sort_by } = parse_input(input)?;
        let side = filter.side(context.session)?;

        let mut players: Vec<&Player> = context
            .session
            .players
            .iter()
            .filter(|p| side.is_none() || p.team == side)
            .collect();
        // Stable, so ties keep roster order.
        players.sort_by(|a, b| sort_by.value(b).total_cmp(&sort_by.value(a)));

        let description = format!(
            "Showing {} players sorted by {}",
            filter.as_str().replace('_', " "),
            sort_by.as_str()
        );

        let mut lines = vec![format!("{description}:")];
        for (idx, p) in players.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({}) {}/{}/{} KDA {:.2}, {:.0} damage, {:.0} gold",
                idx + 1,
                p.name,
                p.champion,
                p.stats.kills,
                p.stats.deaths,
                p.stats.assists,
                p.stats.kda,
                p.stats.damage_dealt,
                p.stats.gold_earned
            ));
        }

        let action = self
            .category()
            .action(
                ActionKind::DisplayPlayers,
                json!({
                    "players": players,
                    "filter": filter.as_str(),
                    "sortBy": sort_by.as_str(),
                }),
            )
            .with_description(description);

        Ok(ToolOutput::success(lines.join("\n")).with_action(action))
    }
}

/// Side filter for event lists; events are credited to a side, not to a colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum CreditedSide {
    MyTeam,
    EnemyTeam,
    #[default]
    All,
}

impl From<CreditedSide> for TeamFilter {
    fn from(side: CreditedSide) -> Self {
        match side {
            CreditedSide::MyTeam => TeamFilter::MyTeam,
            CreditedSide::EnemyTeam => TeamFilter::EnemyTeam,
            CreditedSide::All => TeamFilter::All,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct ShowTimelineInput {
    /// Kind of event to list.
    event_type: EventKind,
    /// Side credited with the event. Defaults to all.
    #[serde(default)]
    filter: CreditedSide,
}

pub struct ShowEventTimeline;

#[async_trait]
impl Tool for ShowEventTimeline {
    fn name(&self) -> &'static str {
        "show_event_timeline"
    }

    fn description(&self) -> &'static str {
        "Show every event of one kind (dragons, barons, heralds, towers or kills) in match \
         order, optionally only those credited to one side."
    }

    fn input_schema(&self) -> Value {
        schema_for::<ShowTimelineInput>()
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Display
    }

    async fn execute(&self, context: &ToolContext<'_>, input: Value) -> Result<ToolOutput> {
        let ShowTimelineInput { event_type, filter } = parse_input(input)?;
        let filter = TeamFilter::from(filter);
        let side = filter.side(context.session)?;

        let events: Vec<_> = context
            .session
            .events
            .of_kind(event_type)
            .iter()
            .filter(|e| side.is_none() || e.side() == side)
            .cloned()
            .collect();

        let description = format!(
            "Showing {} timeline ({} events)",
            event_type.collection(),
            events.len()
        );
        let text = summary::event_timeline(event_type, &events, context.session, None);

        let action = self
            .category()
            .action(
                ActionKind::DisplayEventTimeline,
                json!({
                    "eventType": event_type.collection(),
                    "events": events,
                    "filter": filter.as_str(),
                }),
            )
            .with_description(description);

        Ok(ToolOutput::success(text).with_action(action))
    }
}
