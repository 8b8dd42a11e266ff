//! Caller-supplied match state, read-only for the duration of a turn.

use rift_common::Team;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionContext {
    pub match_id: Option<String>,
    pub current_frame: Option<i64>,
    /// Whatever the client shows as the current time (minutes or a clock label).
    pub current_time: Option<Value>,
    pub duration_minutes: Option<f64>,
    pub puuid: Option<String>,
    pub main_player: Option<MainPlayer>,
    pub players: Vec<Player>,
    pub events: MatchEvents,
    /// Pre-computed summaries shown to the model verbatim.
    pub summary: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionContext {
    pub fn main_team(&self) -> Option<Team> {
        self.main_player.as_ref().and_then(|p| p.team)
    }

    pub fn player_name(&self, id: i64) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.id == Some(id))
            .map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainPlayer {
    pub id: Option<i64>,
    pub name: String,
    pub champion: String,
    #[serde(deserialize_with = "lenient_team")]
    pub team: Option<Team>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub id: Option<i64>,
    pub name: String,
    pub champion: String,
    #[serde(deserialize_with = "lenient_team")]
    pub team: Option<Team>,
    pub role: Option<String>,
    pub stats: PlayerStats,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub kda: f64,
    pub damage_dealt: f64,
    pub gold_earned: f64,
    pub vision_score: f64,
    pub cs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchEvents {
    pub kills: Vec<EventRecord>,
    pub dragons: Vec<EventRecord>,
    pub barons: Vec<EventRecord>,
    pub heralds: Vec<EventRecord>,
    pub towers: Vec<EventRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchEvents {
    pub fn of_kind(&self, kind: EventKind) -> &[EventRecord] {
        match kind {
            EventKind::Dragon => &self.dragons,
            EventKind::Baron => &self.barons,
            EventKind::Herald => &self.heralds,
            EventKind::Tower => &self.towers,
            EventKind::Kill => &self.kills,
        }
    }
}

/// One timeline event. Type-specific fields (`dragonType`, `killer`, `laneType`, ...)
/// are kept in `details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub frame_index: i64,
    /// Game time in minutes.
    #[serde(default, alias = "timestampMinutes")]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_team", skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl EventRecord {
    pub fn new(frame_index: i64, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    /// The side credited with the event, falling back to `killerTeam`.
    pub fn side(&self) -> Option<Team> {
        self.team.or_else(|| {
            self.details
                .get("killerTeam")
                .and_then(Value::as_str)
                .and_then(parse_team)
        })
    }

    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    pub fn detail_i64(&self, key: &str) -> Option<i64> {
        self.details.get(key).and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[serde(alias = "dragons")]
    Dragon,
    #[serde(alias = "barons")]
    Baron,
    #[serde(alias = "heralds")]
    Herald,
    #[serde(alias = "towers")]
    Tower,
    #[serde(alias = "kills")]
    Kill,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Dragon,
        EventKind::Baron,
        EventKind::Herald,
        EventKind::Tower,
        EventKind::Kill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Dragon => "dragon",
            EventKind::Baron => "baron",
            EventKind::Herald => "herald",
            EventKind::Tower => "tower",
            EventKind::Kill => "kill",
        }
    }

    /// Key of the event list in [`MatchEvents`].
    pub fn collection(self) -> &'static str {
        match self {
            EventKind::Dragon => "dragons",
            EventKind::Baron => "barons",
            EventKind::Herald => "heralds",
            EventKind::Tower => "towers",
            EventKind::Kill => "kills",
        }
    }

    /// Map layer the UI enables alongside navigation to this kind of event.
    pub fn toggle_group(self) -> &'static str {
        match self {
            EventKind::Kill => "kills",
            _ => "objectives",
        }
    }
}

fn parse_team(value: &str) -> Option<Team> {
    match value.to_ascii_lowercase().as_str() {
        "blue" | "100" => Some(Team::Blue),
        "red" | "200" => Some(Team::Red),
        _ => None,
    }
}

/// Unknown or missing sides become `None` instead of failing the whole context.
fn lenient_team<'de, D>(deserializer: D) -> Result<Option<Team>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_team(&s),
        Some(Value::Number(n)) => n.as_i64().and_then(Team::from_riot_team_id),
        _ => None,
    })
}
