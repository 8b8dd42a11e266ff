use std::sync::Arc;

use async_trait::async_trait;
use rift_common::{Error, Lane, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::timeline_store::{MatchSummary, StoredEvent, TimelineStore};

/// Which of the player's interactions a heatmap shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum HeatmapEventKind {
    Kills,
    Deaths,
    Assists,
    Objectives,
}

impl HeatmapEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeatmapEventKind::Kills => "kills",
            HeatmapEventKind::Deaths => "deaths",
            HeatmapEventKind::Assists => "assists",
            HeatmapEventKind::Objectives => "objectives",
        }
    }

    /// Whether `event` counts for the participant in slot `participant_id`.
    pub fn matches(self, event: &StoredEvent, participant_id: i64) -> bool {
        let is_champion_kill = event.event_type == "CHAMPION_KILL";
        match self {
            HeatmapEventKind::Kills => is_champion_kill && event.killer_id == Some(participant_id),
            HeatmapEventKind::Deaths => is_champion_kill && event.victim_id == Some(participant_id),
            HeatmapEventKind::Assists => {
                is_champion_kill && event.assisting_ids.contains(&participant_id)
            }
            HeatmapEventKind::Objectives => match event.event_type.as_str() {
                "ELITE_MONSTER_KILL" => event.killer_id == Some(participant_id),
                "BUILDING_KILL" => {
                    event.killer_id == Some(participant_id)
                        || event.assisting_ids.contains(&participant_id)
                }
                _ => false,
            },
        }
    }
}

/// Typed query for a player's positioned events across imported matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    #[serde(skip)]
    pub puuid: String,
    pub event_type: HeatmapEventKind,
    pub champion_name: Option<String>,
    pub role: Option<Lane>,
    /// Keep only the N most recent matches before other filters apply.
    pub match_count: Option<usize>,
    pub game_time_start: Option<f64>,
    pub game_time_end: Option<f64>,
}

impl EventQuery {
    pub fn new(puuid: impl Into<String>, event_type: HeatmapEventKind) -> Self {
        Self {
            puuid: puuid.into(),
            event_type,
            champion_name: None,
            role: None,
            match_count: None,
            game_time_start: None,
            game_time_end: None,
        }
    }

    fn accepts_match(&self, summary: &MatchSummary) -> bool {
        if let Some(champion) = &self.champion_name {
            if !summary.champion_name.eq_ignore_ascii_case(champion) {
                return false;
            }
        }
        if let Some(role) = self.role {
            if Lane::parse(&summary.role) != Some(role) {
                return false;
            }
        }
        true
    }

    fn accepts_time(&self, minutes: f64) -> bool {
        self.game_time_start.is_none_or(|start| minutes >= start)
            && self.game_time_end.is_none_or(|end| minutes <= end)
    }
}

/// A positioned event attributed to the queried player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvent {
    pub x: i64,
    pub y: i64,
    pub timestamp: i64,
    pub match_id: String,
    pub champion_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub killer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victim_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monster_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvents {
    pub events: Vec<PlayerEvent>,
    /// Matches that passed the champion and role filters.
    pub matches_analyzed: usize,
}

/// Read access to stored match data, as consumed by tool handlers.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// The player's matches, most recent first, capped at `limit` when given.
    async fn recent_matches(&self, puuid: &str, limit: Option<usize>) -> Result<Vec<MatchSummary>>;

    async fn player_events(&self, query: &EventQuery) -> Result<PlayerEvents>;
}

/// [`MatchRepository`] over a shared [`TimelineStore`], paging internally.
#[derive(Clone)]
pub struct SqliteMatchRepository {
    store: Arc<Mutex<TimelineStore>>,
    page_size: usize,
}

impl SqliteMatchRepository {
    pub fn new(store: Arc<Mutex<TimelineStore>>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::Config("page size must be at least 1".into()));
        }
        Ok(Self { store, page_size })
    }

    async fn events_for_match(&self, puuid: &str, match_id: &str) -> Result<Vec<StoredEvent>> {
        let mut events = Vec::new();
        let mut offset = 0;
        loop {
            let page = {
                let store = self.store.lock().await;
                store.events_page(puuid, match_id, self.page_size, offset)?
            };
            let fetched = page.len();
            events.extend(page);
            if fetched < self.page_size {
                break;
            }
            offset += fetched;
        }
        Ok(events)
    }
}

#[async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn recent_matches(&self, puuid: &str, limit: Option<usize>) -> Result<Vec<MatchSummary>> {
        let mut matches = Vec::new();
        let mut offset = 0;
        loop {
            let want = match limit {
                Some(limit) if matches.len() >= limit => break,
                Some(limit) => self.page_size.min(limit - matches.len()),
                None => self.page_size,
            };
            let page = {
                let store = self.store.lock().await;
                store.matches_page(puuid, want, offset)?
            };
            let fetched = page.len();
            matches.extend(page);
            if fetched < want {
                break;
            }
            offset += fetched;
        }
        debug!(puuid, count = matches.len(), "loaded recent matches");
        Ok(matches)
    }

    #[instrument(skip(self, query), fields(event_type = query.event_type.as_str()))]
    async fn player_events(&self, query: &EventQuery) -> Result<PlayerEvents> {
        let matches = self.recent_matches(&query.puuid, query.match_count).await?;

        let mut events = Vec::new();
        let mut matches_analyzed = 0;
        for summary in matches.iter().filter(|m| query.accepts_match(m)) {
            matches_analyzed += 1;
            for event in self.events_for_match(&query.puuid, &summary.match_id).await? {
                if !query.accepts_time(event.minutes()) {
                    continue;
                }
                if !query.event_type.matches(&event, summary.participant_id) {
                    continue;
                }
                events.push(to_player_event(query.event_type, summary, event));
            }
        }

        debug!(
            total = events.len(),
            matches_analyzed, "filtered player events"
        );
        Ok(PlayerEvents {
            events,
            matches_analyzed,
        })
    }
}

fn to_player_event(kind: HeatmapEventKind, summary: &MatchSummary, event: StoredEvent) -> PlayerEvent {
    let mut out = PlayerEvent {
        x: event.x,
        y: event.y,
        timestamp: event.timestamp_ms,
        match_id: summary.match_id.clone(),
        champion_name: summary.champion_name.clone(),
        role: summary.role.clone(),
        killer_id: None,
        victim_id: None,
        monster_type: None,
        building_type: None,
    };
    match kind {
        HeatmapEventKind::Deaths => out.killer_id = event.killer_id,
        HeatmapEventKind::Kills | HeatmapEventKind::Assists => out.victim_id = event.victim_id,
        HeatmapEventKind::Objectives => {
            out.monster_type = event.monster_type;
            out.building_type = event.building_type;
        }
    }
    out
}
