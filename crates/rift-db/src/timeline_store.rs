use rift_common::{Error, Result, Team};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// One imported match, seen from the perspective of the importing player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    /// 1-based participant index of the player inside the match.
    pub participant_id: i64,
    pub champion_name: String,
    /// Raw `teamPosition`; empty for modes without positions.
    pub role: String,
    pub team: Option<Team>,
    pub win: Option<bool>,
    /// Epoch milliseconds.
    pub game_creation: i64,
}

/// A positioned timeline event as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub event_type: String,
    pub timestamp_ms: i64,
    pub x: i64,
    pub y: i64,
    pub killer_id: Option<i64>,
    pub victim_id: Option<i64>,
    pub assisting_ids: Vec<i64>,
    pub monster_type: Option<String>,
    pub building_type: Option<String>,
}

impl StoredEvent {
    pub fn minutes(&self) -> f64 {
        self.timestamp_ms as f64 / 60_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub match_id: String,
    pub events_imported: usize,
    pub replaced: bool,
}

/// SQLite storage for match metadata and positioned timeline events.
pub struct TimelineStore {
    conn: Connection,
}

impl TimelineStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening timeline store at {}", db_path.display());
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS matches (
                    puuid TEXT NOT NULL,
                    match_id TEXT NOT NULL,
                    participant_id INTEGER NOT NULL,
                    champion_name TEXT NOT NULL,
                    team_position TEXT NOT NULL DEFAULT '',
                    team_id INTEGER,
                    win INTEGER,
                    game_creation INTEGER NOT NULL DEFAULT 0,
                    imported_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (puuid, match_id)
                );

                CREATE INDEX IF NOT EXISTS idx_matches_recent
                    ON matches(puuid, game_creation DESC);

                CREATE TABLE IF NOT EXISTS timeline_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    puuid TEXT NOT NULL,
                    match_id TEXT NOT NULL,
                    seq INTEGER NOT NULL,
                    event_type TEXT NOT NULL,
                    timestamp_ms INTEGER NOT NULL,
                    x INTEGER NOT NULL,
                    y INTEGER NOT NULL,
                    killer_id INTEGER,
                    victim_id INTEGER,
                    assisting_ids TEXT NOT NULL DEFAULT '[]',
                    monster_type TEXT,
                    building_type TEXT,
                    FOREIGN KEY (puuid, match_id)
                        REFERENCES matches(puuid, match_id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_events_match
                    ON timeline_events(puuid, match_id, seq);",
            )
            .map_err(|e| Error::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Import a Riot match-v5 document and its timeline-v5 document for `puuid`.
    ///
    /// Only events carrying a map position are stored. Re-importing a match
    /// replaces the previous rows.
    pub fn import_match(
        &self,
        puuid: &str,
        match_doc: &Value,
        timeline_doc: &Value,
    ) -> Result<ImportSummary> {
        let summary = parse_match_summary(puuid, match_doc)?;
        let events = parse_positioned_events(timeline_doc)?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| Error::Database(format!("failed to begin import: {e}")))?;

        let replaced = tx
            .execute(
                "DELETE FROM matches WHERE puuid = ?1 AND match_id = ?2",
                params![puuid, summary.match_id],
            )
            .map_err(|e| Error::Database(format!("failed to clear previous import: {e}")))?
            > 0;

        tx.execute(
            "INSERT INTO matches
                (puuid, match_id, participant_id, champion_name, team_position, team_id, win, game_creation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                puuid,
                summary.match_id,
                summary.participant_id,
                summary.champion_name,
                summary.role,
                summary.team.map(|team| match team {
                    Team::Blue => 100,
                    Team::Red => 200,
                }),
                summary.win,
                summary.game_creation,
            ],
        )
        .map_err(|e| Error::Database(format!("failed to insert match: {e}")))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO timeline_events
                        (puuid, match_id, seq, event_type, timestamp_ms, x, y,
                         killer_id, victim_id, assisting_ids, monster_type, building_type)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .map_err(|e| Error::Database(format!("failed to prepare event insert: {e}")))?;

            for (seq, event) in events.iter().enumerate() {
                let assisting = serde_json::to_string(&event.assisting_ids)?;
                stmt.execute(params![
                    puuid,
                    summary.match_id,
                    seq as i64,
                    event.event_type,
                    event.timestamp_ms,
                    event.x,
                    event.y,
                    event.killer_id,
                    event.victim_id,
                    assisting,
                    event.monster_type,
                    event.building_type,
                ])
                .map_err(|e| Error::Database(format!("failed to insert event: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit import: {e}")))?;

        info!(
            match_id = %summary.match_id,
            events = events.len(),
            replaced,
            "imported match timeline"
        );

        Ok(ImportSummary {
            match_id: summary.match_id,
            events_imported: events.len(),
            replaced,
        })
    }

    /// One page of a player's matches, most recent first.
    pub fn matches_page(&self, puuid: &str, limit: usize, offset: usize) -> Result<Vec<MatchSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT match_id, participant_id, champion_name, team_position, team_id, win, game_creation
                 FROM matches
                 WHERE puuid = ?1
                 ORDER BY game_creation DESC, match_id DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| Error::Database(format!("failed to prepare match query: {e}")))?;

        let rows = stmt
            .query_map(params![puuid, limit as i64, offset as i64], |row| {
                let team_id: Option<i64> = row.get(4)?;
                Ok(MatchSummary {
                    match_id: row.get(0)?,
                    participant_id: row.get(1)?,
                    champion_name: row.get(2)?,
                    role: row.get(3)?,
                    team: team_id.and_then(Team::from_riot_team_id),
                    win: row.get(5)?,
                    game_creation: row.get(6)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to load matches: {e}")))?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(row.map_err(|e| Error::Database(format!("failed to read match row: {e}")))?);
        }
        Ok(matches)
    }

    /// One page of a match's stored events in timeline order.
    pub fn events_page(
        &self,
        puuid: &str,
        match_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT event_type, timestamp_ms, x, y, killer_id, victim_id,
                        assisting_ids, monster_type, building_type
                 FROM timeline_events
                 WHERE puuid = ?1 AND match_id = ?2
                 ORDER BY seq ASC
                 LIMIT ?3 OFFSET ?4",
            )
            .map_err(|e| Error::Database(format!("failed to prepare event query: {e}")))?;

        let rows = stmt
            .query_map(params![puuid, match_id, limit as i64, offset as i64], |row| {
                let assisting_raw: String = row.get(6)?;
                Ok(StoredEvent {
                    event_type: row.get(0)?,
                    timestamp_ms: row.get(1)?,
                    x: row.get(2)?,
                    y: row.get(3)?,
                    killer_id: row.get(4)?,
                    victim_id: row.get(5)?,
                    assisting_ids: serde_json::from_str(&assisting_raw).unwrap_or_default(),
                    monster_type: row.get(7)?,
                    building_type: row.get(8)?,
                })
            })
            .map_err(|e| Error::Database(format!("failed to load events: {e}")))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| Error::Database(format!("failed to read event row: {e}")))?);
        }
        Ok(events)
    }

    pub fn match_count(&self, puuid: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM matches WHERE puuid = ?1",
                params![puuid],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("failed to count matches: {e}")))
    }

    pub fn find_match(&self, puuid: &str, match_id: &str) -> Result<Option<MatchSummary>> {
        self.conn
            .query_row(
                "SELECT match_id, participant_id, champion_name, team_position, team_id, win, game_creation
                 FROM matches WHERE puuid = ?1 AND match_id = ?2",
                params![puuid, match_id],
                |row| {
                    let team_id: Option<i64> = row.get(4)?;
                    Ok(MatchSummary {
                        match_id: row.get(0)?,
                        participant_id: row.get(1)?,
                        champion_name: row.get(2)?,
                        role: row.get(3)?,
                        team: team_id.and_then(Team::from_riot_team_id),
                        win: row.get(5)?,
                        game_creation: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to load match: {e}")))
    }
}

fn parse_match_summary(puuid: &str, match_doc: &Value) -> Result<MatchSummary> {
    let match_id = match_doc
        .pointer("/metadata/matchId")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation("match document is missing metadata.matchId".into()))?
        .to_string();

    let participant = match_doc
        .pointer("/info/participants")
        .and_then(Value::as_array)
        .and_then(|participants| {
            participants
                .iter()
                .position(|p| p.get("puuid").and_then(Value::as_str) == Some(puuid))
                .map(|idx| (idx, &participants[idx]))
        });

    let Some((idx, participant)) = participant else {
        return Err(Error::Validation(format!(
            "player {puuid} is not a participant of {match_id}"
        )));
    };

    // Timeline events reference participants by their 1-based slot.
    let participant_id = participant
        .get("participantId")
        .and_then(Value::as_i64)
        .unwrap_or(idx as i64 + 1);

    debug!(%match_id, participant_id, "parsed match participant");

    Ok(MatchSummary {
        match_id,
        participant_id,
        champion_name: participant
            .get("championName")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        role: participant
            .get("teamPosition")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        team: participant
            .get("teamId")
            .and_then(Value::as_i64)
            .and_then(Team::from_riot_team_id),
        win: participant.get("win").and_then(Value::as_bool),
        game_creation: match_doc
            .pointer("/info/gameCreation")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
    })
}

fn parse_positioned_events(timeline_doc: &Value) -> Result<Vec<StoredEvent>> {
    let frames = timeline_doc
        .pointer("/info/frames")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Validation("timeline document is missing info.frames".into()))?;

    let mut events = Vec::new();
    for frame in frames {
        let Some(frame_events) = frame.get("events").and_then(Value::as_array) else {
            continue;
        };
        for event in frame_events {
            let Some(position) = event.get("position") else {
                continue;
            };
            let (Some(x), Some(y)) = (
                position.get("x").and_then(Value::as_i64),
                position.get("y").and_then(Value::as_i64),
            ) else {
                continue;
            };
            let Some(event_type) = event.get("type").and_then(Value::as_str) else {
                continue;
            };

            events.push(StoredEvent {
                event_type: event_type.to_string(),
                timestamp_ms: event.get("timestamp").and_then(Value::as_i64).unwrap_or_default(),
                x,
                y,
                killer_id: event.get("killerId").and_then(Value::as_i64),
                victim_id: event.get("victimId").and_then(Value::as_i64),
                assisting_ids: event
                    .get("assistingParticipantIds")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                    .unwrap_or_default(),
                monster_type: event
                    .get("monsterType")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                building_type: event
                    .get("buildingType")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
    }
    Ok(events)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub const PUUID: &str = "player-puuid";

    pub fn match_doc(match_id: &str, champion: &str, position: &str, created: i64) -> Value {
        json!({
            "metadata": {
                "matchId": match_id,
                "participants": ["someone-else", PUUID]
            },
            "info": {
                "gameCreation": created,
                "participants": [
                    {"puuid": "someone-else", "participantId": 1, "championName": "Garen",
                     "teamPosition": "TOP", "teamId": 100, "win": true},
                    {"puuid": PUUID, "participantId": 2, "championName": champion,
                     "teamPosition": position, "teamId": 200, "win": false}
                ]
            }
        })
    }

    pub fn timeline_doc() -> Value {
        json!({
            "info": {
                "frames": [
                    {"timestamp": 0, "events": [
                        {"type": "ITEM_PURCHASED", "timestamp": 1000, "participantId": 2}
                    ]},
                    {"timestamp": 60000, "events": [
                        {"type": "CHAMPION_KILL", "timestamp": 300000, "position": {"x": 100, "y": 200},
                         "killerId": 2, "victimId": 1, "assistingParticipantIds": []},
                        {"type": "CHAMPION_KILL", "timestamp": 600000, "position": {"x": 300, "y": 400},
                         "killerId": 1, "victimId": 2, "assistingParticipantIds": [3]}
                    ]},
                    {"timestamp": 120000, "events": [
                        {"type": "CHAMPION_KILL", "timestamp": 900000, "position": {"x": 500, "y": 600},
                         "killerId": 3, "victimId": 6, "assistingParticipantIds": [2, 4]},
                        {"type": "ELITE_MONSTER_KILL", "timestamp": 1200000, "position": {"x": 9866, "y": 4414},
                         "killerId": 2, "monsterType": "DRAGON"},
                        {"type": "BUILDING_KILL", "timestamp": 1500000, "position": {"x": 5846, "y": 6396},
                         "killerId": 7, "assistingParticipantIds": [2], "buildingType": "TOWER_BUILDING"}
                    ]}
                ]
            }
        })
    }
}
