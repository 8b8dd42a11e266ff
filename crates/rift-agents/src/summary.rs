//! Plain-text renderings of match data for tool results.

use rift_common::Team;

use crate::context::{EventKind, EventRecord, SessionContext};

const HIGHLIGHT_MARKER: &str = "👉 ";

/// Minutes with one decimal, or "an unknown time".
pub fn time_label(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) => format!("{m:.1} minutes"),
        None => "an unknown time".to_string(),
    }
}

fn team_label(team: Option<Team>) -> &'static str {
    team.map(Team::label).unwrap_or("A team")
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lane_label(raw: Option<&str>) -> &'static str {
    match raw {
        Some("TOP_LANE") => "top lane",
        Some("MID_LANE") => "mid lane",
        Some("BOT_LANE") | Some("BOTTOM_LANE") => "bot lane",
        _ => "a lane",
    }
}

fn participant_name(session: &SessionContext, event: &EventRecord, name_key: &str, id_key: &str) -> String {
    if let Some(name) = event.detail_str(name_key) {
        return name.to_string();
    }
    match event.detail_i64(id_key) {
        Some(id) => session
            .player_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player {id}")),
        None => "someone".to_string(),
    }
}

/// One sentence describing `event`.
pub fn describe_event(kind: EventKind, event: &EventRecord, session: &SessionContext) -> String {
    let team = team_label(event.side());
    let time = time_label(event.timestamp);
    match kind {
        EventKind::Dragon => {
            let dragon = event
                .detail_str("dragonType")
                .map(title_case)
                .unwrap_or_else(|| "Dragon".to_string());
            format!("{team} secured a {dragon} at {time}.")
        }
        EventKind::Baron => format!("{team} claimed Baron at {time}."),
        EventKind::Herald => format!("{team} took the Rift Herald at {time}."),
        EventKind::Tower => {
            let lane = lane_label(event.detail_str("laneType"));
            format!("{team} took a tower in {lane} at {time}.")
        }
        EventKind::Kill => {
            let killer = participant_name(session, event, "killerName", "killer");
            let victim = participant_name(session, event, "victimName", "victim");
            format!("{team}'s {killer} eliminated {victim} at {time}.")
        }
    }
}

/// Numbered timeline of `events`, marking the one at `highlight`.
pub fn event_timeline(
    kind: EventKind,
    events: &[EventRecord],
    session: &SessionContext,
    highlight: Option<usize>,
) -> String {
    if events.is_empty() {
        return format!("No {} events in this match.", kind.as_str());
    }
    let mut lines = vec![format!("{} timeline:", title_case(kind.as_str()))];
    for (idx, event) in events.iter().enumerate() {
        let marker = if highlight == Some(idx) { HIGHLIGHT_MARKER } else { "" };
        lines.push(format!(
            "{}. {}{}",
            idx + 1,
            marker,
            describe_event(kind, event, session)
        ));
    }
    lines.join("\n")
}
