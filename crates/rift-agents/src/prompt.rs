use crate::context::{EventKind, SessionContext};

const TOOL_GUIDANCE: &str = "\
You can change what the user sees by calling tools:
- navigate_to_timestamp / navigate_to_event move the timeline. The user is asked to allow the jump, so describe where you are taking them.
- show_players and show_event_timeline display lists; open_event_card, open_player_card and open_frame_events_card open detail cards.
- toggle_map_filter shows or hides champions on the minimap.
- filter_heatmap (when available) plots the player's events across their recent matches.
For \"the second dragon\" pass index 2; for \"the next baron\" pass after_frame_index with the current frame. \
Without any hint the latest event is used. Call several tools in one turn when the user asks for several things. \
If a tool returns an error, explain it or try a different tool instead of repeating the same call.";

/// System prompt for one turn, built from the session the client is looking at.
pub fn build_system_prompt(agent_name: &str, session: &SessionContext) -> String {
    let mut parts = vec![format!(
        "You are {agent_name}, a League of Legends match analyst. Answer questions about the \
         match the user is reviewing, concisely and grounded in the data below."
    )];

    let mut snapshot = Vec::new();
    if let Some(match_id) = &session.match_id {
        snapshot.push(format!("Match: {match_id}"));
    }
    if let Some(duration) = session.duration_minutes {
        snapshot.push(format!("Duration: {duration:.1} minutes"));
    }
    if let Some(frame) = session.current_frame {
        snapshot.push(format!("Current frame: {frame}"));
    }
    if let Some(time) = &session.current_time {
        match time.as_str() {
            Some(label) => snapshot.push(format!("Current time: {label}")),
            None => snapshot.push(format!("Current time: {time} minutes")),
        }
    }
    if let Some(main) = &session.main_player {
        let team = main.team.map(|t| t.label()).unwrap_or("an unknown team");
        snapshot.push(format!(
            "Main player: {} playing {} on {}",
            main.name, main.champion, team
        ));
    }
    if !session.players.is_empty() {
        snapshot.push(format!("Players in the match: {}", session.players.len()));
    }
    let counts: Vec<String> = EventKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "{} {}",
                session.events.of_kind(*kind).len(),
                kind.collection()
            )
        })
        .collect();
    snapshot.push(format!("Events: {}", counts.join(", ")));
    parts.push(format!("Match snapshot:\n{}", snapshot.join("\n")));

    if let Some(summary) = &session.summary {
        let rendered =
            serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string());
        parts.push(format!("Match summary:\n{rendered}"));
    }

    parts.push(TOOL_GUIDANCE.to_string());
    parts.join("\n\n")
}
