use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::providers::{ChatMessage, ChatRole, ContentBlock};

/// Tool result text synthesized for a `tool_use` the caller never answered.
pub const PLACEHOLDER_RESULT: &str = "Action was shown to user";

/// Ordered messages of one conversation, replayed verbatim by callers between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<ChatMessage>);

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ChatMessage>> for ConversationHistory {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self(messages)
    }
}

/// What [`repair_pairing`] had to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub placeholders_added: usize,
    pub orphans_removed: usize,
    pub duplicates_removed: usize,
    pub empty_messages_removed: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingViolation {
    /// A `tool_use` id with no result in the following user message.
    Unanswered { message_index: usize, tool_use_id: String },
    /// A result whose id is not requested by the preceding assistant message.
    Orphan { message_index: usize, tool_use_id: String },
    Duplicate { message_index: usize, tool_use_id: String },
}

/// Check that every `tool_use` is answered exactly once by the next user message.
pub fn verify_pairing(messages: &[ChatMessage]) -> Result<(), PairingViolation> {
    for (index, message) in messages.iter().enumerate() {
        let expected = match message.role {
            ChatRole::Assistant => message.tool_use_ids(),
            ChatRole::User => Vec::new(),
        };

        if message.role == ChatRole::User {
            let requested = index
                .checked_sub(1)
                .map(|prev| &messages[prev])
                .filter(|prev| prev.role == ChatRole::Assistant)
                .map(ChatMessage::tool_use_ids)
                .unwrap_or_default();
            let mut seen: Vec<&str> = Vec::new();
            for id in result_ids(message) {
                if !requested.iter().any(|r| r == id) {
                    return Err(PairingViolation::Orphan {
                        message_index: index,
                        tool_use_id: id.to_string(),
                    });
                }
                if seen.contains(&id) {
                    return Err(PairingViolation::Duplicate {
                        message_index: index,
                        tool_use_id: id.to_string(),
                    });
                }
                seen.push(id);
            }
        }

        if expected.is_empty() {
            continue;
        }
        let answered: Vec<&str> = messages
            .get(index + 1)
            .filter(|next| next.role == ChatRole::User)
            .map(result_ids)
            .unwrap_or_default();
        if let Some(missing) = expected.iter().find(|id| !answered.contains(&id.as_str())) {
            return Err(PairingViolation::Unanswered {
                message_index: index,
                tool_use_id: missing.clone(),
            });
        }
    }
    Ok(())
}

/// Rewrite `messages` so that it satisfies [`verify_pairing`].
///
/// Missing results get a placeholder, results nobody asked for and repeated
/// results are dropped, and user messages left empty are removed. Results are
/// moved ahead of any other blocks in their message.
pub fn repair_pairing(messages: &mut Vec<ChatMessage>) -> RepairReport {
    let mut report = RepairReport::default();
    let mut repaired = Vec::with_capacity(messages.len() + 1);
    let mut pending: Vec<String> = Vec::new();

    for message in messages.drain(..) {
        match message.role {
            ChatRole::Assistant => {
                if !pending.is_empty() {
                    report.placeholders_added += pending.len();
                    repaired.push(ChatMessage::tool_results(
                        pending.drain(..).map(placeholder).collect(),
                    ));
                }
                pending = message.tool_use_ids();
                repaired.push(message);
            }
            ChatRole::User => {
                let expected = std::mem::take(&mut pending);
                let mut matched: Vec<Option<ContentBlock>> = vec![None; expected.len()];
                let mut others = Vec::new();

                for block in message.content {
                    let ContentBlock::ToolResult { tool_use_id, .. } = &block else {
                        others.push(block);
                        continue;
                    };
                    match expected.iter().position(|id| id == tool_use_id) {
                        Some(slot) if matched[slot].is_none() => matched[slot] = Some(block),
                        Some(_) => report.duplicates_removed += 1,
                        None => report.orphans_removed += 1,
                    }
                }

                let mut content: Vec<ContentBlock> = matched
                    .into_iter()
                    .zip(expected)
                    .map(|(block, id)| {
                        block.unwrap_or_else(|| {
                            report.placeholders_added += 1;
                            placeholder(id)
                        })
                    })
                    .collect();
                content.extend(others);

                if content.is_empty() {
                    report.empty_messages_removed += 1;
                    continue;
                }
                repaired.push(ChatMessage {
                    role: ChatRole::User,
                    content,
                });
            }
        }
    }

    if !pending.is_empty() {
        report.placeholders_added += pending.len();
        repaired.push(ChatMessage::tool_results(
            pending.into_iter().map(placeholder).collect(),
        ));
    }

    *messages = repaired;

    if !report.is_clean() {
        warn!(
            placeholders = report.placeholders_added,
            orphans = report.orphans_removed,
            duplicates = report.duplicates_removed,
            empty = report.empty_messages_removed,
            "repaired tool pairing in caller history"
        );
    }
    report
}

/// Add the user's text as the next user turn.
///
/// When the history ends in a user message (placeholder results from a repair),
/// the text joins that message so the roles keep alternating.
pub fn append_user_text(messages: &mut Vec<ChatMessage>, text: &str) {
    match messages.last_mut() {
        Some(last) if last.role == ChatRole::User => last.content.push(ContentBlock::text(text)),
        _ => messages.push(ChatMessage::user_text(text)),
    }
}

fn placeholder(tool_use_id: String) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id,
        content: PLACEHOLDER_RESULT.to_string(),
        is_error: false,
    }
}

fn result_ids(message: &ChatMessage) -> Vec<&str> {
    message
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.to_string(),
            name: "show_players".to_string(),
            input: json!({"filter": "all"}),
        }
    }

    fn result(id: &str, content: &str) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: id.to_string(),
            content: content.to_string(),
            is_error: false,
        }
    }

    #[test]
    fn clean_history_is_untouched() {
        let mut messages = vec![
            ChatMessage::user_text("hi"),
            ChatMessage::assistant(vec![ContentBlock::text("looking"), tool_use("a")]),
            ChatMessage::tool_results(vec![result("a", "done")]),
            ChatMessage::assistant(vec![ContentBlock::text("done")]),
        ];
        let before = messages.clone();
        let report = repair_pairing(&mut messages);
        assert!(report.is_clean());
        assert_eq!(messages, before);
        assert!(verify_pairing(&messages).is_ok());
    }

    #[test]
    fn trailing_tool_use_gets_placeholders_and_text_joins_them() {
        let mut messages = vec![
            ChatMessage::user_text("show my team"),
            ChatMessage::assistant(vec![tool_use("a"), tool_use("b")]),
        ];
        assert!(matches!(
            verify_pairing(&messages),
            Err(PairingViolation::Unanswered { message_index: 1, .. })
        ));

        let report = repair_pairing(&mut messages);
        assert_eq!(report.placeholders_added, 2);
        append_user_text(&mut messages, "and now the enemy");

        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[2].content,
            vec![
                result("a", PLACEHOLDER_RESULT),
                result("b", PLACEHOLDER_RESULT),
                ContentBlock::text("and now the enemy"),
            ]
        );
        assert!(verify_pairing(&messages).is_ok());
    }

    #[test]
    fn partial_answers_are_completed_in_call_order() {
        let mut messages = vec![
            ChatMessage::user_text("q"),
            ChatMessage::assistant(vec![tool_use("a"), tool_use("b")]),
            ChatMessage::tool_results(vec![ContentBlock::text("note"), result("b", "B")]),
        ];
        let report = repair_pairing(&mut messages);
        assert_eq!(report.placeholders_added, 1);
        assert_eq!(
            messages[2].content,
            vec![
                result("a", PLACEHOLDER_RESULT),
                result("b", "B"),
                ContentBlock::text("note")
            ]
        );
    }

    #[test]
    fn orphans_and_duplicates_are_dropped() {
        let mut messages = vec![
            ChatMessage::user_text("q"),
            ChatMessage::assistant(vec![tool_use("a")]),
            ChatMessage::tool_results(vec![result("a", "1"), result("a", "2"), result("z", "?")]),
        ];
        assert!(matches!(
            verify_pairing(&messages),
            Err(PairingViolation::Duplicate { .. })
        ));

        let report = repair_pairing(&mut messages);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.orphans_removed, 1);
        assert_eq!(messages[2].content, vec![result("a", "1")]);
        assert!(verify_pairing(&messages).is_ok());
    }

    #[test]
    fn orphan_only_user_message_is_removed() {
        let mut messages = vec![
            ChatMessage::tool_results(vec![result("x", "stale")]),
            ChatMessage::assistant(vec![ContentBlock::text("hello")]),
        ];
        assert!(matches!(
            verify_pairing(&messages),
            Err(PairingViolation::Orphan { message_index: 0, .. })
        ));
        let report = repair_pairing(&mut messages);
        assert_eq!(report.empty_messages_removed, 1);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn back_to_back_assistant_messages_get_results_between_them() {
        let mut messages = vec![
            ChatMessage::user_text("q"),
            ChatMessage::assistant(vec![tool_use("a")]),
            ChatMessage::assistant(vec![ContentBlock::text("later")]),
        ];
        repair_pairing(&mut messages);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].content, vec![result("a", PLACEHOLDER_RESULT)]);
        assert!(verify_pairing(&messages).is_ok());
    }

    #[test]
    fn text_appends_as_new_message_after_assistant() {
        let mut messages = vec![ChatMessage::assistant(vec![ContentBlock::text("hi")])];
        append_user_text(&mut messages, "next");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], ChatMessage::user_text("next"));
    }

    #[test]
    fn history_serializes_as_plain_array() {
        let history = ConversationHistory::from(vec![ChatMessage::user_text("hi")]);
        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(
            value,
            json!([{"role": "user", "content": [{"type": "text", "text": "hi"}]}])
        );
    }
}
