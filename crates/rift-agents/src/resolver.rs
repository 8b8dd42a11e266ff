use crate::context::EventRecord;

/// How a tool call refers to one event of an ordered list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolutionHint {
    /// 1-based position in the list.
    pub explicit_index: Option<i64>,
    pub after_frame_index: Option<i64>,
    /// Game time in minutes.
    pub after_time_minutes: Option<f64>,
}

impl ResolutionHint {
    pub fn index(index: i64) -> Self {
        Self {
            explicit_index: Some(index),
            ..Self::default()
        }
    }

    pub fn after_frame(frame_index: i64) -> Self {
        Self {
            after_frame_index: Some(frame_index),
            ..Self::default()
        }
    }

    pub fn after_time(minutes: f64) -> Self {
        Self {
            after_time_minutes: Some(minutes),
            ..Self::default()
        }
    }
}

/// Pick the 0-based index of the event `hint` refers to, or `None` for an empty list.
///
/// Precedence, first match wins:
/// 1. an explicit index within `1..=len`;
/// 2. the first event strictly after `after_frame_index`, or, when no frame is
///    given, strictly after `after_time_minutes`;
/// 3. the last event.
pub fn resolve(events: &[EventRecord], hint: &ResolutionHint) -> Option<usize> {
    let last = events.len().checked_sub(1)?;

    if let Some(index) = hint.explicit_index {
        if index >= 1 && (index as u64) <= events.len() as u64 {
            return Some(index as usize - 1);
        }
    }

    let after = if let Some(frame) = hint.after_frame_index {
        events.iter().position(|event| event.frame_index > frame)
    } else if let Some(minutes) = hint.after_time_minutes {
        events
            .iter()
            .position(|event| event.timestamp.is_some_and(|ts| ts > minutes))
    } else {
        None
    };

    Some(after.unwrap_or(last))
}
