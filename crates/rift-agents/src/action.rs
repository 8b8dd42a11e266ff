use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    NavigateTimeline,
    ToggleEvent,
    DisplayPlayers,
    DisplayEventTimeline,
    ToggleMapFilter,
    OpenCard,
    DisplayHeatmap,
}

/// One UI side effect the client applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub requires_permission: bool,
    #[serde(default)]
    pub description: String,
}

impl UiAction {
    pub fn new(kind: ActionKind, params: Value, requires_permission: bool) -> Self {
        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            kind,
            params,
            requires_permission,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiActionTag {
    #[serde(rename = "multi_action")]
    MultiAction,
}

/// Several actions the client applies together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAction {
    #[serde(rename = "type")]
    pub tag: MultiActionTag,
    pub actions: Vec<UiAction>,
    pub requires_permission: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Multi(MultiAction),
    Single(UiAction),
}

impl Action {
    pub fn requires_permission(&self) -> bool {
        match self {
            Action::Single(action) => action.requires_permission,
            Action::Multi(multi) => multi.requires_permission,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Action::Single(action) => &action.description,
            Action::Multi(multi) => &multi.description,
        }
    }

    /// Primary kind; a multi-action reports its first member's.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Action::Single(action) => Some(action.kind),
            Action::Multi(multi) => multi.actions.first().map(|a| a.kind),
        }
    }

    /// Member actions in application order.
    pub fn into_members(self) -> Vec<UiAction> {
        match self {
            Action::Single(action) => vec![action],
            Action::Multi(multi) => multi.actions,
        }
    }
}

impl From<UiAction> for Action {
    fn from(action: UiAction) -> Self {
        Action::Single(action)
    }
}
