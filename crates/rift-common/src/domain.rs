use serde::{Deserialize, Serialize};

/// Map side in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Blue => Team::Red,
            Team::Red => Team::Blue,
        }
    }

    /// Riot match data encodes sides as team ids 100 and 200.
    pub fn from_riot_team_id(team_id: i64) -> Option<Self> {
        match team_id {
            100 => Some(Team::Blue),
            200 => Some(Team::Red),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::Blue => "Blue team",
            Team::Red => "Red team",
        }
    }
}

/// Position as reported in `teamPosition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lane {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
}

impl Lane {
    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Top => "TOP",
            Lane::Jungle => "JUNGLE",
            Lane::Middle => "MIDDLE",
            Lane::Bottom => "BOTTOM",
            Lane::Utility => "UTILITY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TOP" => Some(Lane::Top),
            "JUNGLE" => Some(Lane::Jungle),
            "MIDDLE" | "MID" => Some(Lane::Middle),
            "BOTTOM" | "BOT" | "ADC" => Some(Lane::Bottom),
            "UTILITY" | "SUPPORT" => Some(Lane::Utility),
            _ => None,
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_serializes_lowercase_and_flips() {
        assert_eq!(serde_json::to_string(&Team::Blue).unwrap(), "\"blue\"");
        assert_eq!(Team::Blue.opponent(), Team::Red);
        assert_eq!(Team::from_riot_team_id(200), Some(Team::Red));
        assert_eq!(Team::from_riot_team_id(300), None);
    }

    #[test]
    fn lane_parses_common_aliases() {
        assert_eq!(Lane::parse("mid"), Some(Lane::Middle));
        assert_eq!(Lane::parse("Support"), Some(Lane::Utility));
        assert_eq!(Lane::parse("BOTTOM"), Some(Lane::Bottom));
        assert_eq!(Lane::parse("roam"), None);
        assert_eq!(
            serde_json::from_str::<Lane>("\"JUNGLE\"").unwrap(),
            Lane::Jungle
        );
    }
}
