use crate::options::{
    Cadence, ClockIncrement, ClockTime, GamesRestriction, RatingRestriction, TournamentLength,
    Variant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder in a definition name replaced by the previous occurrence's winner
pub const WINNER_PLACEHOLDER: &str = "[winner]";

/// Longest name the remote service accepts
pub const MAX_NAME_LENGTH: usize = 30;

// Helper functions for comma-joined team lists
fn serialize_team_list<S>(teams: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&teams.join(","))
}

fn deserialize_team_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(split_team_list(&s))
}

/// Split a comma-joined team list, dropping blanks
pub fn split_team_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Definition Models
// ============================================================================

/// Tournament format, carrying only the restriction fields relevant to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentKind {
    Arena {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team: Option<String>,
    },
    Swiss {
        #[serde(default)]
        team: Option<String>,
    },
    #[serde(rename = "team")]
    TeamBattle {
        #[serde(
            serialize_with = "serialize_team_list",
            deserialize_with = "deserialize_team_list"
        )]
        teams: Vec<String>,
        leaders: u32,
    },
}

impl TournamentKind {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentKind::Arena { .. } => "arena",
            TournamentKind::Swiss { .. } => "swiss",
            TournamentKind::TeamBattle { .. } => "team",
        }
    }

    /// Teams this kind is scoped to, in order
    pub fn teams(&self) -> Vec<&str> {
        match self {
            TournamentKind::Arena { team } | TournamentKind::Swiss { team } => team
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .into_iter()
                .collect(),
            TournamentKind::TeamBattle { teams, .. } => teams.iter().map(String::as_str).collect(),
        }
    }

    /// Hosting team: the single restricted team, or the first team of a battle
    pub fn primary_team(&self) -> Option<&str> {
        self.teams().into_iter().next()
    }

    /// Comma-joined scope restriction, `None` when unrestricted
    pub fn restriction(&self) -> Option<String> {
        let teams = self.teams();
        if teams.is_empty() {
            None
        } else {
            Some(teams.join(","))
        }
    }
}

/// A locally stored recurring tournament definition
///
/// Identity is positional within the store until the remote service assigns
/// an identifier to an occurrence (`last_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cadence: Cadence,
    pub first_date_utc: DateTime<Utc>,
    pub kind: TournamentKind,
    pub rated: bool,
    pub streakable: bool,
    pub has_chat: bool,
    pub berserkable: bool,
    pub clock_time: ClockTime,
    pub clock_increment: ClockIncrement,
    pub length_mins: TournamentLength,
    pub variant: Variant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_fen: Option<String>,
    #[serde(default)]
    pub min_rating: Option<RatingRestriction>,
    #[serde(default)]
    pub max_rating: Option<RatingRestriction>,
    #[serde(default)]
    pub min_games: Option<GamesRestriction>,
    #[serde(default)]
    pub team_pm_template: Option<String>,
    #[serde(default)]
    pub last_notified_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_id: Option<String>,
}

impl Definition {
    /// Create a definition with 3+2 blitz defaults for everything but identity and timing
    pub fn new(
        name: impl Into<String>,
        kind: TournamentKind,
        cadence: Cadence,
        first_date_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            cadence,
            first_date_utc,
            kind,
            rated: true,
            streakable: true,
            has_chat: true,
            berserkable: true,
            clock_time: ClockTime::Minutes3,
            clock_increment: ClockIncrement::Seconds2,
            length_mins: TournamentLength::Minutes60,
            variant: Variant::Standard,
            position_fen: None,
            min_rating: None,
            max_rating: None,
            min_games: None,
            team_pm_template: None,
            last_notified_utc: None,
            last_id: None,
        }
    }

    pub fn has_winner_placeholder(&self) -> bool {
        self.name.contains(WINNER_PLACEHOLDER)
    }

    /// Non-empty notification template, if any
    pub fn template(&self) -> Option<&str> {
        self.team_pm_template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
    }

    pub fn restriction(&self) -> Option<String> {
        self.kind.restriction()
    }

    /// Whether any entry gate applies to participants
    pub fn has_conditions(&self) -> bool {
        self.min_rating.is_some()
            || self.max_rating.is_some()
            || self.min_games.is_some()
            || (matches!(self.kind, TournamentKind::Arena { .. })
                && self.kind.primary_team().is_some())
    }
}

// ============================================================================
// Remote Models
// ============================================================================

/// Read-only snapshot of an occurrence already materialized remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOccurrence {
    pub id: String,
    pub name: String,
    pub rated: bool,
    pub clock_increment: u32,
    pub starts_at_ms: i64,
    pub variant: String,
    #[serde(default)]
    pub team: Option<String>,
}

impl RemoteOccurrence {
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.starts_at_ms)
    }
}

/// Cached account details: who the user is and which teams they lead
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl UserInfo {
    pub fn new(username: impl Into<String>, teams: Vec<String>) -> Self {
        Self {
            username: username.into(),
            teams,
        }
    }
}
