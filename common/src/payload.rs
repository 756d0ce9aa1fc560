// Creation payload for the remote tournament service

use crate::models::{Definition, TournamentKind};
use crate::options::Variant;
use crate::validation::estimated_games;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Bounds the remote service places on the number of swiss rounds
pub const MIN_SWISS_ROUNDS: u32 = 3;
pub const MAX_SWISS_ROUNDS: u32 = 100;

/// Body of a tournament creation request, shaped for the endpoint that
/// creates the tournament kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CreateTournamentRequest {
    /// Arenas and team battles, posted to `/api/tournament`
    Arena(ArenaRequest),
    /// Swiss events, posted to `/api/swiss/new/{team}`
    Swiss(SwissRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Minutes per player
    pub clock_time: f64,
    pub clock_increment: u32,
    pub minutes: u32,
    /// Start instant in epoch milliseconds
    pub start_date: i64,
    pub variant: String,
    pub rated: bool,
    pub berserkable: bool,
    pub streakable: bool,
    pub has_chat: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_battle_by_team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub clock: SwissClock,
    pub nb_rounds: u32,
    /// Start instant in epoch milliseconds
    pub starts_at: i64,
    pub variant: String,
    pub rated: bool,
    pub description: String,
    /// Who may talk in the chat: 0 nobody, 20 team members
    pub chat_for: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwissClock {
    /// Seconds per player
    pub limit: u32,
    pub increment: u32,
}

const SWISS_CHAT_NOBODY: u8 = 0;
const SWISS_CHAT_TEAM_MEMBERS: u8 = 20;

impl CreateTournamentRequest {
    /// Build the payload for the occurrence of `definition` starting at `start`
    ///
    /// `name` is the already resolved name; an empty name lets the remote
    /// service pick one.
    pub fn from_definition(definition: &Definition, name: &str, start: DateTime<Utc>) -> Self {
        let name = name.trim();
        let name = (!name.is_empty()).then(|| name.to_string());
        let position = if definition.variant == Variant::FromPosition {
            definition.position_fen.clone()
        } else {
            None
        };

        if let TournamentKind::Swiss { .. } = definition.kind {
            return Self::Swiss(SwissRequest {
                name,
                clock: SwissClock {
                    limit: definition.clock_time.seconds(),
                    increment: definition.clock_increment.value(),
                },
                nb_rounds: swiss_rounds(definition),
                starts_at: start.timestamp_millis(),
                variant: definition.variant.as_str().to_string(),
                rated: definition.rated,
                description: definition.description.clone(),
                chat_for: if definition.has_chat {
                    SWISS_CHAT_TEAM_MEMBERS
                } else {
                    SWISS_CHAT_NOBODY
                },
                position,
                conditions: conditions(definition),
            });
        }

        let team_battle_by_team = match &definition.kind {
            TournamentKind::TeamBattle { .. } => definition.kind.primary_team().map(str::to_string),
            _ => None,
        };

        Self::Arena(ArenaRequest {
            name,
            clock_time: definition.clock_time.minutes(),
            clock_increment: definition.clock_increment.value(),
            minutes: definition.length_mins.value(),
            start_date: start.timestamp_millis(),
            variant: definition.variant.as_str().to_string(),
            rated: definition.rated,
            berserkable: definition.berserkable,
            streakable: definition.streakable,
            has_chat: definition.has_chat,
            description: definition.description.clone(),
            position,
            conditions: conditions(definition),
            team_battle_by_team,
        })
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Arena(request) => request.name.as_deref(),
            Self::Swiss(request) => request.name.as_deref(),
        }
    }

    /// Start instant in epoch milliseconds
    pub fn starts_at_ms(&self) -> i64 {
        match self {
            Self::Arena(request) => request.start_date,
            Self::Swiss(request) => request.starts_at,
        }
    }

    pub fn rated(&self) -> bool {
        match self {
            Self::Arena(request) => request.rated,
            Self::Swiss(request) => request.rated,
        }
    }

    pub fn clock_increment(&self) -> u32 {
        match self {
            Self::Arena(request) => request.clock_increment,
            Self::Swiss(request) => request.clock.increment,
        }
    }

    pub fn variant(&self) -> &str {
        match self {
            Self::Arena(request) => &request.variant,
            Self::Swiss(request) => &request.variant,
        }
    }
}

/// Entry gates keyed the way the remote service expects them
pub fn conditions(definition: &Definition) -> BTreeMap<String, Value> {
    let mut conditions = BTreeMap::new();
    if let Some(min) = definition.min_rating {
        conditions.insert("minRating.rating".to_string(), Value::from(min.value()));
    }
    if let Some(max) = definition.max_rating {
        conditions.insert("maxRating.rating".to_string(), Value::from(max.value()));
    }
    if let Some(games) = definition.min_games {
        conditions.insert("nbRatedGame.nb".to_string(), Value::from(games.value()));
    }
    if let TournamentKind::Arena { .. } = definition.kind {
        if let Some(team) = definition.kind.primary_team() {
            conditions.insert("teamMember.teamId".to_string(), Value::from(team));
        }
    }
    conditions
}

/// Relative creation endpoint for a tournament kind, `None` for a swiss
/// event without a hosting team
pub fn creation_path(kind: &TournamentKind) -> Option<String> {
    match kind {
        TournamentKind::Arena { .. } | TournamentKind::TeamBattle { .. } => {
            Some("/api/tournament".to_string())
        }
        TournamentKind::Swiss { .. } => kind
            .primary_team()
            .map(|team| format!("/api/swiss/new/{}", team)),
    }
}

fn swiss_rounds(definition: &Definition) -> u32 {
    let estimate = estimated_games(definition).floor() as u32;
    estimate.clamp(MIN_SWISS_ROUNDS, MAX_SWISS_ROUNDS)
}
