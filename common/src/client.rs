// Remote tournament service client
//
// `TournamentApi` is the seam the batch runner works against; `LichessClient`
// is the HTTP implementation. Rate-limited calls are retried according to a
// `RetryStrategy`; every other failure is returned to the caller.

use crate::config::LichessConfig;
use crate::errors::ApiError;
use crate::models::{RemoteOccurrence, TournamentKind};
use crate::payload::{creation_path, CreateTournamentRequest};
use crate::retry::{RateLimitBackoff, RetryStrategy};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Identifier and display name of a freshly created tournament
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTournament {
    pub id: String,
    pub full_name: String,
}

/// Operations the batch runner needs from the remote service
#[async_trait]
pub trait TournamentApi: Send + Sync {
    /// Username owning the configured API key
    async fn account_username(&self) -> Result<String, ApiError>;

    /// Teams `username` is a leader of
    async fn led_teams(&self, username: &str) -> Result<Vec<String>, ApiError>;

    /// Upcoming tournaments created by `username`
    async fn created_tournaments(&self, username: &str)
        -> Result<Vec<RemoteOccurrence>, ApiError>;

    async fn create_tournament(
        &self,
        request: &CreateTournamentRequest,
        kind: &TournamentKind,
    ) -> Result<CreatedTournament, ApiError>;

    async fn update_team_battle(
        &self,
        tournament_id: &str,
        teams: &[String],
        leaders: u32,
    ) -> Result<(), ApiError>;

    /// Send `message` to every member of `team`
    async fn message_team(&self, team: &str, message: &str) -> Result<(), ApiError>;

    /// Winner of a finished tournament, `None` when unavailable
    async fn tournament_winner(&self, tournament_id: &str) -> Result<Option<String>, ApiError>;
}

/// HTTP client for lichess.org (or any server speaking its API)
pub struct LichessClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: Arc<dyn RetryStrategy>,
}

impl LichessClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ApiError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: Arc::new(RateLimitBackoff::new()),
        })
    }

    pub fn from_config(config: &LichessConfig) -> Result<Self, ApiError> {
        let retry = RateLimitBackoff::with_config(
            config.retry_delay_seconds,
            config.max_retries,
            0.1,
        );
        Ok(
            Self::new(&config.base_url, &config.api_key, config.timeout_seconds)?
                .with_retry_strategy(Arc::new(retry)),
        )
    }

    pub fn with_retry_strategy(mut self, retry: Arc<dyn RetryStrategy>) -> Self {
        self.retry = retry;
        self
    }

    /// Send a request, waiting and retrying while rate limited
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.api_key);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();
            debug!(method = %method, path = path, status = status.as_u16(), "Remote response");

            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::TOO_MANY_REQUESTS => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        warn!(
                            path = path,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Request was rate limited, waiting to retry"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(ApiError::RateLimited(attempt + 1)),
                },
                StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
                _ => {
                    let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
                    return Err(ApiError::RequestFailed {
                        status: status.as_u16(),
                        reason,
                    });
                }
            }
        }
    }

    async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        Ok(self.send(Method::GET, path, None).await?.text().await?)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<String, ApiError> {
        Ok(self.send(Method::POST, path, Some(body)).await?.text().await?)
    }
}

#[async_trait]
impl TournamentApi for LichessClient {
    #[instrument(skip(self))]
    async fn account_username(&self) -> Result<String, ApiError> {
        let body = self.get_text("/api/account").await?;
        let account: Account = serde_json::from_str(&body)?;
        Ok(account.username)
    }

    #[instrument(skip(self))]
    async fn led_teams(&self, username: &str) -> Result<Vec<String>, ApiError> {
        let body = self.get_text(&format!("/api/team/of/{}", username)).await?;
        let teams: Vec<Team> = serde_json::from_str(&body)?;
        Ok(teams
            .into_iter()
            .filter(|team| team.leaders.iter().any(|leader| leader.name == username))
            .map(|team| team.id)
            .collect())
    }

    #[instrument(skip(self))]
    async fn created_tournaments(
        &self,
        username: &str,
    ) -> Result<Vec<RemoteOccurrence>, ApiError> {
        let path = format!("/api/user/{}/tournament/created?status=10", username);
        let body = self.get_text(&path).await?;
        let records = parse_created_tournaments(&body)?;
        info!(count = records.len(), "Fetched upcoming tournaments");
        Ok(records)
    }

    #[instrument(skip(self, request, kind), fields(kind = kind.label(), starts_at = request.starts_at_ms()))]
    async fn create_tournament(
        &self,
        request: &CreateTournamentRequest,
        kind: &TournamentKind,
    ) -> Result<CreatedTournament, ApiError> {
        let path = creation_path(kind).ok_or_else(|| {
            ApiError::InvalidResponse("a swiss tournament needs a hosting team".to_string())
        })?;
        let body = serde_json::to_value(request)?;
        let response = self.post_json(&path, &body).await?;
        let created: Created = serde_json::from_str(&response)?;

        Ok(CreatedTournament {
            full_name: created.full_name.or(created.name).unwrap_or_default(),
            id: created.id,
        })
    }

    #[instrument(skip(self))]
    async fn update_team_battle(
        &self,
        tournament_id: &str,
        teams: &[String],
        leaders: u32,
    ) -> Result<(), ApiError> {
        let path = format!("/api/tournament/team-battle/{}", tournament_id);
        let body = json!({ "teams": teams.join(","), "nbLeaders": leaders });
        self.post_json(&path, &body).await?;
        Ok(())
    }

    #[instrument(skip(self, message), fields(message_len = message.len()))]
    async fn message_team(&self, team: &str, message: &str) -> Result<(), ApiError> {
        let path = format!("/team/{}/pm-all", team);
        self.post_json(&path, &json!({ "message": message })).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn tournament_winner(&self, tournament_id: &str) -> Result<Option<String>, ApiError> {
        let path = format!("/api/tournament/{}/results?nb=1", tournament_id);
        let body = match self.get_text(&path).await {
            Ok(body) => body,
            Err(ApiError::RequestFailed { status, .. }) => {
                debug!(status, "No results available");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(line) = body.lines().map(str::trim).find(|line| !line.is_empty()) else {
            return Ok(None);
        };
        let standing: Standing = serde_json::from_str(line)?;
        Ok(Some(standing.username).filter(|name| !name.is_empty()))
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Deserialize)]
struct Account {
    username: String,
}

#[derive(Deserialize)]
struct Team {
    id: String,
    #[serde(default)]
    leaders: Vec<Leader>,
}

#[derive(Deserialize)]
struct Leader {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Created {
    id: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct Standing {
    #[serde(default)]
    username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedTournament {
    id: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rated: bool,
    clock: ListedClock,
    starts_at: StartsAt,
    variant: ListedVariant,
    #[serde(default)]
    conditions: Option<Value>,
    #[serde(default)]
    team_id: Option<String>,
}

#[derive(Deserialize)]
struct ListedClock {
    increment: u32,
}

/// Arena listings carry epoch milliseconds, swiss listings an RFC 3339 string
#[derive(Deserialize)]
#[serde(untagged)]
enum StartsAt {
    Millis(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListedVariant {
    Key(String),
    Object { key: String },
}

impl TryFrom<ListedTournament> for RemoteOccurrence {
    type Error = ApiError;

    fn try_from(listed: ListedTournament) -> Result<Self, Self::Error> {
        let starts_at_ms = match listed.starts_at {
            StartsAt::Millis(ms) => ms,
            StartsAt::Text(text) => chrono::DateTime::parse_from_rfc3339(&text)
                .map_err(|e| ApiError::InvalidResponse(format!("startsAt '{}': {}", text, e)))?
                .timestamp_millis(),
        };

        let variant = match listed.variant {
            ListedVariant::Key(key) | ListedVariant::Object { key } => key,
        };

        let team = listed
            .conditions
            .as_ref()
            .and_then(|c| c.pointer("/teamMember/teamId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(listed.team_id);

        Ok(RemoteOccurrence {
            name: listed.full_name.or(listed.name).unwrap_or_default(),
            id: listed.id,
            rated: listed.rated,
            clock_increment: listed.clock.increment,
            starts_at_ms,
            variant,
            team,
        })
    }
}

/// Parse a newline-delimited JSON listing of tournaments
pub fn parse_created_tournaments(body: &str) -> Result<Vec<RemoteOccurrence>, ApiError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let listed: ListedTournament = serde_json::from_str(line)?;
            RemoteOccurrence::try_from(listed)
        })
        .collect()
}
