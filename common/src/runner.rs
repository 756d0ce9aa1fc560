// Batch runner: creates due occurrences and announces imminent ones
//
// Each run fetches the remote listing once, decides what is due with the
// pure reconciliation functions, then performs the remote calls one
// definition at a time. Definitions are updated in place; the caller saves
// them whether or not the run completed.

use crate::client::{CreatedTournament, TournamentApi};
use crate::errors::ApiError;
use crate::models::{Definition, TournamentKind, UserInfo};
use crate::payload::CreateTournamentRequest;
use crate::reconcile::{due_for_creation, due_for_notification};
use crate::substitution::{resolve_name, TemplateRenderer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of a creation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationSummary {
    pub created: usize,
    pub failed: usize,
    /// Definitions that were not due (invalid, out of horizon or already created)
    pub skipped: usize,
}

/// Outcome of a notification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub notified: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct TourneyRunner {
    api: Arc<dyn TournamentApi>,
    renderer: TemplateRenderer,
}

impl TourneyRunner {
    pub fn new(api: Arc<dyn TournamentApi>, renderer: TemplateRenderer) -> Self {
        Self { api, renderer }
    }

    /// Fetch the account name and the teams it leads
    #[instrument(skip(self))]
    pub async fn refresh_user_info(&self) -> Result<UserInfo, ApiError> {
        let username = self.api.account_username().await?;
        let teams = self.api.led_teams(&username).await?;
        info!(username = %username, teams = teams.len(), "Account details refreshed");
        Ok(UserInfo::new(username, teams))
    }

    /// Create the next occurrence of every definition that is due
    ///
    /// A remote failure for one definition is logged and counted; only an
    /// authorization failure stops the batch. When the team battle settings
    /// cannot be applied the occurrence still counts as created, since it
    /// exists remotely, and the failure is counted as well.
    #[instrument(skip(self, definitions), fields(definitions = definitions.len(), username = %username))]
    pub async fn create_due(
        &self,
        definitions: &mut [Definition],
        username: &str,
        now: DateTime<Utc>,
        horizon_days: u32,
    ) -> Result<CreationSummary, ApiError> {
        let records = self.api.created_tournaments(username).await?;
        let due: Vec<(usize, DateTime<Utc>)> =
            due_for_creation(definitions, &records, now, horizon_days)
                .into_iter()
                .map(|d| (d.index, d.next_occurrence))
                .collect();

        let mut summary = CreationSummary {
            skipped: definitions.len() - due.len(),
            ..Default::default()
        };

        for (index, start) in due {
            let definition = &mut definitions[index];
            let created = match self.create_occurrence(definition, start).await {
                Ok(created) => created,
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                Err(e) => {
                    error!(index, name = %definition.name, error = %e, "Failed to create tournament");
                    summary.failed += 1;
                    continue;
                }
            };

            info!(
                index,
                remote_id = %created.id,
                full_name = %created.full_name,
                starts_at = %start,
                "Tournament created"
            );
            definition.last_id = Some(created.id.clone());
            summary.created += 1;

            if let TournamentKind::TeamBattle { teams, leaders } = &definition.kind {
                match self
                    .api
                    .update_team_battle(&created.id, teams, *leaders)
                    .await
                {
                    Ok(()) => debug!(index, teams = teams.len(), "Team battle configured"),
                    Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                    Err(e) => {
                        error!(index, remote_id = %created.id, error = %e, "Failed to configure team battle");
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            created = summary.created,
            failed = summary.failed,
            skipped = summary.skipped,
            "Creation run finished"
        );
        Ok(summary)
    }

    async fn create_occurrence(
        &self,
        definition: &Definition,
        start: DateTime<Utc>,
    ) -> Result<CreatedTournament, ApiError> {
        let winner = match definition.last_id.as_deref() {
            Some(previous) if definition.has_winner_placeholder() => {
                self.previous_winner(previous).await?
            }
            _ => String::new(),
        };

        let name = resolve_name(&definition.name, &winner);
        let request = CreateTournamentRequest::from_definition(definition, &name, start);
        self.api.create_tournament(&request, &definition.kind).await
    }

    /// Winner of the previous occurrence, empty when it cannot be looked up
    ///
    /// Only an authorization failure is returned; the name then simply drops
    /// the placeholder.
    async fn previous_winner(&self, tournament_id: &str) -> Result<String, ApiError> {
        match self.api.tournament_winner(tournament_id).await {
            Ok(winner) => Ok(winner.unwrap_or_default()),
            Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
            Err(e) => {
                warn!(tournament_id = %tournament_id, error = %e, "Previous winner lookup failed");
                Ok(String::new())
            }
        }
    }

    /// Message the team(s) of every definition whose occurrence starts within a day
    ///
    /// A definition is marked notified once at least one of its teams received
    /// the message, so a partial failure is not repeated to teams that already
    /// got it.
    #[instrument(skip(self, definitions), fields(definitions = definitions.len(), username = %username))]
    pub async fn notify_due(
        &self,
        definitions: &mut [Definition],
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<NotificationSummary, ApiError> {
        let records = self.api.created_tournaments(username).await?;
        let messages: Vec<(usize, String, Vec<String>)> =
            due_for_notification(definitions, &records, now)
                .into_iter()
                .filter_map(|due| {
                    let template = due.definition.template()?;
                    let message = self.renderer.render(
                        template,
                        due.definition,
                        due.record,
                        due.next_occurrence,
                    );
                    let teams = due
                        .definition
                        .kind
                        .teams()
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    Some((due.index, message, teams))
                })
                .collect();

        let mut summary = NotificationSummary {
            skipped: definitions.len() - messages.len(),
            ..Default::default()
        };

        for (index, message, teams) in messages {
            let mut delivered = 0;
            let mut failed = false;

            for team in &teams {
                match self.api.message_team(team, &message).await {
                    Ok(()) => delivered += 1,
                    Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                    Err(e) => {
                        warn!(index, team = %team, error = %e, "Failed to message team");
                        failed = true;
                    }
                }
            }

            if delivered > 0 {
                definitions[index].last_notified_utc = Some(now);
                summary.notified += 1;
                info!(index, teams = delivered, "Team notification sent");
            }
            if failed {
                summary.failed += 1;
            }
        }

        info!(
            notified = summary.notified,
            failed = summary.failed,
            skipped = summary.skipped,
            "Notification run finished"
        );
        Ok(summary)
    }
}
