// Reconciliation of local definitions against occurrences already created remotely
//
// Guarantees at most one creation per occurrence: once a definition has
// recorded a remote identifier, only that identifier is matched.

use crate::models::{Definition, RemoteOccurrence, TournamentKind};
use crate::schedule::Recurrence;
use crate::validation::validate;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};

/// A definition whose next occurrence should be created remotely
#[derive(Debug, Clone, PartialEq)]
pub struct DueCreation<'a> {
    /// Position of the definition in the input slice
    pub index: usize,
    pub definition: &'a Definition,
    pub next_occurrence: DateTime<Utc>,
}

/// A definition whose upcoming occurrence should be announced to its team(s)
#[derive(Debug, Clone, PartialEq)]
pub struct DueNotification<'a> {
    pub index: usize,
    pub definition: &'a Definition,
    pub record: &'a RemoteOccurrence,
    pub next_occurrence: DateTime<Utc>,
}

/// Whether the definition's recorded remote identifier is among `records`
pub fn already_created(definition: &Definition, records: &[RemoteOccurrence]) -> bool {
    definition
        .last_id
        .as_deref()
        .is_some_and(|id| records.iter().any(|record| record.id == id))
}

/// Find the remote record for the occurrence starting at `next_occurrence`
///
/// Matches by identifier when one has been recorded. Only definitions that
/// never recorded an identifier fall back to comparing the record's fields.
pub fn matching_record<'a>(
    definition: &Definition,
    records: &'a [RemoteOccurrence],
    next_occurrence: DateTime<Utc>,
) -> Option<&'a RemoteOccurrence> {
    match definition.last_id.as_deref() {
        Some(id) => records.iter().find(|record| record.id == id),
        None => records
            .iter()
            .find(|record| resembles(definition, record, next_occurrence)),
    }
}

fn resembles(
    definition: &Definition,
    record: &RemoteOccurrence,
    next_occurrence: DateTime<Utc>,
) -> bool {
    // Names carrying the winner placeholder cannot be predicted
    let name = definition.name.trim();
    let name_matches =
        definition.has_winner_placeholder() || name.is_empty() || record.name.starts_with(name);

    let team_matches = match &definition.kind {
        TournamentKind::TeamBattle { .. } => true,
        kind => record.team.as_deref() == kind.primary_team(),
    };

    name_matches
        && team_matches
        && record.rated == definition.rated
        && record.clock_increment == definition.clock_increment.value()
        && record.starts_at_ms == next_occurrence.timestamp_millis()
        && record.variant == definition.variant.as_str()
}

/// Valid definitions, not yet created, whose next occurrence is within
/// `horizon_days` of `now`; in input order
#[instrument(skip_all, fields(definitions = definitions.len(), records = records.len(), horizon_days = horizon_days))]
pub fn due_for_creation<'a>(
    definitions: &'a [Definition],
    records: &[RemoteOccurrence],
    now: DateTime<Utc>,
    horizon_days: u32,
) -> Vec<DueCreation<'a>> {
    let horizon = now + Duration::days(i64::from(horizon_days));

    definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| {
            let outcome = validate(definition);
            if !outcome.valid {
                debug!(index, name = %definition.name, reasons = ?outcome.reasons, "Skipping invalid definition");
                return None;
            }

            let next_occurrence = match definition.next_occurrence(now) {
                Ok(next) => next,
                Err(e) => {
                    warn!(index, name = %definition.name, error = %e, "Cannot compute next occurrence");
                    return None;
                }
            };

            if next_occurrence > horizon {
                return None;
            }

            if let Some(record) = matching_record(definition, records, next_occurrence) {
                debug!(index, remote_id = %record.id, "Occurrence already created");
                return None;
            }

            Some(DueCreation {
                index,
                definition,
                next_occurrence,
            })
        })
        .collect()
}

/// Definitions with a team message template whose occurrence starts within a
/// day and has not been announced this cycle; in input order
///
/// Definitions without a matching remote record are skipped for this batch.
#[instrument(skip_all, fields(definitions = definitions.len(), records = records.len()))]
pub fn due_for_notification<'a>(
    definitions: &'a [Definition],
    records: &'a [RemoteOccurrence],
    now: DateTime<Utc>,
) -> Vec<DueNotification<'a>> {
    definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| {
            definition.template()?;
            definition.restriction()?;

            let next_occurrence = match definition.next_occurrence(now) {
                Ok(next) => next,
                Err(e) => {
                    warn!(index, name = %definition.name, error = %e, "Cannot compute next occurrence");
                    return None;
                }
            };

            if (next_occurrence - now).num_days() != 0 {
                return None;
            }

            if let Some(last) = definition.last_notified_utc {
                if last >= next_occurrence - Duration::days(1) {
                    debug!(index, last_notified = %last, "Already notified this cycle");
                    return None;
                }
            }

            let Some(record) = matching_record(definition, records, next_occurrence) else {
                debug!(index, name = %definition.name, "No remote occurrence to announce yet");
                return None;
            };

            Some(DueNotification {
                index,
                definition,
                record,
                next_occurrence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Cadence, ClockTime};
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn weekly(name: &str) -> Definition {
        let mut def = Definition::new(
            name,
            TournamentKind::Arena {
                team: Some("club".to_string()),
            },
            Cadence::Weekly,
            utc(2024, 1, 1, 18, 0),
        );
        def.team_pm_template = Some("[name] starts soon: [link]".to_string());
        def
    }

    fn record_for(def: &Definition, id: &str, starts: DateTime<Utc>) -> RemoteOccurrence {
        RemoteOccurrence {
            id: id.to_string(),
            name: format!("{} Arena", def.name),
            rated: def.rated,
            clock_increment: def.clock_increment.value(),
            starts_at_ms: starts.timestamp_millis(),
            variant: def.variant.as_str().to_string(),
            team: def.kind.primary_team().map(str::to_string),
        }
    }

    #[test]
    fn test_already_created_by_identifier_only() {
        let mut def = weekly("Monday Blitz");
        let mut record = record_for(&def, "abc", utc(2024, 3, 18, 18, 0));
        assert!(!already_created(&def, std::slice::from_ref(&record)));

        def.last_id = Some("abc".to_string());
        // Field drift does not matter once the identifier is known
        record.name = "Renamed".to_string();
        record.rated = !def.rated;
        assert!(already_created(&def, &[record]));
    }

    #[test]
    fn test_known_identifier_disables_heuristic() {
        let mut def = weekly("Monday Blitz");
        def.last_id = Some("old".to_string());
        let next = utc(2024, 3, 18, 18, 0);
        let records = vec![record_for(&def, "new", next)];
        assert!(matching_record(&def, &records, next).is_none());
    }

    #[test]
    fn test_heuristic_fallback_without_identifier() {
        let def = weekly("Monday Blitz");
        let next = utc(2024, 3, 18, 18, 0);
        let records = vec![
            record_for(&def, "other-time", utc(2024, 3, 25, 18, 0)),
            record_for(&def, "match", next),
        ];
        assert_eq!(matching_record(&def, &records, next).unwrap().id, "match");

        let mut different = record_for(&def, "x", next);
        different.variant = "atomic".to_string();
        assert!(matching_record(&def, &[different], next).is_none());
    }

    #[test]
    fn test_due_for_creation_filters() {
        let now = utc(2024, 3, 15, 10, 0);
        let due = weekly("Monday Blitz");

        let mut created = weekly("Created");
        created.last_id = Some("done".to_string());

        let mut invalid = weekly("Invalid");
        invalid.clock_time = ClockTime::Minutes60;

        let mut far = weekly("Far Away");
        far.first_date_utc = utc(2024, 5, 1, 18, 0);

        let definitions = vec![due, created.clone(), invalid, far];
        let records = vec![record_for(&created, "done", utc(2024, 3, 18, 18, 0))];

        let result = due_for_creation(&definitions, &records, now, 7);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].index, 0);
        assert_eq!(result[0].next_occurrence, utc(2024, 3, 18, 18, 0));
    }

    #[test]
    fn test_due_for_creation_horizon_boundary() {
        let now = utc(2024, 3, 15, 10, 0);
        let definitions = vec![weekly("Monday Blitz")];
        assert!(due_for_creation(&definitions, &[], now, 3).is_empty());
        assert_eq!(due_for_creation(&definitions, &[], now, 4).len(), 1);
    }

    #[test]
    fn test_due_for_creation_after_previous_occurrence_finished() {
        // last_id refers to last week's occurrence, which is no longer listed
        let now = utc(2024, 3, 15, 10, 0);
        let mut def = weekly("Monday Blitz");
        def.last_id = Some("last-week".to_string());
        let definitions = vec![def];
        assert_eq!(due_for_creation(&definitions, &[], now, 7).len(), 1);
    }

    #[test]
    fn test_due_for_notification_within_a_day() {
        let now = utc(2024, 3, 18, 9, 0);
        let mut def = weekly("Monday Blitz");
        def.last_id = Some("abc".to_string());
        let records = vec![record_for(&def, "abc", utc(2024, 3, 18, 18, 0))];
        let definitions = vec![def];

        let result = due_for_notification(&definitions, &records, now);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].record.id, "abc");
        assert_eq!(result[0].next_occurrence, utc(2024, 3, 18, 18, 0));

        // More than a day away
        let earlier = utc(2024, 3, 17, 17, 0);
        assert!(due_for_notification(&definitions, &records, earlier).is_empty());
    }

    #[test]
    fn test_due_for_notification_skips_already_notified() {
        let now = utc(2024, 3, 18, 9, 0);
        let mut def = weekly("Monday Blitz");
        def.last_id = Some("abc".to_string());
        def.last_notified_utc = Some(utc(2024, 3, 18, 8, 0));
        let records = vec![record_for(&def, "abc", utc(2024, 3, 18, 18, 0))];
        let mut definitions = vec![def];
        assert!(due_for_notification(&definitions, &records, now).is_empty());

        // Notified last cycle
        definitions[0].last_notified_utc = Some(utc(2024, 3, 11, 8, 0));
        assert_eq!(due_for_notification(&definitions, &records, now).len(), 1);
    }

    #[test]
    fn test_due_for_notification_requires_template_scope_and_record() {
        let now = utc(2024, 3, 18, 9, 0);

        let mut no_template = weekly("No Template");
        no_template.team_pm_template = None;

        let mut no_team = weekly("No Team");
        no_team.kind = TournamentKind::Arena { team: None };

        let unmatched = weekly("Unmatched");

        let records = vec![
            record_for(&no_template, "a", utc(2024, 3, 18, 18, 0)),
            record_for(&no_team, "b", utc(2024, 3, 18, 18, 0)),
        ];
        let definitions = vec![no_template, no_team, unmatched];
        assert!(due_for_notification(&definitions, &records, now).is_empty());
    }
}
