// Field-by-name editing of definitions
//
// A closed dispatch table maps field tokens to typed setters; anything not in
// the table is rejected instead of being written onto the definition.

use crate::errors::EditError;
use crate::models::{split_team_list, Definition, TournamentKind};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

type Setter = fn(&mut Definition, &str) -> Result<(), EditError>;

const SETTERS: &[(&str, Setter)] = &[
    ("name", set_name),
    ("description", set_description),
    ("cadence", set_cadence),
    ("first_date", set_first_date),
    ("variant", set_variant),
    ("clock_time", set_clock_time),
    ("clock_increment", set_clock_increment),
    ("length", set_length),
    ("rated", set_rated),
    ("position", set_position),
    ("berserkable", set_berserkable),
    ("streakable", set_streakable),
    ("chat", set_chat),
    ("team", set_team),
    ("teams", set_teams),
    ("leaders", set_leaders),
    ("min_rating", set_min_rating),
    ("max_rating", set_max_rating),
    ("min_games", set_min_games),
    ("template", set_template),
    ("kind", set_kind),
];

/// Names of every editable field
pub fn field_names() -> impl Iterator<Item = &'static str> {
    SETTERS.iter().map(|(name, _)| *name)
}

/// Set `field` on `definition` from its textual form
pub fn apply(definition: &mut Definition, field: &str, raw: &str) -> Result<(), EditError> {
    let wanted = field.trim().to_ascii_lowercase();
    let (_, setter) = SETTERS
        .iter()
        .find(|(name, _)| *name == wanted)
        .ok_or_else(|| EditError::UnknownField(field.to_string()))?;
    setter(definition, raw.trim())
}

/// Parse a start instant: RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` followed by an
/// optional IANA zone (UTC when omitted)
pub fn parse_start(raw: &str) -> Result<DateTime<Utc>, EditError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let (local, zone) = match raw.rsplit_once(' ') {
        Some((head, tail)) if Tz::from_str(tail).is_ok() => (head.trim(), tail),
        _ => (raw, "UTC"),
    };
    let tz = Tz::from_str(zone).map_err(|e| invalid("first_date", e))?;

    let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M"))
        .map_err(|_| {
            invalid(
                "first_date",
                format!("'{}' is not a date and time like 2020-12-24 23:59:59", raw),
            )
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| invalid("first_date", format!("{} does not exist in {}", local, tz)))
}

pub fn parse_bool(field: &str, raw: &str) -> Result<bool, EditError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(invalid(field, format!("'{}' is not yes or no", raw))),
    }
}

fn invalid(field: &str, reason: impl ToString) -> EditError {
    EditError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn not_applicable(field: &str, kind: &TournamentKind) -> EditError {
    EditError::NotApplicable {
        field: field.to_string(),
        kind: kind.label().to_string(),
    }
}

fn is_none(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("none")
}

fn parse<T>(field: &str, raw: &str) -> Result<T, EditError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.parse().map_err(|e: T::Err| invalid(field, e))
}

fn parse_optional<T>(field: &str, raw: &str) -> Result<Option<T>, EditError>
where
    T: FromStr,
    T::Err: ToString,
{
    if is_none(raw) {
        Ok(None)
    } else {
        parse(field, raw).map(Some)
    }
}

fn optional_text(raw: &str) -> Option<String> {
    (!is_none(raw)).then(|| raw.to_string())
}

fn set_name(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.name = raw.to_string();
    Ok(())
}

fn set_description(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.description = raw.to_string();
    Ok(())
}

fn set_cadence(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.cadence = parse("cadence", raw)?;
    Ok(())
}

fn set_first_date(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.first_date_utc = parse_start(raw)?;
    Ok(())
}

fn set_variant(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.variant = parse("variant", raw)?;
    Ok(())
}

fn set_clock_time(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.clock_time = parse("clock_time", raw)?;
    Ok(())
}

fn set_clock_increment(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.clock_increment = parse("clock_increment", raw)?;
    Ok(())
}

fn set_length(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.length_mins = parse("length", raw)?;
    Ok(())
}

fn set_rated(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.rated = parse_bool("rated", raw)?;
    Ok(())
}

fn set_position(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.position_fen = optional_text(raw);
    Ok(())
}

fn set_berserkable(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.berserkable = parse_bool("berserkable", raw)?;
    Ok(())
}

fn set_streakable(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.streakable = parse_bool("streakable", raw)?;
    Ok(())
}

fn set_chat(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.has_chat = parse_bool("chat", raw)?;
    Ok(())
}

fn set_team(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    match &mut def.kind {
        TournamentKind::Arena { team } | TournamentKind::Swiss { team } => {
            *team = optional_text(raw);
            Ok(())
        }
        kind @ TournamentKind::TeamBattle { .. } => Err(not_applicable("team", kind)),
    }
}

fn set_teams(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    match &mut def.kind {
        TournamentKind::TeamBattle { teams, .. } => {
            *teams = split_team_list(raw);
            Ok(())
        }
        kind => Err(not_applicable("teams", kind)),
    }
}

fn set_leaders(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    match &mut def.kind {
        TournamentKind::TeamBattle { leaders, .. } => {
            *leaders = parse("leaders", raw)?;
            Ok(())
        }
        kind => Err(not_applicable("leaders", kind)),
    }
}

fn set_min_rating(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.min_rating = parse_optional("min_rating", raw)?;
    Ok(())
}

fn set_max_rating(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.max_rating = parse_optional("max_rating", raw)?;
    Ok(())
}

fn set_min_games(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.min_games = parse_optional("min_games", raw)?;
    Ok(())
}

fn set_template(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    def.team_pm_template = optional_text(raw);
    Ok(())
}

/// Switch the tournament kind, carrying the hosting team across
fn set_kind(def: &mut Definition, raw: &str) -> Result<(), EditError> {
    let team = def.kind.primary_team().map(str::to_string);
    def.kind = match raw.to_ascii_lowercase().as_str() {
        "arena" => TournamentKind::Arena { team },
        "swiss" => TournamentKind::Swiss { team },
        "team" | "team_battle" => match &def.kind {
            TournamentKind::TeamBattle { .. } => return Ok(()),
            _ => TournamentKind::TeamBattle {
                teams: team.into_iter().collect(),
                leaders: 1,
            },
        },
        _ => {
            return Err(invalid(
                "kind",
                format!("'{}' is not one of: arena, swiss, team", raw),
            ))
        }
    };
    Ok(())
}
