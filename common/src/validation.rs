// Definition validation
//
// Invalid definitions are a normal outcome, reported as a list of reasons.
// Every rule runs; the outcome aggregates all failures.

use crate::models::{Definition, TournamentKind, MAX_NAME_LENGTH, WINNER_PLACEHOLDER};
use crate::options::Variant;
use crate::substitution::{invalid_timezones, without_placeholder};
use serde::Serialize;

/// Fewest games a player should expect to get through
pub const MIN_ESTIMATED_GAMES: f64 = 3.0;

/// Most games a player should expect to get through
pub const MAX_ESTIMATED_GAMES: f64 = 150.0;

/// Result of validating a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            valid: reasons.is_empty(),
            reasons,
        }
    }
}

/// Expected number of games one player plays over the tournament length
///
/// Each game is assumed to use 80% of both clocks, plus 15 seconds between
/// games.
pub fn estimated_games(definition: &Definition) -> f64 {
    let clock_minutes = definition.clock_time.minutes();
    let increment = f64::from(definition.clock_increment.value());
    let seconds_per_game = ((60.0 * clock_minutes + 30.0 * increment) * 2.0 * 0.8) + 15.0;
    f64::from(definition.length_mins.value() * 60) / seconds_per_game
}

/// Validate a definition on its own
pub fn validate(definition: &Definition) -> ValidationOutcome {
    validate_with_teams(definition, None)
}

/// Validate a definition, also checking restricted teams against the teams
/// the user leads when that list is known
pub fn validate_with_teams(
    definition: &Definition,
    led_teams: Option<&[String]>,
) -> ValidationOutcome {
    let mut reasons = Vec::new();

    check_name(definition, &mut reasons);
    check_time_control(definition, &mut reasons);
    check_rated_time_control(definition, &mut reasons);
    check_berserk(definition, &mut reasons);
    check_rating_range(definition, &mut reasons);
    check_duration(definition, &mut reasons);
    check_template(definition, &mut reasons);
    check_position(definition, &mut reasons);
    check_kind(&definition.kind, &mut reasons);
    if let Some(teams) = led_teams {
        check_team_leadership(&definition.kind, teams, &mut reasons);
    }

    ValidationOutcome::from_reasons(reasons)
}

fn check_name(definition: &Definition, reasons: &mut Vec<String>) {
    let rendered = without_placeholder(&definition.name);
    if rendered.chars().count() > MAX_NAME_LENGTH {
        reasons.push(format!(
            "Name must be at most {} characters (excluding {}), got {}",
            MAX_NAME_LENGTH,
            WINNER_PLACEHOLDER,
            rendered.chars().count()
        ));
    }

    let bare = definition.name.replace(WINNER_PLACEHOLDER, "");
    if !bare.chars().all(|c| c == ' ' || c.is_alphanumeric()) {
        reasons.push(format!(
            "Name may only contain letters, digits and spaces (besides {})",
            WINNER_PLACEHOLDER
        ));
    }
}

fn check_time_control(definition: &Definition, reasons: &mut Vec<String>) {
    if definition.clock_time.seconds() + definition.clock_increment.value() == 0 {
        reasons.push("Clock time and increment cannot both be zero".to_string());
    }
}

fn check_rated_time_control(definition: &Definition, reasons: &mut Vec<String>) {
    if definition.rated
        && definition.variant != Variant::Standard
        && definition.clock_time.seconds() == 0
        && definition.clock_increment.value() <= 1
    {
        reasons.push(format!(
            "Rated {} games need a clock time above zero or an increment above 1 second; make the tournament unrated",
            definition.variant.display_name()
        ));
    }
}

fn check_berserk(definition: &Definition, reasons: &mut Vec<String>) {
    if definition.berserkable
        && definition.clock_increment.value() > 2 * definition.clock_time.seconds()
    {
        reasons.push(
            "Berserk requires the increment to be at most twice the clock time in seconds"
                .to_string(),
        );
    }
}

fn check_rating_range(definition: &Definition, reasons: &mut Vec<String>) {
    if let (Some(min), Some(max)) = (definition.min_rating, definition.max_rating) {
        if min.value() >= max.value() {
            reasons.push(format!(
                "Minimum rating ({}) must be lower than maximum rating ({})",
                min, max
            ));
        }
    }
}

fn check_duration(definition: &Definition, reasons: &mut Vec<String>) {
    let games = estimated_games(definition);
    if games < MIN_ESTIMATED_GAMES {
        reasons.push(format!(
            "Only about {:.1} games fit in {} minutes: increase the duration or decrease the clock",
            games, definition.length_mins
        ));
    } else if games > MAX_ESTIMATED_GAMES {
        reasons.push(format!(
            "About {:.0} games fit in {} minutes: decrease the duration or increase the clock",
            games, definition.length_mins
        ));
    }
}

fn check_template(definition: &Definition, reasons: &mut Vec<String>) {
    if let Some(template) = definition.template() {
        for zone in invalid_timezones(template) {
            reasons.push(format!("Unknown timezone '{}' in team message template", zone));
        }
    }
}

fn check_position(definition: &Definition, reasons: &mut Vec<String>) {
    let has_position = definition
        .position_fen
        .as_deref()
        .is_some_and(|fen| !fen.trim().is_empty());
    if definition.variant == Variant::FromPosition && !has_position {
        reasons.push("A starting position (FEN) is required for the fromPosition variant".to_string());
    }
}

fn check_kind(kind: &TournamentKind, reasons: &mut Vec<String>) {
    match kind {
        TournamentKind::Arena { .. } => {}
        TournamentKind::Swiss { .. } => {
            if kind.primary_team().is_none() {
                reasons.push("Swiss tournaments must be restricted to a team".to_string());
            }
        }
        TournamentKind::TeamBattle { teams, leaders } => {
            if teams.len() < 2 {
                reasons.push(format!(
                    "Team battles need at least 2 teams, got {}",
                    teams.len()
                ));
            }
            if *leaders < 1 {
                reasons.push("Team battles need at least 1 leader per team".to_string());
            }
        }
    }
}

fn check_team_leadership(kind: &TournamentKind, led_teams: &[String], reasons: &mut Vec<String>) {
    for team in kind.teams() {
        if !led_teams.iter().any(|led| led == team) {
            reasons.push(format!("You are not a leader of team '{}'", team));
        }
    }
}
