// Notification template rendering and tournament name fitting

use crate::models::{
    Definition, RemoteOccurrence, TournamentKind, MAX_NAME_LENGTH, WINNER_PLACEHOLDER,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::instrument;

pub const NAME_TOKEN: &str = "[name]";
pub const VARIANT_TOKEN: &str = "[variant]";
pub const CLOCK_TIME_TOKEN: &str = "[clocktime]";
pub const INCREMENT_TOKEN: &str = "[clockincrement]";
pub const LINK_TOKEN: &str = "[link]";
pub const BREAK_TOKEN: &str = "[br]";
pub const TIMEZONE_TOKEN: &str = "[timezone:<IANA zone>]";

/// Every token a team message template may use
pub const TEMPLATE_TOKENS: &[&str] = &[
    NAME_TOKEN,
    VARIANT_TOKEN,
    CLOCK_TIME_TOKEN,
    INCREMENT_TOKEN,
    LINK_TOKEN,
    BREAK_TOKEN,
    TIMEZONE_TOKEN,
];

/// Local rendering used for `[timezone:<zone>]` tokens
pub const TIMEZONE_FORMAT: &str = "%A %-d %B %Y %H:%M %Z";

lazy_static::lazy_static! {
    // Fixed tokens and timezone directives in a single alternation, so one
    // left-to-right pass never rescans substituted text.
    static ref TOKEN_PATTERN: Regex = Regex::new(
        r"\[(name|variant|clocktime|clockincrement|link|br|timezone:([^\[\]]*))\]"
    )
    .expect("Invalid token pattern");

    static ref TIMEZONE_PATTERN: Regex =
        Regex::new(r"\[timezone:([^\[\]]*)\]").expect("Invalid timezone pattern");
}

/// Renders team notification templates for a created occurrence
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    base_url: String,
}

impl TemplateRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public link to an occurrence
    pub fn link(&self, kind: &TournamentKind, remote_id: &str) -> String {
        let section = match kind {
            TournamentKind::Swiss { .. } => "swiss",
            TournamentKind::Arena { .. } | TournamentKind::TeamBattle { .. } => "tournament",
        };
        format!("{}/{}/{}", self.base_url, section, remote_id)
    }

    /// Substitute every known token in `template`
    ///
    /// Timezone tokens naming an unknown zone are left as typed; validation
    /// reports them before a template ever reaches this point.
    #[instrument(skip_all, fields(remote_id = %record.id, template_len = template.len()))]
    pub fn render(
        &self,
        template: &str,
        definition: &Definition,
        record: &RemoteOccurrence,
        occurrence: DateTime<Utc>,
    ) -> String {
        let rendered = TOKEN_PATTERN.replace_all(template, |caps: &Captures| {
            match &caps[1] {
                "name" => record.name.clone(),
                "variant" => definition.variant.display_name().to_string(),
                "clocktime" => definition.clock_time.as_str().to_string(),
                "clockincrement" => definition.clock_increment.as_str().to_string(),
                "link" => self.link(&definition.kind, &record.id),
                "br" => "\n".to_string(),
                _ => {
                    let zone = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                    match Tz::from_str(zone) {
                        Ok(tz) => occurrence
                            .with_timezone(&tz)
                            .format(TIMEZONE_FORMAT)
                            .to_string(),
                        Err(_) => {
                            tracing::warn!(zone = zone, "Leaving unknown timezone token in place");
                            caps[0].to_string()
                        }
                    }
                }
            }
        });

        rendered.into_owned()
    }
}

/// Zone identifiers named by `[timezone:<zone>]` tokens, in order of appearance
pub fn timezone_tokens(template: &str) -> Vec<String> {
    TIMEZONE_PATTERN
        .captures_iter(template)
        .filter_map(|cap| cap.get(1))
        .map(|zone| zone.as_str().trim().to_string())
        .collect()
}

/// Zone identifiers in `template` that do not resolve to an IANA zone
pub fn invalid_timezones(template: &str) -> Vec<String> {
    timezone_tokens(template)
        .into_iter()
        .filter(|zone| Tz::from_str(zone).is_err())
        .collect()
}

/// Fit the previous winner's name into a definition name
///
/// The winner is first inserted with non-alphanumeric characters stripped. If
/// that overflows the name limit, a truncated alphabetic-only fragment is used
/// as long as it keeps more than half of the winner's letters; otherwise the
/// placeholder is dropped and whitespace collapsed.
pub fn resolve_name(name: &str, previous_winner: &str) -> String {
    if !name.contains(WINNER_PLACEHOLDER) {
        return name.to_string();
    }

    let alphanumeric: String = previous_winner
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    if !alphanumeric.is_empty() {
        let substituted = name.replace(WINNER_PLACEHOLDER, &alphanumeric);
        if substituted.chars().count() <= MAX_NAME_LENGTH {
            return substituted;
        }

        let alphabetic: Vec<char> = previous_winner
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect();
        let placeholders = name.matches(WINNER_PLACEHOLDER).count();
        let fixed = name.chars().count() - placeholders * WINNER_PLACEHOLDER.chars().count();
        let room = MAX_NAME_LENGTH.saturating_sub(fixed) / placeholders;
        let fragment: String = alphabetic.iter().take(room).collect();

        if fragment.chars().count() * 2 > alphabetic.len() {
            return name.replace(WINNER_PLACEHOLDER, &fragment);
        }
    }

    without_placeholder(name)
}

/// Name with the winner placeholder removed and whitespace collapsed
pub fn without_placeholder(name: &str) -> String {
    name.replace(WINNER_PLACEHOLDER, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
