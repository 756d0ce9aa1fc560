// Property-based tests for name fitting and template rendering

use chrono::{DateTime, TimeZone, Utc};
use common::models::{
    Definition, RemoteOccurrence, TournamentKind, MAX_NAME_LENGTH, WINNER_PLACEHOLDER,
};
use common::options::Cadence;
use common::substitution::{resolve_name, without_placeholder, TemplateRenderer};
use proptest::prelude::*;

fn definition() -> Definition {
    Definition::new(
        "Club Arena",
        TournamentKind::Arena {
            team: Some("club".to_string()),
        },
        Cadence::Weekly,
        Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap(),
    )
}

fn record(name: &str, starts: DateTime<Utc>) -> RemoteOccurrence {
    RemoteOccurrence {
        id: "abcd1234".to_string(),
        name: name.to_string(),
        rated: true,
        clock_increment: 2,
        starts_at_ms: starts.timestamp_millis(),
        variant: "standard".to_string(),
        team: Some("club".to_string()),
    }
}

/// *For any* name that fits once the placeholder is removed, and any winner,
/// the fitted name fits and no longer carries the placeholder.
#[test]
fn property_resolved_name_fits() {
    proptest!(|(
        prefix in "[A-Za-z ]{0,14}",
        suffix in "[A-Za-z ]{0,14}",
        winner in "[A-Za-z0-9_\\-]{0,25}"
    )| {
        let name = format!("{}{}{}", prefix, WINNER_PLACEHOLDER, suffix);
        prop_assume!(without_placeholder(&name).chars().count() <= MAX_NAME_LENGTH);

        let fitted = resolve_name(&name, &winner);
        prop_assert!(fitted.chars().count() <= MAX_NAME_LENGTH, "'{}' is too long", fitted);
        prop_assert!(!fitted.contains(WINNER_PLACEHOLDER));
    });
}

/// *For any* name without the placeholder, fitting is the identity.
#[test]
fn property_names_without_placeholder_are_untouched() {
    proptest!(|(name in "[A-Za-z0-9 ]{0,40}", winner in "[A-Za-z]{0,20}")| {
        prop_assert_eq!(resolve_name(&name, &winner), name);
    });
}

/// *For any* template built from literal text and known tokens, rendering
/// leaves no token behind.
#[test]
fn property_rendering_replaces_every_token() {
    let tokens = prop::sample::select(vec![
        "[name]",
        "[variant]",
        "[clocktime]",
        "[clockincrement]",
        "[link]",
        "[br]",
        "[timezone:Europe/London]",
        "[timezone:Asia/Tokyo]",
        "[timezone:UTC]",
    ]);

    proptest!(|(
        parts in prop::collection::vec(("[A-Za-z0-9 .,!:]{0,12}", tokens.clone()), 0..6),
        tail in "[A-Za-z0-9 .,!:]{0,12}",
        record_name in "[A-Za-z ]{1,20}",
        start_secs in 1_700_000_000i64..1_900_000_000i64
    )| {
        let template: String = parts
            .iter()
            .map(|(text, token)| format!("{}{}", text, token))
            .chain(std::iter::once(tail.clone()))
            .collect();
        let starts = DateTime::from_timestamp(start_secs, 0).unwrap();

        let renderer = TemplateRenderer::new("https://lichess.org");
        let rendered = renderer.render(&template, &definition(), &record(&record_name, starts), starts);

        prop_assert!(!rendered.contains('['), "unrendered token in '{}'", rendered);
        prop_assert!(rendered.ends_with(&tail));
    });
}

/// *For any* text without brackets, rendering is the identity.
#[test]
fn property_plain_text_is_unchanged() {
    proptest!(|(text in "[^\\[\\]]{0,60}")| {
        let starts = Utc.with_ymd_and_hms(2024, 3, 18, 18, 0, 0).unwrap();
        let renderer = TemplateRenderer::new("https://lichess.org");
        let rendered = renderer.render(&text, &definition(), &record("Club Arena", starts), starts);
        prop_assert_eq!(rendered, text);
    });
}
