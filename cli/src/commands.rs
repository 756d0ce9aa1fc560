// Command handlers

use crate::cli::{KindArg, NewArgs};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use common::client::{LichessClient, TournamentApi};
use common::config::Settings;
use common::edit;
use common::models::{split_team_list, Definition, TournamentKind, UserInfo};
use common::runner::TourneyRunner;
use common::schedule::{next_occurrence, upcoming};
use common::store::DefinitionStore;
use common::substitution::TemplateRenderer;
use common::validation::{validate, validate_with_teams};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

const SHOWN_OCCURRENCES: usize = 3;

fn store(settings: &Settings) -> DefinitionStore {
    DefinitionStore::new(&settings.storage.data_dir)
}

fn runner(settings: &Settings) -> Result<TourneyRunner> {
    if !settings.has_api_key() {
        bail!("No API key configured; run `litourney setup --api-key <token>` first");
    }
    let client = LichessClient::from_config(&settings.lichess)
        .context("Failed to build Lichess client")?;
    let api: Arc<dyn TournamentApi> = Arc::new(client);
    Ok(TourneyRunner::new(
        api,
        TemplateRenderer::new(settings.lichess.base_url.clone()),
    ))
}

/// Cached account details, fetched and saved when missing
async fn user_info(settings: &Settings, runner: &TourneyRunner) -> Result<UserInfo> {
    let store = store(settings);
    if let Some(user_info) = store.load_user_info()? {
        return Ok(user_info);
    }
    info!("No cached account details, refreshing");
    let user_info = runner.refresh_user_info().await?;
    store.save_user_info(&user_info)?;
    Ok(user_info)
}

pub fn setup(
    mut settings: Settings,
    config_dir: &Path,
    api_key: String,
    horizon_days: u32,
) -> Result<()> {
    settings.lichess.api_key = api_key;
    settings.scheduling.horizon_days = horizon_days;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid settings: {}", e))?;

    let path = settings
        .write_local(config_dir)
        .context("Failed to write local configuration")?;
    info!(path = %path.display(), "Configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}

pub async fn refresh(settings: &Settings) -> Result<()> {
    let runner = runner(settings)?;
    let user_info = runner.refresh_user_info().await?;
    store(settings).save_user_info(&user_info)?;

    println!("Logged in as {}", user_info.username);
    if user_info.teams.is_empty() {
        println!("You do not lead any teams");
    } else {
        println!("Teams you lead: {}", user_info.teams.join(", "));
    }
    Ok(())
}

fn kind_from_args(args: &NewArgs) -> Result<TournamentKind> {
    let team = args.team.clone().filter(|team| !team.trim().is_empty());
    Ok(match args.kind {
        KindArg::Arena => TournamentKind::Arena { team },
        KindArg::Swiss => TournamentKind::Swiss { team },
        KindArg::Team => {
            let teams = args.teams.as_deref().map(split_team_list).unwrap_or_default();
            if teams.is_empty() {
                bail!("A team battle needs --teams");
            }
            TournamentKind::TeamBattle {
                teams,
                leaders: args.leaders,
            }
        }
    })
}

pub(crate) fn definition_from_args(args: NewArgs) -> Result<Definition> {
    let start = edit::parse_start(&format!("{} {}", args.start, args.timezone))?;
    let kind = kind_from_args(&args)?;

    let mut definition = Definition::new(args.name, kind, args.cadence, start);
    definition.description = args.description;
    definition.variant = args.variant;
    definition.position_fen = args.position.filter(|fen| !fen.trim().is_empty());
    definition.clock_time = args.clock_time;
    definition.clock_increment = args.clock_increment;
    definition.length_mins = args.length;
    definition.rated = !args.unrated;
    definition.berserkable = !args.no_berserk;
    definition.streakable = !args.no_streaks;
    definition.has_chat = !args.no_chat;
    definition.min_rating = args.min_rating;
    definition.max_rating = args.max_rating;
    definition.min_games = args.min_games;
    definition.team_pm_template = args.template;
    Ok(definition)
}

pub fn new(settings: &Settings, args: NewArgs) -> Result<()> {
    let store = store(settings);
    let definition = definition_from_args(args)?;

    let user_info = store.load_user_info()?;
    let led_teams = user_info.as_ref().map(|info| info.teams.as_slice());
    let outcome = validate_with_teams(&definition, led_teams);
    if !outcome.valid {
        for reason in &outcome.reasons {
            println!("  - {}", reason);
        }
        bail!("Tournament '{}' is not valid", definition.name);
    }

    let name = definition.name.clone();
    let index = store.add(definition)?;
    info!(index, name = %name, "Definition added");
    println!("Added [{}] {}", index, name);
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let definitions = store(settings).load_definitions()?;
    if definitions.is_empty() {
        println!("No tournaments configured");
        return Ok(());
    }

    let now = Utc::now();
    for (index, definition) in definitions.iter().enumerate() {
        let next = next_occurrence(definition.first_date_utc, definition.cadence, now)
            .map(|next| next.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|e| e.to_string());
        let status = if validate(definition).valid {
            "ok"
        } else {
            "INVALID"
        };
        println!(
            "[{}] {} ({}, {}) next: {} [{}]",
            index,
            definition.name,
            definition.kind.label(),
            definition.cadence,
            next,
            status
        );
    }
    Ok(())
}

pub fn show(settings: &Settings, index: usize) -> Result<()> {
    let definition = store(settings).get(index)?;
    println!("{}", serde_json::to_string_pretty(&definition)?);

    let outcome = validate(&definition);
    if outcome.valid {
        println!("Valid");
    } else {
        println!("Invalid:");
        for reason in &outcome.reasons {
            println!("  - {}", reason);
        }
    }

    let occurrences = upcoming(
        definition.first_date_utc,
        definition.cadence,
        Utc::now(),
        SHOWN_OCCURRENCES,
    )?;
    println!("Upcoming:");
    for occurrence in occurrences {
        println!("  {}", occurrence.format("%A %Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

pub fn edit(settings: &Settings, index: usize, field: &str, value: &str) -> Result<()> {
    let updated = store(settings).update(index, |definition| -> Result<()> {
        edit::apply(definition, field, value).with_context(|| {
            format!(
                "Editable fields: {}",
                edit::field_names().collect::<Vec<_>>().join(", ")
            )
        })
    })?;
    info!(index, field = %field, "Definition edited");

    let outcome = validate(&updated);
    println!("Updated [{}] {}", index, updated.name);
    if !outcome.valid {
        println!("Warning, the tournament is now invalid:");
        for reason in &outcome.reasons {
            println!("  - {}", reason);
        }
    }
    Ok(())
}

pub fn delete(settings: &Settings, index: usize) -> Result<()> {
    let removed = store(settings).remove(index)?;
    info!(index, name = %removed.name, "Definition removed");
    println!("Removed {}", removed.name);
    Ok(())
}

pub fn validate_all(settings: &Settings) -> Result<()> {
    let store = store(settings);
    let definitions = store.load_definitions()?;
    let user_info = store.load_user_info()?;
    let led_teams = user_info.as_ref().map(|info| info.teams.as_slice());

    let mut invalid = 0;
    for (index, definition) in definitions.iter().enumerate() {
        let outcome = validate_with_teams(definition, led_teams);
        if outcome.valid {
            println!("[{}] {}: ok", index, definition.name);
        } else {
            invalid += 1;
            println!("[{}] {}: invalid", index, definition.name);
            for reason in &outcome.reasons {
                println!("  - {}", reason);
            }
        }
    }
    println!("{} of {} tournaments are invalid", invalid, definitions.len());
    Ok(())
}

pub fn purge(settings: &Settings) -> Result<()> {
    let removed = store(settings).purge_invalid()?;
    if removed.is_empty() {
        println!("Nothing to purge");
    } else {
        for name in &removed {
            println!("Removed {}", name);
        }
    }
    Ok(())
}

pub async fn create(settings: &Settings) -> Result<()> {
    let runner = runner(settings)?;
    let user_info = user_info(settings, &runner).await?;
    let store = store(settings);
    let mut definitions = store.load_definitions()?;

    let result = runner
        .create_due(
            &mut definitions,
            &user_info.username,
            Utc::now(),
            settings.scheduling.horizon_days,
        )
        .await;
    // Occurrences created before a failure still need their ids recorded
    store.save_definitions(&definitions)?;

    let summary = result.map_err(|e| {
        error!(error = %e, "Creation run aborted");
        e
    })?;
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some tournaments could not be created");
    }
    println!(
        "Created {}, failed {}, skipped {}",
        summary.created, summary.failed, summary.skipped
    );
    Ok(())
}

pub async fn notify(settings: &Settings) -> Result<()> {
    let runner = runner(settings)?;
    let user_info = user_info(settings, &runner).await?;
    let store = store(settings);
    let mut definitions = store.load_definitions()?;

    let result = runner
        .notify_due(&mut definitions, &user_info.username, Utc::now())
        .await;
    store.save_definitions(&definitions)?;

    let summary = result.map_err(|e| {
        error!(error = %e, "Notification run aborted");
        e
    })?;
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some team messages could not be sent");
    }
    println!(
        "Notified {}, failed {}, skipped {}",
        summary.notified, summary.failed, summary.skipped
    );
    Ok(())
}
