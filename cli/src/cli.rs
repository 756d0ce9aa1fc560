// Command-line surface

use clap::{Args, Parser, Subcommand, ValueEnum};
use common::config::DEFAULT_CONFIG_DIR;
use common::options::{
    Cadence, ClockIncrement, ClockTime, GamesRestriction, RatingRestriction, TournamentLength,
    Variant,
};
use common::substitution::TEMPLATE_TOKENS;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Schedule recurring Lichess tournaments")]
pub struct Cli {
    /// Directory holding default.toml and local.toml
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Store the API key and how many days ahead to create tournaments
    Setup {
        #[arg(long)]
        api_key: String,
        #[arg(long, default_value_t = 7)]
        horizon_days: u32,
    },
    /// Fetch the account name and the teams it leads
    Refresh,
    /// Add a recurring tournament definition
    #[command(after_help = template_help())]
    New(NewArgs),
    /// List definitions with their next occurrence
    List,
    /// Show one definition in full
    Show { index: usize },
    /// Change one field of a definition
    Edit {
        index: usize,
        field: String,
        /// New value; `none` clears optional fields
        value: String,
    },
    /// Remove a definition
    Delete { index: usize },
    /// Check every definition and report problems
    Validate,
    /// Remove every invalid definition
    Purge,
    /// Create upcoming occurrences that are due
    Create,
    /// Message teams about occurrences starting within a day
    Notify,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Arena,
    Swiss,
    Team,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct NewArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "weekly")]
    pub cadence: Cadence,
    /// First start, `YYYY-MM-DD HH:MM` in `--timezone`
    #[arg(long)]
    pub start: String,
    /// IANA zone of `--start`
    #[arg(long, default_value = "UTC")]
    pub timezone: String,
    #[arg(long, value_enum, default_value_t = KindArg::Arena)]
    pub kind: KindArg,
    /// Team members-only restriction (arena) or hosting team (swiss)
    #[arg(long)]
    pub team: Option<String>,
    /// Comma-separated teams of a team battle
    #[arg(long)]
    pub teams: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub leaders: u32,
    #[arg(long, default_value = "standard")]
    pub variant: Variant,
    /// Starting position for the fromPosition variant
    #[arg(long)]
    pub position: Option<String>,
    /// Minutes per player
    #[arg(long, default_value = "3")]
    pub clock_time: ClockTime,
    /// Seconds added per move
    #[arg(long, default_value = "2")]
    pub clock_increment: ClockIncrement,
    /// Tournament length in minutes
    #[arg(long, default_value = "60")]
    pub length: TournamentLength,
    #[arg(long)]
    pub unrated: bool,
    #[arg(long)]
    pub no_berserk: bool,
    #[arg(long)]
    pub no_streaks: bool,
    #[arg(long)]
    pub no_chat: bool,
    #[arg(long)]
    pub min_rating: Option<RatingRestriction>,
    #[arg(long)]
    pub max_rating: Option<RatingRestriction>,
    #[arg(long)]
    pub min_games: Option<GamesRestriction>,
    /// Team message sent the day an occurrence starts
    #[arg(long)]
    pub template: Option<String>,
}

fn template_help() -> String {
    format!("Template tokens: {}", TEMPLATE_TOKENS.join(" "))
}
