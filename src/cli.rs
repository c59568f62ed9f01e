//! CLI argument parsing for the enrichment configuration workflow.
//!
//! Every session command loads state from `--session`, applies one transition
//! and writes the state back.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::fields::FieldType;

/// Session directory used when `--session` is omitted.
pub const DEFAULT_SESSION_DIR: &str = ".lenrich";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "lenrich",
    version,
    about = "Configure lead enrichment for a spreadsheet of contacts",
    after_help = "Commands:\n  init --input <file>          Upload a CSV/JSON dataset and detect the email column\n  status                       Summarize the session and next action\n  email --column <name>        Pick the email column\n  next                         Confirm the email column and move to field selection\n  fields add|remove|presets    Edit the selected enrichment fields\n  suggest --prompt <text>      Ask the field generator for suggestions\n  accept|reject <n>            Resolve a pending suggestion\n  start                        Finalize the configuration (writes enrichment.json)\n  back | reset                 Step back or start over\n  keys set|status              Manage API keys\n\nExamples:\n  lenrich init --session /tmp/leads --input leads.csv\n  lenrich next --session /tmp/leads\n  lenrich suggest --session /tmp/leads --prompt \"funding stage and CEO name\"\n  lenrich accept --session /tmp/leads 1\n  lenrich start --session /tmp/leads",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug detail to stderr (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Detect(DetectArgs),
    Status(StatusArgs),
    Email(EmailArgs),
    Next(SessionArgs),
    #[command(subcommand)]
    Fields(FieldsCommand),
    Suggest(SuggestArgs),
    Accept(SuggestionArgs),
    Reject(SuggestionArgs),
    Start(SessionArgs),
    Back(SessionArgs),
    Reset(SessionArgs),
    #[command(subcommand)]
    Keys(KeysCommand),
}

/// Session directory holding dataset, state, and config.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Session directory
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SESSION_DIR)]
    pub session: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Upload a dataset and move to email column selection")]
pub struct InitArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// CSV or JSON dataset; defaults to the dataset retained in the session
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Discard an in-progress configuration and start over
    #[arg(long)]
    pub force: bool,

    /// Upload even when API keys are missing
    #[arg(long)]
    pub skip_key_check: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Detect the email column of a dataset")]
pub struct DetectArgs {
    /// CSV or JSON dataset
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Summarize the session and next action")]
pub struct StatusArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Select the email column")]
pub struct EmailArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[arg(long, value_name = "NAME")]
    pub column: String,
}

#[derive(Subcommand, Debug)]
pub enum FieldsCommand {
    /// List the preset field catalog
    Presets,
    /// Add a preset or a manually described field
    Add(FieldsAddArgs),
    /// Remove a selected field by its generated name
    Remove(FieldsRemoveArgs),
}

#[derive(Parser, Debug)]
pub struct FieldsAddArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Preset field name (see `lenrich fields presets`)
    #[arg(long, value_name = "NAME", conflicts_with_all = ["name", "description"])]
    pub preset: Option<String>,

    /// Display name of a custom field
    #[arg(long, value_name = "DISPLAY", requires = "description")]
    pub name: Option<String>,

    /// What the custom field should contain
    #[arg(long, value_name = "TEXT", requires = "name")]
    pub description: Option<String>,

    /// Value type of a custom field
    #[arg(long = "type", value_name = "TYPE", default_value = "string", requires = "name")]
    pub field_type: FieldType,
}

#[derive(Parser, Debug)]
pub struct FieldsRemoveArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Field name as shown by `lenrich status`
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Parser, Debug)]
#[command(about = "Ask the field generator to propose fields")]
pub struct SuggestArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Natural-language description of the data you want
    #[arg(long, value_name = "TEXT")]
    pub prompt: String,

    /// Field generation endpoint
    #[arg(long, value_name = "URL", conflicts_with = "command")]
    pub url: Option<String>,

    /// Local command that reads the request on stdin and prints the response
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SuggestionArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Suggestion number as listed by `lenrich status`
    #[arg(value_name = "INDEX", value_parser = clap::value_parser!(u64).range(1..))]
    pub index: u64,
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Store an API key
    Set(KeysSetArgs),
    /// Show which required keys are configured
    Status,
}

#[derive(Parser, Debug)]
pub struct KeysSetArgs {
    /// Key name (firecrawl_api_key or openai_api_key)
    #[arg(value_name = "NAME")]
    pub name: String,

    #[arg(value_name = "VALUE")]
    pub value: String,
}
