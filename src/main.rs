use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod classify;
mod cli;
mod credentials;
mod dataset;
mod detect;
mod email;
mod error;
mod fields;
mod generate;
mod session;
mod status;
mod workflow;

use cli::{Command, FieldsCommand, KeysCommand, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Init(args) => {
            workflow::run_init(args, &credentials::load_default_credentials()?)
        }
        Command::Detect(args) => workflow::run_detect(args),
        Command::Status(args) => {
            workflow::run_status(args, &credentials::load_default_credentials()?)
        }
        Command::Email(args) => workflow::run_email(args),
        Command::Next(args) => workflow::run_next(args),
        Command::Fields(FieldsCommand::Presets) => workflow::run_fields_presets(),
        Command::Fields(FieldsCommand::Add(args)) => workflow::run_fields_add(args),
        Command::Fields(FieldsCommand::Remove(args)) => workflow::run_fields_remove(args),
        Command::Suggest(args) => {
            workflow::run_suggest(args, &credentials::load_default_credentials()?)
        }
        Command::Accept(args) => workflow::run_accept(args),
        Command::Reject(args) => workflow::run_reject(args),
        Command::Start(args) => workflow::run_start(args),
        Command::Back(args) => workflow::run_back(args),
        Command::Reset(args) => workflow::run_reset(args),
        Command::Keys(KeysCommand::Set(args)) => {
            workflow::run_keys_set(args, &mut credentials::load_default_credentials()?)
        }
        Command::Keys(KeysCommand::Status) => {
            workflow::run_keys_status(&credentials::load_default_credentials()?)
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
