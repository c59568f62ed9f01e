//! Command runners: load the session, apply one transition, persist, print.
use crate::cli::{
    DetectArgs, EmailArgs, FieldsAddArgs, FieldsRemoveArgs, InitArgs, KeysSetArgs, SessionArgs,
    StatusArgs, SuggestArgs, SuggestionArgs,
};
use crate::credentials::{missing_credentials, CredentialsProvider, OPENAI_API_KEY, REQUIRED_KEYS};
use crate::dataset::load_dataset;
use crate::detect::{detect_email_column, score_columns};
use crate::fields::{preset_fields, ManualField};
use crate::generate::{build_generator, request_fields, resolve_generator, GeneratorTarget};
use crate::session::{
    clear_finalized, default_config, load_config, load_retained_dataset_optional, load_state,
    load_state_or_default, write_config, write_dataset, write_finalized, write_state, SessionPaths,
};
use crate::status::{build_status_summary, render_status_text};
use anyhow::{anyhow, Context, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub mod reducer;
pub mod state;

use reducer::{reduce, Action, Effect, Transition};
use state::{Step, WorkflowState};

pub fn run_init(args: InitArgs, credentials: &dyn CredentialsProvider) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state_or_default(&paths)?;
    if state.step != Step::Upload && !args.force {
        return Err(anyhow!(
            "session at {} is already at {} (use --force or `lenrich reset`)",
            paths.root().display(),
            state.step.label()
        ));
    }

    // Read the input before touching the session so a bad path keeps the configuration.
    let dataset = match args.input.as_deref() {
        Some(input) => load_dataset(input)?,
        None => load_retained_dataset_optional(&paths)?.ok_or_else(|| {
            anyhow!(
                "no dataset retained at {} (pass --input <file>)",
                paths.dataset_path().display()
            )
        })?,
    };
    let state = if state.step == Step::Upload {
        state
    } else {
        let (reset, _) = apply_action(&paths, &state, Action::Reset)?;
        clear_finalized(&paths)?;
        reset
    };
    if !paths.config_path().is_file() {
        write_config(&paths, &default_config())?;
    }
    // Retained even when the key check below holds the upload back.
    write_dataset(&paths, &dataset)?;

    if !args.skip_key_check {
        let missing = missing_credentials(credentials);
        if !missing.is_empty() {
            return Err(anyhow!(
                "missing API keys: {} (store them with `lenrich keys set <name> <value>`, then rerun `lenrich init --session {}`)",
                missing.join(", "),
                paths.root().display()
            ));
        }
    }

    let (state, _) = apply_action(&paths, &state, Action::upload(&dataset))?;
    println!(
        "loaded {} rows with {} columns into {}",
        dataset.rows.len(),
        dataset.columns.len(),
        paths.root().display()
    );
    match (&state.detection, state.email_column.as_deref()) {
        (_, Some(column)) => println!("email column: {column}"),
        (Some(detection), None) => match detection.column_name.as_deref() {
            Some(column) => println!(
                "possible email column: {column} (confidence {}); confirm with `lenrich email --column`",
                detection.confidence
            ),
            None => println!("no email column detected; pick one with `lenrich email --column`"),
        },
        (None, None) => {}
    }
    Ok(())
}

pub fn run_detect(args: DetectArgs) -> Result<()> {
    let dataset = load_dataset(&args.input)?;
    let detection = detect_email_column(&dataset.rows, &dataset.columns);
    if args.json {
        let report = serde_json::json!({
            "detection": detection,
            "scores": score_columns(&dataset.rows, &dataset.columns),
        });
        let text = serde_json::to_string_pretty(&report).context("serialize detection report")?;
        println!("{text}");
        return Ok(());
    }
    match detection.column_name.as_deref() {
        Some(column) => println!("{column} (confidence {})", detection.confidence),
        None => println!("no email column detected"),
    }
    Ok(())
}

pub fn run_status(args: StatusArgs, credentials: &dyn CredentialsProvider) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state_or_default(&paths)?;
    let dataset = load_retained_dataset_optional(&paths)?;
    let summary = build_status_summary(&state, dataset.as_ref(), missing_credentials(credentials));
    if args.json {
        let text = serde_json::to_string_pretty(&summary).context("serialize status summary")?;
        println!("{text}");
    } else {
        print!("{}", render_status_text(&summary));
    }
    Ok(())
}

pub fn run_email(args: EmailArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state(&paths)?;
    let (state, _) = apply_action(&paths, &state, Action::SelectEmailColumn(args.column))?;
    if let Some(column) = state.email_column.as_deref() {
        println!("email column: {column}");
    }
    Ok(())
}

pub fn run_next(args: SessionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session);
    let state = load_state(&paths)?;
    let (state, _) = apply_action(&paths, &state, Action::AdvanceToFields)?;
    println!("{}", state.step.label());
    print_selection(&state);
    Ok(())
}

pub fn run_fields_presets() -> Result<()> {
    for field in preset_fields() {
        println!(
            "{:<20} {:<20} {:<8} {}",
            field.name,
            field.display_name,
            field.field_type.label(),
            field.description
        );
    }
    Ok(())
}

pub fn run_fields_add(args: FieldsAddArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state(&paths)?;
    let action = match (args.preset, args.name, args.description) {
        (Some(name), _, _) => Action::AddPreset(name),
        (None, Some(display_name), Some(description)) => Action::AddManualField(ManualField {
            display_name,
            description,
            field_type: args.field_type,
        }),
        _ => return Err(anyhow!("pass --preset <name> or --name and --description")),
    };
    let (state, _) = apply_action(&paths, &state, action)?;
    print_selection(&state);
    Ok(())
}

pub fn run_fields_remove(args: FieldsRemoveArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state(&paths)?;
    let (state, _) = apply_action(&paths, &state, Action::RemoveField(args.name))?;
    print_selection(&state);
    Ok(())
}

/// Issue one generation request. The response is applied to whatever state the
/// session holds when it arrives, so a superseded request is discarded.
///
/// Everything fallible that precedes the call is resolved before the request is
/// recorded; once it is, every outcome is reported through `FinishGeneration`.
pub fn run_suggest(args: SuggestArgs, credentials: &dyn CredentialsProvider) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let config = load_config(&paths)?;
    let state = load_state(&paths)?;
    let target = resolve_generator(
        args.url.as_deref(),
        args.command.as_deref(),
        &config.generator,
    );
    let api_key = match target {
        GeneratorTarget::Http { .. } => credentials.get(OPENAI_API_KEY),
        GeneratorTarget::Command { .. } => None,
    };
    let timeout = Duration::from_secs(config.generator.timeout_secs);
    let generator = build_generator(&target, timeout, api_key);
    let now_ms = now_epoch_ms()?;

    let (issued, effect) = apply_action(
        &paths,
        &state,
        Action::BeginGeneration {
            prompt: args.prompt.clone(),
            now_ms,
            lease_ms: config.generator.timeout_secs.saturating_mul(1_000),
        },
    )?;
    let Effect::GenerationIssued(seq) = effect else {
        return Err(anyhow!("generation request was not issued"));
    };
    tracing::debug!(seq, ?target, "issuing field generation request");
    let result = request_fields(generator.as_ref(), args.prompt.trim());

    let latest = match load_state(&paths) {
        Ok(latest) => latest,
        Err(err) => {
            tracing::warn!(
                seq,
                error = %format!("{err:#}"),
                "re-reading session state failed; applying response to the issuing state"
            );
            issued
        }
    };
    let (state, effect) = apply_action(&paths, &latest, Action::FinishGeneration { seq, result })?;
    match effect {
        Effect::SuggestionsReceived(count) => {
            println!("received {count} suggested fields");
            print_suggestions(&state);
        }
        Effect::StaleResponseDiscarded(seq) => {
            println!("discarded response to request #{seq}; the session moved on");
        }
        _ => {}
    }
    Ok(())
}

pub fn run_accept(args: SuggestionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state(&paths)?;
    let index = suggestion_index(args.index)?;
    let (state, _) = apply_action(&paths, &state, Action::AcceptSuggestion(index))?;
    print_selection(&state);
    print_suggestions(&state);
    Ok(())
}

pub fn run_reject(args: SuggestionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session.session);
    let state = load_state(&paths)?;
    let index = suggestion_index(args.index)?;
    let (state, _) = apply_action(&paths, &state, Action::RejectSuggestion(index))?;
    print_suggestions(&state);
    Ok(())
}

pub fn run_start(args: SessionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session);
    let state = load_state(&paths)?;
    let (_, effect) = apply_action(&paths, &state, Action::Start)?;
    let Effect::Finalized(config) = effect else {
        return Err(anyhow!("start did not finalize the configuration"));
    };
    write_finalized(&paths, &config)?;
    println!(
        "enriching by `{}` with {} fields; wrote {}",
        config.email_column,
        config.fields.len(),
        paths.enrichment_path().display()
    );
    Ok(())
}

pub fn run_back(args: SessionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session);
    let state = load_state(&paths)?;
    let (state, _) = apply_action(&paths, &state, Action::Back)?;
    clear_finalized(&paths)?;
    println!("{}", state.step.label());
    Ok(())
}

pub fn run_reset(args: SessionArgs) -> Result<()> {
    let paths = SessionPaths::new(args.session);
    let state = load_state_or_default(&paths)?;
    let (state, _) = apply_action(&paths, &state, Action::Reset)?;
    clear_finalized(&paths)?;
    println!("{}", state.step.label());
    Ok(())
}

pub fn run_keys_set(args: KeysSetArgs, credentials: &mut dyn CredentialsProvider) -> Result<()> {
    let name = args.name.trim().to_ascii_lowercase();
    if !REQUIRED_KEYS.contains(&name.as_str()) {
        return Err(anyhow!(
            "unknown key `{}` (expected one of: {})",
            args.name,
            REQUIRED_KEYS.join(", ")
        ));
    }
    credentials.set(&name, &args.value)?;
    match credentials.location() {
        Some(path) => println!("stored {name} in {}", path.display()),
        None => println!("stored {name}"),
    }
    Ok(())
}

pub fn run_keys_status(credentials: &dyn CredentialsProvider) -> Result<()> {
    let missing = missing_credentials(credentials);
    for key in REQUIRED_KEYS {
        let state = if missing.contains(key) { "missing" } else { "set" };
        println!("{key}: {state}");
    }
    Ok(())
}

fn now_epoch_ms() -> Result<u64> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis();
    u64::try_from(millis).context("timestamp out of range")
}

/// Reduce and persist. Silent rejections print a note and succeed.
fn apply_action(
    paths: &SessionPaths,
    state: &WorkflowState,
    action: Action,
) -> Result<(WorkflowState, Effect)> {
    let Transition {
        state: next,
        outcome,
    } = reduce(state, action);
    match outcome {
        Ok(effect) => {
            write_state(paths, &next)?;
            Ok((next, effect))
        }
        Err(err) => {
            if next != *state {
                write_state(paths, &next)?;
            }
            if err.is_silent() {
                println!("note: {err}");
                return Ok((next, Effect::None));
            }
            Err(err.into())
        }
    }
}

fn suggestion_index(one_based: u64) -> Result<usize> {
    let index = usize::try_from(one_based).context("suggestion index out of range")?;
    index
        .checked_sub(1)
        .ok_or_else(|| anyhow!("suggestion numbers start at 1"))
}

fn print_selection(state: &WorkflowState) {
    println!(
        "selected fields ({}/{}): {}",
        state.selected.len(),
        crate::fields::MAX_SELECTED_FIELDS,
        state.selected.names().join(", ")
    );
}

fn print_suggestions(state: &WorkflowState) {
    for (idx, field) in state.suggestions.iter().enumerate() {
        println!(
            "  #{} {} ({}, {}): {}",
            idx + 1,
            field.display_name,
            field.name,
            field.field_type.label(),
            field.description
        );
    }
}
