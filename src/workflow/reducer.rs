//! Pure workflow transitions.
//!
//! `reduce(state, action)` never performs I/O. A rejected action leaves the
//! state exactly as it was, except that a failed generation response still
//! clears the in-flight marker so the user can retry.
use crate::dataset::Dataset;
use crate::detect::{detect_email_column, EmailDetection};
use crate::error::EnrichError;
use crate::fields::{
    default_selection, generate_field_name, preset, EnrichmentField, FieldSelection, ManualField,
};
use crate::generate::{translate_suggestions, GeneratedField};

use super::state::{ConfigurePhase, FinalizedConfig, Step, WorkflowState};

/// Every user action or completed external call the workflow reacts to.
#[derive(Debug, Clone)]
pub enum Action {
    /// Rows and columns arrived from the uploader.
    Upload {
        columns: Vec<String>,
        detection: EmailDetection,
    },
    SelectEmailColumn(String),
    AdvanceToFields,
    AddPreset(String),
    AddField(EnrichmentField),
    AddManualField(ManualField),
    RemoveField(String),
    /// `now_ms` stamps the request; a pending request older than `lease_ms`
    /// is treated as abandoned.
    BeginGeneration {
        prompt: String,
        now_ms: u64,
        lease_ms: u64,
    },
    FinishGeneration {
        seq: u64,
        result: Result<Vec<GeneratedField>, EnrichError>,
    },
    /// Index into the pending suggestion list.
    AcceptSuggestion(usize),
    RejectSuggestion(usize),
    Start,
    Back,
    Reset,
}

impl Action {
    /// Upload action for `dataset`, running email detection once.
    pub fn upload(dataset: &Dataset) -> Self {
        Action::Upload {
            columns: dataset.columns.clone(),
            detection: detect_email_column(&dataset.rows, &dataset.columns),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Upload { .. } => "upload",
            Action::SelectEmailColumn(_) => "select_email_column",
            Action::AdvanceToFields => "advance_to_fields",
            Action::AddPreset(_) => "add_preset",
            Action::AddField(_) => "add_field",
            Action::AddManualField(_) => "add_manual_field",
            Action::RemoveField(_) => "remove_field",
            Action::BeginGeneration { .. } => "begin_generation",
            Action::FinishGeneration { .. } => "finish_generation",
            Action::AcceptSuggestion(_) => "accept_suggestion",
            Action::RejectSuggestion(_) => "reject_suggestion",
            Action::Start => "start",
            Action::Back => "back",
            Action::Reset => "reset",
        }
    }
}

/// Side information produced by a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    GenerationIssued(u64),
    SuggestionsReceived(usize),
    StaleResponseDiscarded(u64),
    Finalized(FinalizedConfig),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: WorkflowState,
    pub outcome: Result<Effect, EnrichError>,
}

pub fn reduce(state: &WorkflowState, action: Action) -> Transition {
    let action_name = action.name();
    let mut next = state.clone();
    let outcome = apply(&mut next, action);
    match &outcome {
        Ok(effect) => {
            tracing::debug!(
                action = action_name,
                from = state.step.as_str(),
                to = next.step.as_str(),
                ?effect,
                "transition applied"
            );
            Transition {
                state: next,
                outcome,
            }
        }
        Err(err) => {
            tracing::debug!(
                action = action_name,
                step = state.step.as_str(),
                error = %err,
                "transition rejected"
            );
            let state = match err {
                EnrichError::GenerationFailed(_) => next,
                _ => state.clone(),
            };
            Transition { state, outcome }
        }
    }
}

fn apply(state: &mut WorkflowState, action: Action) -> Result<Effect, EnrichError> {
    match action {
        Action::Upload { columns, detection } => {
            if state.step != Step::Upload {
                return Err(EnrichError::StepBlocked(
                    "a dataset is already loaded; go back to upload a new one".to_string(),
                ));
            }
            if columns.is_empty() {
                return Err(EnrichError::InvalidInput("dataset has no columns".to_string()));
            }
            let mut fresh = state.restarted();
            fresh.email_column = detection.auto_accepted().map(str::to_string);
            fresh.detection = Some(detection);
            fresh.columns = columns;
            fresh.selected = FieldSelection::from_fields(default_selection())?;
            fresh.step = Step::Configure(ConfigurePhase::EmailColumn);
            *state = fresh;
            Ok(Effect::None)
        }
        Action::SelectEmailColumn(column) => {
            if !matches!(state.step, Step::Configure(_)) {
                return Err(blocked(state.step, "change the email column"));
            }
            if !state.columns.contains(&column) {
                return Err(EnrichError::InvalidInput(format!(
                    "`{column}` is not a column of this dataset"
                )));
            }
            state.email_column = Some(column);
            Ok(Effect::None)
        }
        Action::AdvanceToFields => match state.step {
            Step::Configure(ConfigurePhase::EmailColumn) => {
                require_email_column(state)?;
                state.step = Step::Configure(ConfigurePhase::Fields);
                Ok(Effect::None)
            }
            Step::Configure(ConfigurePhase::Fields) => Ok(Effect::None),
            step => Err(blocked(step, "advance to field selection")),
        },
        Action::AddPreset(name) => {
            require_fields_phase(state)?;
            let field = preset(&name)
                .ok_or_else(|| EnrichError::InvalidInput(format!("unknown preset `{name}`")))?;
            state.selected = state.selected.add(field)?;
            Ok(Effect::None)
        }
        Action::AddField(field) => {
            require_fields_phase(state)?;
            state.selected = state.selected.add(field)?;
            Ok(Effect::None)
        }
        Action::AddManualField(manual) => {
            require_fields_phase(state)?;
            let field = manual.into_field(state.selected.names().as_slice())?;
            state.selected = state.selected.add(field)?;
            Ok(Effect::None)
        }
        Action::RemoveField(name) => {
            require_fields_phase(state)?;
            state.selected = state.selected.remove(&name);
            Ok(Effect::None)
        }
        Action::BeginGeneration {
            prompt,
            now_ms,
            lease_ms,
        } => {
            require_fields_phase(state)?;
            if prompt.trim().is_empty() {
                return Err(EnrichError::InvalidInput(
                    "describe the fields you want to add".to_string(),
                ));
            }
            if let Some(seq) = state.generation.in_flight {
                if !state.generation.is_expired(now_ms, lease_ms) {
                    return Err(EnrichError::GenerationInFlight(seq));
                }
                tracing::warn!(seq, "reclaiming expired generation request");
                state.generation.abandon();
            }
            Ok(Effect::GenerationIssued(state.generation.issue(now_ms)))
        }
        Action::FinishGeneration { seq, result } => {
            if !state.generation.is_current(seq) {
                tracing::info!(seq, "discarding stale generation response");
                return Ok(Effect::StaleResponseDiscarded(seq));
            }
            state.generation.abandon();
            let generated = result?;
            let mut taken: Vec<&str> = state.selected.names();
            taken.extend(state.suggestions.iter().map(|field| field.name.as_str()));
            let proposals = translate_suggestions(generated, taken.as_slice());
            let count = proposals.len();
            state.suggestions.extend(proposals);
            Ok(Effect::SuggestionsReceived(count))
        }
        Action::AcceptSuggestion(index) => {
            require_fields_phase(state)?;
            let mut candidate = suggestion_at(state, index)?.clone();
            if state.selected.contains(&candidate.name) {
                let mut taken = state.selected.names();
                taken.extend(
                    state
                        .suggestions
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| *idx != index)
                        .map(|(_, field)| field.name.as_str()),
                );
                candidate.name = generate_field_name(&candidate.display_name, taken.as_slice());
            }
            state.selected = state.selected.add(candidate)?;
            state.suggestions.remove(index);
            Ok(Effect::None)
        }
        Action::RejectSuggestion(index) => {
            require_fields_phase(state)?;
            suggestion_at(state, index)?;
            state.suggestions.remove(index);
            Ok(Effect::None)
        }
        Action::Start => {
            if state.step != Step::Configure(ConfigurePhase::Fields) {
                return Err(blocked(state.step, "start enrichment"));
            }
            let email_column = require_email_column(state)?.to_string();
            if state.selected.is_empty() {
                return Err(EnrichError::StepBlocked(
                    "select at least one field to enrich".to_string(),
                ));
            }
            let config = FinalizedConfig {
                email_column,
                fields: state.selected.fields().to_vec(),
            };
            state.generation.abandon();
            state.finalized = Some(config.clone());
            state.step = Step::Running;
            Ok(Effect::Finalized(config))
        }
        Action::Back => match state.step {
            Step::Running => {
                state.finalized = None;
                state.step = Step::Configure(ConfigurePhase::Fields);
                Ok(Effect::None)
            }
            Step::Configure(_) => {
                *state = state.restarted();
                Ok(Effect::None)
            }
            Step::Upload => Err(blocked(Step::Upload, "go back")),
        },
        Action::Reset => {
            *state = state.restarted();
            Ok(Effect::None)
        }
    }
}

fn blocked(step: Step, what: &str) -> EnrichError {
    EnrichError::StepBlocked(format!("cannot {what} during {}", step.label()))
}

fn require_fields_phase(state: &WorkflowState) -> Result<(), EnrichError> {
    match state.step {
        Step::Configure(ConfigurePhase::Fields) => Ok(()),
        Step::Configure(ConfigurePhase::EmailColumn) => Err(EnrichError::StepBlocked(
            "confirm the email column before editing fields".to_string(),
        )),
        step => Err(blocked(step, "edit fields")),
    }
}

fn require_email_column(state: &WorkflowState) -> Result<&str, EnrichError> {
    state
        .email_column
        .as_deref()
        .filter(|column| !column.trim().is_empty())
        .ok_or_else(|| EnrichError::StepBlocked("select an email column first".to_string()))
}

fn suggestion_at(state: &WorkflowState, index: usize) -> Result<&EnrichmentField, EnrichError> {
    state.suggestions.get(index).ok_or_else(|| {
        EnrichError::InvalidInput(format!(
            "no suggestion #{} ({} pending)",
            index + 1,
            state.suggestions.len()
        ))
    })
}
