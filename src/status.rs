//! Status summaries for the CLI.
use serde::Serialize;

use crate::classify::{classify_row, SkipSummary};
use crate::dataset::{cell, Dataset};
use crate::detect::EmailDetection;
use crate::fields::{EnrichmentField, MAX_SELECTED_FIELDS};
use crate::workflow::state::WorkflowState;

/// Rows shown in the preview table.
pub const PREVIEW_ROWS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub step: &'static str,
    pub step_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<EmailDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_column: Option<String>,
    pub columns: Vec<String>,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_summary: Option<SkipSummary>,
    pub selected_fields: Vec<EnrichmentField>,
    pub max_fields: usize,
    pub suggestions: Vec<EnrichmentField>,
    pub generating: bool,
    pub preview: Vec<PreviewRow>,
    pub missing_credentials: Vec<&'static str>,
    pub next_action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewRow {
    pub email: String,
    pub email_status: &'static str,
    pub class: &'static str,
}

pub fn build_status_summary(
    state: &WorkflowState,
    dataset: Option<&Dataset>,
    missing_credentials: Vec<&'static str>,
) -> StatusSummary {
    let email_column = state.email_column.clone();
    let skip_summary = match (dataset, email_column.as_deref()) {
        (Some(dataset), Some(column)) => Some(SkipSummary::from_rows(&dataset.rows, column)),
        _ => None,
    };
    let preview = match (dataset, email_column.as_deref()) {
        (Some(dataset), Some(column)) => dataset
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|row| {
                let class = classify_row(row, column);
                PreviewRow {
                    email: cell(row, column).trim().to_string(),
                    email_status: class.email_label(),
                    class: class.as_str(),
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    StatusSummary {
        step: state.step.as_str(),
        step_label: state.step.label(),
        detection: state.detection.clone(),
        email_column,
        columns: state.columns.clone(),
        row_count: dataset.map_or(0, |dataset| dataset.rows.len()),
        skip_summary,
        selected_fields: state.selected.fields().to_vec(),
        max_fields: MAX_SELECTED_FIELDS,
        suggestions: state.suggestions.clone(),
        generating: state.is_generating(),
        preview,
        next_action: next_action(state, &missing_credentials),
        missing_credentials,
    }
}

fn next_action(state: &WorkflowState, missing_credentials: &[&str]) -> String {
    use crate::workflow::state::{ConfigurePhase, Step};
    match state.step {
        Step::Upload if !missing_credentials.is_empty() => format!(
            "store API keys with `lenrich keys set` ({})",
            missing_credentials.join(", ")
        ),
        Step::Upload => "upload a dataset with `lenrich init --input <file>`".to_string(),
        Step::Configure(ConfigurePhase::EmailColumn) if state.email_column.is_none() => {
            "pick the email column with `lenrich email --column <name>`".to_string()
        }
        Step::Configure(ConfigurePhase::EmailColumn) => {
            "confirm the email column with `lenrich next`".to_string()
        }
        Step::Configure(ConfigurePhase::Fields) if state.selected.is_empty() => {
            "select at least one field with `lenrich fields add`".to_string()
        }
        Step::Configure(ConfigurePhase::Fields) if !state.suggestions.is_empty() => {
            "review suggestions with `lenrich accept` / `lenrich reject`, then `lenrich start`"
                .to_string()
        }
        Step::Configure(ConfigurePhase::Fields) => "start enrichment with `lenrich start`".to_string(),
        Step::Running => "configuration handed off (see enrichment.json)".to_string(),
    }
}

/// Human-readable rendering of a summary.
pub fn render_status_text(summary: &StatusSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("step: {}\n", summary.step_label));
    if summary.row_count > 0 || !summary.columns.is_empty() {
        out.push_str(&format!(
            "dataset: {} rows, columns: {}\n",
            summary.row_count,
            summary.columns.join(", ")
        ));
    }
    if let Some(detection) = &summary.detection {
        match detection.column_name.as_deref() {
            Some(column) => out.push_str(&format!(
                "detected email column: {column} (confidence {})\n",
                detection.confidence
            )),
            None => out.push_str("detected email column: none (pick one)\n"),
        }
    }
    if let Some(column) = &summary.email_column {
        out.push_str(&format!("email column: {column}\n"));
    }
    if let Some(skip) = &summary.skip_summary {
        out.push_str(&format!(
            "rows: {} enrichable, {} personal, {} invalid, {} empty\n",
            skip.enrichable, skip.personal_domain, skip.invalid, skip.empty
        ));
        if let Some(warning) = skip.warning() {
            out.push_str(&format!("note: {warning}\n"));
        }
    }
    for row in &summary.preview {
        let email = if row.email.is_empty() { "-" } else { row.email.as_str() };
        out.push_str(&format!("  {email} [{}]\n", row.email_status));
    }
    if !summary.selected_fields.is_empty() || summary.step.starts_with("configure") {
        out.push_str(&format!(
            "fields ({}/{}):\n",
            summary.selected_fields.len(),
            summary.max_fields
        ));
        for field in &summary.selected_fields {
            out.push_str(&format!(
                "  {} ({}, {}): {}\n",
                field.display_name,
                field.name,
                field.field_type.label(),
                field.description
            ));
        }
    }
    if !summary.suggestions.is_empty() {
        out.push_str("suggested fields:\n");
        for (idx, field) in summary.suggestions.iter().enumerate() {
            out.push_str(&format!(
                "  #{} {} ({}): {}\n",
                idx + 1,
                field.display_name,
                field.field_type.label(),
                field.description
            ));
        }
    }
    if summary.generating {
        out.push_str("generating: a field generation request is pending\n");
    }
    if !summary.missing_credentials.is_empty() {
        out.push_str(&format!(
            "missing credentials: {}\n",
            summary.missing_credentials.join(", ")
        ));
    }
    out.push_str(&format!("next: {}\n", summary.next_action));
    out
}
