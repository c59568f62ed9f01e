//! Persisted workflow state.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detect::EmailDetection;
use crate::fields::{EnrichmentField, FieldSelection};

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Sub-step inside Configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurePhase {
    EmailColumn,
    Fields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "phase", rename_all = "snake_case")]
pub enum Step {
    #[default]
    Upload,
    Configure(ConfigurePhase),
    Running,
}

impl Step {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Configure(ConfigurePhase::EmailColumn) => "configure.email_column",
            Step::Configure(ConfigurePhase::Fields) => "configure.fields",
            Step::Running => "running",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::Upload => "Upload",
            Step::Configure(ConfigurePhase::EmailColumn) => "Step 1: confirm email column",
            Step::Configure(ConfigurePhase::Fields) => "Step 2: select fields",
            Step::Running => "Running",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequence numbers for field generation requests.
///
/// Only the response whose number matches `in_flight` is applied; anything else
/// is a superseded or abandoned request.
///
/// `issued_at_ms` lets a later request reclaim a marker whose owner died
/// before reporting back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTracker {
    pub last_issued: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_flight: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at_ms: Option<u64>,
}

impl GenerationTracker {
    pub(crate) fn issue(&mut self, now_ms: u64) -> u64 {
        self.last_issued += 1;
        self.in_flight = Some(self.last_issued);
        self.issued_at_ms = Some(now_ms);
        self.last_issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.in_flight == Some(seq)
    }

    /// Whether the pending request has outlived `lease_ms`. A marker without
    /// a timestamp has no owner to wait for.
    pub fn is_expired(&self, now_ms: u64, lease_ms: u64) -> bool {
        self.issued_at_ms
            .is_none_or(|issued| now_ms.saturating_sub(issued) >= lease_ms)
    }

    pub(crate) fn abandon(&mut self) {
        self.in_flight = None;
        self.issued_at_ms = None;
    }
}

/// The configuration handed to the enrichment executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedConfig {
    pub email_column: String,
    /// In selection order.
    pub fields: Vec<EnrichmentField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub schema_version: u32,
    pub step: Step,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<EmailDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_column: Option<String>,
    #[serde(default)]
    pub selected: FieldSelection,
    /// Generated fields awaiting accept/reject.
    #[serde(default)]
    pub suggestions: Vec<EnrichmentField>,
    #[serde(default)]
    pub generation: GenerationTracker,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized: Option<FinalizedConfig>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            step: Step::Upload,
            columns: Vec::new(),
            detection: None,
            email_column: None,
            selected: FieldSelection::new(),
            suggestions: Vec::new(),
            generation: GenerationTracker::default(),
            finalized: None,
        }
    }
}

impl WorkflowState {
    /// Fresh Upload state that keeps the request counter monotonic.
    pub(crate) fn restarted(&self) -> Self {
        Self {
            generation: GenerationTracker {
                last_issued: self.generation.last_issued,
                ..GenerationTracker::default()
            },
            ..Self::default()
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generation.in_flight.is_some()
    }
}
