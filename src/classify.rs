//! Skippable-row heuristic.
//!
//! Classification is advisory: it feeds the cost warning shown before a run and
//! never removes rows. Whether a row is actually enriched is the executor's call.
use serde::Serialize;
use std::fmt;

use crate::dataset::{cell, Row};
use crate::email::{domain_of, is_email_shaped};

/// Free/consumer providers whose addresses rarely lead to company data.
pub const PERSONAL_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowClass {
    Empty,
    Invalid,
    PersonalDomain,
    Enrichable,
}

impl RowClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowClass::Empty => "empty",
            RowClass::Invalid => "invalid",
            RowClass::PersonalDomain => "personal_domain",
            RowClass::Enrichable => "enrichable",
        }
    }

    /// Preview label for the email cell: shape only, domain ignored.
    pub fn email_label(&self) -> &'static str {
        match self {
            RowClass::Empty => "empty",
            RowClass::Invalid => "invalid",
            RowClass::PersonalDomain | RowClass::Enrichable => "valid",
        }
    }
}

impl fmt::Display for RowClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the email found in `email_column` of `row`.
pub fn classify_row(row: &Row, email_column: &str) -> RowClass {
    let email = cell(row, email_column).trim().to_lowercase();
    if email.is_empty() {
        return RowClass::Empty;
    }
    if !is_email_shaped(&email) {
        return RowClass::Invalid;
    }
    match domain_of(&email) {
        Some(domain) if PERSONAL_EMAIL_DOMAINS.contains(&domain) => RowClass::PersonalDomain,
        _ => RowClass::Enrichable,
    }
}

/// Per-class row counts over a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipSummary {
    pub total: usize,
    pub empty: usize,
    pub invalid: usize,
    pub personal_domain: usize,
    pub enrichable: usize,
}

impl SkipSummary {
    pub fn from_rows(rows: &[Row], email_column: &str) -> Self {
        let mut summary = SkipSummary::default();
        for row in rows {
            summary.total += 1;
            match classify_row(row, email_column) {
                RowClass::Empty => summary.empty += 1,
                RowClass::Invalid => summary.invalid += 1,
                RowClass::PersonalDomain => summary.personal_domain += 1,
                RowClass::Enrichable => summary.enrichable += 1,
            }
        }
        summary
    }

    /// Warning text about personal-provider rows, if there are any.
    pub fn warning(&self) -> Option<String> {
        if self.personal_domain == 0 {
            return None;
        }
        Some(format!(
            "{} emails from common providers (Gmail, Yahoo, etc.) will be skipped to save API calls; \
             these are typically personal emails without company information",
            self.personal_domain
        ))
    }
}
