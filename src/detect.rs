//! Email column detection.
//!
//! Each column gets a 0-100 score from two signals: how much its name looks like
//! an email header (strong), and what share of its sampled non-empty values are
//! email-shaped (corroborating). Only the first [`DETECTION_SAMPLE_ROWS`] rows
//! are sampled so large uploads stay cheap.
use serde::{Deserialize, Serialize};

use crate::dataset::{cell, Row};
use crate::email::is_email_shaped;

/// Confidence at which a detected column is pre-selected.
pub const EMAIL_AUTO_ACCEPT_CONFIDENCE: u8 = 50;
/// Rows sampled per column when scoring values.
pub const DETECTION_SAMPLE_ROWS: usize = 100;
/// Scores at or below this floor are not reported as a detection.
pub const MIN_DETECTION_SCORE: u8 = 10;

const EXACT_NAME_SCORE: u32 = 60;
const EMAIL_NAME_SCORE: u32 = 50;
const MAIL_NAME_SCORE: u32 = 30;
const VALUE_SCORE_WEIGHT: f64 = 50.0;

const EXACT_EMAIL_NAMES: &[&str] = &["email", "emails", "emailaddress", "emailaddr"];

/// Outcome of a detection pass. `column_name` is `None` when the user must pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDetection {
    pub column_name: Option<String>,
    pub confidence: u8,
}

impl EmailDetection {
    /// Column to pre-select, if the detection is confident enough.
    pub fn auto_accepted(&self) -> Option<&str> {
        self.column_name
            .as_deref()
            .filter(|_| self.confidence >= EMAIL_AUTO_ACCEPT_CONFIDENCE)
    }
}

/// Score breakdown for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnScore {
    pub column: String,
    pub name_score: u8,
    pub value_score: u8,
    pub sampled: usize,
    pub email_shaped: usize,
    pub confidence: u8,
}

/// Pick the column most likely to hold email addresses.
pub fn detect_email_column(rows: &[Row], columns: &[String]) -> EmailDetection {
    let mut best: Option<ColumnScore> = None;
    for score in score_columns(rows, columns) {
        if best
            .as_ref()
            .is_none_or(|current| score.confidence > current.confidence)
        {
            best = Some(score);
        }
    }
    let detection = match best {
        Some(score) if score.confidence > MIN_DETECTION_SCORE => EmailDetection {
            column_name: Some(score.column),
            confidence: score.confidence,
        },
        _ => EmailDetection::default(),
    };
    tracing::debug!(
        column = detection.column_name.as_deref().unwrap_or("<none>"),
        confidence = detection.confidence,
        "email column detection"
    );
    detection
}

/// Score every column in `columns`, in column order.
pub fn score_columns(rows: &[Row], columns: &[String]) -> Vec<ColumnScore> {
    let sample = &rows[..rows.len().min(DETECTION_SAMPLE_ROWS)];
    columns
        .iter()
        .map(|column| score_column(sample, column))
        .collect()
}

fn score_column(sample: &[Row], column: &str) -> ColumnScore {
    let name_score = name_score(column);
    let mut sampled = 0;
    let mut email_shaped = 0;
    for row in sample {
        let value = cell(row, column).trim();
        if value.is_empty() {
            continue;
        }
        sampled += 1;
        if is_email_shaped(value) {
            email_shaped += 1;
        }
    }
    let value_score = if sampled == 0 {
        0
    } else {
        (email_shaped as f64 / sampled as f64 * VALUE_SCORE_WEIGHT).round() as u32
    };
    let confidence = (name_score + value_score).min(100);
    ColumnScore {
        column: column.to_string(),
        name_score: name_score as u8,
        value_score: value_score as u8,
        sampled,
        email_shaped,
        confidence: confidence as u8,
    }
}

fn name_score(column: &str) -> u32 {
    let normalized: String = column
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    if EXACT_EMAIL_NAMES.contains(&normalized.as_str()) {
        EXACT_NAME_SCORE
    } else if normalized.contains("email") {
        EMAIL_NAME_SCORE
    } else if normalized.contains("mail") {
        MAIL_NAME_SCORE
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn row(cells: &[(&str, &str)]) -> Row {
        cells
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn work_email_column_with_mostly_populated_values_is_confident() {
        let cols = columns(&["Name", "Work Email", "Company"]);
        let rows: Vec<Row> = (0..10)
            .map(|idx| {
                let email = if idx < 8 {
                    format!("person{idx}@company{idx}.com")
                } else {
                    String::new()
                };
                row(&[
                    ("Name", &*format!("Person {idx}")),
                    ("Work Email", email.as_str()),
                    ("Company", "Acme"),
                ])
            })
            .collect();

        let detection = detect_email_column(&rows, &cols);
        assert_eq!(detection.column_name.as_deref(), Some("Work Email"));
        assert!(detection.confidence >= EMAIL_AUTO_ACCEPT_CONFIDENCE);
        assert_eq!(detection.auto_accepted(), Some("Work Email"));
    }

    #[test]
    fn values_alone_can_identify_an_unlabelled_column() {
        let cols = columns(&["Contact", "Notes"]);
        let rows = vec![
            row(&[("Contact", "a@acme.io"), ("Notes", "call back")]),
            row(&[("Contact", "b@beta.io"), ("Notes", "")]),
        ];
        let detection = detect_email_column(&rows, &cols);
        assert_eq!(detection.column_name.as_deref(), Some("Contact"));
        assert_eq!(detection.confidence, 50);
    }

    #[test]
    fn no_plausible_column_yields_none() {
        let cols = columns(&["Name", "Company"]);
        let rows = vec![row(&[("Name", "Jane"), ("Company", "Acme")])];
        let detection = detect_email_column(&rows, &cols);
        assert_eq!(detection, EmailDetection::default());
        assert_eq!(detection.auto_accepted(), None);
    }

    #[test]
    fn weak_name_signal_is_reported_but_not_auto_accepted() {
        let cols = columns(&["Mailing Address"]);
        let rows = vec![row(&[("Mailing Address", "1 Main St")])];
        let detection = detect_email_column(&rows, &cols);
        assert_eq!(detection.column_name.as_deref(), Some("Mailing Address"));
        assert_eq!(detection.confidence, 30);
        assert_eq!(detection.auto_accepted(), None);
    }

    #[test]
    fn ties_resolve_to_the_first_column() {
        let cols = columns(&["Email", "E-mail"]);
        let detection = detect_email_column(&[], &cols);
        assert_eq!(detection.column_name.as_deref(), Some("Email"));
        assert_eq!(detection.confidence, 60);
    }

    #[test]
    fn confidence_stays_in_range_and_names_a_real_column() {
        let cols = columns(&["email", "Email Address", "x"]);
        let rows: Vec<Row> = (0..500)
            .map(|idx| {
                row(&[
                    ("email", &*format!("u{idx}@x.io")),
                    ("Email Address", &*format!("u{idx}@y.io")),
                    ("x", "z"),
                ])
            })
            .collect();
        let detection = detect_email_column(&rows, &cols);
        assert!(detection.confidence <= 100);
        let name = detection.column_name.expect("detected");
        assert!(cols.contains(&name));
        assert_eq!(detection.confidence, 100);
    }

    #[test]
    fn only_the_bounded_sample_is_scored() {
        let cols = columns(&["Contact"]);
        let mut rows: Vec<Row> = (0..DETECTION_SAMPLE_ROWS)
            .map(|_| row(&[("Contact", "not an email")]))
            .collect();
        rows.extend((0..50).map(|idx| row(&[("Contact", &*format!("u{idx}@x.io"))])));
        let scores = score_columns(&rows, &cols);
        assert_eq!(scores[0].sampled, DETECTION_SAMPLE_ROWS);
        assert_eq!(scores[0].email_shaped, 0);
    }

    fn arb_column() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("email".to_string()),
            Just("Work Email".to_string()),
            Just("E-Mail Addr".to_string()),
            Just("mailbox".to_string()),
            "[A-Za-z _-]{0,12}",
        ]
    }

    fn arb_value() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-z]{1,6}@[a-z]{1,6}\\.[a-z]{2,3}",
            "[ -~]{0,16}",
        ]
    }

    fn arb_table() -> impl Strategy<Value = (Vec<String>, Vec<Row>)> {
        prop::collection::btree_set(arb_column(), 1..6).prop_flat_map(|names| {
            let cols: Vec<String> = names.into_iter().collect();
            let width = cols.len();
            let rows = prop::collection::vec(prop::collection::vec(arb_value(), width), 0..130);
            (Just(cols), rows)
        })
        .prop_map(|(cols, values)| {
            let rows: Vec<Row> = values
                .into_iter()
                .map(|cells| cols.iter().cloned().zip(cells).collect::<Row>())
                .collect();
            (cols, rows)
        })
    }

    proptest! {
        #[test]
        fn detection_is_bounded_and_picks_a_listed_column((cols, rows) in arb_table()) {
            let detection = detect_email_column(&rows, &cols);
            prop_assert!(detection.confidence <= 100);
            match detection.column_name.as_deref() {
                Some(name) => {
                    prop_assert!(cols.iter().any(|column| column == name));
                    prop_assert!(detection.confidence > MIN_DETECTION_SCORE);
                }
                None => prop_assert_eq!(detection.confidence, 0),
            }
            for score in score_columns(&rows, &cols) {
                prop_assert!(score.confidence <= 100);
                prop_assert!(score.email_shaped <= score.sampled);
                prop_assert!(score.sampled <= DETECTION_SAMPLE_ROWS);
            }
        }
    }
}
