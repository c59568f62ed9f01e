//! Selected-field registry.
//!
//! Every mutation returns a new selection or an error; the old selection is
//! never partially updated. Insertion order is preserved because it drives
//! display and output-column order.
use serde::{Deserialize, Serialize};

use super::{EnrichmentField, MAX_SELECTED_FIELDS};
use crate::error::EnrichError;

/// Ordered set of selected fields, at most [`MAX_SELECTED_FIELDS`] long with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EnrichmentField>", into = "Vec<EnrichmentField>")]
pub struct FieldSelection {
    fields: Vec<EnrichmentField>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection by adding `fields` in order; fails on the first violation.
    pub fn from_fields(fields: Vec<EnrichmentField>) -> Result<Self, EnrichError> {
        fields
            .into_iter()
            .try_fold(Self::new(), |selection, field| selection.add(field))
    }

    pub fn fields(&self) -> &[EnrichmentField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fields.len() >= MAX_SELECTED_FIELDS
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Append `field`, rejecting an 11th field or a repeated name.
    pub fn add(&self, field: EnrichmentField) -> Result<Self, EnrichError> {
        if self.is_full() {
            return Err(EnrichError::CapacityExceeded);
        }
        if self.contains(&field.name) {
            return Err(EnrichError::Duplicate(field.name));
        }
        let mut fields = self.fields.clone();
        fields.push(field);
        Ok(Self { fields })
    }

    /// Drop the field named `name`; absent names are a no-op.
    pub fn remove(&self, name: &str) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|field| field.name != name)
                .cloned()
                .collect(),
        }
    }
}

impl TryFrom<Vec<EnrichmentField>> for FieldSelection {
    type Error = EnrichError;

    fn try_from(fields: Vec<EnrichmentField>) -> Result<Self, Self::Error> {
        Self::from_fields(fields)
    }
}

impl From<FieldSelection> for Vec<EnrichmentField> {
    fn from(selection: FieldSelection) -> Self {
        selection.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{preset, preset_fields, FieldType};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn field(name: &str) -> EnrichmentField {
        EnrichmentField {
            name: name.to_string(),
            display_name: name.to_string(),
            description: format!("describe {name}"),
            field_type: FieldType::String,
            required: false,
        }
    }

    fn full_selection() -> FieldSelection {
        let mut fields = preset_fields();
        fields.push(field("ceoName"));
        FieldSelection::from_fields(fields).expect("ten fields fit")
    }

    #[test]
    fn add_preserves_insertion_order() {
        let selection = FieldSelection::new()
            .add(field("b"))
            .and_then(|s| s.add(field("a")))
            .and_then(|s| s.add(field("c")))
            .expect("three adds");
        assert_eq!(selection.names(), ["b", "a", "c"]);
    }

    #[test]
    fn eleventh_field_is_rejected_and_selection_unchanged() {
        let selection = full_selection();
        assert_eq!(selection.len(), MAX_SELECTED_FIELDS);
        let err = selection.add(field("mission")).unwrap_err();
        assert_eq!(err, EnrichError::CapacityExceeded);
        assert_eq!(selection.len(), MAX_SELECTED_FIELDS);
    }

    #[test]
    fn capacity_is_checked_before_duplicates() {
        let selection = full_selection();
        let err = selection.add(field("ceoName")).unwrap_err();
        assert_eq!(err, EnrichError::CapacityExceeded);
    }

    #[test]
    fn readding_same_name_is_a_silent_duplicate() {
        let selection = FieldSelection::new()
            .add(preset("industry").expect("preset"))
            .expect("first add");
        let err = selection
            .add(preset("industry").expect("preset"))
            .unwrap_err();
        assert!(err.is_silent());
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn removing_missing_name_is_a_no_op() {
        let selection = FieldSelection::new().add(field("a")).expect("add");
        assert_eq!(selection.remove("zzz"), selection);
        assert!(selection.remove("a").is_empty());
    }

    proptest! {
        #[test]
        fn add_and_remove_sequences_keep_invariants(
            ops in prop::collection::vec((any::<bool>(), 0..14usize), 0..200)
        ) {
            let mut selection = FieldSelection::new();
            for (adding, idx) in ops {
                let name = format!("f{idx}");
                if adding {
                    match selection.add(field(&name)) {
                        Ok(next) => {
                            prop_assert_eq!(next.len(), selection.len() + 1);
                            prop_assert_eq!(next.names().last().copied(), Some(name.as_str()));
                            selection = next;
                        }
                        Err(EnrichError::CapacityExceeded) => prop_assert!(selection.is_full()),
                        Err(err) => {
                            prop_assert!(err.is_silent());
                            prop_assert!(selection.contains(&name));
                        }
                    }
                } else {
                    let before: Vec<String> =
                        selection.names().into_iter().map(str::to_string).collect();
                    selection = selection.remove(&name);
                    prop_assert!(!selection.contains(&name));
                    let kept: Vec<String> =
                        before.into_iter().filter(|kept| *kept != name).collect();
                    prop_assert_eq!(selection.names(), kept);
                }
                let unique: BTreeSet<_> = selection.names().into_iter().collect();
                prop_assert!(selection.len() <= MAX_SELECTED_FIELDS);
                prop_assert_eq!(unique.len(), selection.len());
            }
        }
    }

    #[test]
    fn deserializing_rejects_invalid_selection() {
        let json = serde_json::to_string(&vec![field("a"), field("a")]).expect("serialize");
        assert!(serde_json::from_str::<FieldSelection>(&json).is_err());
        let ok = serde_json::to_string(&vec![field("a"), field("b")]).expect("serialize");
        let selection: FieldSelection = serde_json::from_str(&ok).expect("valid selection");
        assert_eq!(selection.names(), ["a", "b"]);
    }
}
