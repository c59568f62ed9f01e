//! Enrichment field model.
//!
//! A field is a named, typed, described extraction target. Fields come from
//! three places (the preset catalog, natural-language suggestions, and manual
//! entry) and all of them go through the same naming and selection rules.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EnrichError;

pub mod naming;
pub mod presets;
pub mod registry;

pub use naming::generate_field_name;
pub use presets::{default_selection, preset, preset_fields};
pub use registry::FieldSelection;

/// Maximum number of fields selected at once.
pub const MAX_SELECTED_FIELDS: usize = 10;

/// Value type the executor should extract for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
}

impl FieldType {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
        }
    }

    /// Human label shown next to a field.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String => "Text",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Array => "List",
        }
    }

    /// Map a field generator type tag onto an extraction type.
    ///
    /// The generator's `text` and `array` tags both become `String`: list
    /// extraction is not representable downstream yet. Returns `None` for tags
    /// the generator is not documented to emit.
    pub fn from_generator_tag(tag: &str) -> Option<FieldType> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "array" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = EnrichError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "array" | "list" => Ok(FieldType::Array),
            other => Err(EnrichError::InvalidInput(format!(
                "unknown field type `{other}` (expected string, number, boolean or array)"
            ))),
        }
    }
}

/// A single extraction target handed to the enrichment executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentField {
    /// Machine identifier, unique within a selection; used as the output key.
    pub name: String,
    pub display_name: String,
    /// Instruction for what to extract; this is what the executor reads.
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Reserved for strict-mode enrichment.
    #[serde(default)]
    pub required: bool,
}

/// Hand-authored field as submitted by the user, before it has a name.
#[derive(Debug, Clone, Default)]
pub struct ManualField {
    pub display_name: String,
    pub description: String,
    pub field_type: FieldType,
}

impl ManualField {
    /// Validate the submission and assign a name that avoids `existing`.
    pub fn into_field<S: AsRef<str>>(self, existing: &[S]) -> Result<EnrichmentField, EnrichError> {
        let display_name = self.display_name.trim();
        let description = self.description.trim();
        if display_name.is_empty() || description.is_empty() {
            return Err(EnrichError::InvalidInput(
                "field name and description are both required".to_string(),
            ));
        }
        Ok(EnrichmentField {
            name: generate_field_name(display_name, existing),
            display_name: display_name.to_string(),
            description: description.to_string(),
            field_type: self.field_type,
            required: false,
        })
    }
}
