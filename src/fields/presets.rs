//! Built-in preset fields.
use super::{EnrichmentField, FieldType};

struct PresetSpec {
    name: &'static str,
    display_name: &'static str,
    description: &'static str,
    field_type: FieldType,
}

const PRESETS: &[PresetSpec] = &[
    PresetSpec {
        name: "companyName",
        display_name: "Company Name",
        description: "The name of the company",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "companyDescription",
        display_name: "Company Description",
        description: "A brief description of what the company does",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "industry",
        display_name: "Industry",
        description: "The primary industry the company operates in",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "employeeCount",
        display_name: "Employee Count",
        description: "The number of employees at the company",
        field_type: FieldType::Number,
    },
    PresetSpec {
        name: "yearFounded",
        display_name: "Year Founded",
        description: "The year the company was founded",
        field_type: FieldType::Number,
    },
    PresetSpec {
        name: "headquarters",
        display_name: "Headquarters",
        description: "The location of the company headquarters",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "revenue",
        display_name: "Revenue",
        description: "The annual revenue of the company",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "fundingRaised",
        display_name: "Funding Raised",
        description: "Total funding raised by the company",
        field_type: FieldType::String,
    },
    PresetSpec {
        name: "fundingStage",
        display_name: "Funding Stage",
        description: "The current funding stage (e.g., Pre-seed, Seed, Series A, Series B, Series C, Series D+, IPO)",
        field_type: FieldType::String,
    },
];

/// Presets selected when a configuration starts.
pub const DEFAULT_PRESET_NAMES: &[&str] = &["companyName", "companyDescription", "industry"];

impl PresetSpec {
    fn to_field(&self) -> EnrichmentField {
        EnrichmentField {
            name: self.name.to_string(),
            display_name: self.display_name.to_string(),
            description: self.description.to_string(),
            field_type: self.field_type,
            required: false,
        }
    }
}

/// The full catalog in display order.
pub fn preset_fields() -> Vec<EnrichmentField> {
    PRESETS.iter().map(PresetSpec::to_field).collect()
}

/// Look up a preset by machine name.
pub fn preset(name: &str) -> Option<EnrichmentField> {
    PRESETS
        .iter()
        .find(|spec| spec.name == name)
        .map(PresetSpec::to_field)
}

pub fn default_selection() -> Vec<EnrichmentField> {
    DEFAULT_PRESET_NAMES.iter().filter_map(|name| preset(name)).collect()
}
