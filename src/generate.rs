//! Natural-language field proposals.
//!
//! A free-text description is sent to an external text-to-schema service and
//! the returned candidates are translated into [`EnrichmentField`]s. Proposals
//! are never merged into the selection here; the workflow holds them until the
//! user accepts or rejects each one.
//!
//! # Transports
//!
//! The service is reached either over HTTP ([`http::HttpFieldGenerator`]) or
//! through a user-configured local command ([`command::CommandFieldGenerator`])
//! that reads the JSON request on stdin and prints the JSON response. Both speak
//! the same envelope:
//!
//! ```text
//! request:  {"prompt": "..."}
//! response: {"success": true, "data": {"fields": [{"displayName", "description", "type"}]}}
//! ```
//!
//! # Configuration
//!
//! The transport is resolved in priority order:
//! 1. `--command` / `--url` CLI flags
//! 2. `generator` in the session `config.json`
//! 3. `LENRICH_GENERATOR_COMMAND` / `LENRICH_GENERATOR_URL`
//! 4. [`DEFAULT_GENERATOR_URL`]
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::EnrichError;
use crate::fields::{generate_field_name, EnrichmentField, FieldType};
use crate::session::GeneratorConfig;

pub mod command;
pub mod http;

pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:3000/api/generate-fields";
pub const GENERATOR_URL_ENV: &str = "LENRICH_GENERATOR_URL";
pub const GENERATOR_COMMAND_ENV: &str = "LENRICH_GENERATOR_COMMAND";

/// Request body sent to the generation service.
#[derive(Debug, Serialize)]
pub struct GenerateFieldsRequest<'a> {
    pub prompt: &'a str,
}

/// Candidate field as returned by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedField {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub type_tag: String,
}

#[derive(Debug, Deserialize)]
struct GenerateFieldsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<GenerateFieldsData>,
}

#[derive(Debug, Deserialize)]
struct GenerateFieldsData {
    #[serde(default)]
    fields: Option<Vec<GeneratedField>>,
}

/// Anything that can turn a prompt into candidate fields.
pub trait FieldGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<Vec<GeneratedField>>;
}

/// Where generation requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorTarget {
    Http { url: String },
    Command { command: String },
}

/// Resolve the generator transport from flags, session config, then environment.
pub fn resolve_generator(
    flag_url: Option<&str>,
    flag_command: Option<&str>,
    config: &GeneratorConfig,
) -> GeneratorTarget {
    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    if let Some(command) = non_empty(flag_command) {
        return GeneratorTarget::Command { command };
    }
    if let Some(url) = non_empty(flag_url) {
        return GeneratorTarget::Http { url };
    }
    if let Some(command) = non_empty(config.command.as_deref()) {
        return GeneratorTarget::Command { command };
    }
    if let Some(url) = non_empty(config.url.as_deref()) {
        return GeneratorTarget::Http { url };
    }
    if let Some(command) = non_empty(env::var(GENERATOR_COMMAND_ENV).ok().as_deref()) {
        return GeneratorTarget::Command { command };
    }
    if let Some(url) = non_empty(env::var(GENERATOR_URL_ENV).ok().as_deref()) {
        return GeneratorTarget::Http { url };
    }
    GeneratorTarget::Http {
        url: DEFAULT_GENERATOR_URL.to_string(),
    }
}

/// Build a generator for `target`. `api_key` is forwarded by the HTTP transport only.
pub fn build_generator(
    target: &GeneratorTarget,
    timeout: Duration,
    api_key: Option<String>,
) -> Box<dyn FieldGenerator> {
    match target {
        GeneratorTarget::Http { url } => {
            Box::new(http::HttpFieldGenerator::new(url.clone(), timeout, api_key))
        }
        GeneratorTarget::Command { command } => {
            Box::new(command::CommandFieldGenerator::new(command.clone(), timeout))
        }
    }
}

/// Call `generator`, folding every transport or payload failure into `GenerationFailed`.
pub fn request_fields(
    generator: &dyn FieldGenerator,
    prompt: &str,
) -> Result<Vec<GeneratedField>, EnrichError> {
    generator.generate(prompt).map_err(|err| {
        tracing::warn!(error = %format!("{err:#}"), "field generation failed");
        match err.downcast::<EnrichError>() {
            Ok(EnrichError::GenerationFailed(reason)) => EnrichError::GenerationFailed(reason),
            Ok(other) => EnrichError::GenerationFailed(other.to_string()),
            Err(err) => EnrichError::GenerationFailed(format!("{err:#}")),
        }
    })
}

/// Parse the service envelope. Anything but a successful, non-empty field list fails.
pub fn parse_generation_response(body: &str) -> Result<Vec<GeneratedField>, EnrichError> {
    let response: GenerateFieldsResponse = serde_json::from_str(body.trim())
        .map_err(|err| EnrichError::GenerationFailed(format!("invalid response JSON: {err}")))?;
    if !response.success {
        return Err(EnrichError::GenerationFailed(
            "service reported success=false".to_string(),
        ));
    }
    let fields = response
        .data
        .and_then(|data| data.fields)
        .ok_or_else(|| EnrichError::GenerationFailed("response missing data.fields".to_string()))?;
    if fields.is_empty() {
        return Err(EnrichError::GenerationFailed(
            "service returned no fields".to_string(),
        ));
    }
    let returned = fields.len();
    let usable: Vec<GeneratedField> = fields
        .into_iter()
        .filter(|field| {
            let named = !field.display_name.trim().is_empty();
            if !named {
                tracing::warn!(
                    description = field.description.as_str(),
                    "dropping generated field without a display name"
                );
            }
            named
        })
        .collect();
    if usable.is_empty() {
        return Err(EnrichError::GenerationFailed(format!(
            "service returned {returned} fields, none with a display name"
        )));
    }
    Ok(usable)
}

/// Translate candidates into fields named so they avoid `taken` and each other.
pub fn translate_suggestions<S: AsRef<str>>(
    generated: Vec<GeneratedField>,
    taken: &[S],
) -> Vec<EnrichmentField> {
    let mut names: Vec<String> = taken.iter().map(|name| name.as_ref().to_string()).collect();
    let mut fields = Vec::with_capacity(generated.len());
    for candidate in generated {
        let field_type = FieldType::from_generator_tag(&candidate.type_tag).unwrap_or_else(|| {
            tracing::warn!(
                tag = candidate.type_tag.as_str(),
                field = candidate.display_name.as_str(),
                "unknown generator type tag; using string"
            );
            FieldType::String
        });
        let name = generate_field_name(&candidate.display_name, names.as_slice());
        names.push(name.clone());
        fields.push(EnrichmentField {
            name,
            display_name: candidate.display_name.trim().to_string(),
            description: candidate.description.trim().to_string(),
            field_type,
            required: false,
        });
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGenerator(anyhow::Result<String>);

    impl FieldGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> anyhow::Result<Vec<GeneratedField>> {
            match &self.0 {
                Ok(body) => Ok(parse_generation_response(body)?),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    const GOOD: &str = r#"{
      "success": true,
      "data": {"fields": [
        {"displayName": "CEO Name", "description": "Name of the CEO", "type": "text"},
        {"displayName": "Product Lines", "description": "Main products", "type": "array"},
        {"displayName": "Is Public", "description": "Publicly traded?", "type": "boolean"},
        {"displayName": "Office Count", "description": "Number of offices", "type": "number"}
      ]}
    }"#;

    #[test]
    fn parses_successful_envelope() {
        let fields = parse_generation_response(GOOD).expect("valid envelope");
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].display_name, "CEO Name");
        assert_eq!(fields[1].type_tag, "array");
    }

    #[test]
    fn malformed_envelopes_fail_generation() {
        for body in [
            r#"{"success": false}"#,
            r#"{"success": true}"#,
            r#"{"success": true, "data": {}}"#,
            r#"{"success": true, "data": {"fields": []}}"#,
            "not json",
            "",
        ] {
            assert!(
                matches!(
                    parse_generation_response(body),
                    Err(EnrichError::GenerationFailed(_))
                ),
                "{body:?} should fail"
            );
        }
    }

    #[test]
    fn candidates_without_display_names_are_dropped() {
        let body = r#"{"success": true, "data": {"fields": [
            {"displayName": "   ", "description": "blank", "type": "text"},
            {"displayName": "CEO Name", "description": "Name of the CEO", "type": "text"},
            {"description": "missing", "type": "number"}
        ]}}"#;
        let fields = parse_generation_response(body).expect("one usable field");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].display_name, "CEO Name");

        let translated = translate_suggestions::<&str>(fields, &[]);
        assert!(translated.iter().all(|f| f.name != "field" && !f.display_name.is_empty()));

        let body = r#"{"success": true, "data": {"fields": [
            {"displayName": "", "description": "blank", "type": "text"}
        ]}}"#;
        assert!(matches!(
            parse_generation_response(body),
            Err(EnrichError::GenerationFailed(msg)) if msg.contains("none with a display name")
        ));
    }

    #[test]
    fn translation_maps_types_and_avoids_selected_names() {
        let generated = parse_generation_response(GOOD).expect("valid envelope");
        let fields = translate_suggestions(generated, &["ceoName"]);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["ceoName2", "productLines", "isPublic", "officeCount"]);
        assert_eq!(fields[0].field_type, FieldType::String);
        assert_eq!(fields[1].field_type, FieldType::String);
        assert_eq!(fields[2].field_type, FieldType::Boolean);
        assert_eq!(fields[3].field_type, FieldType::Number);
        assert!(fields.iter().all(|f| !f.required));
    }

    #[test]
    fn translation_dedups_names_within_one_batch() {
        let generated = vec![
            GeneratedField {
                display_name: "Revenue".to_string(),
                description: "2023 revenue".to_string(),
                type_tag: "text".to_string(),
            },
            GeneratedField {
                display_name: "Revenue".to_string(),
                description: "2024 revenue".to_string(),
                type_tag: "mystery".to_string(),
            },
        ];
        let fields = translate_suggestions::<&str>(generated, &[]);
        assert_eq!(fields[0].name, "revenue");
        assert_eq!(fields[1].name, "revenue2");
        assert_eq!(fields[1].field_type, FieldType::String);
    }

    #[test]
    fn transport_errors_become_generation_failed() {
        let generator = FixedGenerator(Err(anyhow::anyhow!("connection refused")));
        let err = request_fields(&generator, "ceo name").unwrap_err();
        assert!(matches!(err, EnrichError::GenerationFailed(msg) if msg.contains("connection refused")));

        let generator = FixedGenerator(Ok(r#"{"success": false}"#.to_string()));
        let err = request_fields(&generator, "ceo name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to generate fields: service reported success=false"
        );
    }

    #[test]
    fn flags_take_priority_over_session_config() {
        let config = GeneratorConfig {
            url: Some("http://config.example/gen".to_string()),
            command: None,
            timeout_secs: 5,
        };
        assert_eq!(
            resolve_generator(None, Some("my-llm --json"), &config),
            GeneratorTarget::Command {
                command: "my-llm --json".to_string()
            }
        );
        assert_eq!(
            resolve_generator(Some("http://flag.example"), None, &config),
            GeneratorTarget::Http {
                url: "http://flag.example".to_string()
            }
        );
        assert_eq!(
            resolve_generator(Some("  "), None, &config),
            GeneratorTarget::Http {
                url: "http://config.example/gen".to_string()
            }
        );
    }
}
