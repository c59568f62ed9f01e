//! HTTP transport for the field generation service.
use anyhow::{anyhow, Context, Result};
use std::time::{Duration, Instant};

use super::{parse_generation_response, FieldGenerator, GenerateFieldsRequest, GeneratedField};

/// Header carrying the user's OpenAI key when the service runs without one.
pub const OPENAI_KEY_HEADER: &str = "X-OpenAI-API-Key";

pub struct HttpFieldGenerator {
    agent: ureq::Agent,
    url: String,
    api_key: Option<String>,
}

impl HttpFieldGenerator {
    pub fn new(url: String, timeout: Duration, api_key: Option<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            url,
            api_key,
        }
    }
}

impl FieldGenerator for HttpFieldGenerator {
    fn generate(&self, prompt: &str) -> Result<Vec<GeneratedField>> {
        let start = Instant::now();
        let mut request = self.agent.post(self.url.as_str());
        if let Some(key) = self.api_key.as_deref() {
            request = request.header(OPENAI_KEY_HEADER, key);
        }
        let mut response = request
            .send_json(&GenerateFieldsRequest { prompt })
            .with_context(|| format!("POST {}", self.url))?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .context("read field generator response")?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            prompt_bytes = prompt.len(),
            response_bytes = body.len(),
            "field generation request complete"
        );

        if !status.is_success() {
            return Err(anyhow!("field generator returned HTTP {}", status.as_u16()));
        }
        Ok(parse_generation_response(&body)?)
    }
}
