//! Session directory layout and persistence.
//!
//! A session directory holds everything one configuration run needs, so each
//! CLI invocation can load state, apply one transition, and write it back.
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::workflow::state::{FinalizedConfig, WorkflowState, STATE_SCHEMA_VERSION};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 60;

/// Typed paths into a session directory.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    root: PathBuf,
}

impl SessionPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the retained `dataset.json` path.
    pub fn dataset_path(&self) -> PathBuf {
        self.root.join("dataset.json")
    }

    /// Return the `state.json` path.
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Return the `enrichment.json` path read by the executor.
    pub fn enrichment_path(&self) -> PathBuf {
        self.root.join("enrichment.json")
    }
}

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Field generator settings; unset transports fall through to the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: None,
            command: None,
            timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_GENERATOR_TIMEOUT_SECS
}

pub fn default_config() -> SessionConfig {
    SessionConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        generator: GeneratorConfig::default(),
    }
}

/// Load `config.json`, falling back to defaults when the session has none.
pub fn load_config(paths: &SessionPaths) -> Result<SessionConfig> {
    let path = paths.config_path();
    if !path.is_file() {
        return Ok(default_config());
    }
    let config: SessionConfig = read_json(&path).context("parse session config JSON")?;
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.generator.timeout_secs == 0 {
        return Err(anyhow!("generator.timeout_secs must be positive"));
    }
    Ok(config)
}

pub fn write_config(paths: &SessionPaths, config: &SessionConfig) -> Result<()> {
    write_json(&paths.config_path(), config)
}

/// Load `state.json`. A missing file means the session was never initialized.
pub fn load_state(paths: &SessionPaths) -> Result<WorkflowState> {
    let path = paths.state_path();
    if !path.is_file() {
        return Err(anyhow!(
            "no session state at {} (run `lenrich init` first)",
            path.display()
        ));
    }
    let state: WorkflowState = read_json(&path).context("parse workflow state JSON")?;
    if state.schema_version != STATE_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported state schema_version {}",
            state.schema_version
        ));
    }
    Ok(state)
}

/// Like [`load_state`], but an uninitialized session starts at Upload.
pub fn load_state_or_default(paths: &SessionPaths) -> Result<WorkflowState> {
    if paths.state_path().is_file() {
        load_state(paths)
    } else {
        Ok(WorkflowState::default())
    }
}

pub fn write_state(paths: &SessionPaths, state: &WorkflowState) -> Result<()> {
    write_json(&paths.state_path(), state)
}

pub fn load_retained_dataset(paths: &SessionPaths) -> Result<Dataset> {
    let path = paths.dataset_path();
    let dataset: Dataset = read_json(&path).context("parse retained dataset")?;
    Dataset::new(dataset.columns, dataset.rows).map_err(anyhow::Error::from)
}

pub fn load_retained_dataset_optional(paths: &SessionPaths) -> Result<Option<Dataset>> {
    if !paths.dataset_path().is_file() {
        return Ok(None);
    }
    load_retained_dataset(paths).map(Some)
}

pub fn write_dataset(paths: &SessionPaths, dataset: &Dataset) -> Result<()> {
    write_json(&paths.dataset_path(), dataset)
}

/// Write the finalized configuration for the executor.
pub fn write_finalized(paths: &SessionPaths, config: &FinalizedConfig) -> Result<()> {
    write_json(&paths.enrichment_path(), config)
}

/// Withdraw a previously written configuration.
pub fn clear_finalized(paths: &SessionPaths) -> Result<()> {
    let path = paths.enrichment_path();
    if path.is_file() {
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("decode {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
