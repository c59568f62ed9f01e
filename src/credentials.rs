//! Credentials provider.
//!
//! The workflow never reads API keys from ambient state directly; it is handed
//! a [`CredentialsProvider`]. The CLI layers process environment variables over
//! a JSON file in the user config dir.
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const FIRECRAWL_API_KEY: &str = "firecrawl_api_key";
pub const OPENAI_API_KEY: &str = "openai_api_key";
/// Keys the enrichment executor needs before an upload is accepted.
pub const REQUIRED_KEYS: &[&str] = &[FIRECRAWL_API_KEY, OPENAI_API_KEY];
/// Override for the credentials file location.
pub const CREDENTIALS_PATH_ENV: &str = "LENRICH_CREDENTIALS";

pub trait CredentialsProvider {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Where `set` persists values, if anywhere.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Required keys that `provider` cannot supply.
pub fn missing_credentials(provider: &dyn CredentialsProvider) -> Vec<&'static str> {
    REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| provider.get(key).is_none())
        .collect()
}

/// Environment variable consulted for `key` (`openai_api_key` -> `OPENAI_API_KEY`).
pub fn env_var_for(key: &str) -> String {
    key.to_ascii_uppercase()
}

/// In-process store used by tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentials {
    values: BTreeMap<String, String>,
}

#[cfg(test)]
impl CredentialsProvider for MemoryCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values
            .insert(key.to_string(), checked_value(key, value)?.to_string());
        Ok(())
    }
}

/// JSON object of key -> value persisted at `path`.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileCredentials {
    pub fn load(path: PathBuf) -> Result<Self> {
        let values = if path.is_file() {
            let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_slice(&bytes).context("parse credentials JSON")?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

}

impl CredentialsProvider for FileCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = checked_value(key, value)?;
        let mut values = self.values.clone();
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&values).context("serialize credentials")?;
        fs::write(&self.path, text.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        self.values = values;
        tracing::info!(key, path = %self.path.display(), "credential stored");
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Environment first, then `inner`. Writes always go to `inner`.
#[derive(Debug, Clone)]
pub struct EnvCredentials<P> {
    inner: P,
}

impl<P> EnvCredentials<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: CredentialsProvider> CredentialsProvider for EnvCredentials<P> {
    fn get(&self, key: &str) -> Option<String> {
        env::var(env_var_for(key))
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.inner.get(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }

    fn location(&self) -> Option<&Path> {
        self.inner.location()
    }
}

/// Credentials file location: `LENRICH_CREDENTIALS`, else the user config dir.
pub fn default_credentials_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CREDENTIALS_PATH_ENV).filter(|path| !path.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| anyhow!("no user config directory"))?;
    Ok(base.join("lead-enrich").join("credentials.json"))
}

/// The provider the CLI uses.
pub fn load_default_credentials() -> Result<EnvCredentials<FileCredentials>> {
    let path = default_credentials_path()?;
    Ok(EnvCredentials::new(FileCredentials::load(path)?))
}

fn checked_value<'a>(key: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("please enter a valid value for {key}"));
    }
    Ok(value)
}
