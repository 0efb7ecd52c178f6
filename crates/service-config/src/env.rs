use crate::error::ConfigError;
use std::{collections::HashMap, fs, path::Path};
use tracing::debug;

/// Variables from the process environment, optionally overlaid with a
/// `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    /// Snapshot of the process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads `KEY=VALUE` lines from `path`. File values override values
    /// already present.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::EnvFile(format!("failed to read {}: {e}", path.display()))
        })?;

        let loaded = self.parse_env_content(&content)?;
        debug!(path = %path.display(), loaded, "Loaded env file");
        Ok(())
    }

    /// Loads `path` when it exists; a missing file is not an error.
    pub fn load_optional<P: AsRef<Path>>(&mut self, path: P) -> Result<bool, ConfigError> {
        if !path.as_ref().exists() {
            return Ok(false);
        }
        self.load_from_file(path).map(|_| true)
    }

    /// Value of `key`, with surrounding whitespace trimmed. Blank values
    /// count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    fn parse_env_content(&mut self, content: &str) -> Result<usize, ConfigError> {
        let mut loaded = 0;
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::EnvFile(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::EnvFile(format!(
                    "empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value).to_string());
            loaded += 1;
        }

        Ok(loaded)
    }

    fn unquote_value(value: &str) -> &str {
        let value = value.trim();
        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                return &value[1..value.len() - 1];
            }
        }
        value
    }
}
