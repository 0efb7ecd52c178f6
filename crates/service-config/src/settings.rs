use crate::{env::EnvManager, error::ConfigError};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use url::Url;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const API_BASE_URL: &str = "API_BASE_URL";
pub const API_TIMEZONE: &str = "API_TIMEZONE";
pub const API_INVALID_CURSOR: &str = "API_INVALID_CURSOR";
pub const API_MAX_PAGE_SIZE: &str = "API_MAX_PAGE_SIZE";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";
const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Helsinki;

/// What to do with a cursor token that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidCursorPolicy {
    /// Log a warning and serve the first page.
    #[default]
    FirstPage,
    /// Fail the request.
    Reject,
}

impl FromStr for InvalidCursorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first-page" | "first_page" => Ok(InvalidCursorPolicy::FirstPage),
            "reject" => Ok(InvalidCursorPolicy::Reject),
            other => Err(ConfigError::invalid(
                API_INVALID_CURSOR,
                format!("expected 'first-page' or 'reject', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for InvalidCursorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidCursorPolicy::FirstPage => f.write_str("first-page"),
            InvalidCursorPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Process-wide settings, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub database_url: Option<String>,
    /// Absolute URL the endpoint paths are joined onto. Always ends in `/`.
    pub base_url: Url,
    /// Zone used for date filters and aggregate buckets.
    pub timezone: Tz,
    pub invalid_cursor: InvalidCursorPolicy,
    /// Optional cap applied on top of every endpoint's own maximum.
    pub max_page_size: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            database_url: None,
            base_url: default_base_url(),
            timezone: DEFAULT_TIMEZONE,
            invalid_cursor: InvalidCursorPolicy::default(),
            max_page_size: None,
        }
    }
}

impl ServiceSettings {
    pub fn from_env(env: &EnvManager) -> Result<Self, ConfigError> {
        let base_url = match env.get(API_BASE_URL) {
            Some(raw) => parse_base_url(raw)?,
            None => default_base_url(),
        };

        let timezone = match env.get(API_TIMEZONE) {
            Some(raw) => raw.parse::<Tz>().map_err(|_| {
                ConfigError::invalid(API_TIMEZONE, format!("unknown timezone '{raw}'"))
            })?,
            None => DEFAULT_TIMEZONE,
        };

        let invalid_cursor = env
            .get(API_INVALID_CURSOR)
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();

        let max_page_size = env
            .get(API_MAX_PAGE_SIZE)
            .map(|raw| match raw.parse::<u64>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ConfigError::invalid(
                    API_MAX_PAGE_SIZE,
                    format!("expected a positive integer, got '{raw}'"),
                )),
            })
            .transpose()?;

        Ok(ServiceSettings {
            database_url: env.get(DATABASE_URL).map(str::to_string),
            base_url,
            timezone,
            invalid_cursor,
            max_page_size,
        })
    }

    /// `DATABASE_URL` with any password replaced, for logging.
    pub fn redacted_database_url(&self) -> Option<String> {
        self.database_url.as_deref().map(|raw| match Url::parse(raw) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            Ok(url) => url.to_string(),
            Err(_) => "<unparsable>".to_string(),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::invalid(API_BASE_URL, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(API_BASE_URL, "not an absolute base URL"));
    }
    Ok(url)
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("static url")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_is_empty() {
        let settings = ServiceSettings::from_env(&EnvManager::default()).unwrap();
        assert_eq!(settings, ServiceSettings::default());
        assert_eq!(settings.timezone, chrono_tz::Europe::Helsinki);
        assert_eq!(settings.base_url.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_reads_all_values() {
        let env = EnvManager::from_pairs([
            (DATABASE_URL, "postgres://api:secret@db/lido"),
            (API_BASE_URL, "https://example.org/api"),
            (API_TIMEZONE, "UTC"),
            (API_INVALID_CURSOR, "reject"),
            (API_MAX_PAGE_SIZE, "2000"),
        ]);
        let settings = ServiceSettings::from_env(&env).unwrap();

        assert_eq!(settings.base_url.as_str(), "https://example.org/api/");
        assert_eq!(settings.timezone, chrono_tz::UTC);
        assert_eq!(settings.invalid_cursor, InvalidCursorPolicy::Reject);
        assert_eq!(settings.max_page_size, Some(2000));
        assert_eq!(
            settings.redacted_database_url().unwrap(),
            "postgres://api:***@db/lido"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            (API_TIMEZONE, "Mars/Olympus"),
            (API_INVALID_CURSOR, "ignore"),
            (API_MAX_PAGE_SIZE, "0"),
            (API_MAX_PAGE_SIZE, "many"),
            (API_BASE_URL, "not a url"),
        ] {
            let env = EnvManager::from_pairs([(key, value)]);
            match ServiceSettings::from_env(&env) {
                Err(ConfigError::InvalidValue { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected invalid {key}, got {other:?}"),
            }
        }
    }
}
