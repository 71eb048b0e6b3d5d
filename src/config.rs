//! Client configuration read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid ROAMLOG_API_BASE_URL {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("ROAMLOG_API_BASE_URL must be an http(s) URL, got {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid ROAMLOG_TIMEOUT_SECS {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("could not determine XDG data directory")]
    NoDataDir,
}

/// Settings for talking to the trip service and for local files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every API path is appended to.
    pub api_base_url: Url,
    /// Upper bound on any single request, including a hung submit.
    pub timeout: Duration,
    /// Directory for the session file and the log file.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Reads configuration from process environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    #[mutants::skip]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = lookup("ROAMLOG_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_base_url = Url::parse(&base).map_err(|source| ConfigError::InvalidBaseUrl {
            value: base.clone(),
            source,
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base));
        }

        let timeout = match lookup("ROAMLOG_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let data_dir = match lookup("ROAMLOG_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("roamlog"),
        };

        Ok(Self {
            api_base_url,
            timeout,
            data_dir,
        })
    }

    /// Path of the persisted session file.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Path of the log file the UI writes tracing output to.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("roamlog.log")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ROAMLOG_API_BASE_URL", "https://trips.example/api"),
            ("ROAMLOG_TIMEOUT_SECS", "5"),
            ("ROAMLOG_DATA_DIR", "/tmp/roamlog-test"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://trips.example/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/roamlog-test"));
        assert_eq!(
            config.session_path(),
            PathBuf::from("/tmp/roamlog-test/session.json")
        );
        assert_eq!(
            config.log_path(),
            PathBuf::from("/tmp/roamlog-test/roamlog.log")
        );
    }

    #[test]
    fn defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("ROAMLOG_DATA_DIR", "/tmp/x")])).unwrap();
        assert_eq!(config.api_base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn bad_url_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("ROAMLOG_API_BASE_URL", "not a url"),
            ("ROAMLOG_DATA_DIR", "/tmp/x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn non_http_scheme_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("ROAMLOG_API_BASE_URL", "ftp://trips.example"),
            ("ROAMLOG_DATA_DIR", "/tmp/x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("ROAMLOG_TIMEOUT_SECS", "0"),
            ("ROAMLOG_DATA_DIR", "/tmp/x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("ROAMLOG_TIMEOUT_SECS", "soon"),
            ("ROAMLOG_DATA_DIR", "/tmp/x"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(s) if s == "soon"));
    }
}
