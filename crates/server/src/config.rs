//! Server configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, then `ELIX_*` environment variables. The CLI applies
//! its own flags on top of the result.
//!
//! # Example
//!
//! ```toml
//! bind = "127.0.0.1"
//! port = 8080
//! rate_limit = 120
//! api_token = "dev-token"
//! store_path = "data/elix.json"
//!
//! [identity]
//! url = "https://project.supabase.co"
//! key = "service-role-key"
//!
//! [kpi]
//! monthly_budget = 75000.0
//! field_team_uptime = 98
//! ```

use std::path::{Path, PathBuf};

use elix_core::metrics::KpiSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Requests per minute per client IP; 0 disables limiting.
pub const DEFAULT_RATE_LIMIT: u64 = 120;
/// Request body cap: 10 MB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// External identity provider (GoTrue-compatible).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub url: String,
    /// Service key sent as `apikey` and used for admin calls.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub rate_limit: u64,
    pub max_body_bytes: usize,
    /// Bearer token accepted without an identity provider round trip.
    pub api_token: Option<String>,
    /// Persist records to this JSON file. In-memory when absent.
    pub store_path: Option<PathBuf>,
    pub identity: Option<IdentityConfig>,
    pub kpi: KpiSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            rate_limit: DEFAULT_RATE_LIMIT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            api_token: None,
            store_path: None,
            identity: None,
            kpi: KpiSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid with `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay `ELIX_*` variables looked up through `lookup`. Empty values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ELIX_BIND") {
            self.bind = v;
        }
        if let Some(v) = get("ELIX_PORT") {
            self.port = parse_env("ELIX_PORT", v)?;
        }
        if let Some(v) = get("ELIX_RATE_LIMIT") {
            self.rate_limit = parse_env("ELIX_RATE_LIMIT", v)?;
        }
        if let Some(v) = get("ELIX_API_TOKEN") {
            self.api_token = Some(v);
        }
        if let Some(v) = get("ELIX_STORE_PATH") {
            self.store_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("ELIX_MONTHLY_BUDGET") {
            self.kpi.monthly_budget = parse_env("ELIX_MONTHLY_BUDGET", v)?;
        }

        match (get("ELIX_IDENTITY_URL"), get("ELIX_IDENTITY_KEY")) {
            (Some(url), Some(key)) => self.identity = Some(IdentityConfig { url, key }),
            (Some(url), None) => match &mut self.identity {
                Some(identity) => identity.url = url,
                None => {
                    return Err(ConfigError::Invalid(
                        "ELIX_IDENTITY_URL is set but no identity key is configured".into(),
                    ))
                }
            },
            (None, Some(key)) => match &mut self.identity {
                Some(identity) => identity.key = key,
                None => {
                    return Err(ConfigError::Invalid(
                        "ELIX_IDENTITY_KEY is set but no identity url is configured".into(),
                    ))
                }
            },
            (None, None) => {}
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit, 120);
        assert_eq!(config.kpi.monthly_budget, 50_000.0);
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(config.identity.is_none());
    }

    #[test]
    fn file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elix.toml");
        std::fs::write(
            &path,
            r#"
port = 9000
api_token = "from-file"

[kpi]
monthly_budget = 75000.0
field_team_uptime = 95
"#,
        )
        .unwrap();

        let mut config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.kpi.field_team_uptime, 95);

        config
            .apply_env(env(&[
                ("ELIX_PORT", "9100"),
                ("ELIX_API_TOKEN", "from-env"),
                ("ELIX_RATE_LIMIT", "0"),
                ("ELIX_BIND", ""),
            ]))
            .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.api_token.as_deref(), Some("from-env"));
        assert_eq!(config.rate_limit, 0);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.kpi.monthly_budget, 75_000.0);
    }

    #[test]
    fn bad_env_value_names_the_variable() {
        let mut config = ServerConfig::default();
        let err = config.apply_env(env(&[("ELIX_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("ELIX_PORT"), "{err}");
    }

    #[test]
    fn identity_needs_url_and_key() {
        let mut config = ServerConfig::default();
        assert!(config
            .apply_env(env(&[("ELIX_IDENTITY_URL", "https://id.example")]))
            .is_err());

        config
            .apply_env(env(&[
                ("ELIX_IDENTITY_URL", "https://id.example"),
                ("ELIX_IDENTITY_KEY", "secret"),
            ]))
            .unwrap();
        assert_eq!(
            config.identity,
            Some(IdentityConfig {
                url: "https://id.example".into(),
                key: "secret".into(),
            })
        );
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ServerConfig::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "port = \"not a number\"").unwrap();
        assert!(matches!(
            ServerConfig::from_file(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
