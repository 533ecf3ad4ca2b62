//! Server configuration
//!
//! Loaded from a TOML file, then overridden from the environment. Every
//! section has defaults, so an empty file (or no file) is a valid config.

use codepad_assistant::AssistantConfig;
use codepad_core::{FreeTierPolicy, User, DEFAULT_FREE_LANGUAGE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable holding the LLM provider key
pub const ENV_API_KEY: &str = "CODEPAD_LLM_API_KEY";
/// Fallback key variable used by existing Groq deployments
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Environment override for the listen port
pub const ENV_PORT: &str = "CODEPAD_PORT";
/// Environment override for the log filter
pub const ENV_LOG: &str = "CODEPAD_LOG";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the expected shape
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Value out of range or inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub entitlement: EntitlementSettings,
    pub assistant: AssistantConfig,
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Header the identity gateway sets to the verified subject
    pub subject_header: String,
    /// Request body cap in bytes
    pub max_body_bytes: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            subject_header: "x-auth-subject".to_string(),
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Plan gating settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntitlementSettings {
    /// Languages open without a paid plan
    pub free_languages: Vec<String>,
    /// Optional TOML file of users to seed the in-memory directory
    pub users_file: Option<PathBuf>,
}

impl Default for EntitlementSettings {
    fn default() -> Self {
        Self {
            free_languages: vec![DEFAULT_FREE_LANGUAGE.to_string()],
            users_file: None,
        }
    }
}

impl EntitlementSettings {
    /// Free-tier policy table
    #[must_use]
    pub fn policy(&self) -> FreeTierPolicy {
        FreeTierPolicy::new(self.free_languages.iter().map(|l| l.trim().to_string()))
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Base filter directive, e.g. `info` or `codepad_core=debug`
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Users seed file shape
#[derive(Debug, Default, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<User>,
}

impl ServerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With listen port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// With assistant settings
    #[inline]
    #[must_use]
    pub fn with_assistant(mut self, assistant: AssistantConfig) -> Self {
        self.assistant = assistant;
        self
    }

    /// Parse from TOML text
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// File (if given) plus process environment, validated
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).or_else(|| lookup(ENV_GROQ_API_KEY)) {
            self.assistant.api_key = Some(key);
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_PORT} is not a port: {port}")))?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
        Ok(self)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.subject_header.trim().is_empty() {
            return Err(ConfigError::Invalid("server.subject_header must not be empty".to_string()));
        }
        if self.free_languages_blank() {
            return Err(ConfigError::Invalid(
                "entitlement.free_languages must not contain blank entries".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            return Err(ConfigError::Invalid(format!(
                "assistant.temperature must be within 0.0..=2.0, got {}",
                self.assistant.temperature
            )));
        }
        if self.assistant.max_tokens == 0 {
            return Err(ConfigError::Invalid("assistant.max_tokens must be positive".to_string()));
        }
        self.listen_addr()?;
        Ok(())
    }

    fn free_languages_blank(&self) -> bool {
        self.entitlement.free_languages.iter().any(|l| l.trim().is_empty())
    }

    /// Socket address to bind
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad listen address: {e}")))
    }

    /// Users from the configured seed file, or none
    pub fn seed_users(&self) -> Result<Vec<User>, ConfigError> {
        let Some(path) = &self.entitlement.users_file else {
            return Ok(Vec::new());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: UsersFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(file.users)
    }

    /// Copy with the API key masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if redacted.assistant.api_key.is_some() {
            redacted.assistant.api_key = Some("<redacted>".to_string());
        }
        redacted
    }

    /// TOML rendering with the API key masked
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_toml_is_default() {
        let config = ServerConfig::from_toml("", Path::new("inline")).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections() {
        let config = ServerConfig::from_toml(
            r#"
            [server]
            port = 9000

            [entitlement]
            free_languages = ["javascript", "python"]

            [assistant]
            default_model = "llama-3.1-8b-instant"
            "#,
            Path::new("inline"),
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.subject_header, "x-auth-subject");
        assert_eq!(config.assistant.default_model, "llama-3.1-8b-instant");
        assert_eq!(config.assistant.max_tokens, 1024);
        assert_eq!(
            config.entitlement.policy().languages().collect::<Vec<_>>(),
            ["javascript", "python"]
        );
    }

    #[test]
    fn parse_error_names_file() {
        let err = ServerConfig::from_toml("[server\nport = 1", Path::new("codepad.toml")).unwrap_err();
        assert!(err.to_string().contains("codepad.toml"));
    }

    #[test]
    fn env_overrides() {
        let config = ServerConfig::default()
            .apply_env(env(&[(ENV_GROQ_API_KEY, "gsk_1"), (ENV_PORT, "3001"), (ENV_LOG, "debug")]))
            .unwrap();
        assert_eq!(config.assistant.api_key.as_deref(), Some("gsk_1"));
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn primary_key_variable_wins() {
        let config = ServerConfig::default()
            .apply_env(env(&[(ENV_API_KEY, "primary"), (ENV_GROQ_API_KEY, "fallback")]))
            .unwrap();
        assert_eq!(config.assistant.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn bad_port_rejected() {
        let result = ServerConfig::default().apply_env(env(&[(ENV_PORT, "http")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validation() {
        let mut config = ServerConfig::default();
        config.entitlement.free_languages.push(" ".to_string());
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.assistant.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.host = "not a host".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn redacted_toml_hides_key() {
        let config = ServerConfig::default()
            .with_assistant(AssistantConfig::new().with_api_key("gsk_secret"));
        let text = config.to_redacted_toml().unwrap();
        assert!(!text.contains("gsk_secret"));
        assert!(text.contains("<redacted>"));
    }
}
