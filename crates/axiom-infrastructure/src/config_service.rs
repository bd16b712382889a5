//! Configuration loading.
//!
//! Reads `config.toml` and resolves the Gemini API key from the environment
//! or `secret.json`.

use std::fs;
use std::path::{Path, PathBuf};

use axiom_core::config::{AxiomConfig, SecretConfig};
use axiom_core::error::{AxiomError, Result};

use crate::paths::AxiomPaths;
use crate::storage::AtomicJsonFile;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Credentials for the reasoning API.
#[derive(Clone, PartialEq)]
pub struct ApiCredentials {
    pub api_key: String,
    /// Model named next to the key in secret.json, if any.
    pub model_name: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Loads configuration and secrets.
#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: Option<PathBuf>,
    secret_path: Option<PathBuf>,
}

impl ConfigService {
    /// Uses the default locations under `~/.config/axiom/`.
    pub fn new() -> Self {
        Self {
            config_path: AxiomPaths::config_file().ok(),
            secret_path: AxiomPaths::secret_file().ok(),
        }
    }

    /// Overrides the config file location.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Overrides the secret file location.
    pub fn with_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secret_path = Some(path.into());
        self
    }

    /// Loads `config.toml`. A missing file yields the defaults.
    pub fn load_config(&self) -> Result<AxiomConfig> {
        let Some(path) = self.config_path.as_deref() else {
            return Ok(AxiomConfig::default());
        };
        load_config_file(path)
    }

    /// Resolves the API key from the process environment, then secret.json.
    pub fn resolve_credentials(&self) -> Result<ApiCredentials> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_credentials`](Self::resolve_credentials) with an
    /// injectable environment lookup.
    pub fn resolve_credentials_with<F>(&self, env: F) -> Result<ApiCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in API_KEY_ENV_VARS {
            if let Some(api_key) = env(name).filter(|value| !value.trim().is_empty()) {
                tracing::debug!(source = name, "using API key from environment");
                return Ok(ApiCredentials {
                    api_key,
                    model_name: None,
                });
            }
        }

        let Some(secret_path) = self.secret_path.as_deref() else {
            return Err(missing_key_error(None));
        };

        let secrets = AtomicJsonFile::<SecretConfig>::new(secret_path.to_path_buf())
            .load()
            .map_err(|e| {
                AxiomError::config(format!("Failed to read {}: {}", secret_path.display(), e))
            })?;

        let gemini = secrets
            .and_then(|secrets| secrets.gemini)
            .filter(|gemini| !gemini.api_key.trim().is_empty())
            .ok_or_else(|| missing_key_error(Some(secret_path)))?;

        tracing::debug!(path = %secret_path.display(), "using API key from secret file");
        Ok(ApiCredentials {
            api_key: gemini.api_key,
            model_name: gemini.model_name.filter(|name| !name.trim().is_empty()),
        })
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn load_config_file(path: &Path) -> Result<AxiomConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AxiomConfig::default());
    }

    let content = fs::read_to_string(path)?;
    AxiomConfig::from_toml_str(&content).map_err(|e| {
        AxiomError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn missing_key_error(secret_path: Option<&Path>) -> AxiomError {
    let location = secret_path
        .map(|path| format!(" or add it to {}", path.display()))
        .unwrap_or_default();
    AxiomError::config(format!(
        "No Gemini API key found. Set {}{}",
        API_KEY_ENV_VARS.join(" or "),
        location
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> ConfigService {
        ConfigService::new()
            .with_config_path(dir.path().join("config.toml"))
            .with_secret_path(dir.path().join("secret.json"))
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = service_in(&dir).load_config().unwrap();
        assert_eq!(config, AxiomConfig::default());
    }

    #[test]
    fn test_invalid_config_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[solver\n").unwrap();
        let err = service_in(&dir).load_config().unwrap_err();
        assert!(matches!(err, AxiomError::Config(_)));
    }

    #[test]
    fn test_environment_key_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "from-file"}}"#,
        )
        .unwrap();

        let creds = service_in(&dir)
            .resolve_credentials_with(|name| (name == "API_KEY").then(|| "from-env".to_string()))
            .unwrap();
        assert_eq!(creds.api_key, "from-env");
    }

    #[test]
    fn test_secret_file_fallback() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "from-file", "model_name": "gemini-2.5-flash"}}"#,
        )
        .unwrap();

        let creds = service_in(&dir).resolve_credentials_with(|_| None).unwrap();
        assert_eq!(creds.api_key, "from-file");
        assert_eq!(creds.model_name.as_deref(), Some("gemini-2.5-flash"));
    }

    #[test]
    fn test_blank_secret_key_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "  ", "model_name": "gemini-2.5-flash"}}"#,
        )
        .unwrap();

        let err = service_in(&dir).resolve_credentials_with(|_| None).unwrap_err();
        assert!(matches!(err, AxiomError::Config(message) if message.contains("secret.json")));
    }

    #[test]
    fn test_secret_file_without_gemini_section() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("secret.json"), "{}").unwrap();

        let err = service_in(&dir).resolve_credentials_with(|_| None).unwrap_err();
        assert!(matches!(err, AxiomError::Config(message) if message.contains("No Gemini API key")));
    }

    #[test]
    fn test_unparsable_secret_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("secret.json"), "{ api_key = nope").unwrap();

        let err = service_in(&dir).resolve_credentials_with(|_| None).unwrap_err();
        assert!(matches!(err, AxiomError::Config(message) if message.starts_with("Failed to read")));
    }

    #[test]
    fn test_environment_key_ignores_secret_model() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("secret.json"),
            r#"{"gemini": {"api_key": "from-file", "model_name": "gemini-2.5-flash"}}"#,
        )
        .unwrap();

        let creds = service_in(&dir)
            .resolve_credentials_with(|name| {
                (name == "GEMINI_API_KEY").then(|| "from-env".to_string())
            })
            .unwrap();
        assert_eq!(creds.model_name, None);
    }

    #[test]
    fn test_no_key_anywhere_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = service_in(&dir).resolve_credentials_with(|_| None).unwrap_err();
        assert!(matches!(err, AxiomError::Config(message) if message.contains("GEMINI_API_KEY")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = ApiCredentials {
            api_key: "super-secret".to_string(),
            model_name: None,
        };
        assert!(!format!("{creds:?}").contains("super-secret"));
    }
}
