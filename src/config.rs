use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Service account key file, relative to the working directory.
const CREDENTIALS_FILE: &str = "cloud-auth.json";

/// Collaborator configuration, relative to the working directory.
const CONFIG_FILE: &str = "Information/config.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Emails granted writer access to every document this session creates.
    pub users_email: Vec<String>,

    /// Path to the service account key file.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from(CREDENTIALS_FILE)
}

impl Config {
    /// Load the collaborator configuration from its fixed path.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                path
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        if config.users_email.iter().any(|email| email.is_empty()) {
            return Err(AppError::Config(
                "users_email entries must not be empty".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            users_email: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            credentials_file: default_credentials_file(),
        };

        let serialized = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&serialized).unwrap();

        assert_eq!(config.users_email, deserialized.users_email);
        assert_eq!(config.credentials_file, deserialized.credentials_file);
    }

    #[test]
    fn test_config_defaults_credentials_file() {
        let config: Config =
            serde_json::from_str(r#"{"users_email": ["a@example.com"]}"#).unwrap();

        assert_eq!(config.users_email, vec!["a@example.com".to_string()]);
        assert_eq!(config.credentials_file, PathBuf::from(CREDENTIALS_FILE));
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::load_from(Path::new("does-not-exist/config.json")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
