use serde::{Deserialize, Serialize};
use sessionvault_platform::VaultConfig;
use std::path::Path;

use crate::error::{Result, SessionVaultError};

/// Key the session secret is stored under.
pub const DEFAULT_SESSION_KEY: &str = "sessionData";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSettings {
    #[serde(default = "default_session_key")]
    pub session_key: String,
    #[serde(default)]
    pub vault: VaultConfig,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            session_key: default_session_key(),
            vault: VaultConfig::default(),
        }
    }
}

impl ServiceSettings {
    pub fn validate(&self) -> Result<()> {
        if self.session_key.trim().is_empty() {
            return Err(SessionVaultError::Config(
                "sessionKey must not be empty".to_string(),
            ));
        }
        self.vault
            .validate()
            .map_err(|e| SessionVaultError::Config(e.message))
    }
}

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

pub fn load_settings(path: &Path) -> Result<ServiceSettings> {
    if !path.exists() {
        return Ok(ServiceSettings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: ServiceSettings = serde_json::from_str(&content)?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &ServiceSettings) -> Result<()> {
    settings.validate()?;
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionvault_platform::UnlockPolicy;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, ServiceSettings::default());
        assert_eq!(settings.session_key, "sessionData");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = ServiceSettings {
            session_key: "token".to_string(),
            vault: VaultConfig::default().with_policy(UnlockPolicy::MemoryOnly),
        };

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "sessionKey": "token" }"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.session_key, "token");
        assert_eq!(settings.vault, VaultConfig::default());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "sessionKey": "  " }"#).unwrap();

        let err = load_settings(&path).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, SessionVaultError::Serialization(_)));
    }
}
