//! Configuration management for featurewiz
//!
//! Stores settings in ~/.config/featurewiz/config.json. Secrets never land in
//! this file; they live in the system keychain (see [`crate::keyring`]).

use crate::keyring::{self, StoredCredentials};
use crate::session::{AuthState, SessionContext};
use crate::util::write_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// ML API the original deployment talks to
pub const DEFAULT_API_BASE_URL: &str = "https://ml-linear-regression.onrender.com";

pub const API_URL_ENV: &str = "FEATUREWIZ_API_URL";
pub const FIRESTORE_PROJECT_ENV: &str = "FEATUREWIZ_FIRESTORE_PROJECT";
pub const FIRESTORE_API_KEY_ENV: &str = "FEATUREWIZ_FIRESTORE_API_KEY";
pub const ID_TOKEN_ENV: &str = "FEATUREWIZ_ID_TOKEN";
pub const USER_ID_ENV: &str = "FEATUREWIZ_USER_ID";
pub const ANONYMOUS_ENV: &str = "FEATUREWIZ_ANONYMOUS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Overrides [`DEFAULT_API_BASE_URL`]
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub firestore_project_id: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Use the local JSON store instead of Firestore
    #[serde(default)]
    pub offline: bool,
    /// Most recent wizard run, offered for resume
    #[serde(default)]
    pub last_session: Option<SessionContext>,
}

fn default_request_timeout_secs() -> u64 {
    // The hosted model sleeps when idle; the first request can take a while
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            firestore_project_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            offline: false,
            last_session: None,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

impl Config {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("featurewiz"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Where `--offline` runs keep their documents
    pub fn offline_store_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("featurewiz").join("offline-store.json"))
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("featurewiz").join("featurewiz.log"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    warn!(error = %e, "failed to set config directory permissions");
                }
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        write_atomic(path, &content).context("Failed to write config")?;
        Ok(())
    }

    /// Environment variable, then config file, then the built-in default
    pub fn effective_api_base_url(&self) -> String {
        env_nonempty(API_URL_ENV)
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn firestore_project(&self) -> Option<String> {
        env_nonempty(FIRESTORE_PROJECT_ENV).or_else(|| self.firestore_project_id.clone())
    }

    /// Keychain credentials with environment overrides applied
    pub fn credentials(&self) -> StoredCredentials {
        let mut creds = match keyring::read_credentials() {
            Ok(creds) => creds,
            Err(err) => {
                keyring::warn_keychain_error_once("Firestore credentials", &err);
                StoredCredentials::default()
            }
        };
        if let Some(key) = env_nonempty(FIRESTORE_API_KEY_ENV) {
            creds.firestore_api_key = Some(key);
        }
        if let Some(token) = env_nonempty(ID_TOKEN_ENV) {
            creds.id_token = Some(token);
        }
        if let Some(uid) = env_nonempty(USER_ID_ENV) {
            creds.user_id = Some(uid);
            creds.anonymous = env_flag(ANONYMOUS_ENV);
        }
        creds
    }

    /// Current user as the wizard sees it
    pub fn auth_state(&self) -> AuthState {
        auth_from_credentials(&self.credentials())
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/featurewiz/config.json".to_string())
    }
}

pub fn auth_from_credentials(creds: &StoredCredentials) -> AuthState {
    match &creds.user_id {
        Some(uid) if creds.anonymous => AuthState::Anonymous { uid: uid.clone() },
        Some(uid) => AuthState::Identified { uid: uid.clone() },
        None => AuthState::SignedOut,
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"));
        assert_eq!(config.request_timeout_secs, 60);
        assert!(!config.offline);
        assert!(config.last_session.is_none());
    }

    #[test]
    fn test_save_and_reload_round_trip_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: Some("http://localhost:5000".to_string()),
            offline: true,
            last_session: Some(SessionContext::new(
                "s1",
                "d1",
                AuthState::Identified {
                    uid: "u1".to_string(),
                },
            )),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.api_base_url.as_deref(), Some("http://localhost:5000"));
        assert!(loaded.offline);
        assert_eq!(loaded.last_session, config.last_session);
    }

    #[test]
    fn test_corrupt_config_is_preserved_and_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.request_timeout_secs, 60);
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"firestore_project_id": "demo"}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.firestore_project_id.as_deref(), Some("demo"));
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_auth_from_credentials() {
        let mut creds = StoredCredentials::default();
        assert_eq!(auth_from_credentials(&creds), AuthState::SignedOut);

        creds.user_id = Some("u1".to_string());
        assert_eq!(
            auth_from_credentials(&creds),
            AuthState::Identified {
                uid: "u1".to_string()
            }
        );

        creds.anonymous = true;
        assert!(auth_from_credentials(&creds).is_anonymous());
    }
}
