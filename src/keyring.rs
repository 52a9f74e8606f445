//! Unified keyring storage for featurewiz credentials
//!
//! Firestore access needs a web API key and, for rules that check
//! `request.auth`, a Firebase ID token plus the uid it belongs to. All of it
//! lives in a single keychain entry as JSON so the OS prompts once.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use tracing::warn;

const KEYRING_SERVICE: &str = "featurewiz-credentials";
const KEYRING_USERNAME: &str = "default";

/// All credentials stored in a single keychain entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firestore_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

type KeyringResult<T> = Result<T, String>;

static CREDENTIALS_CACHE: OnceLock<Mutex<Option<StoredCredentials>>> = OnceLock::new();
static KEYRING_ERROR_WARNED: AtomicBool = AtomicBool::new(false);

fn credentials_cache() -> &'static Mutex<Option<StoredCredentials>> {
    CREDENTIALS_CACHE.get_or_init(|| Mutex::new(None))
}

fn keyring_disabled() -> bool {
    if cfg!(test) {
        return true;
    }
    matches!(
        std::env::var("FEATUREWIZ_DISABLE_KEYRING")
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
        "1" | "true" | "yes"
    )
}

fn keyring_entry() -> Result<Entry, keyring::Error> {
    Entry::new(KEYRING_SERVICE, KEYRING_USERNAME)
}

/// Warn about keychain errors only once per session
pub fn warn_keychain_error_once(context: &str, err: &str) {
    if KEYRING_ERROR_WARNED.swap(true, Ordering::Relaxed) {
        return;
    }
    warn!(
        context,
        error = err,
        "couldn't access system keychain; set FEATUREWIZ_FIRESTORE_API_KEY to bypass it"
    );
}

fn read_credentials_uncached() -> KeyringResult<StoredCredentials> {
    if keyring_disabled() {
        return Ok(StoredCredentials::default());
    }
    let entry = keyring_entry().map_err(|e| e.to_string())?;
    match entry.get_password() {
        Ok(json) => {
            serde_json::from_str(&json).map_err(|e| format!("Failed to parse credentials: {}", e))
        }
        Err(keyring::Error::NoEntry) => Ok(StoredCredentials::default()),
        Err(err) => Err(err.to_string()),
    }
}

fn write_credentials(creds: &StoredCredentials) -> KeyringResult<()> {
    if keyring_disabled() {
        return Err("System keychain is disabled (FEATUREWIZ_DISABLE_KEYRING)".to_string());
    }
    let json = serde_json::to_string(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;
    let entry = keyring_entry().map_err(|e| e.to_string())?;
    entry.set_password(&json).map_err(|e| e.to_string())
}

/// Read credentials, caching the first successful read for the process
pub fn read_credentials() -> KeyringResult<StoredCredentials> {
    let mut guard = match credentials_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(creds) = guard.as_ref() {
        return Ok(creds.clone());
    }
    let creds = read_credentials_uncached()?;
    *guard = Some(creds.clone());
    Ok(creds)
}

/// Replace stored credentials and refresh the cache
pub fn save_credentials(creds: &StoredCredentials) -> KeyringResult<()> {
    write_credentials(creds)?;
    let mut guard = match credentials_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(creds.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_credentials_partial_serialization() {
        let creds = StoredCredentials {
            firestore_api_key: Some("AIza-test".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&creds).unwrap();
        assert!(json.contains("AIza-test"));
        assert!(!json.contains("id_token"));
    }

    #[test]
    fn test_stored_credentials_deserialize_empty() {
        let parsed: StoredCredentials = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, StoredCredentials::default());
    }

    #[test]
    fn test_keyring_disabled_in_tests() {
        assert!(keyring_disabled());
        assert_eq!(read_credentials_uncached(), Ok(StoredCredentials::default()));
        assert!(save_credentials(&StoredCredentials::default()).is_err());
    }
}
