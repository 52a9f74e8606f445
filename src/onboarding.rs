//! `featurewiz setup`: connect to Firestore
//!
//! The project id goes into the config file. The API key, ID token and user
//! id are secrets and go into the system keychain.

use crate::config::Config;
use crate::keyring::{self, StoredCredentials};
use std::io::{self, BufRead, Write};

fn prompt(label: &str, current: Option<&str>) -> Result<Option<String>, String> {
    match current {
        Some(value) if !value.is_empty() => print!("  {} [{}]: ", label, value),
        _ => print!("  {}: ", label),
    }
    io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{}…", visible)
}

/// Interactive setup. Entering nothing keeps the current value.
pub fn run_setup(config: &mut Config) -> Result<(), String> {
    println!();
    println!("  f e a t u r e w i z   setup");
    println!("  ─────────────────────────────────────────────────────────────────");
    println!();
    println!("  Find these in the Firebase console under Project settings.");
    println!("  Leave the user id empty to run signed out.");
    println!();

    let mut creds = keyring::read_credentials().unwrap_or_else(|err| {
        keyring::warn_keychain_error_once("setup", &err);
        StoredCredentials::default()
    });

    if let Some(project) = prompt("Firestore project id", config.firestore_project_id.as_deref())? {
        config.firestore_project_id = Some(project);
    }
    let masked_key = creds.firestore_api_key.as_deref().map(mask);
    if let Some(key) = prompt("Web API key", masked_key.as_deref())? {
        creds.firestore_api_key = Some(key);
    }
    let masked_token = creds.id_token.as_deref().map(mask);
    if let Some(token) = prompt("ID token (optional)", masked_token.as_deref())? {
        creds.id_token = Some(token);
    }
    if let Some(uid) = prompt("User id (optional)", creds.user_id.as_deref())? {
        creds.user_id = Some(uid);
        let guest = prompt("Is this a guest (anonymous) account? [y/N]", None)?;
        creds.anonymous = guest.is_some_and(|answer| answer.eq_ignore_ascii_case("y"));
    }

    keyring::save_credentials(&creds)?;
    config.offline = false;
    config.save().map_err(|e| e.to_string())?;

    println!();
    println!("  ✓ Credentials saved to the system keychain");
    println!("  ✓ Config location: {}", Config::config_location());
    println!();
    Ok(())
}
