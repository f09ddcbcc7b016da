//! Provider credential resolution.
//!
//! Tokens are looked up in the process environment first, then in a
//! local credentials file (`$XDG_CONFIG_HOME/lumen/credentials.json`,
//! falling back to `~/.config/lumen/credentials.json`). A missing key
//! is a configuration error surfaced before any network call.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::provider::ProviderId;

/// Resolve the API token for a provider.
///
/// Environment wins over the credentials file so deployments can
/// override whatever a developer has stored locally.
pub fn resolve_credential(provider: ProviderId) -> Result<String, CoreError> {
    let env_key = provider.credential_env();

    if let Ok(token) = std::env::var(env_key) {
        if !token.trim().is_empty() {
            return Ok(token);
        }
    }

    if let Some(token) = lookup_in_file(env_key) {
        return Ok(token);
    }

    Err(CoreError::MissingCredential { provider, env_key })
}

/// Path of the local credentials file, if a config directory exists.
pub fn credentials_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(config_dir.join("lumen").join("credentials.json"))
}

/// Read a token from the credentials file.
///
/// The file is a flat JSON object keyed by the same names as the
/// environment variables. Unreadable or malformed files are treated as
/// absent -- the caller falls through to the missing-credential error.
fn lookup_in_file(env_key: &str) -> Option<String> {
    let path = credentials_path()?;
    let raw = std::fs::read_to_string(path).ok()?;
    let map: HashMap<String, String> = serde_json::from_str(&raw).ok()?;
    map.get(env_key)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env mutation is process-global, so every env-dependent case runs
    // inside this single test to avoid interference under the parallel
    // test runner.
    #[test]
    fn resolution_order_env_then_file_then_error() {
        let env_key = ProviderId::Sdxl.credential_env();

        // Environment wins.
        std::env::set_var(env_key, "tok-from-env");
        let token = resolve_credential(ProviderId::Sdxl).unwrap();
        assert_eq!(token, "tok-from-env");
        std::env::remove_var(env_key);

        // Falls back to the credentials file.
        let dir = tempfile::tempdir().unwrap();
        let lumen_dir = dir.path().join("lumen");
        std::fs::create_dir_all(&lumen_dir).unwrap();
        std::fs::write(
            lumen_dir.join("credentials.json"),
            r#"{"REPLICATE_API_TOKEN": "tok-from-file"}"#,
        )
        .unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        let token = resolve_credential(ProviderId::Flux).unwrap();
        assert_eq!(token, "tok-from-file");

        // Neither source present: configuration error.
        std::env::set_var("XDG_CONFIG_HOME", "/nonexistent-config-dir");
        let err = resolve_credential(ProviderId::Sdxl).unwrap_err();
        assert!(matches!(err, CoreError::MissingCredential { .. }));
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    fn blank_file_entry_is_treated_as_absent() {
        assert_eq!(lookup_in_file("NO_SUCH_KEY_EVER"), None);
    }
}
