//! Configuration loader
//!
//! Loads [`Settings`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SYMPLUR_CLIENT_ID`: OAuth client ID (required)
//! - `SYMPLUR_CLIENT_SECRET`: OAuth client secret (required)
//! - `SYMPLUR_BASE_URI`: API root (optional)
//! - `SYMPLUR_TIMEOUT_SECS`: Request timeout in seconds (optional)
//!
//! ## File Locations
//! The loader probes `symplur.toml` and `symplur.json` in the current
//! directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};

use super::{ClientConfig, Settings};
use crate::errors::ApiError;

/// Client ID variable
pub const ENV_CLIENT_ID: &str = "SYMPLUR_CLIENT_ID";
/// Client secret variable
pub const ENV_CLIENT_SECRET: &str = "SYMPLUR_CLIENT_SECRET";
/// Base URI variable
pub const ENV_BASE_URI: &str = "SYMPLUR_BASE_URI";
/// Timeout variable
pub const ENV_TIMEOUT_SECS: &str = "SYMPLUR_TIMEOUT_SECS";

const FILE_NAMES: [&str; 2] = ["symplur.toml", "symplur.json"];

/// Load settings with automatic fallback strategy
///
/// First attempts to load from environment variables. If a required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ApiError::Config` if settings cannot be loaded from either
/// source or the file format is invalid.
pub fn load() -> Result<Settings, ApiError> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from environment variables
///
/// # Errors
/// Returns `ApiError::Config` if the credentials are missing or the
/// timeout is not a number.
pub fn load_from_env() -> Result<Settings, ApiError> {
    let client_id = env_var(ENV_CLIENT_ID)?;
    let client_secret = env_var(ENV_CLIENT_SECRET)?;

    let mut client = ClientConfig::default();
    if let Ok(base_uri) = std::env::var(ENV_BASE_URI) {
        client.base_uri = base_uri;
    }
    if let Ok(timeout) = std::env::var(ENV_TIMEOUT_SECS) {
        client.timeout_secs = timeout
            .parse::<u64>()
            .map_err(|e| ApiError::Config(format!("Invalid timeout: {e}")))?;
    }

    Ok(Settings { client_id, client_secret, client })
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `ApiError::Config` if the file is missing, unreadable, or does
/// not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings, ApiError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ApiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ApiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse settings, picking the format from the file extension
fn parse_config(contents: &str, path: &Path) -> Result<Settings, ApiError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ApiError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ApiError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String, ApiError> {
    std::env::var(key)
        .map_err(|_| ApiError::Config(format!("Missing required environment variable: {key}")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::{DEFAULT_BASE_URI, DEFAULT_TIMEOUT_SECS};

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_env() {
        for key in [ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_BASE_URI, ENV_TIMEOUT_SECS] {
            std::env::remove_var(key);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
        let mut file = tempfile::Builder::new().suffix(&format!(".{extension}")).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let path = file.path().to_path_buf();
        (file, path)
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var(ENV_CLIENT_ID, "myid");
        std::env::set_var(ENV_CLIENT_SECRET, "mysecret");
        std::env::set_var(ENV_BASE_URI, "http://localhost:8080/v1");
        std::env::set_var(ENV_TIMEOUT_SECS, "30");

        let settings = load_from_env().unwrap();
        assert_eq!(settings.client_id, "myid");
        assert_eq!(settings.client_secret, "mysecret");
        assert_eq!(settings.client.base_uri, "http://localhost:8080/v1");
        assert_eq!(settings.client.timeout_secs, 30);

        clear_env();
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CLIENT_ID, "myid");
        std::env::set_var(ENV_CLIENT_SECRET, "mysecret");

        let settings = load_from_env().unwrap();
        assert_eq!(settings.client.base_uri, DEFAULT_BASE_URI);
        assert_eq!(settings.client.timeout_secs, 600);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CLIENT_ID, "myid");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains(ENV_CLIENT_SECRET)));

        clear_env();
    }

    #[test]
    fn test_load_from_env_zero_timeout_uses_default() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CLIENT_ID, "myid");
        std::env::set_var(ENV_CLIENT_SECRET, "mysecret");
        std::env::set_var(ENV_TIMEOUT_SECS, "0");

        let settings = load_from_env().unwrap();
        assert_eq!(settings.client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_timeout() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CLIENT_ID, "myid");
        std::env::set_var(ENV_CLIENT_SECRET, "mysecret");
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");

        assert!(matches!(load_from_env(), Err(ApiError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_file, path) = temp_config(
            r#"
client_id = "myid"
client_secret = "mysecret"
base_uri = "http://example.com/v1/"
timeout_secs = 10

[headers]
X-Trace = "abc"
"#,
            "toml",
        );

        let settings = load_from_file(Some(path)).unwrap();
        assert_eq!(settings.client_id, "myid");
        assert_eq!(settings.client.normalized_base_uri(), "http://example.com/v1");
        assert_eq!(settings.client.timeout_secs, 10);
        assert_eq!(settings.client.headers.get("X-Trace").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_load_from_file_json() {
        let (_file, path) =
            temp_config(r#"{"client_id": "myid", "client_secret": "mysecret"}"#, "json");

        let settings = load_from_file(Some(path)).unwrap();
        assert_eq!(settings.client_secret, "mysecret");
        assert_eq!(settings.client.base_uri, DEFAULT_BASE_URI);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/symplur.toml"))).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.starts_with("Config file not found")));
    }

    #[test]
    fn test_parse_config_rejects_unknown_extension() {
        let err = parse_config("", Path::new("symplur.yaml")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("yaml")));
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let err = parse_config("client_id = ", Path::new("symplur.toml")).unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.starts_with("Invalid TOML")));
    }
}
