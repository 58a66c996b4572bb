// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

/// The one environment variable consulted: the API credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("appforge");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

/// Load the config at `path`, writing the defaults there on first run.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(&default_config, path)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, contents).context("Failed to write config file")?;

    Ok(())
}

/// Pick the API credential: the config file wins over the environment.
pub fn resolve_api_key(config: &AppConfig, env_value: Option<String>) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or(env_value)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured. Set {API_KEY_ENV} or add api_key to the config file."
            )
        })
}

/// Directory generated bundles are written to.
pub fn output_dir(config: &AppConfig) -> PathBuf {
    config
        .output_dir
        .as_ref()
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Candidate log files, most preferred first.
pub fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("appforge").join("logs").join("appforge.log"));
    }

    // Fallback for environments without a usable config dir
    candidates.push(PathBuf::from(".appforge").join("logs").join("appforge.log"));

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("appforge/config.toml");

        let config = load_config_from(&path).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists(), "default config should be written on first run");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            api_url: "http://custom:8080/v1".to_string(),
            structured_output: true,
            output_dir: Some("/tmp/out".to_string()),
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "model = [").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        let config = AppConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        let key = resolve_api_key(&config, Some("from-env".to_string())).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_resolve_api_key_falls_back_to_env() {
        let key = resolve_api_key(&AppConfig::default(), Some(" sk-env \n".to_string())).unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let err = resolve_api_key(&AppConfig::default(), Some("   ".to_string())).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
        assert!(resolve_api_key(&AppConfig::default(), None).is_err());
    }

    #[test]
    fn test_output_dir_defaults_to_current_dir() {
        assert_eq!(output_dir(&AppConfig::default()), PathBuf::from("."));
        let config = AppConfig {
            output_dir: Some("exports".to_string()),
            ..Default::default()
        };
        assert_eq!(output_dir(&config), PathBuf::from("exports"));
    }

    #[test]
    fn test_log_file_candidates_has_local_fallback() {
        let candidates = log_file_candidates();
        assert_eq!(
            candidates.last().unwrap(),
            &PathBuf::from(".appforge/logs/appforge.log")
        );
    }
}
