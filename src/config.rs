use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Freshness window for cached list data, in milliseconds
  #[serde(default = "default_cache_ttl_ms")]
  pub cache_ttl_ms: u64,
  /// View opened on startup
  #[serde(default)]
  pub default_view: StartView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the Trove backend, e.g. https://trove.example.com
  pub url: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartView {
  #[default]
  Items,
  Docs,
}

fn default_cache_ttl_ms() -> u64 {
  30_000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./trove.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/trove/config.yaml
  /// 4. ~/.config/trove/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/trove/config.yaml\n\
                 with at least an api.url entry."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("trove.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("trove").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// The configured cache freshness window.
  pub fn cache_time(&self) -> Duration {
    Duration::from_millis(self.cache_ttl_ms)
  }

  /// Get the backend API token from environment variables.
  ///
  /// Checks TROVE_API_TOKEN first, then TROVE_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("TROVE_API_TOKEN")
      .or_else(|_| std::env::var("TROVE_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set TROVE_API_TOKEN or TROVE_TOKEN environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn test_minimal_config_gets_defaults() {
    let file = write_config("api:\n  url: https://trove.example.com\n");
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.api.url, "https://trove.example.com");
    assert_eq!(config.cache_ttl_ms, 30_000);
    assert_eq!(config.cache_time(), Duration::from_secs(30));
    assert_eq!(config.default_view, StartView::Items);
  }

  #[test]
  fn test_full_config_overrides_defaults() {
    let file = write_config(
      "api:\n  url: http://localhost:3000\ncache_ttl_ms: 5000\ndefault_view: docs\n",
    );
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.cache_ttl_ms, 5000);
    assert_eq!(config.default_view, StartView::Docs);
  }

  #[test]
  fn test_missing_api_url_is_an_error() {
    let file = write_config("cache_ttl_ms: 5000\n");
    assert!(Config::load_from_path(file.path()).is_err());
  }
}
