use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Override for the data directory (snapshot, theme, cache, log).
  pub data_dir: Option<PathBuf>,
  /// Offline asset mirror settings.
  #[serde(default)]
  pub assets: AssetsConfig,
}

/// The app-shell mirror: a versioned set of remote assets kept available
/// offline. Defaults cover the published shell, so no config is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
  /// Disable to skip caching entirely (storage becomes a no-op).
  pub enabled: bool,
  /// Base URL the asset paths resolve against.
  pub base_url: String,
  /// Cache generation tag. Bump together with the published assets.
  pub version: String,
  /// Root document served when a navigation fetch fails offline.
  pub root: String,
  /// Icon served when an image fetch fails with nothing cached.
  pub placeholder_icon: String,
  /// Enumerated asset paths mirrored at install.
  pub paths: Vec<String>,
}

impl Default for AssetsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      base_url: "https://tuido.dev/app/".to_string(),
      version: "tuido-assets-v2".to_string(),
      root: "index.html".to_string(),
      placeholder_icon: "icons/icon-192.png".to_string(),
      paths: vec![
        "index.html".to_string(),
        "styles.css".to_string(),
        "manifest.json".to_string(),
        "icons/icon-192.png".to_string(),
        "icons/icon-512.png".to_string(),
      ],
    }
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided (an error if missing)
  /// 2. ./tuido.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tuido/config.yaml
  ///
  /// No file at all is fine: every field has a default.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tuido.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tuido").join("config.yaml");
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

  /// Resolve the data directory: CLI override, then config, then the
  /// platform data dir.
  pub fn resolve_data_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = cli_override {
      return Ok(p.to_path_buf());
    }
    if let Some(p) = &self.data_dir {
      return Ok(p.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("tuido"))
  }

  /// Parsed asset base URL.
  pub fn asset_base_url(&self) -> Result<Url> {
    Url::parse(&self.assets.base_url)
      .map_err(|e| eyre!("Invalid assets.base_url {}: {}", self.assets.base_url, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_parse() {
    let config = Config::default();
    assert!(config.assets.enabled);
    assert!(config.assets.paths.contains(&config.assets.root));
    assert!(config
      .assets
      .paths
      .contains(&config.assets.placeholder_icon));
    config.asset_base_url().unwrap();
  }

  #[test]
  fn test_yaml_overrides() {
    let yaml = r#"
data_dir: /tmp/tuido-test
assets:
  version: "tuido-assets-v3"
  paths: ["index.html"]
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
      config.data_dir.as_deref(),
      Some(Path::new("/tmp/tuido-test"))
    );
    assert_eq!(config.assets.version, "tuido-assets-v3");
    assert_eq!(config.assets.paths, vec!["index.html"]);
    // Untouched fields keep their defaults.
    assert!(config.assets.enabled);
    assert_eq!(config.assets.root, "index.html");
  }

  #[test]
  fn test_cli_override_wins() {
    let config = Config {
      data_dir: Some(PathBuf::from("/from-config")),
      ..Config::default()
    };
    let dir = config
      .resolve_data_dir(Some(Path::new("/from-cli")))
      .unwrap();
    assert_eq!(dir, PathBuf::from("/from-cli"));
  }
}
