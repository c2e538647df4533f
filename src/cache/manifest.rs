//! The enumerated, versioned asset set mirrored at install.

use crate::config::AssetsConfig;

/// One cache generation's worth of assets, identified by a version tag.
#[derive(Debug, Clone)]
pub struct CacheManifest {
  /// Generation tag; also the name of the active cache store.
  pub version: String,
  /// Root document, served when a navigation fetch fails offline.
  pub root: String,
  /// Fallback icon for failed image fetches.
  pub placeholder_icon: String,
  /// Paths (relative to the base URL) precached at install.
  pub paths: Vec<String>,
}

impl CacheManifest {
  pub fn from_config(assets: &AssetsConfig) -> Self {
    Self {
      version: assets.version.clone(),
      root: assets.root.clone(),
      placeholder_icon: assets.placeholder_icon.clone(),
      paths: assets.paths.clone(),
    }
  }
}
