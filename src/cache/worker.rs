//! Cache lifecycle and fetch policy.
//!
//! The worker owns one manifest (the current generation) over a storage
//! backend. Network access goes through fetcher closures, mirroring how
//! the UI passes work to background tasks, so every policy branch can be
//! exercised without a network.

use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::fetcher::FetchResponse;
use super::manifest::CacheManifest;
use super::storage::{CacheStorage, CachedAsset};

/// What kind of resource a request is for. Drives the fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
  /// Top-level document load; falls back to the cached root when offline.
  Navigation,
  /// Image resource; falls back to the placeholder icon when offline.
  Image,
  /// Anything else; offline failures propagate.
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Method {
  Get,
  Head,
  Post,
}

/// An intercepted asset request.
#[derive(Debug, Clone)]
pub struct AssetRequest {
  pub path: String,
  pub kind: RequestKind,
  pub method: Method,
}

impl AssetRequest {
  pub fn navigation(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      kind: RequestKind::Navigation,
      method: Method::Get,
    }
  }

  #[allow(dead_code)]
  pub fn get(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      kind: RequestKind::Other,
      method: Method::Get,
    }
  }

  #[allow(dead_code)]
  pub fn image(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      kind: RequestKind::Image,
      method: Method::Get,
    }
  }
}

/// Versioned asset cache over a storage backend.
pub struct CacheWorker<S: CacheStorage> {
  storage: Arc<S>,
  manifest: CacheManifest,
  /// Origin of the asset base URL; responses from other origins are never
  /// stored.
  origin: Url,
}

impl<S: CacheStorage> CacheWorker<S> {
  pub fn new(storage: S, manifest: CacheManifest, base_url: Url) -> Self {
    Self {
      storage: Arc::new(storage),
      manifest,
      origin: base_url,
    }
  }

  pub fn manifest(&self) -> &CacheManifest {
    &self.manifest
  }

  /// Whether the active generation holds the cached root document.
  /// The install prompt is shown while this is false.
  pub fn shell_cached(&self) -> Result<bool> {
    Ok(
      self
        .storage
        .get_asset(&self.manifest.version, &self.manifest.root)?
        .is_some(),
    )
  }

  /// Install phase: fetch the whole manifest concurrently and store it
  /// under the current generation tag. All-or-nothing: any failed or
  /// non-200 fetch fails the install and nothing is stored.
  pub async fn install<F, Fut>(&self, fetch: F) -> Result<()>
  where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<FetchResponse>>,
  {
    let fetches = self.manifest.paths.iter().map(|path| {
      let fut = fetch(path.clone());
      async move {
        let resp = fut.await?;
        if !resp.ok() {
          return Err(eyre!("precache of {} returned status {}", path, resp.status));
        }
        Ok((path.as_str(), resp))
      }
    });

    let responses = try_join_all(fetches).await?;
    for (path, resp) in responses {
      self.storage.store_asset(
        &self.manifest.version,
        path,
        resp.content_type.as_deref(),
        &resp.body,
      )?;
    }

    info!(
      "installed cache generation {} ({} assets)",
      self.manifest.version,
      self.manifest.paths.len()
    );
    Ok(())
  }

  /// Activate phase: garbage-collect every generation whose tag differs
  /// from the current version.
  pub fn activate(&self) -> Result<()> {
    for generation in self.storage.list_generations()? {
      if generation != self.manifest.version {
        self.storage.delete_generation(&generation)?;
        info!("purged stale cache generation {generation}");
      }
    }
    Ok(())
  }

  /// Fetch interception policy.
  ///
  /// Navigations go network-first with the cached root as offline
  /// fallback. Everything else is cache-first: a cached match is returned
  /// unconditionally; a miss goes to the network and a 200 GET response
  /// is opportunistically stored (store failures are tolerated). A failed
  /// image fetch falls back to the cached placeholder icon.
  pub async fn fetch<F, Fut>(&self, req: &AssetRequest, fetch: F) -> Result<CachedAsset>
  where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<FetchResponse>>,
  {
    if req.kind == RequestKind::Navigation {
      return match fetch(req.path.clone()).await {
        Ok(resp) => Ok(asset_from(resp)),
        Err(err) => {
          debug!("navigation fetch failed, serving cached shell: {err}");
          self
            .cached(&self.manifest.root)
            .ok_or_else(|| eyre!("offline and no cached shell: {}", err))
        }
      };
    }

    // Cache-first, no revalidation.
    if let Some(hit) = self.cached(&req.path) {
      return Ok(hit);
    }

    match fetch(req.path.clone()).await {
      Ok(resp) => {
        if resp.ok() && req.method == Method::Get {
          self.maybe_store(&req.path, &resp);
        }
        Ok(asset_from(resp))
      }
      Err(err) => {
        if req.kind == RequestKind::Image {
          if let Some(icon) = self.cached(&self.manifest.placeholder_icon) {
            debug!("image fetch failed, serving placeholder icon: {err}");
            return Ok(icon);
          }
        }
        Err(err)
      }
    }
  }

  /// Cache lookup with read failures treated as misses.
  fn cached(&self, path: &str) -> Option<CachedAsset> {
    match self.storage.get_asset(&self.manifest.version, path) {
      Ok(Some(hit)) => {
        debug!(
          "cache hit for {path} ({}, cached {})",
          hit.content_type.as_deref().unwrap_or("unknown type"),
          hit.cached_at
        );
        Some(hit)
      }
      Ok(None) => None,
      Err(e) => {
        warn!("cache read failed for {path}: {e}");
        None
      }
    }
  }

  /// Opportunistically store a successful response, tolerating failure.
  /// Cross-origin responses are never stored.
  fn maybe_store(&self, path: &str, resp: &FetchResponse) {
    if let Ok(url) = Url::parse(path) {
      if url.origin() != self.origin.origin() {
        debug!("not caching cross-origin response for {path}");
        return;
      }
    }
    if let Err(e) = self.storage.store_asset(
      &self.manifest.version,
      path,
      resp.content_type.as_deref(),
      &resp.body,
    ) {
      warn!("cache write failed for {path}: {e}");
    }
  }
}

impl<S: CacheStorage> Clone for CacheWorker<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      manifest: self.manifest.clone(),
      origin: self.origin.clone(),
    }
  }
}

fn asset_from(resp: FetchResponse) -> CachedAsset {
  CachedAsset {
    body: resp.body,
    content_type: resp.content_type,
    cached_at: chrono::Utc::now(),
  }
}
