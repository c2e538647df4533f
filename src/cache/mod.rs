//! Versioned offline asset cache.
//!
//! This module mirrors an enumerated set of remote assets (the app shell)
//! into a local store so they stay available without a network connection:
//! - Install eagerly fetches the manifest into the current cache generation
//! - Activate purges every generation other than the current one
//! - Fetch serves cache-first, with a shell fallback for navigations and a
//!   placeholder fallback for images

mod fetcher;
mod manifest;
mod storage;
mod worker;

pub use fetcher::{FetchResponse, HttpFetcher};
pub use manifest::CacheManifest;
pub use storage::{CacheStorage, CachedAsset, SqliteStorage};
pub use worker::{AssetRequest, CacheWorker, Method, RequestKind};
