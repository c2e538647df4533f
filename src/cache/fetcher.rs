//! Network side of the cache: a plain response type plus the reqwest-backed
//! fetcher used in production. The worker itself takes fetchers as closures,
//! so tests never touch the network.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// A fetched response, reduced to what the cache needs.
#[derive(Debug, Clone)]
pub struct FetchResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl FetchResponse {
  pub fn ok(&self) -> bool {
    self.status == 200
  }
}

/// HTTP fetcher resolving asset paths against the manifest base URL.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  base: Url,
}

impl HttpFetcher {
  pub fn new(base: Url) -> Self {
    Self {
      client: reqwest::Client::new(),
      base,
    }
  }

  /// GET an asset. `path` may be relative to the base URL or absolute.
  pub async fn get(&self, path: &str) -> Result<FetchResponse> {
    let url = self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid asset path {}: {}", path, e))?;

    let resp = self.client.get(url).send().await?;
    let status = resp.status().as_u16();
    let content_type = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = resp.bytes().await?.to_vec();

    Ok(FetchResponse {
      status,
      content_type,
      body,
    })
  }
}
