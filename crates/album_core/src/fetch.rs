use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::error::FetchError;
use url::Url;

/// Asynchronously produces the bytes behind a locator, or fails.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, locator: &Url) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(request_timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Url) -> Result<Vec<u8>, FetchError> {
        let res = self
            .http
            .get(locator.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| FetchError::transport(locator, transport_message(&err)))?;
        let body = res
            .bytes()
            .await
            .map_err(|err| FetchError::transport(locator, transport_message(&err)))?;

        if body.is_empty() {
            return Err(FetchError::empty_response(locator));
        }
        tracing::trace!(%locator, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else {
        err.to_string()
    }
}

#[cfg(test)]
#[path = "tests/fetch_tests.rs"]
mod tests;
