use std::sync::Arc;

use shared::{domain::AlbumResource, error::FetchError};
use thiserror::Error;
use url::Url;

use crate::{
    fetch::Fetcher,
    pipeline::{FetchBatch, FetchMode, FetchPipeline},
    thumbnail::Thumbnail,
};

pub const DEFAULT_BATCH_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub title: String,
    pub thumbnail: Thumbnail,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("malformed album catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

/// Loads the album catalog and every listed thumbnail.
pub struct AlbumLoader {
    fetcher: Arc<dyn Fetcher>,
    catalog_url: Url,
    batch_limit: usize,
    mode: FetchMode,
}

impl AlbumLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, catalog_url: Url) -> Self {
        Self {
            fetcher,
            catalog_url,
            batch_limit: DEFAULT_BATCH_LIMIT,
            mode: FetchMode::default(),
        }
    }

    pub fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fetches the catalog and keeps the first `batch_limit` entries.
    pub async fn fetch_catalog(&self) -> Result<Vec<AlbumResource>, LoadError> {
        let bytes = self.fetcher.fetch(&self.catalog_url).await?;
        let mut resources: Vec<AlbumResource> = serde_json::from_slice(&bytes)?;
        let listed = resources.len();
        resources.truncate(self.batch_limit);
        tracing::debug!(listed, kept = resources.len(), "album catalog fetched");
        Ok(resources)
    }

    pub async fn load_albums(&self) -> Result<Vec<Album>, LoadError> {
        let resources = self.fetch_catalog().await?;
        let batch = FetchBatch::new(
            resources
                .iter()
                .map(AlbumResource::thumbnail_descriptor)
                .collect(),
        );
        let pipeline = FetchPipeline::new(Arc::clone(&self.fetcher), self.mode);
        let thumbnails = batch
            .run(&pipeline, |_, bytes| Thumbnail::from_bytes(&bytes))
            .await?;

        let albums: Vec<Album> = resources
            .into_iter()
            .zip(thumbnails)
            .map(|(resource, thumbnail)| Album {
                title: resource.title,
                thumbnail,
            })
            .collect();
        let placeholders = albums
            .iter()
            .filter(|album| album.thumbnail.is_placeholder())
            .count();
        tracing::info!(count = albums.len(), placeholders, "albums loaded");
        Ok(albums)
    }
}

#[cfg(test)]
#[path = "tests/album_tests.rs"]
mod tests;
