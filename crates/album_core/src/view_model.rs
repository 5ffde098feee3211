use std::sync::RwLock;

use futures::{Stream, StreamExt};

use crate::album::{Album, AlbumLoader, LoadError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    NotSearching,
    Searching(String),
}

impl SearchMode {
    /// Blank input means "not searching".
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::NotSearching
        } else {
            Self::Searching(trimmed.to_string())
        }
    }

    pub fn matches(&self, album: &Album) -> bool {
        match self {
            Self::NotSearching => true,
            Self::Searching(text) => album
                .title
                .to_lowercase()
                .contains(&text.to_lowercase()),
        }
    }
}

/// Application state behind the album list: the loaded albums and the
/// current search mode. The visible rows are derived on every call.
#[derive(Default)]
pub struct AlbumViewModel {
    albums: RwLock<Vec<Album>>,
    mode: RwLock<SearchMode>,
}

impl AlbumViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the album list on success. A failed load leaves the previous
    /// list in place.
    pub async fn load(&self, loader: &AlbumLoader) -> Result<usize, LoadError> {
        match loader.load_albums().await {
            Ok(albums) => {
                let count = albums.len();
                *self
                    .albums
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = albums;
                Ok(count)
            }
            Err(err) => {
                tracing::error!(error = %err, "album load failed; keeping previous albums");
                Err(err)
            }
        }
    }

    pub fn albums(&self) -> Vec<Album> {
        self.albums
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn album_count(&self) -> usize {
        self.albums
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn search_mode(&self) -> SearchMode {
        self.mode
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_search_text(&self, text: &str) {
        let mode = SearchMode::from_text(text);
        tracing::debug!(?mode, "search mode changed");
        *self
            .mode
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
    }

    pub fn visible_albums(&self) -> Vec<Album> {
        let mode = self.search_mode();
        self.albums
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|album| mode.matches(album))
            .cloned()
            .collect()
    }

    /// Applies every text the sequence yields until it ends.
    pub async fn drive_search<S>(&self, texts: S)
    where
        S: Stream<Item = String>,
    {
        futures::pin_mut!(texts);
        while let Some(text) = texts.next().await {
            self.set_search_text(&text);
        }
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
