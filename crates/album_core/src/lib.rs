//! Album browser core: catalog loading, the batch thumbnail pipeline, and the
//! search-driven view model.

pub mod album;
pub mod fetch;
pub mod pipeline;
pub mod search;
pub mod settings;
pub mod thumbnail;
pub mod view_model;

pub use album::{Album, AlbumLoader, LoadError, DEFAULT_BATCH_LIMIT};
pub use fetch::{Fetcher, HttpFetcher};
pub use pipeline::{FetchBatch, FetchMode, FetchPipeline};
pub use search::{FieldEvent, FieldEventKind, FieldHub, FieldId, SearchField};
pub use settings::{load_settings, Settings};
pub use thumbnail::{PreviewImage, Thumbnail};
pub use view_model::{AlbumViewModel, SearchMode};
