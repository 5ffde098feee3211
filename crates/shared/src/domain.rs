use serde::{Deserialize, Serialize};
use url::Url;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(AlbumId);
id_newtype!(ResourceId);

/// Everything needed to retrieve one remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchDescriptor {
    pub id: ResourceId,
    pub locator: Url,
}

impl FetchDescriptor {
    pub fn new(id: ResourceId, locator: Url) -> Self {
        Self { id, locator }
    }
}

/// One entry of the remote album catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResource {
    pub album_id: AlbumId,
    pub id: ResourceId,
    pub title: String,
    pub url: Url,
    pub thumbnail_url: Url,
}

impl AlbumResource {
    pub fn thumbnail_descriptor(&self) -> FetchDescriptor {
        FetchDescriptor::new(self.id, self.thumbnail_url.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl BatchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}
