use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexFolderRequest {
    /// Empty the collection first and index the whole data folder again.
    #[serde(default)]
    pub force_reindex: bool,
}
