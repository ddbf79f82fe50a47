use crate::domain::model::TransformedData;
use crate::domain::ports::{RecordStore, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;

/// Stores each transformed record as `records/{uuid}.json`.
pub struct FileStore<S: Storage> {
    storage: S,
}

impl<S: Storage> FileStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Form-encodes the uuid so distinct uuids never share a file.
    pub fn record_path(uuid: &str) -> String {
        let safe: String = url::form_urlencoded::byte_serialize(uuid.as_bytes()).collect();
        format!("records/{}.json", safe)
    }
}

#[async_trait]
impl<S: Storage> RecordStore for FileStore<S> {
    async fn save(&self, data: &TransformedData) -> Result<()> {
        let path = Self::record_path(&data.uuid);
        let json = serde_json::to_vec_pretty(data)?;

        tracing::debug!("Writing {} ({} bytes)", path, json.len());
        self.storage
            .write_file(&path, &json)
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!("could not save {}: {}", path, e),
            })
    }
}
