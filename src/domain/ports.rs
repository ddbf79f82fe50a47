use crate::domain::model::{
    NotificationMessage, Record, SearchQuery, TransformedData, ValidationResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source side of the batch: a searchable catalogue of records.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn can_connect(&self) -> bool;

    /// Builds the search for records created or changed after `since`.
    fn construct_query(&self, since: Option<DateTime<Utc>>) -> SearchQuery;

    async fn search_records(&self, query: &SearchQuery) -> Result<Vec<Record>>;
}

pub trait Validator: Send + Sync {
    fn validate(&self, record: &Record) -> ValidationResult;
}

pub trait Transformer: Send + Sync {
    fn transform(&self, record: &Record) -> Result<TransformedData>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, data: &TransformedData) -> Result<()>;
}

#[async_trait]
pub trait NotificationBackend: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<()>;
}
