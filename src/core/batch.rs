use crate::app::notifications::NotificationService;
use crate::domain::model::{BatchStats, Record, ValidationResult};
use crate::domain::ports::{Connector, RecordStore, Transformer, Validator};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};

/// One harvest run: connect, search, then validate/transform/save each record
/// in fetch order, finishing with a single summary notification.
pub struct BatchJob<C, V, T, S>
where
    C: Connector,
    V: Validator,
    T: Transformer,
    S: RecordStore,
{
    connector: C,
    validator: V,
    transformer: T,
    store: S,
    notifications: NotificationService,
    since: Option<DateTime<Utc>>,
}

impl<C, V, T, S> BatchJob<C, V, T, S>
where
    C: Connector,
    V: Validator,
    T: Transformer,
    S: RecordStore,
{
    pub fn new(
        connector: C,
        validator: V,
        transformer: T,
        store: S,
        notifications: NotificationService,
    ) -> Self {
        Self {
            connector,
            validator,
            transformer,
            store,
            notifications,
            since: None,
        }
    }

    /// Only records created or changed after `since` are harvested.
    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub async fn run(&self) -> Result<BatchStats> {
        tracing::info!("Starting batch run");
        let mut stats = BatchStats::start(self.since);

        let records = self.fetch_records().await?;
        stats.fetched = records.len();
        tracing::info!("Fetched {} records", stats.fetched);

        for record in &records {
            self.process_record(record, &mut stats).await;
        }

        stats.finish();
        tracing::info!(
            "Batch run {}: {} valid, {} invalid, {} saved, {} failed",
            stats.status(),
            stats.valid,
            stats.invalid,
            stats.saved,
            stats.failed
        );
        self.notifications.notify_batch_summary(&stats).await;

        Ok(stats)
    }

    async fn fetch_records(&self) -> Result<Vec<Record>> {
        if !self.connector.can_connect().await {
            let err = EtlError::ConnectionError {
                message: "connectivity check failed".to_string(),
            };
            tracing::error!("❌ {}", err);
            self.notifications.notify_connection_error(&err).await;
            return Err(err);
        }

        let query = self.connector.construct_query(self.since);
        match self.connector.search_records(&query).await {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::error!("❌ Searching records failed: {}", err);
                self.notifications.notify_connection_error(&err).await;
                Err(err)
            }
        }
    }

    async fn process_record(&self, record: &Record, stats: &mut BatchStats) {
        match self.validator.validate(record) {
            ValidationResult::Valid => {
                stats.valid += 1;
                match self.transform_and_save(record).await {
                    Ok(()) => stats.saved += 1,
                    Err(err) => {
                        // Only counted; the summary lists failed records.
                        tracing::warn!("Record {} failed: {}", record.uuid, err);
                        stats.record_failure(&record.uuid);
                    }
                }
            }
            ValidationResult::Invalid(details) => {
                stats.invalid += 1;
                tracing::info!(
                    "Record {} is invalid ({} errors)",
                    record.uuid,
                    details.errors.len()
                );
                self.notifications.notify_record_processor_error(&details).await;
            }
        }
    }

    async fn transform_and_save(&self, record: &Record) -> Result<()> {
        let transformed = self.transformer.transform(record)?;
        self.store.save(&transformed).await?;
        tracing::debug!("Saved record {}", record.uuid);
        Ok(())
    }
}
