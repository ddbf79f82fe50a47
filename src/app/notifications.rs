use crate::adapters::storage::LocalStorage;
use crate::config::{NotificationChannel, NotificationsConfig};
use crate::domain::model::{BatchStats, NotificationMessage, ValidationDetails};
use crate::domain::ports::{NotificationBackend, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use chrono::Local;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writes each notification to its own text file.
pub struct FileNotificationBackend<S: Storage> {
    storage: S,
    channel: String,
    destination: Vec<String>,
    sequence: AtomicUsize,
}

impl<S: Storage> FileNotificationBackend<S> {
    pub fn new(storage: S, config: &NotificationsConfig) -> Self {
        Self {
            storage,
            channel: config.channel.as_str().to_string(),
            destination: config.destination.clone(),
            sequence: AtomicUsize::new(0),
        }
    }

    fn file_name(&self, subject: &str) -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let safe_subject: String = subject
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{:04}_{}.txt", timestamp, sequence, safe_subject)
    }

    fn render(&self, message: &NotificationMessage) -> String {
        let channel = message.channel.as_deref().unwrap_or(&self.channel);
        format!(
            "Subject: {}\nChannel: {}\nDestination: {}\n{}\n{}\n",
            message.subject,
            channel,
            self.destination.join(", "),
            "-".repeat(20),
            message.content
        )
    }
}

#[async_trait]
impl<S: Storage> NotificationBackend for FileNotificationBackend<S> {
    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        let file_name = self.file_name(&message.subject);
        self.storage
            .write_file(&file_name, self.render(message).as_bytes())
            .await
            .map_err(|e| EtlError::NotificationError {
                message: format!("could not write {}: {}", file_name, e),
            })
    }
}

/// Emits notifications as log events.
pub struct LogNotificationBackend {
    destination: Vec<String>,
}

impl LogNotificationBackend {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            destination: config.destination.clone(),
        }
    }
}

#[async_trait]
impl NotificationBackend for LogNotificationBackend {
    async fn send(&self, message: &NotificationMessage) -> Result<()> {
        tracing::info!(
            subject = %message.subject,
            destination = ?self.destination,
            "📣 {}",
            message.content
        );
        Ok(())
    }
}

pub struct NotificationService {
    backend: Box<dyn NotificationBackend>,
}

impl NotificationService {
    pub fn new(backend: Box<dyn NotificationBackend>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &NotificationsConfig) -> Self {
        let backend: Box<dyn NotificationBackend> = match config.channel {
            NotificationChannel::File => Box::new(FileNotificationBackend::new(
                LocalStorage::new(config.output_dir().to_string()),
                config,
            )),
            NotificationChannel::Log => Box::new(LogNotificationBackend::new(config)),
        };
        Self::new(backend)
    }

    async fn send(&self, message: NotificationMessage) {
        if let Err(e) = self.backend.send(&message).await {
            tracing::warn!("Dropping notification '{}': {}", message.subject, e);
        }
    }

    pub async fn notify_connection_error(&self, error: &EtlError) {
        self.send(NotificationMessage::new(
            "Connection Error",
            format!("A connection error occurred: {}", error),
        ))
        .await;
    }

    pub async fn notify_record_processor_error(&self, details: &ValidationDetails) {
        let mut content = format!("Record {} could not be processed:", details.record_id);
        for error in &details.errors {
            let _ = write!(content, "\n  - {}", error);
        }
        self.send(NotificationMessage::new(
            format!("Invalid Record: {}", details.record_id),
            content,
        ))
        .await;
    }

    pub async fn notify_batch_summary(&self, stats: &BatchStats) {
        let since = stats
            .since
            .map(|since| since.to_rfc3339())
            .unwrap_or_else(|| "the beginning".to_string());
        let finished = stats
            .finished_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let mut content = format!(
            "Harvest {}. Records changed since {}.\n\
             Fetched: {}\nValid: {}\nInvalid: {}\nSaved: {}\nFailed: {}\n\
             Started: {}\nFinished: {}",
            stats.status(),
            since,
            stats.fetched,
            stats.valid,
            stats.invalid,
            stats.saved,
            stats.failed,
            stats.started_at.to_rfc3339(),
            finished
        );
        if !stats.failed_records.is_empty() {
            let _ = write!(
                content,
                "\nFailed records: {}",
                stats.failed_records.join(", ")
            );
        }
        self.send(NotificationMessage::new("Batch Summary", content)).await;
    }
}
