use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A metadata record as fetched from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub uuid: String,
    /// Raw ISO 19115-3 XML document.
    pub content: String,
}

impl Record {
    pub fn new(uuid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            content: content.into(),
        }
    }
}

/// Elasticsearch query body sent to the catalogue search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(pub serde_json::Value);

impl SearchQuery {
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    pub record_id: String,
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationDetails),
}

impl ValidationResult {
    pub fn from_errors(record_id: &str, errors: Vec<String>) -> Self {
        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationDetails {
                record_id: record_id.to_string(),
                errors,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn errors(&self) -> &[String] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(details) => &details.errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub begin: String,
    pub end: String,
}

/// Flattened summary of a valid record, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedData {
    pub uuid: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub resource_type: Option<String>,
    pub purpose: Option<String>,
    pub contract_code: Option<String>,
    pub classification: Option<String>,
    pub license: Option<String>,
    pub reference_system: Option<String>,
    pub bounding_box: Option<BoundingBox>,
    pub temporal_extent: Option<TemporalExtent>,
    pub harvested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    CompletedWithErrors,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::CompletedWithErrors => write!(f, "completed with errors"),
        }
    }
}

/// Counters accumulated over one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub since: Option<DateTime<Utc>>,
    pub fetched: usize,
    pub valid: usize,
    pub invalid: usize,
    pub saved: usize,
    /// Valid records whose transform or save failed.
    pub failed: usize,
    #[serde(default)]
    pub failed_records: Vec<String>,
}

impl BatchStats {
    pub fn start(since: Option<DateTime<Utc>>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            since,
            fetched: 0,
            valid: 0,
            invalid: 0,
            saved: 0,
            failed: 0,
            failed_records: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, record_id: &str) {
        self.failed += 1;
        self.failed_records.push(record_id.to_string());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn status(&self) -> BatchStatus {
        if self.invalid == 0 && self.failed == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::CompletedWithErrors
        }
    }

    pub fn processed(&self) -> usize {
        self.valid + self.invalid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub subject: String,
    pub content: String,
    /// Overrides the configured channel for this message.
    pub channel: Option<String>,
}

impl NotificationMessage {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            channel: None,
        }
    }
}
