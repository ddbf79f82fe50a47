use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for a lookback window, from the config file or the CLI.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub job: JobConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: Option<String>,
    pub lookback_days: Option<i64>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: None,
            lookback_days: Some(7),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub search_endpoint: String,
    pub get_record_endpoint: String,
    pub test_endpoint: String,
    #[serde(alias = "maxRecords")]
    pub max_records: Option<usize>,
    #[serde(default, alias = "grdc_filter_keywords")]
    pub filter_keywords: Vec<String>,
    pub timeout_seconds: Option<u64>,
}

impl SourceConfig {
    pub fn max_records(&self) -> usize {
        self.max_records.unwrap_or(100)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    #[default]
    File,
    Log,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::File => "file",
            NotificationChannel::Log => "log",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub channel: NotificationChannel,
    #[serde(default)]
    pub destination: Vec<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub output_dir: Option<String>,
}

impl NotificationsConfig {
    pub fn output_dir(&self) -> &str {
        self.output_dir.as_deref().unwrap_or("notifications")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub valid_resource_types: Option<Vec<String>>,
    pub classifications: Option<Vec<String>>,
    pub licenses: Option<Vec<String>>,
    pub reference_systems: Option<Vec<String>>,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl ValidatorConfig {
    pub fn valid_resource_types(&self) -> Vec<String> {
        self.valid_resource_types
            .clone()
            .unwrap_or_else(|| owned(&["dataset", "product"]))
    }

    pub fn classifications(&self) -> Vec<String> {
        self.classifications.clone().unwrap_or_else(|| {
            owned(&[
                "unclassified",
                "sensitive but unclassified",
                "for office use only",
                "limited distribution",
                "restricted",
                "confidential",
                "protected",
                "secret",
                "top secret",
            ])
        })
    }

    pub fn licenses(&self) -> Vec<String> {
        self.licenses.clone().unwrap_or_else(|| {
            owned(&[
                "AVR transfer agreement",
                "Data access license agreement",
                "Creative commons attribution 4.0 (CC-BY)",
            ])
        })
    }

    pub fn reference_systems(&self) -> Vec<String> {
        self.reference_systems
            .clone()
            .unwrap_or_else(|| owned(&["EPSG:4326", "EPSG:3857"]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub output_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
        }
    }
}

impl HarvestConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.url", &self.source.url)?;
        validation::validate_endpoint("source.search_endpoint", &self.source.search_endpoint)?;
        validation::validate_endpoint(
            "source.get_record_endpoint",
            &self.source.get_record_endpoint,
        )?;
        validation::validate_endpoint("source.test_endpoint", &self.source.test_endpoint)?;

        if let Some(max_records) = self.source.max_records {
            validation::validate_positive_number("source.max_records", max_records, 1)?;
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(days) = self.job.lookback_days {
            validation::validate_range("job.lookback_days", days, 1, MAX_LOOKBACK_DAYS)?;
        }

        validation::validate_path("store.output_path", &self.store.output_path)?;
        if self.notifications.channel == NotificationChannel::File {
            validation::validate_path(
                "notifications.output_dir",
                self.notifications.output_dir(),
            )?;
        }

        Ok(())
    }

    pub fn job_name(&self) -> &str {
        self.job.name.as_deref().unwrap_or("metadata-harvest")
    }

    pub fn lookback_days(&self) -> i64 {
        self.job.lookback_days.unwrap_or(7)
    }

    pub fn max_records(&self) -> usize {
        self.source.max_records()
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.source.timeout_seconds()
    }

    pub fn output_path(&self) -> &str {
        &self.store.output_path
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
