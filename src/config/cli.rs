use crate::config::toml_config::MAX_LOOKBACK_DAYS;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "harvest-etl")]
#[command(about = "Harvest, validate and store GeoNetwork metadata records")]
pub struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/harvest.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Override job.lookback_days from the config
    #[arg(
        long,
        conflicts_with = "since",
        value_parser = clap::value_parser!(i64).range(1..=MAX_LOOKBACK_DAYS)
    )]
    pub lookback_days: Option<i64>,

    /// Harvest records changed after this RFC 3339 timestamp
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Print the search query and exit without contacting the catalogue
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// `--since` wins over any lookback window.
    pub fn resolve_since(&self, config_lookback_days: i64) -> Result<DateTime<Utc>> {
        if let Some(since) = self.since {
            return Ok(since);
        }
        let days = self.lookback_days.unwrap_or(config_lookback_days);
        validation::validate_range("lookback_days", days, 1, MAX_LOOKBACK_DAYS)?;

        Duration::try_days(days)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "lookback_days".to_string(),
                value: days.to_string(),
                reason: "Lookback window is out of range".to_string(),
            })
    }
}
