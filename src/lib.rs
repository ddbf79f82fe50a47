pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{FileStore, LocalStorage};
pub use app::{GeoNetworkConnector, MetadataTransformer, MetadataValidator, NotificationService};
pub use config::HarvestConfig;
pub use crate::core::batch::BatchJob;
pub use utils::error::{EtlError, Result};
