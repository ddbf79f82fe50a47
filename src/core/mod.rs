pub mod batch;

pub use crate::domain::model::{BatchStats, Record, TransformedData, ValidationResult};
pub use crate::domain::ports::{Connector, RecordStore, Storage, Transformer, Validator};
pub use crate::utils::error::Result;
pub use batch::BatchJob;
