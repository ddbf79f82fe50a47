// Application layer: concrete collaborators for the batch job.

pub mod geonetwork;
pub mod metadata;
pub mod notifications;
pub mod transform;

pub use geonetwork::GeoNetworkConnector;
pub use metadata::MetadataValidator;
pub use notifications::NotificationService;
pub use transform::MetadataTransformer;
