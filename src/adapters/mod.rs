// Adapters layer: concrete implementations for external systems.

pub mod storage;
pub mod store;

pub use storage::LocalStorage;
pub use store::FileStore;
