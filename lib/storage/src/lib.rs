pub mod manager;

pub use manager::{CollectionSummary, StorageManager};
