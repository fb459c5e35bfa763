// Adapters layer: concrete document stores behind the `DocumentStore` port.

pub mod file_store;
pub mod firestore;
pub mod memory;

use crate::config::StoreConfig;
use crate::domain::ports::DocumentStore;
use crate::utils::error::Result;

pub use file_store::JsonFileStore;
pub use firestore::{FirestoreSettings, FirestoreStore};
pub use memory::MemoryStore;

/// Builds the store selected by configuration.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn DocumentStore>> {
    match config {
        StoreConfig::File { path } => {
            tracing::info!("📁 Using JSON file store: {}", path);
            Ok(Box::new(JsonFileStore::new(path)))
        }
        StoreConfig::Firestore {
            project_id,
            database,
            base_url,
            token,
            page_size,
        } => {
            let mut settings = FirestoreSettings::new(project_id.clone())
                .with_token(token.clone());
            if let Some(database) = database {
                settings = settings.with_database(database.clone());
            }
            if let Some(base_url) = base_url {
                settings = settings.with_base_url(base_url.clone());
            }
            if let Some(page_size) = page_size {
                settings = settings.with_page_size(*page_size);
            }
            tracing::info!(
                "☁️ Using Firestore store: project={} database={}",
                settings.project_id,
                settings.database
            );
            Ok(Box::new(FirestoreStore::new(settings)?))
        }
    }
}
