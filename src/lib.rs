pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::LambdaConfig;

pub use adapters::{open_store, FirestoreStore, JsonFileStore, MemoryStore};
pub use config::{toml_config::TomlConfig, StoreConfig};
pub use crate::core::{
    depreciation::DepreciationPolicy,
    scheduler::{run_on_schedule, Schedule},
    updater::DepreciationUpdater,
};
pub use utils::error::{Result, UpdaterError};
