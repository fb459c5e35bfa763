#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

use crate::core::depreciation::DepreciationPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_resolved, validate_url, Validate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;

pub const MAX_CONCURRENCY: usize = 256;

/// Which document store the updater talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        path: String,
    },
    Firestore {
        project_id: String,
        database: Option<String>,
        base_url: Option<String>,
        token: Option<String>,
        page_size: Option<usize>,
    },
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<()> {
        match self {
            StoreConfig::File { path } => validate_path("store.path", path),
            StoreConfig::Firestore {
                project_id,
                base_url,
                token,
                ..
            } => {
                crate::utils::validation::validate_non_empty_string("store.project_id", project_id)?;
                validate_resolved("store.project_id", project_id)?;
                if let Some(base_url) = base_url {
                    validate_url("store.base_url", base_url)?;
                }
                if let Some(token) = token {
                    validate_resolved("store.token", token)?;
                }
                Ok(())
            }
        }
    }
}

/// Shared checks for updater settings.
pub(crate) fn validate_updater_settings(
    collection: &str,
    concurrency: usize,
    policy: &DepreciationPolicy,
) -> Result<()> {
    use crate::utils::validation::*;

    validate_collection_id("collection", collection)?;
    validate_range("concurrency", concurrency, 1, MAX_CONCURRENCY)?;
    validate_daily_rate("policy.daily_price_rate", policy.daily_price_rate)?;
    validate_range("policy.max_freshness", policy.max_freshness, 0, 1_000)?;
    if !policy.price_floor.is_finite() || policy.price_floor < 0.0 {
        return Err(crate::utils::error::UpdaterError::InvalidConfigValueError {
            field: "policy.price_floor".to_string(),
            value: policy.price_floor.to_string(),
            reason: "Price floor must be a non-negative number".to_string(),
        });
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "crop-depreciation")]
#[command(about = "Depreciates marketplace listing prices and freshness over time")]
pub struct CliConfig {
    /// Use a local JSON file as the document store
    #[arg(long, conflicts_with = "firestore_project")]
    pub store_file: Option<String>,

    /// Firestore project id (token read from FIRESTORE_TOKEN)
    #[arg(long)]
    pub firestore_project: Option<String>,

    #[arg(long, default_value = crate::adapters::firestore::DEFAULT_BASE_URL)]
    pub firestore_url: String,

    #[arg(long, default_value = crate::adapters::firestore::DEFAULT_DATABASE)]
    pub firestore_database: String,

    #[arg(long, default_value = crate::core::updater::DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, default_value = "16")]
    pub concurrency: usize,

    #[arg(long, default_value = "0.05")]
    pub daily_rate: f64,

    /// Keep running, e.g. "every 24 hours". Runs once when omitted.
    #[arg(long)]
    pub schedule: Option<String>,

    /// Print planned updates without writing
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per run phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn store_config(&self) -> Result<StoreConfig> {
        match (&self.store_file, &self.firestore_project) {
            (Some(path), _) => Ok(StoreConfig::File { path: path.clone() }),
            (None, Some(project_id)) => Ok(StoreConfig::Firestore {
                project_id: project_id.clone(),
                database: Some(self.firestore_database.clone()),
                base_url: Some(self.firestore_url.clone()),
                token: std::env::var("FIRESTORE_TOKEN").ok(),
                page_size: None,
            }),
            (None, None) => Err(crate::utils::error::UpdaterError::MissingConfigError {
                field: "--store-file or --firestore-project".to_string(),
            }),
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn policy(&self) -> DepreciationPolicy {
        DepreciationPolicy {
            daily_price_rate: self.daily_rate,
            ..DepreciationPolicy::default()
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.store_config()?.validate()?;
        validate_updater_settings(&self.collection, self.concurrency, &self.policy())?;
        if let Some(expression) = &self.schedule {
            crate::core::scheduler::Schedule::parse(expression)?;
        }
        Ok(())
    }
}
