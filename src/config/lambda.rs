use crate::adapters::firestore::{DEFAULT_BASE_URL, DEFAULT_DATABASE};
use crate::config::{validate_updater_settings, StoreConfig};
use crate::core::depreciation::{DepreciationPolicy, DEFAULT_DAILY_PRICE_RATE};
use crate::core::updater::{DEFAULT_COLLECTION, DEFAULT_CONCURRENCY};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::Validate;
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub project_id: String,
    pub database: String,
    pub base_url: String,
    pub token: Option<String>,
    pub collection: String,
    pub concurrency: usize,
    pub daily_price_rate: f64,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            project_id: lookup("FIRESTORE_PROJECT").ok_or_else(|| {
                UpdaterError::MissingConfigError {
                    field: "FIRESTORE_PROJECT".to_string(),
                }
            })?,
            database: lookup("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            base_url: lookup("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: lookup("FIRESTORE_TOKEN"),
            collection: lookup("LISTINGS_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            concurrency: parse_env(&lookup, "UPDATE_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            daily_price_rate: parse_env(&lookup, "DAILY_PRICE_RATE", DEFAULT_DAILY_PRICE_RATE)?,
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::Firestore {
            project_id: self.project_id.clone(),
            database: Some(self.database.clone()),
            base_url: Some(self.base_url.clone()),
            token: self.token.clone(),
            page_size: None,
        }
    }
}

fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| UpdaterError::InvalidConfigValueError {
                field: name.to_string(),
                value: raw.clone(),
                reason: "Could not parse value".to_string(),
            }),
        None => Ok(default),
    }
}

impl ConfigProvider for LambdaConfig {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn policy(&self) -> DepreciationPolicy {
        DepreciationPolicy {
            daily_price_rate: self.daily_price_rate,
            ..DepreciationPolicy::default()
        }
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        self.store_config().validate()?;
        validate_updater_settings(&self.collection, self.concurrency, &self.policy())?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LambdaConfig::from_lookup(lookup_from(&[("FIRESTORE_PROJECT", "farm-market")]))
            .unwrap();

        assert_eq!(config.project_id, "farm-market");
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
        assert_eq!(config.collection(), "marketplace");
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.policy(), DepreciationPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = LambdaConfig::from_lookup(lookup_from(&[
            ("FIRESTORE_PROJECT", "farm-market"),
            ("LISTINGS_COLLECTION", "produce"),
            ("UPDATE_CONCURRENCY", " 4 "),
            ("DAILY_PRICE_RATE", "0.1"),
        ]))
        .unwrap();

        assert_eq!(config.collection(), "produce");
        assert_eq!(config.concurrency(), 4);
        assert_eq!(config.policy().daily_price_rate, 0.1);
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            LambdaConfig::from_lookup(lookup_from(&[])),
            Err(UpdaterError::MissingConfigError { ref field }) if field == "FIRESTORE_PROJECT"
        ));

        let err = LambdaConfig::from_lookup(lookup_from(&[
            ("FIRESTORE_PROJECT", "farm-market"),
            ("UPDATE_CONCURRENCY", "lots"),
        ]))
        .unwrap_err();
        match err {
            UpdaterError::InvalidConfigValueError { field, value, .. } => {
                assert_eq!(field, "UPDATE_CONCURRENCY");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
