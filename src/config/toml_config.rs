use crate::config::{validate_updater_settings, StoreConfig};
use crate::core::depreciation::DepreciationPolicy;
use crate::core::scheduler::{Schedule, DEFAULT_SCHEDULE};
use crate::core::updater::{DEFAULT_COLLECTION, DEFAULT_CONCURRENCY};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub updater: UpdaterConfig,
    #[serde(default)]
    pub policy: DepreciationPolicy,
    pub schedule: Option<ScheduleConfig>,
    pub store: StoreConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            collection: default_collection(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_name() -> String {
    "update-crop-prices".to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// e.g. "every 24 hours"
    pub every: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| UpdaterError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FIRESTORE_TOKEN})，未設定者保留原字串
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 取得排程設定 (未設定時使用每 24 小時)
    pub fn schedule(&self) -> Result<Schedule> {
        let expression = self
            .schedule
            .as_ref()
            .map(|s| s.every.as_str())
            .unwrap_or(DEFAULT_SCHEDULE);
        Schedule::parse(expression)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn collection(&self) -> &str {
        &self.updater.collection
    }

    fn concurrency(&self) -> usize {
        self.updater.concurrency
    }

    fn policy(&self) -> DepreciationPolicy {
        self.policy
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.store.validate()?;
        validate_updater_settings(
            &self.updater.collection,
            self.updater.concurrency,
            &self.policy,
        )?;
        self.schedule()?;
        Ok(())
    }
}
