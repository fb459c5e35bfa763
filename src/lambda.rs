use crop_depreciation::config::lambda::LambdaConfig;
use crop_depreciation::utils::{logger, validation::Validate};
use crop_depreciation::{open_store, DepreciationUpdater};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};

/// EventBridge scheduled event; only the fields we log are read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScheduledEvent {
    pub id: Option<String>,
    #[serde(rename = "detail-type")]
    pub detail_type: Option<String>,
    pub time: Option<String>,
}

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub listings_scanned: usize,
    pub listings_updated: usize,
    pub malformed: Vec<String>,
}

async fn function_handler(event: LambdaEvent<ScheduledEvent>) -> Result<Response, Error> {
    tracing::info!(
        event_id = ?event.payload.id,
        detail_type = ?event.payload.detail_type,
        scheduled_time = ?event.payload.time,
        "Starting depreciation Lambda function"
    );

    let config = LambdaConfig::from_env()?;
    config.validate()?;

    let store = open_store(&config.store_config())?;
    let updater = DepreciationUpdater::from_config(store, &config);
    let summary = updater.run().await?;

    // 有寫入失敗時回報錯誤，讓排程平台重試 (重跑結果相同)
    if summary.has_failures() {
        let failed: Vec<&str> = summary.failures.iter().map(|f| f.id.as_str()).collect();
        return Err(format!(
            "{} of {} listing updates failed: {}",
            summary.failures.len(),
            summary.failures.len() + summary.updated,
            failed.join(", ")
        )
        .into());
    }

    tracing::info!("Depreciation Lambda function completed successfully");
    Ok(Response {
        message: "Depreciation run completed successfully".to_string(),
        listings_scanned: summary.scanned,
        listings_updated: summary.updated,
        malformed: summary.malformed,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
