use clap::Parser;
use crop_depreciation::utils::error::ErrorSeverity;
use crop_depreciation::utils::{logger, validation::Validate};
use crop_depreciation::{open_store, run_on_schedule, CliConfig, DepreciationUpdater, Schedule};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting crop-depreciation CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let store = open_store(&config.store_config()?)?;
    let updater = DepreciationUpdater::from_config(store, &config).with_monitoring(config.monitor);

    if config.dry_run {
        let plan = updater.plan().await?;
        println!(
            "🔍 DRY RUN - {} listings scanned, {} would be updated",
            plan.scanned,
            plan.updates.len()
        );
        for update in &plan.updates {
            println!(
                "  {} (day {}): pricePerKg -> {:.2}, freshnessScore -> {}",
                update.id, update.days_elapsed, update.price_per_kg, update.freshness_score
            );
        }
        return Ok(());
    }

    // 排程模式：直到 Ctrl-C 才結束
    if let Some(expression) = &config.schedule {
        let schedule = Schedule::parse(expression)?;
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let runs = run_on_schedule(&updater, schedule, shutdown).await;
        println!("✅ Scheduler stopped after {} runs", runs);
        return Ok(());
    }

    match updater.run().await {
        Ok(summary) => {
            println!(
                "✅ Depreciation run completed: {} scanned, {} updated, {} malformed, {} failed",
                summary.scanned,
                summary.updated,
                summary.malformed.len(),
                summary.failures.len()
            );
            if summary.has_failures() {
                for failure in &summary.failures {
                    eprintln!("❌ {}: {}", failure.id, failure.error);
                }
                // 重試錯誤
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Depreciation run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
