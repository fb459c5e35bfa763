use anyhow::Context;
use clap::Parser;
use crop_depreciation::core::ConfigProvider;
use crop_depreciation::utils::{logger, validation::Validate};
use crop_depreciation::{open_store, run_on_schedule, DepreciationUpdater, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-updater")]
#[command(about = "Listing depreciation updater driven by a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "depreciation.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Keep running on the configured schedule instead of a single run
    #[arg(long)]
    scheduled: bool,

    /// Dry run - show what would be updated without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    logger::init_cli_logger_with_level(args.verbose, config.log_level());

    tracing::info!("🚀 Starting TOML-based depreciation updater");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let store = open_store(&config.store).context("failed to open document store")?;
    let updater = DepreciationUpdater::from_config(store, &config).with_monitoring(monitor_enabled);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No listing will be written");
        let plan = updater.plan().await?;
        println!("📋 Planned updates ({} of {} listings):", plan.updates.len(), plan.scanned);
        println!("{}", serde_json::to_string_pretty(&plan.updates)?);
        if !plan.malformed.is_empty() {
            println!("⚠️ Malformed listings skipped: {}", plan.malformed.join(", "));
        }
        return Ok(());
    }

    if args.scheduled {
        let schedule = config.schedule()?;
        let runs = run_on_schedule(&updater, schedule, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
        tracing::info!("✅ Scheduler stopped after {} runs", runs);
        return Ok(());
    }

    let summary = updater.run().await.context("depreciation run failed")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.has_failures() {
        std::process::exit(2);
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Name: {}", config.updater.name);
    println!("  Collection: {}", config.collection());
    println!("  Concurrency: {}", config.concurrency());
    println!(
        "  Policy: {:.1}% per day, freshness from {}, floor {}",
        config.policy.daily_price_rate * 100.0,
        config.policy.max_freshness,
        config.policy.price_floor
    );
    match &config.store {
        crop_depreciation::StoreConfig::File { path } => println!("  Store: file {}", path),
        crop_depreciation::StoreConfig::Firestore { project_id, .. } => {
            println!("  Store: firestore project {}", project_id)
        }
    }
    if args.scheduled {
        if let Some(schedule) = &config.schedule {
            println!("  Schedule: {}", schedule.every);
        }
    }
}
