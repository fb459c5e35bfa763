use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "crop_depreciation=info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_cli_logger(verbose: bool) {
    init_cli_logger_with_level(verbose, None);
}

/// `level` overrides the default filter when `RUST_LOG` is unset.
pub fn init_cli_logger_with_level(verbose: bool, level: Option<&str>) {
    init_compact(env_filter(&cli_directive(verbose, level)));
}

// --verbose 優先於設定檔的 log_level
fn cli_directive(verbose: bool, level: Option<&str>) -> String {
    match level {
        _ if verbose => "crop_depreciation=debug,info".to_string(),
        Some(level) => format!("crop_depreciation={}", level),
        None => DEFAULT_FILTER.to_string(),
    }
}

fn init_compact(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .json(), // Lambda uses JSON format for better CloudWatch integration
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_directive() {
        assert_eq!(cli_directive(false, None), DEFAULT_FILTER);
        assert_eq!(cli_directive(false, Some("warn")), "crop_depreciation=warn");
        assert_eq!(cli_directive(true, Some("warn")), "crop_depreciation=debug,info");
        assert_eq!(cli_directive(true, None), "crop_depreciation=debug,info");
    }
}
