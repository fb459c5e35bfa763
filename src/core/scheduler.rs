use crate::core::updater::DepreciationUpdater;
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, UpdaterError};
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_SCHEDULE: &str = "every 24 hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub every: Duration,
    /// Stop after this many runs; `None` runs until shutdown.
    pub max_runs: Option<u32>,
}

impl Schedule {
    pub fn every(every: Duration) -> Self {
        Self {
            every,
            max_runs: None,
        }
    }

    /// 解析 "every 24 hours" / "every 30 minutes" / "every 1 day"
    pub fn parse(expression: &str) -> Result<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"(?i)^\s*every\s+(\d+)\s+(minute|hour|day)s?\s*$")
                .expect("schedule pattern is valid")
        });

        let invalid = || UpdaterError::ScheduleError {
            expression: expression.to_string(),
        };
        let caps = re.captures(expression).ok_or_else(invalid)?;
        let amount: u64 = caps[1].parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        let unit_secs = match caps[2].to_ascii_lowercase().as_str() {
            "minute" => 60,
            "hour" => 60 * 60,
            _ => 24 * 60 * 60,
        };
        let secs = amount.checked_mul(unit_secs).ok_or_else(invalid)?;

        Ok(Self::every(Duration::from_secs(secs)))
    }

    pub fn with_max_runs(mut self, max_runs: u32) -> Self {
        self.max_runs = Some(max_runs);
        self
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::every(Duration::from_secs(24 * 60 * 60))
    }
}

/// Runs the updater immediately, then once per tick until `shutdown` resolves.
///
/// Runs are sequential, so a slow run never overlaps the next trigger; ticks
/// missed while a run is in progress are skipped. A failed run is logged and
/// retried on the next tick. Returns the number of completed runs.
pub async fn run_on_schedule<S, F>(
    updater: &DepreciationUpdater<S>,
    schedule: Schedule,
    shutdown: F,
) -> u32
where
    S: DocumentStore,
    F: Future<Output = ()>,
{
    if schedule.max_runs == Some(0) {
        tracing::info!("⏰ Run limit is 0, nothing to schedule");
        return 0;
    }

    let mut ticker = tokio::time::interval(schedule.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    tracing::info!("⏰ Scheduling depreciation runs every {:?}", schedule.every);

    let mut runs = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("🛑 Shutdown requested, stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                match updater.run().await {
                    Ok(summary) if summary.has_failures() => {
                        tracing::warn!(
                            "⚠️ Run completed with {} failed updates; they will be retried next run",
                            summary.failures.len()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("❌ Depreciation run failed: {}", e);
                        tracing::error!("💡 {}", e.recovery_suggestion());
                    }
                }
                runs += 1;
                if schedule.max_runs.is_some_and(|max| runs >= max) {
                    break;
                }
            }
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule_expressions() {
        assert_eq!(
            Schedule::parse("every 24 hours").unwrap().every,
            Duration::from_secs(86_400)
        );
        assert_eq!(
            Schedule::parse("every 1 day").unwrap().every,
            Duration::from_secs(86_400)
        );
        assert_eq!(
            Schedule::parse("  Every 30 Minutes ").unwrap().every,
            Duration::from_secs(1_800)
        );
        assert_eq!(Schedule::default(), Schedule::parse(DEFAULT_SCHEDULE).unwrap());
    }

    #[test]
    fn test_parse_rejects_invalid_expressions() {
        for expression in ["daily", "every 0 hours", "every hours", "every 5 weeks", ""] {
            assert!(
                matches!(
                    Schedule::parse(expression),
                    Err(UpdaterError::ScheduleError { .. })
                ),
                "{} should be rejected",
                expression
            );
        }
    }
}
