// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cadence doctor` command implementation.
//!
//! Runs diagnostic checks against the Cadence environment to identify
//! configuration issues, storage problems, and delivery backlogs.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use cadence_config::model::CadenceConfig;
use cadence_core::{CadenceError, CampaignStore, HealthStatus, ScheduleStatus};
use cadence_storage::SqliteStore;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

/// Run the `cadence doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(config: &CadenceConfig, plain: bool) -> Result<(), CadenceError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = Vec::new();
    results.push(check_config(config));
    results.push(check_database(&config.storage.database_path).await);
    results.push(check_retry_backlog(&config.storage.database_path).await);

    println!();
    println!("  cadence doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    for result in &results {
        let duration_ms = result.duration.as_millis();
        let line = match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✓".green(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Warn => {
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "!".yellow(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    format!(
                        "    {} {:<20} {} ({duration_ms}ms)",
                        "✗".red(),
                        result.name,
                        result.message
                    )
                } else {
                    format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    )
                }
            }
        };
        println!("{line}");
    }

    println!();
    if fail_count > 0 {
        println!("  {fail_count} check(s) failed.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn check_config(config: &CadenceConfig) -> CheckResult {
    let start = Instant::now();
    // Config already passed load_and_validate to get here; report the
    // effective tick cadence.
    CheckResult {
        name: "config".to_string(),
        status: CheckStatus::Pass,
        message: format!(
            "tick every {}s, {} worker(s)",
            config.engine.tick_interval_secs, config.engine.max_concurrent_schedules
        ),
        duration: start.elapsed(),
    }
}

async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let result = async {
        let store = SqliteStore::open(db_path).await?;
        let health = store.health_check().await?;
        let schedules = store.list_schedules(Some(ScheduleStatus::Active)).await?;
        let totals = store.attempt_totals().await?;
        store.close().await?;
        Ok::<_, CadenceError>((health, schedules.len(), totals))
    }
    .await;

    match result {
        Ok((HealthStatus::Healthy, active, totals)) => CheckResult {
            name: "database".to_string(),
            status: CheckStatus::Pass,
            message: format!(
                "{active} active schedule(s), {} sent, {} failed",
                totals.sent, totals.failed
            ),
            duration: start.elapsed(),
        },
        Ok((status, _, _)) => CheckResult {
            name: "database".to_string(),
            status: CheckStatus::Warn,
            message: format!("{status:?}"),
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name: "database".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

async fn check_retry_backlog(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let result = async {
        let store = SqliteStore::open(db_path).await?;
        let totals = store.attempt_totals().await?;
        store.close().await?;
        Ok::<_, CadenceError>(totals)
    }
    .await;

    match result {
        Ok(totals) if totals.retrying == 0 => CheckResult {
            name: "retry backlog".to_string(),
            status: CheckStatus::Pass,
            message: "no attempts waiting on retry".to_string(),
            duration: start.elapsed(),
        },
        Ok(totals) => CheckResult {
            name: "retry backlog".to_string(),
            status: CheckStatus::Warn,
            message: format!("{} attempt(s) waiting on retry", totals.retrying),
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name: "retry backlog".to_string(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_check_reports_cadence() {
        let config = CadenceConfig::default();
        let result = check_config(&config);
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.message.contains("60s"));
    }

    #[tokio::test]
    async fn database_check_passes_on_fresh_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("doctor.db");
        let result = check_database(db_path.to_str().unwrap()).await;
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn retry_backlog_check_passes_when_empty() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("backlog.db");
        let result = check_retry_backlog(db_path.to_str().unwrap()).await;
        assert_eq!(result.status, CheckStatus::Pass);
    }
}
