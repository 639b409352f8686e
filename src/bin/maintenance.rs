//! 维护任务命令行入口，供 cron 等外部调度器调用。
//!
//! ```text
//! agora-maintenance purge-expired-statuses
//! agora-maintenance --all
//! ```

use std::sync::Arc;

use agora::{
    config::Config,
    services::{
        maintenance::{MaintenanceService, MaintenanceTask},
        Database,
    },
};
use clap::Parser;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "agora-maintenance", about = "Run Agora maintenance tasks once and exit")]
struct Cli {
    /// 要执行的任务
    #[arg(value_enum, required_unless_present = "all", conflicts_with = "all")]
    task: Option<MaintenanceTask>,

    /// 依次执行全部任务
    #[arg(long)]
    all: bool,
}

impl Cli {
    fn tasks(&self) -> Vec<MaintenanceTask> {
        match self.task {
            Some(task) => vec![task],
            None => MaintenanceTask::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    let db = Arc::new(Database::new(&config).await?);
    db.verify_connection().await?;

    let service = MaintenanceService::new(db).await?;

    let mut failed = 0usize;
    for task in cli.tasks() {
        match service.run(task).await {
            Ok(report) => info!("{} done, {} rows affected", report.task, report.affected),
            Err(e) => {
                error!("{} failed: {}", task, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} maintenance task(s) failed", failed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_task_or_all() {
        let cli = Cli::try_parse_from(["agora-maintenance", "expire-premium"]).unwrap();
        assert_eq!(cli.tasks(), vec![MaintenanceTask::ExpirePremium]);

        let cli = Cli::try_parse_from(["agora-maintenance", "--all"]).unwrap();
        assert_eq!(cli.tasks().len(), MaintenanceTask::ALL.len());

        assert!(Cli::try_parse_from(["agora-maintenance"]).is_err());
        assert!(Cli::try_parse_from(["agora-maintenance", "vacuum"]).is_err());
    }
}
