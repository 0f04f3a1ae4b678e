// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Duration;
use clap::{Parser, Subcommand};
use linkrs::config::settings::Settings;
use linkrs::domain::models::task::TaskType;
use linkrs::domain::repositories::task_repository::TaskRepository;
use linkrs::infrastructure::database::connection;
use linkrs::presentation::routes::{routes, AppContext};
use linkrs::queue::reassignment::ReassignmentPipeline;
use linkrs::queue::scheduler::MaintenanceScheduler;
use linkrs::utils::telemetry;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

/// 僵死任务清扫间隔（秒）
const SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Parser)]
#[command(
    name = "linkrs",
    version,
    about = "Backlink automation task distribution service",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API with the in-process maintenance scheduler
    Serve,

    /// Reset stuck tasks once and print a per-task report
    CleanupStuck {
        /// Stuck timeout in minutes (defaults to the configured value)
        #[arg(long)]
        timeout: Option<i64>,
    },

    /// Delete resettable tasks of a type and recreate them from opportunities
    ClearReassign {
        /// Task type: comment, profile, forum or guestposting
        task_type: String,
    },

    /// Clear-and-reassign for comment tasks, with a dry-run preview
    ReassignComments {
        /// Restrict to a single campaign
        #[arg(long)]
        campaign_id: Option<Uuid>,

        /// Print the plan without writing anything
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

/// 主函数
///
/// 应用程序入口点，按子命令分派：缺省启动服务进程，
/// 维护命令执行一次后退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry();

    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(db, settings).await,
        Commands::CleanupStuck { timeout } => cleanup_stuck(db, settings, timeout).await,
        Commands::ClearReassign { task_type } => {
            let task_type: TaskType = task_type
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown task type: {}", task_type))?;
            reassign(db, settings, task_type, None, false).await
        }
        Commands::ReassignComments {
            campaign_id,
            dry_run,
        } => reassign(db, settings, TaskType::Comment, campaign_id, dry_run).await,
    }
}

/// 启动HTTP服务和维护调度器
async fn serve(db: Arc<DatabaseConnection>, settings: Arc<Settings>) -> anyhow::Result<()> {
    linkrs::infrastructure::metrics::init_metrics(settings.server.metrics_port);

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    if settings.auth.api_tokens.is_empty() {
        warn!("No API tokens configured, every worker request will be rejected");
    }

    let context = AppContext::new(db, &settings);

    let scheduler = MaintenanceScheduler::new(
        context.task_repo.clone(),
        Duration::minutes(settings.tasks.stuck_timeout_minutes),
        SWEEP_INTERVAL_SECS,
    );
    scheduler.start();
    info!(
        timeout_minutes = settings.tasks.stuck_timeout_minutes,
        "Maintenance scheduler started"
    );

    let app = routes(context);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 单次僵死任务清扫
async fn cleanup_stuck(
    db: Arc<DatabaseConnection>,
    settings: Arc<Settings>,
    timeout: Option<i64>,
) -> anyhow::Result<()> {
    let minutes = timeout.unwrap_or(settings.tasks.stuck_timeout_minutes);
    let context = AppContext::new(db, &settings);

    let reports = context
        .task_repo
        .reset_stuck_tasks(Duration::minutes(minutes))
        .await?;

    if reports.is_empty() {
        println!("No stuck tasks found (timeout: {} minutes)", minutes);
        return Ok(());
    }

    for report in &reports {
        println!(
            "reset task {} (campaign {}): {}",
            report.task_id, report.campaign_id, report.reason
        );
    }
    println!("Reset {} stuck tasks", reports.len());

    Ok(())
}

/// 批量重新分配任务
async fn reassign(
    db: Arc<DatabaseConnection>,
    settings: Arc<Settings>,
    task_type: TaskType,
    campaign_id: Option<Uuid>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let context = AppContext::new(db, &settings);
    let pipeline = ReassignmentPipeline::new(
        context.task_repo.clone(),
        context.opportunity_repo.clone(),
        context.backlink_repo.clone(),
    );

    if dry_run {
        let plans = pipeline.plan(task_type, campaign_id).await?;
        if plans.is_empty() {
            println!("No {} tasks eligible for reassignment", task_type);
            return Ok(());
        }
        for plan in &plans {
            println!(
                "campaign {}: {} resettable, {} targets from {}, would recreate {}",
                plan.campaign_id,
                plan.resettable,
                plan.source.targets().len(),
                plan.source.label(),
                plan.planned()
            );
        }
        println!("Dry run, nothing was changed");
        return Ok(());
    }

    let reports = pipeline.run(task_type, campaign_id).await?;
    if reports.is_empty() {
        println!("No {} tasks eligible for reassignment", task_type);
        return Ok(());
    }
    for report in &reports {
        println!(
            "campaign {}: deleted {}, created {} (targets from {})",
            report.campaign_id, report.deleted, report.created, report.source
        );
    }

    Ok(())
}
