use std::{net::SocketAddr, sync::Arc};

use agora::{
    build_router,
    config::Config,
    services::{maintenance::MaintenanceTask, Database},
    state::AppState,
};
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    init_tracing(&config);
    info!("Starting Agora service ({})...", config.environment);

    // 初始化数据库连接
    let db = Database::new(&config).await.map_err(|e| {
        error!("Failed to create database connection: {}", e);
        anyhow::anyhow!("Database initialization failed")
    })?;
    db.verify_connection().await?;
    db.migrate().await?;
    info!("Database connection established successfully");

    // 创建应用状态
    let app_state = Arc::new(AppState::build(config.clone(), Arc::new(db)).await?);

    // 启动后台任务
    if config.enable_internal_scheduler {
        start_background_tasks(app_state.clone());
    } else {
        info!("Internal scheduler disabled, maintenance runs through the CLI or HTTP endpoint");
    }

    let app = build_router(app_state);

    // 启动主服务器
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    // 过期状态与吊销令牌清理
    let status_state = app_state.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(
            status_state.config.status_sweep_interval_secs,
        ));

        loop {
            ticker.tick().await;
            for task in [
                MaintenanceTask::PurgeExpiredStatuses,
                MaintenanceTask::PurgeRevokedTokens,
            ] {
                if let Err(e) = status_state.maintenance_service.run(task).await {
                    error!("Scheduled {} failed: {}", task, e);
                }
            }
        }
    });

    // 会员到期降级
    let premium_state = app_state;
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(
            premium_state.config.premium_sweep_interval_secs,
        ));

        loop {
            ticker.tick().await;
            if let Err(e) = premium_state
                .maintenance_service
                .run(MaintenanceTask::ExpirePremium)
                .await
            {
                error!("Scheduled {} failed: {}", MaintenanceTask::ExpirePremium, e);
            }
        }
    });

    info!("Background tasks started successfully");
}
