// 光伏关断器测试数据管理服务入口

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use tokio_util::sync::CancellationToken;

use pv_lib::logging::init_logging;
use pv_lib::services::infrastructure::SqliteOrmPersistenceService;
use pv_lib::utils::config::load_app_config;
use pv_lib::web::{create_axum_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "pv-server", version, about = "光伏关断器测试数据管理服务")]
struct Cli {
    /// 配置文件路径，不存在时写入默认配置
    #[arg(short, long, default_value = "config/app_config.json")]
    config: PathBuf,

    /// 使用内存数据库（数据不落盘）
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_app_config(cli.config.clone())
        .await
        .with_context(|| format!("加载配置失败: {:?}", cli.config))?;
    if cli.in_memory {
        config.persistence_config.in_memory = true;
    }

    init_logging(&config.logging_config);
    info!(
        "{} v{} 启动中 (环境: {})",
        config.app_settings.app_name, config.app_settings.app_version, config.app_settings.environment
    );

    let persistence = if config.persistence_config.in_memory {
        SqliteOrmPersistenceService::new_in_memory().await
    } else {
        SqliteOrmPersistenceService::new(Some(&config.persistence_config.database_path)).await
    }
    .context("初始化数据库失败")?;

    let bind_addr = format!("{}:{}", config.server_config.host, config.server_config.port);
    let monitor_interval = Duration::from_secs(config.monitor_config.refresh_interval_secs);
    let ticker_interval = Duration::from_millis(config.simulation_config.ticker_interval_ms);
    let control_interval = Duration::from_millis(config.simulation_config.control_tick_ms);

    let app_state = Arc::new(AppState::new(config, Arc::new(persistence)).context("初始化服务失败")?);

    let cancel = CancellationToken::new();
    let background = vec![
        app_state.metric_ticker.spawn(ticker_interval, cancel.child_token()),
        app_state.control_panel.spawn_ticker(control_interval, cancel.child_token()),
        app_state.device_monitor.spawn_poller(
            app_state.persistence.clone(),
            monitor_interval,
            cancel.child_token(),
        ),
    ];

    let router = create_axum_router(app_state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("监听 {} 失败", bind_addr))?;
    info!("HTTP服务已启动: http://{}", bind_addr);

    let shutdown = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("监听退出信号失败: {}", e);
            }
            info!("收到退出信号，正在停止服务");
            shutdown.cancel();
        })
        .await
        .context("HTTP服务异常退出")?;

    cancel.cancel();
    for handle in background {
        let _ = handle.await;
    }
    info!("服务已停止");
    Ok(())
}
