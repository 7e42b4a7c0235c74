//! dockdash - Docker 部署看板控制台客户端
//!
//! 连接看板服务端的消息 socket，维护项目/环境状态视图，
//! 触发部署并实时追踪日志流

pub mod error;
pub mod config;
pub mod domain;
pub mod state;
pub mod services;

use std::sync::Arc;

use tracing::{error, info};

pub use config::env::RuntimeConfig;
use config::EnvConfig;
use state::{get_shutdown_token, trigger_shutdown, DashboardState};

/// 控制台模式入口
///
/// 加载配置、建立 socket 连接并启动状态渲染，直到 Ctrl-C 退出
pub async fn init_and_run_console(runtime: RuntimeConfig) {
    let config = EnvConfig::from_env().with_overrides(&runtime);
    let shutdown = get_shutdown_token();

    info!(server_url = %config.server_url, "Starting dashboard console");

    let state = Arc::new(DashboardState::new(config.clone()));
    let handle = services::socket::spawn(&config, state.clone(), shutdown.clone());

    // 问候当前用户，失败只记入错误列表（原样保留服务端返回）
    let rest = services::rest::RestClient::new(&config.server_url);
    match rest.user().await {
        Ok(user) => info!(user = %user.fullname, "Authenticated"),
        Err(e) => state.record_error(format!("load user: {}", e)).await,
    }

    let monitor = tokio::spawn(services::monitor::start(
        state.clone(),
        handle.clone(),
        shutdown.clone(),
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            trigger_shutdown();
        }
        _ = shutdown.cancelled() => {}
    }

    if let Err(e) = monitor.await {
        error!(error = %e, "Monitor task failed");
    }
}
