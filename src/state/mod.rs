//! 运行时状态模块
//!
//! 看板视图状态与两条追加式日志流

pub mod dashboard;
pub mod log_stream;
pub mod deploy_stream;

pub use dashboard::{DashboardState, EnvStatusView, ProjectStatusView};
pub use deploy_stream::DeployStream;
pub use log_stream::LogStream;

use tokio_util::sync::CancellationToken;

/// 全局 shutdown token，用于优雅关闭所有后台任务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}
