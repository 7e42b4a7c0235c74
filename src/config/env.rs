//! 环境变量配置加载

use std::env;

use url::Url;

use crate::domain::log::LogLevel;
use crate::error::ClientResult;

/// 各类容量上限
pub mod constants {
    /// 日志流保留的最大条数
    pub const MAX_LOG_ENTRIES: usize = 500;
    /// 部署日志缓冲区最大个数
    pub const MAX_DEPLOY_BUFFERS: usize = 64;
    /// 严重告警广播通道容量
    pub const ALERT_CHANNEL_CAPACITY: usize = 16;
}

/// 命令行运行时覆盖
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// 覆盖服务端地址
    pub server_override: Option<String>,
    /// 覆盖日志过滤级别
    pub level_override: Option<u8>,
}

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 看板服务端地址 (http/https)
    pub server_url: String,
    /// 日志流默认过滤级别
    pub min_log_level: LogLevel,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let server_url =
            env::var("DASHBOARD_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        let min_log_level = env::var("DASHBOARD_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .map(LogLevel::from)
            .unwrap_or(LogLevel::Info);

        Self {
            server_url,
            min_log_level,
        }
    }

    /// 应用命令行覆盖
    pub fn with_overrides(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(ref server) = runtime.server_override {
            self.server_url = server.clone();
        }
        if let Some(level) = runtime.level_override {
            self.min_log_level = LogLevel::from(level);
        }
        self
    }

    /// 消息 socket 地址
    ///
    /// 把 http(s) 基地址转换为 ws(s) 并追加 `/socket` 路径
    pub fn socket_url(&self) -> ClientResult<String> {
        let mut url = Url::parse(&self.server_url)?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        // Url::set_scheme 拒绝 http->ws，手动重建
        let host = url.host_str().unwrap_or("localhost").to_string();
        let port = url.port();

        url.set_path("/socket");
        let rebuilt = match port {
            Some(port) => format!("{}://{}:{}{}", scheme, host, port, url.path()),
            None => format!("{}://{}{}", scheme, host, url.path()),
        };

        Ok(rebuilt)
    }
}
