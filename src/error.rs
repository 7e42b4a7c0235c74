//! 统一错误处理
//!
//! 客户端所有失败路径共用 `ClientError`，调用方将错误文本追加到状态里的错误列表

use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Socket request channel closed")]
    ChannelClosed,
}

/// 便捷类型别名
pub type ClientResult<T> = Result<T, ClientError>;
