//! 日志流领域模型
//!
//! 服务端日志条目为结构化 JSON：`t`/`lvl`/`msg` 加任意附加参数；
//! 部署日志则按 (项目, 环境, 分钟) 分组增量推送

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 部署日志 key 中日期的截断长度（到分钟）
const DEPLOY_KEY_DATE_LEN: usize = 16;

/// revision 参数展示时的截断长度
const REVISION_DISPLAY_LEN: usize = 12;

/// 日志级别，数值越小越严重
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum LogLevel {
    Critical = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
}

impl From<u8> for LogLevel {
    fn from(lvl: u8) -> Self {
        match lvl {
            0 => LogLevel::Critical,
            1 => LogLevel::Error,
            2 => LogLevel::Warning,
            3 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        level as u8
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "crit",
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// 是否触发严重告警（桌面通知级别）
    pub fn is_critical(&self) -> bool {
        matches!(self, LogLevel::Critical)
    }

    /// 是否计入未读计数（debug 以下不计）
    pub fn is_notable(&self) -> bool {
        (*self as u8) < LogLevel::Debug as u8
    }
}

/// 服务端日志条目
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    pub lvl: LogLevel,
    pub msg: String,
    /// 其余结构化参数（project、environment、revision 等）
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// 附加参数的展示形式
    ///
    /// revision 截断为短哈希，其余参数原样输出
    pub fn display_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if key == "revision" {
                    // 按字符截断，revision 值不保证是 ASCII
                    (key.clone(), text.chars().take(REVISION_DISPLAY_LEN).collect())
                } else {
                    (key.clone(), text)
                }
            })
            .collect()
    }

    /// 参数拼成一行文本
    pub fn params_line(&self) -> String {
        let parts: Vec<String> = self
            .display_params()
            .into_iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        parts.join(", ")
    }
}

/// 部署日志片段
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployLogEntry {
    pub project: String,
    pub environment: String,
    /// 服务端的部署开始时间文本
    pub date: String,
    /// 增量日志文本
    pub log: String,
}

impl DeployLogEntry {
    pub fn new(project: &str, environment: &str, log: impl Into<String>) -> Self {
        Self {
            project: project.to_string(),
            environment: environment.to_string(),
            date: Utc::now().format("%Y-%m-%d %H:%M:%S%.9f UTC").to_string(),
            log: log.into(),
        }
    }

    /// 缓冲区 key：同一分钟内的片段归并到同一次部署
    pub fn key(&self) -> String {
        let date: String = self.date.chars().take(DEPLOY_KEY_DATE_LEN).collect();
        format!("{} {} {}", self.project, self.environment, date)
    }
}
