//! socket 消息信封
//!
//! 出站 `{event, request}`，入站 `{event, result}`；
//! 入站按 event 解析成具体消息，未知 event 报错但不断开连接

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::container::ContainerRecord;
use crate::domain::log::{DeployLogEntry, LogEntry};
use crate::domain::project::Project;
use crate::domain::status::ProjectStatusReport;
use crate::error::ClientError;

/// 出站请求
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "request", rename_all = "lowercase")]
pub enum ClientRequest {
    /// 触发部署
    Deploy { project: String, environment: String },
    /// 拉取项目容器列表
    Containers { project: String },
    /// 拉取全部项目状态
    Status {},
}

impl ClientRequest {
    pub fn deploy(project: &str, environment: &str) -> Self {
        ClientRequest::Deploy {
            project: project.to_string(),
            environment: environment.to_string(),
        }
    }

    pub fn containers(project: &str) -> Self {
        ClientRequest::Containers {
            project: project.to_string(),
        }
    }

    pub fn status() -> Self {
        ClientRequest::Status {}
    }
}

/// 入站消息信封
#[derive(Clone, Debug, Deserialize)]
pub struct ServerEnvelope {
    pub event: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// 解析后的入站消息
#[derive(Clone, Debug)]
pub enum ServerMessage {
    Projects(HashMap<String, Project>),
    Status(HashMap<String, ProjectStatusReport>),
    Containers(Vec<ContainerRecord>),
    Deploy(DeployLogEntry),
    Log(LogEntry),
}

impl ServerEnvelope {
    /// 按 event 解析 result
    pub fn decode(self) -> Result<ServerMessage, ClientError> {
        let message = match self.event.as_str() {
            "projects" => ServerMessage::Projects(serde_json::from_value(self.result)?),
            "status" => ServerMessage::Status(serde_json::from_value(self.result)?),
            "containers" => ServerMessage::Containers(serde_json::from_value(self.result)?),
            "deploy" => ServerMessage::Deploy(serde_json::from_value(self.result)?),
            "log" => ServerMessage::Log(serde_json::from_value(self.result)?),
            _ => return Err(ClientError::UnknownEvent(self.event)),
        };
        Ok(message)
    }
}

impl ServerMessage {
    /// 从原始 socket 文本解析
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let envelope: ServerEnvelope = serde_json::from_str(raw)?;
        envelope.decode()
    }
}
