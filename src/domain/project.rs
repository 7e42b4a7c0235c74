//! 项目与环境领域模型
//!
//! 服务端以 Go 默认序列化（PascalCase 字段）推送，未知字段直接忽略

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 部署任务标识
pub const TASK_DEPLOY: &str = "deploy";

/// 任务状态：环境名 -> 任务名 -> 开始时间
pub type TaskStatus = HashMap<String, HashMap<String, DateTime<Utc>>>;

/// 项目
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Project {
    pub name: String,
    pub repository: Option<String>,
    pub environments: HashMap<String, Environment>,
    pub task_status: TaskStatus,
}

impl Project {
    /// 环境是否有部署任务进行中
    pub fn is_deploying(&self, environment: &str) -> bool {
        self.task_status
            .get(environment)
            .map_or(false, |tasks| tasks.contains_key(TASK_DEPLOY))
    }
}

/// 部署环境
///
/// 一个环境对应一组 Docker endpoint，每个 endpoint 预期运行一个容器
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Environment {
    pub name: String,
    pub docker_end_points: Vec<String>,
}

impl Environment {
    /// 预期运行的容器数
    pub fn expected_containers(&self) -> usize {
        self.docker_end_points.len()
    }
}

/// 当前登录用户 (GET /rest/user)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    pub fullname: String,
    pub avatar: String,
}
