//! 环境状态分类
//!
//! 把环境里运行中的容器镜像 tag 与期望 revision 比较，
//! 得出 loading/down/partial/outdated/ok 状态标签

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::container::ContainerSummary;
use crate::domain::project::{Environment, Project};

/// 环境状态标签
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvTag {
    /// 尚未收到状态推送
    Loading,
    /// 没有容器在运行，或运行数不足
    Down,
    /// 部分 endpoint 不符合预期
    Partial,
    /// 运行中的镜像落后于期望 revision
    Outdated,
    /// 全部容器运行期望 revision
    Ok,
}

impl EnvTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvTag::Loading => "loading",
            EnvTag::Down => "down",
            EnvTag::Partial => "partial",
            EnvTag::Outdated => "outdated",
            EnvTag::Ok => "ok",
        }
    }
}

/// 单个环境的状态快照
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EnvironmentStatus {
    pub environment: Environment,
    pub last_revision_label: String,
    pub running_containers: Vec<ContainerSummary>,
    pub containers: Vec<ContainerSummary>,
}

/// 服务端 `status` 推送里单个项目的记录
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectStatusReport {
    pub project: Project,
    pub status: HashMap<String, EnvironmentStatus>,
    pub error: Option<serde_json::Value>,
}

/// 环境状态分类
///
/// 每次状态推送都重新计算，不保留历史：
/// 1. 无状态 -> loading
/// 2. 无运行容器 -> down
/// 3. 运行数少于 endpoint 数 -> down + partial
/// 4. 否则统计镜像 tag 与期望 revision 前缀不符的容器；
///    有落后容器 -> outdated + partial，全部一致 -> ok
pub fn env_status(status: Option<&EnvironmentStatus>) -> Vec<EnvTag> {
    let Some(status) = status else {
        return vec![EnvTag::Loading];
    };

    let total = status.environment.expected_containers();
    let running = &status.running_containers;

    if running.is_empty() {
        return vec![EnvTag::Down];
    }

    if running.len() < total {
        return vec![EnvTag::Down, EnvTag::Partial];
    }

    let outdated = running
        .iter()
        .filter(|c| c.matches_revision(&status.last_revision_label) == Some(false))
        .count();

    if outdated != 0 {
        vec![EnvTag::Outdated, EnvTag::Partial]
    } else {
        vec![EnvTag::Ok]
    }
}

/// 环境是否可以部署
///
/// 已有容器运行目标 revision 时不可重复部署；无状态时无法判断
pub fn is_deployable(status: Option<&EnvironmentStatus>) -> Option<bool> {
    let status = status?;
    let revision = &status.last_revision_label;

    Some(
        !status
            .running_containers
            .iter()
            .any(|c| c.matches_revision(revision) == Some(true)),
    )
}
