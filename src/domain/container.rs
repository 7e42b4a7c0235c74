//! 容器相关领域模型

use serde::{Deserialize, Serialize};

/// 状态推送里的容器摘要
///
/// 镜像引用形如 `repo:tag`，tag 通常是 revision 的短哈希
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSummary {
    pub docker_end_point: String,
    pub image: String,
    pub status: String,
}

impl ContainerSummary {
    /// 镜像引用的 tag 部分，没有 tag 返回 None
    pub fn revision_tag(&self) -> Option<&str> {
        self.image.splitn(2, ':').nth(1)
    }

    /// tag 是否命中期望 revision 的前缀
    ///
    /// 按 tag 自身长度取 revision 前缀比较，短哈希 tag 也能命中；
    /// 没有 tag 的镜像无法判断，返回 None
    pub fn matches_revision(&self, revision: &str) -> Option<bool> {
        let tag = self.revision_tag()?;
        Some(
            revision
                .as_bytes()
                .get(..tag.len())
                .is_some_and(|prefix| prefix == tag.as_bytes()),
        )
    }
}

/// `containers` 回复里的一行记录
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerRecord {
    pub project: crate::domain::project::Project,
    pub container: Option<ContainerDetail>,
    pub error: Option<serde_json::Value>,
}

/// 容器明细
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDetail {
    pub docker_end_point: String,
    pub image: String,
    #[serde(rename = "Id")]
    pub id: String,
    pub names: Vec<String>,
    pub status: String,
    pub created: i64,
    pub ports: Vec<PortBinding>,
}

impl ContainerDetail {
    /// 容器是否在运行（Docker 状态文本 "Up ..."）
    pub fn is_running(&self) -> bool {
        self.status.starts_with("Up ")
    }

    /// 容器 ID 短格式（12 位）
    pub fn short_id(&self) -> &str {
        let len = self.id.len().min(12);
        &self.id[..len]
    }

    /// 端口映射的可读形式
    pub fn ports_string(&self) -> String {
        let parts: Vec<String> = self.ports.iter().map(PortBinding::to_string).collect();
        parts.join(", ")
    }
}

/// 端口映射
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PortBinding {
    #[serde(rename = "IP")]
    pub ip: String,
    pub private_port: u16,
    pub public_port: u16,
    #[serde(rename = "Type")]
    pub kind: String,
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ip.is_empty() {
            write!(f, "{}/{}", self.private_port, self.kind)
        } else {
            write!(
                f,
                "{}:{}->{}/{}",
                self.ip, self.public_port, self.private_port, self.kind
            )
        }
    }
}
