//! 部署日志流
//!
//! 片段按 (项目, 环境, 分钟) 归并到同一个缓冲区，表示一次部署的增量输出；
//! 同 key 的片段只追加，key 的出现顺序保留

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::config::env::constants::MAX_DEPLOY_BUFFERS;
use crate::domain::log::DeployLogEntry;

/// 没有任何部署时的当前 key
pub const LATEST: &str = "latest";

struct Buffers {
    by_key: HashMap<String, String>,
    /// key 的出现顺序，最旧在前
    order: Vec<String>,
    current: String,
}

/// 部署日志流
pub struct DeployStream {
    buffers: RwLock<Buffers>,
    /// 新出现的部署计数
    pending: AtomicUsize,
}

impl DeployStream {
    pub fn new() -> Self {
        Self {
            buffers: RwLock::new(Buffers {
                by_key: HashMap::new(),
                order: Vec::new(),
                current: LATEST.to_string(),
            }),
            pending: AtomicUsize::new(0),
        }
    }

    /// 追加一个片段，返回其缓冲区 key
    pub async fn append(&self, entry: &DeployLogEntry) -> String {
        let key = entry.key();
        let mut buffers = self.buffers.write().await;

        if !buffers.by_key.contains_key(&key) {
            self.pending.fetch_add(1, Ordering::Relaxed);
            buffers.order.push(key.clone());
            buffers.by_key.insert(key.clone(), String::new());

            // 超出上限时丢弃最旧的部署记录
            while buffers.order.len() > MAX_DEPLOY_BUFFERS {
                let oldest = buffers.order.remove(0);
                buffers.by_key.remove(&oldest);
            }
        }

        if let Some(buffer) = buffers.by_key.get_mut(&key) {
            buffer.push_str(&entry.log);
        }
        buffers.current = key.clone();

        key
    }

    /// 当前（最近有输出的）部署 key
    pub async fn current(&self) -> String {
        self.buffers.read().await.current.clone()
    }

    /// 某次部署的完整日志
    pub async fn get(&self, key: &str) -> Option<String> {
        self.buffers.read().await.by_key.get(key).cloned()
    }

    /// 已知的部署 key，最旧在前
    pub async fn keys(&self) -> Vec<String> {
        self.buffers.read().await.order.clone()
    }

    /// 新部署计数
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// 取走新部署计数
    pub fn take_pending(&self) -> usize {
        self.pending.swap(0, Ordering::Relaxed)
    }
}

impl Default for DeployStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(project: &str, date: &str, log: &str) -> DeployLogEntry {
        DeployLogEntry {
            project: project.to_string(),
            environment: "live".to_string(),
            date: date.to_string(),
            log: log.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fragments_concatenate_under_one_key() {
        let stream = DeployStream::new();
        assert_eq!(stream.current().await, LATEST);

        let key = stream
            .append(&fragment("frontend", "2024-02-01 10:04:01.0 +0000 UTC", "step 1\n"))
            .await;
        stream
            .append(&fragment("frontend", "2024-02-01 10:04:45.0 +0000 UTC", "step 2\n"))
            .await;

        assert_eq!(stream.get(&key).await.unwrap(), "step 1\nstep 2\n");
        assert_eq!(stream.current().await, key);
        assert_eq!(stream.pending(), 1);
    }

    #[tokio::test]
    async fn test_new_minute_opens_new_buffer() {
        let stream = DeployStream::new();
        stream
            .append(&fragment("frontend", "2024-02-01 10:04:59.0 +0000 UTC", "a"))
            .await;
        stream
            .append(&fragment("frontend", "2024-02-01 10:05:00.0 +0000 UTC", "b"))
            .await;

        assert_eq!(stream.keys().await.len(), 2);
        assert_eq!(stream.pending(), 2);
    }

    #[tokio::test]
    async fn test_current_follows_last_write() {
        let stream = DeployStream::new();
        stream
            .append(&fragment("frontend", "2024-02-01 10:04:00.0 +0000 UTC", "a"))
            .await;
        let key = stream
            .append(&fragment("backend", "2024-02-01 10:04:00.0 +0000 UTC", "b"))
            .await;

        assert_eq!(stream.current().await, key);
        assert!(key.starts_with("backend "));
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest_deploy() {
        let stream = DeployStream::new();
        for i in 0..(MAX_DEPLOY_BUFFERS + 3) {
            stream
                .append(&fragment(
                    &format!("p{}", i),
                    "2024-02-01 10:04:00.0 +0000 UTC",
                    "x",
                ))
                .await;
        }

        let keys = stream.keys().await;
        assert_eq!(keys.len(), MAX_DEPLOY_BUFFERS);
        assert!(stream.get("p0 live 2024-02-01 10:04").await.is_none());
    }
}
