//! 服务端日志流
//!
//! 新条目插到最前，按客户端选定的最低级别过滤展示；
//! 严重条目额外走广播通道（桌面通知的替身）

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{broadcast, RwLock};

use crate::config::env::constants::{ALERT_CHANNEL_CAPACITY, MAX_LOG_ENTRIES};
use crate::domain::log::{LogEntry, LogLevel};

/// 日志流
pub struct LogStream {
    /// 条目，新的在前
    entries: RwLock<VecDeque<LogEntry>>,
    /// 展示的最低级别（数值更大 = 更不严重也展示）
    min_level: RwLock<LogLevel>,
    /// 未读计数（debug 以下不计）
    pending: AtomicUsize,
    /// 严重告警广播
    alerts: broadcast::Sender<LogEntry>,
}

impl LogStream {
    pub fn new(min_level: LogLevel) -> Self {
        let (alerts, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(VecDeque::new()),
            min_level: RwLock::new(min_level),
            pending: AtomicUsize::new(0),
            alerts,
        }
    }

    /// 追加一条日志
    pub async fn push(&self, entry: LogEntry) {
        if entry.lvl.is_notable() {
            self.pending.fetch_add(1, Ordering::Relaxed);
        }
        if entry.lvl.is_critical() {
            // 没有订阅者时发送失败，忽略
            let _ = self.alerts.send(entry.clone());
        }

        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        while entries.len() > MAX_LOG_ENTRIES {
            entries.pop_back();
        }
    }

    /// 按当前级别过滤出可见条目
    pub async fn visible(&self) -> Vec<LogEntry> {
        let level = *self.min_level.read().await;
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|entry| entry.lvl <= level)
            .cloned()
            .collect()
    }

    /// 调整过滤级别
    pub async fn set_level(&self, level: LogLevel) {
        *self.min_level.write().await = level;
    }

    pub async fn level(&self) -> LogLevel {
        *self.min_level.read().await
    }

    /// 订阅严重告警
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<LogEntry> {
        self.alerts.subscribe()
    }

    /// 未读计数
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// 取走未读计数（查看日志页后清零）
    pub fn take_pending(&self) -> usize {
        self.pending.swap(0, Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
