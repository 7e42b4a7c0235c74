//! 看板 socket 客户端
//!
//! 维持到服务端 `/socket` 的长连接：入站消息按 event 分发到状态，
//! 出站请求走 mpsc 通道；断线固定间隔重连

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::EnvConfig;
use crate::domain::message::{ClientRequest, ServerMessage};
use crate::error::{ClientError, ClientResult};
use crate::state::DashboardState;

const RECONNECT_DELAY_SECS: u64 = 5;
const PING_INTERVAL_SECS: u64 = 30;
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// socket 连接句柄
///
/// 可以在任意任务里克隆使用；请求经通道交给连接任务发送
#[derive(Clone)]
pub struct SocketHandle {
    tx: mpsc::Sender<ClientRequest>,
    state: Arc<DashboardState>,
}

impl SocketHandle {
    /// 触发部署
    ///
    /// 先在本地标记部署进行中，服务端随后的 projects 推送会接管该标记
    pub async fn deploy(&self, project: &str, environment: &str) -> ClientResult<()> {
        self.state.mark_deploying(project, environment).await;
        self.send(ClientRequest::deploy(project, environment)).await
    }

    /// 请求项目容器列表
    pub async fn request_containers(&self, project: &str) -> ClientResult<()> {
        self.state.set_processing(true);
        self.send(ClientRequest::containers(project)).await
    }

    /// 请求全部项目状态
    pub async fn request_status(&self) -> ClientResult<()> {
        self.state.set_processing(true);
        self.send(ClientRequest::status()).await
    }

    async fn send(&self, request: ClientRequest) -> ClientResult<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| ClientError::ChannelClosed)
    }
}

/// 启动 socket 客户端任务，返回请求句柄
pub fn spawn(
    config: &EnvConfig,
    state: Arc<DashboardState>,
    shutdown: CancellationToken,
) -> SocketHandle {
    let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
    let handle = SocketHandle {
        tx,
        state: state.clone(),
    };

    match config.socket_url() {
        Ok(url) => {
            tokio::spawn(run(url, state, rx, shutdown));
        }
        Err(e) => {
            tokio::spawn(async move {
                state.record_error(format!("socket url: {}", e)).await;
            });
        }
    }

    handle
}

/// 连接循环：断开后固定延迟重连，直到 shutdown
async fn run(
    url: String,
    state: Arc<DashboardState>,
    mut rx: mpsc::Receiver<ClientRequest>,
    shutdown: CancellationToken,
) {
    loop {
        match run_client(&url, &state, &mut rx, &shutdown).await {
            Ok(()) => info!("Dashboard socket disconnected"),
            Err(e) => {
                error!(error = %e, "Dashboard socket error");
                state.record_error(format!("socket: {}", e)).await;
            }
        }

        if shutdown.is_cancelled() {
            return;
        }

        info!(delay_secs = RECONNECT_DELAY_SECS, "Reconnecting dashboard socket");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)) => {}
            _ = shutdown.cancelled() => return,
        }
    }
}

/// 单次连接的收发循环
async fn run_client(
    url: &str,
    state: &Arc<DashboardState>,
    rx: &mut mpsc::Receiver<ClientRequest>,
    shutdown: &CancellationToken,
) -> anyhow::Result<()> {
    info!(url = %url, "Connecting to dashboard socket");
    let (ws_stream, _) = connect_async(url).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    info!("Connected to dashboard socket");

    let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    // interval 的第一个 tick 立即触发
    ping_interval.tick().await;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(follow_up) = handle_message(state, &text).await {
                            let raw = serde_json::to_string(&follow_up)?;
                            ws_tx.send(Message::Text(raw)).await?;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_tx.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("Received pong");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Server closed connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            request = rx.recv() => {
                match request {
                    Some(request) => {
                        let raw = serde_json::to_string(&request)?;
                        debug!(request = %raw, "Sending request");
                        ws_tx.send(Message::Text(raw)).await?;
                    }
                    None => break,
                }
            }
            _ = ping_interval.tick() => {
                ws_tx.send(Message::Ping(Vec::new())).await?;
            }
            _ = shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    Ok(())
}

/// 分发一条入站消息，必要时返回跟进请求
///
/// 收到 projects 后立即请求一次状态，保持项目列表和状态同步
async fn handle_message(state: &Arc<DashboardState>, raw: &str) -> Option<ClientRequest> {
    match ServerMessage::parse(raw) {
        Ok(ServerMessage::Projects(projects)) => {
            debug!(count = projects.len(), "Received projects");
            state.apply_projects(projects).await;
            Some(ClientRequest::status())
        }
        Ok(ServerMessage::Status(reports)) => {
            debug!(count = reports.len(), "Received status");
            state.apply_status(reports).await;
            None
        }
        Ok(ServerMessage::Containers(records)) => {
            debug!(count = records.len(), "Received containers");
            state.apply_containers(records).await;
            None
        }
        Ok(ServerMessage::Deploy(entry)) => {
            state.deploys.append(&entry).await;
            state.updated.notify_waiters();
            None
        }
        Ok(ServerMessage::Log(entry)) => {
            state.logs.push(entry).await;
            state.updated.notify_waiters();
            None
        }
        Err(e) => {
            state.record_error(format!("socket message: {}", e)).await;
            None
        }
    }
}
