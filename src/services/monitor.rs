//! 控制台状态渲染
//!
//! 状态有变化就重画一张项目/环境表，严重告警单独成行输出

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::log::LogEntry;
use crate::domain::status::EnvTag;
use crate::services::socket::SocketHandle;
use crate::state::{DashboardState, ProjectStatusView};

/// revision 展示截断长度
const REVISION_DISPLAY_LEN: usize = 12;

/// 启动渲染循环，直到 shutdown
pub async fn start(
    state: Arc<DashboardState>,
    handle: SocketHandle,
    shutdown: CancellationToken,
) {
    // 连接后服务端会推 projects 并带出一次状态刷新；
    // 这里再主动拉一次，避免错过推送时一直停在 loading
    if let Err(e) = handle.request_status().await {
        warn!(error = %e, "Initial status request failed");
    }

    let mut alerts = state.logs.subscribe_alerts();

    loop {
        tokio::select! {
            _ = state.updated.notified() => {
                render(&state).await;
            }
            alert = alerts.recv() => {
                if let Ok(entry) = alert {
                    print_alert(&entry);
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }
}

/// 画一次完整的状态表
async fn render(state: &Arc<DashboardState>) {
    if !state.is_loaded() {
        return;
    }

    let views = state.status_views().await;
    let mut deploying: HashMap<(String, String), bool> = HashMap::new();
    for (name, view) in &views {
        for env in view.environments.keys() {
            deploying.insert(
                (name.clone(), env.clone()),
                state.is_deploying(name, env).await,
            );
        }
    }

    println!();
    println!(
        "{:<20} {:<12} {:<14} {:<11} {}",
        "PROJECT", "ENVIRONMENT", "REVISION", "CONTAINERS", "STATUS"
    );
    for line in render_lines(&views, &deploying) {
        println!("{}", line);
    }

    // 展示过即视为已读，计数清零
    let pending_logs = state.logs.take_pending();
    let pending_deploys = state.deploys.take_pending();
    if pending_logs > 0 || pending_deploys > 0 {
        println!("({} new log entries, {} new deployments)", pending_logs, pending_deploys);
    }
}

/// 状态表内容行，项目/环境按名称排序保证输出稳定
fn render_lines(
    views: &HashMap<String, ProjectStatusView>,
    deploying: &HashMap<(String, String), bool>,
) -> Vec<String> {
    let mut project_names: Vec<&String> = views.keys().collect();
    project_names.sort();

    let mut lines = Vec::new();
    for name in project_names {
        let view = &views[name];
        let mut env_names: Vec<&String> = view.environments.keys().collect();
        env_names.sort();

        for env in env_names {
            let env_view = &view.environments[env];

            let (revision, containers) = match &env_view.status {
                Some(status) => {
                    let label: String = status
                        .last_revision_label
                        .chars()
                        .take(REVISION_DISPLAY_LEN)
                        .collect();
                    let total = status.environment.expected_containers();
                    (
                        label,
                        format!("{}/{}", status.running_containers.len(), total),
                    )
                }
                None => ("-".to_string(), "-".to_string()),
            };

            let mut tags: Vec<&str> = env_view.tags.iter().map(EnvTag::as_str).collect();
            if *deploying
                .get(&(name.clone(), env.clone()))
                .unwrap_or(&false)
            {
                tags.push("deploying");
            }

            lines.push(format!(
                "{:<20} {:<12} {:<14} {:<11} {}",
                name,
                env,
                revision,
                containers,
                tags.join("+")
            ));
        }
    }

    lines
}

/// 严重告警（桌面通知的控制台形态）
fn print_alert(entry: &LogEntry) {
    let params = entry.params_line();
    if params.is_empty() {
        println!("[Critical Error] {}", entry.msg);
    } else {
        println!("[Critical Error] {} ({})", entry.msg, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::ContainerSummary;
    use crate::domain::project::{Environment, Project};
    use crate::domain::status::EnvironmentStatus;
    use crate::state::EnvStatusView;

    fn view(tags: Vec<EnvTag>, status: Option<EnvironmentStatus>) -> ProjectStatusView {
        let mut environments = HashMap::new();
        environments.insert(
            "live".to_string(),
            EnvStatusView {
                tags,
                deployable: Some(true),
                status,
            },
        );
        ProjectStatusView {
            project: Project {
                name: "frontend".to_string(),
                ..Default::default()
            },
            environments,
            error: None,
        }
    }

    #[test]
    fn test_render_loading_row() {
        let mut views = HashMap::new();
        views.insert("frontend".to_string(), view(vec![EnvTag::Loading], None));

        let lines = render_lines(&views, &HashMap::new());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("frontend"));
        assert!(lines[0].contains("loading"));
        assert!(lines[0].contains("-"));
    }

    #[test]
    fn test_render_multibyte_revision_label() {
        let status = EnvironmentStatus {
            environment: Environment {
                name: "live".to_string(),
                docker_end_points: vec!["tcp://a:2375".to_string()],
            },
            last_revision_label: "版本版本版本版本版本版本版本".to_string(),
            running_containers: Vec::new(),
            containers: Vec::new(),
        };

        let mut views = HashMap::new();
        views.insert("frontend".to_string(), view(vec![EnvTag::Down], Some(status)));

        let lines = render_lines(&views, &HashMap::new());
        assert!(lines[0].contains("版本版本版本版本版本版本"));
        assert!(!lines[0].contains("版本版本版本版本版本版本版本"));
    }

    #[test]
    fn test_render_status_row_with_deploy_marker() {
        let status = EnvironmentStatus {
            environment: Environment {
                name: "live".to_string(),
                docker_end_points: vec!["tcp://a:2375".to_string(), "tcp://b:2375".to_string()],
            },
            last_revision_label: "abc123def456789".to_string(),
            running_containers: vec![ContainerSummary {
                image: "frontend:abc123".to_string(),
                ..Default::default()
            }],
            containers: Vec::new(),
        };

        let mut views = HashMap::new();
        views.insert(
            "frontend".to_string(),
            view(vec![EnvTag::Down, EnvTag::Partial], Some(status)),
        );
        let mut deploying = HashMap::new();
        deploying.insert(("frontend".to_string(), "live".to_string()), true);

        let lines = render_lines(&views, &deploying);
        assert!(lines[0].contains("abc123def456"));
        assert!(!lines[0].contains("abc123def456789"));
        assert!(lines[0].contains("1/2"));
        assert!(lines[0].contains("down+partial+deploying"));
    }

    #[tokio::test]
    async fn test_render_drains_pending_counters() {
        use std::collections::BTreeMap;
        use std::sync::Arc;

        use chrono::Utc;

        use crate::config::EnvConfig;
        use crate::domain::log::{DeployLogEntry, LogLevel};
        use crate::domain::status::ProjectStatusReport;

        let state = Arc::new(DashboardState::new(EnvConfig {
            server_url: "http://localhost:8080".to_string(),
            min_log_level: LogLevel::Info,
        }));

        let mut reports = HashMap::new();
        reports.insert(
            "frontend".to_string(),
            ProjectStatusReport {
                project: Project {
                    name: "frontend".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        state.apply_status(reports).await;

        state
            .logs
            .push(LogEntry {
                timestamp: Utc::now(),
                lvl: LogLevel::Warning,
                msg: "pending".to_string(),
                params: BTreeMap::new(),
            })
            .await;
        state
            .deploys
            .append(&DeployLogEntry::new("frontend", "live", "step 1\n"))
            .await;

        assert_eq!(state.logs.pending(), 1);
        assert_eq!(state.deploys.pending(), 1);

        // 展示过即清零
        render(&state).await;
        assert_eq!(state.logs.pending(), 0);
        assert_eq!(state.deploys.pending(), 0);
    }
}
