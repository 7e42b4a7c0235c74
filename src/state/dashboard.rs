//! 看板视图状态
//!
//! 所有字段由 socket 消息回调驱动，按 last-write-wins 覆盖；
//! 分类标签在每次状态推送时整体重算

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock};
use tracing::error;

use crate::config::EnvConfig;
use crate::domain::container::ContainerRecord;
use crate::domain::project::{Project, TASK_DEPLOY};
use crate::domain::status::{env_status, is_deployable, EnvTag, EnvironmentStatus, ProjectStatusReport};
use crate::state::deploy_stream::DeployStream;
use crate::state::log_stream::LogStream;

/// 单个环境的展示视图
#[derive(Clone, Debug)]
pub struct EnvStatusView {
    pub tags: Vec<EnvTag>,
    pub deployable: Option<bool>,
    pub status: Option<EnvironmentStatus>,
}

/// 单个项目的展示视图
#[derive(Clone, Debug)]
pub struct ProjectStatusView {
    pub project: Project,
    /// 环境名 -> 视图；没有状态推送的环境标记 loading
    pub environments: HashMap<String, EnvStatusView>,
    pub error: Option<serde_json::Value>,
}

/// 看板状态
pub struct DashboardState {
    /// 环境配置
    pub config: EnvConfig,
    /// 启动时间
    pub started_at: DateTime<Utc>,

    /// 项目列表（projects 推送整体替换）
    projects: RwLock<HashMap<String, Project>>,
    /// 状态视图（status 推送整体替换）
    views: RwLock<HashMap<String, ProjectStatusView>>,
    /// 部署进行中标记 (project -> 环境集合)
    deploying: RwLock<HashMap<String, HashSet<String>>>,
    /// 最近一次 containers 回复
    containers: RwLock<Vec<ContainerRecord>>,
    /// 错误列表，只追加
    errors: RwLock<Vec<String>>,

    /// 日志流
    pub logs: LogStream,
    /// 部署日志流
    pub deploys: DeployStream,

    /// 有请求在途
    processing: AtomicBool,
    /// 是否收到过第一次状态推送
    loaded: AtomicBool,
    /// 视图变化通知（渲染端等待）
    pub updated: Notify,
}

impl DashboardState {
    pub fn new(config: EnvConfig) -> Self {
        let min_level = config.min_log_level;
        Self {
            config,
            started_at: Utc::now(),
            projects: RwLock::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
            deploying: RwLock::new(HashMap::new()),
            containers: RwLock::new(Vec::new()),
            errors: RwLock::new(Vec::new()),
            logs: LogStream::new(min_level),
            deploys: DeployStream::new(),
            processing: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            updated: Notify::new(),
        }
    }

    /// 应用 projects 推送
    ///
    /// 替换项目列表，并按服务端任务状态重建部署标记
    pub async fn apply_projects(&self, projects: HashMap<String, Project>) {
        {
            let mut deploying = self.deploying.write().await;
            deploying.clear();
            for (name, project) in &projects {
                let envs: HashSet<String> = project
                    .task_status
                    .iter()
                    .filter(|(_, tasks)| tasks.contains_key(TASK_DEPLOY))
                    .map(|(env, _)| env.clone())
                    .collect();
                if !envs.is_empty() {
                    deploying.insert(name.clone(), envs);
                }
            }
        }

        *self.projects.write().await = projects;
        self.updated.notify_waiters();
    }

    /// 应用 status 推送
    ///
    /// 对每个项目的每个环境重算分类标签；项目声明了但还没有
    /// 状态的环境标记为 loading
    pub async fn apply_status(&self, reports: HashMap<String, ProjectStatusReport>) {
        let mut views = HashMap::with_capacity(reports.len());

        for (name, report) in reports {
            let mut env_names: HashSet<String> =
                report.project.environments.keys().cloned().collect();
            env_names.extend(report.status.keys().cloned());

            let environments = env_names
                .into_iter()
                .map(|env| {
                    let status = report.status.get(&env);
                    let view = EnvStatusView {
                        tags: env_status(status),
                        deployable: is_deployable(status),
                        status: status.cloned(),
                    };
                    (env, view)
                })
                .collect();

            views.insert(
                name,
                ProjectStatusView {
                    project: report.project,
                    environments,
                    error: report.error,
                },
            );
        }

        *self.views.write().await = views;
        self.loaded.store(true, Ordering::Relaxed);
        self.processing.store(false, Ordering::Relaxed);
        self.updated.notify_waiters();
    }

    /// 应用 containers 回复
    pub async fn apply_containers(&self, records: Vec<ContainerRecord>) {
        *self.containers.write().await = records;
        self.processing.store(false, Ordering::Relaxed);
        self.updated.notify_waiters();
    }

    /// 本地触发部署时先行标记，等服务端的 projects 推送覆盖
    pub async fn mark_deploying(&self, project: &str, environment: &str) {
        let mut deploying = self.deploying.write().await;
        deploying
            .entry(project.to_string())
            .or_default()
            .insert(environment.to_string());
        drop(deploying);
        self.updated.notify_waiters();
    }

    /// 环境是否有部署进行中
    pub async fn is_deploying(&self, project: &str, environment: &str) -> bool {
        self.deploying
            .read()
            .await
            .get(project)
            .map_or(false, |envs| envs.contains(environment))
    }

    /// 追加一条错误（HTTP 失败等），不重试
    pub async fn record_error(&self, message: String) {
        error!(error = %message, "Dashboard error");
        self.errors.write().await.push(message);
        self.updated.notify_waiters();
    }

    pub async fn errors(&self) -> Vec<String> {
        self.errors.read().await.clone()
    }

    pub async fn projects(&self) -> HashMap<String, Project> {
        self.projects.read().await.clone()
    }

    pub async fn status_views(&self) -> HashMap<String, ProjectStatusView> {
        self.views.read().await.clone()
    }

    pub async fn containers(&self) -> Vec<ContainerRecord> {
        self.containers.read().await.clone()
    }

    pub fn set_processing(&self, value: bool) {
        self.processing.store(value, Ordering::Relaxed);
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Relaxed)
    }

    /// 是否收到过第一次状态推送
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::ContainerSummary;
    use crate::domain::log::LogLevel;
    use crate::domain::project::Environment;

    fn test_state() -> DashboardState {
        DashboardState::new(EnvConfig {
            server_url: "http://localhost:8080".to_string(),
            min_log_level: LogLevel::Info,
        })
    }

    fn report(revision: &str, images: &[&str]) -> ProjectStatusReport {
        let mut project = Project {
            name: "frontend".to_string(),
            ..Default::default()
        };
        project.environments.insert(
            "live".to_string(),
            Environment {
                name: "live".to_string(),
                docker_end_points: vec!["tcp://a:2375".to_string()],
            },
        );
        project.environments.insert(
            "staging".to_string(),
            Environment {
                name: "staging".to_string(),
                docker_end_points: vec!["tcp://b:2375".to_string()],
            },
        );

        let mut status = HashMap::new();
        status.insert(
            "live".to_string(),
            EnvironmentStatus {
                environment: project.environments["live"].clone(),
                last_revision_label: revision.to_string(),
                running_containers: images
                    .iter()
                    .map(|image| ContainerSummary {
                        image: image.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                containers: Vec::new(),
            },
        );

        ProjectStatusReport {
            project,
            status,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_apply_status_computes_tags() {
        let state = test_state();
        assert!(!state.is_loaded());

        let mut reports = HashMap::new();
        reports.insert("frontend".to_string(), report("abc123", &["frontend:abc123"]));
        state.apply_status(reports).await;

        assert!(state.is_loaded());
        let views = state.status_views().await;
        let frontend = &views["frontend"];
        assert_eq!(frontend.environments["live"].tags, vec![EnvTag::Ok]);
        assert_eq!(frontend.environments["live"].deployable, Some(false));
        // staging 声明了但没有状态
        assert_eq!(frontend.environments["staging"].tags, vec![EnvTag::Loading]);
        assert_eq!(frontend.environments["staging"].deployable, None);
    }

    #[tokio::test]
    async fn test_status_push_overwrites_previous() {
        let state = test_state();

        let mut first = HashMap::new();
        first.insert("frontend".to_string(), report("abc123", &["frontend:ffff"]));
        state.apply_status(first).await;

        let views = state.status_views().await;
        assert_eq!(
            views["frontend"].environments["live"].tags,
            vec![EnvTag::Outdated, EnvTag::Partial]
        );

        let mut second = HashMap::new();
        second.insert("frontend".to_string(), report("abc123", &["frontend:abc123"]));
        state.apply_status(second).await;

        let views = state.status_views().await;
        assert_eq!(views["frontend"].environments["live"].tags, vec![EnvTag::Ok]);
    }

    #[tokio::test]
    async fn test_apply_projects_rebuilds_deploy_flags() {
        let state = test_state();
        state.mark_deploying("frontend", "live").await;
        assert!(state.is_deploying("frontend", "live").await);

        // 服务端推送里没有进行中的任务，标记被覆盖
        let mut projects = HashMap::new();
        projects.insert(
            "frontend".to_string(),
            Project {
                name: "frontend".to_string(),
                ..Default::default()
            },
        );
        state.apply_projects(projects).await;
        assert!(!state.is_deploying("frontend", "live").await);
    }

    #[tokio::test]
    async fn test_apply_projects_reads_task_status() {
        let state = test_state();

        let project: Project = serde_json::from_str(
            r#"{"Name": "frontend", "TaskStatus": {"live": {"deploy": "2024-02-01T10:00:00Z"}}}"#,
        )
        .unwrap();
        let mut projects = HashMap::new();
        projects.insert("frontend".to_string(), project);

        state.apply_projects(projects).await;
        assert!(state.is_deploying("frontend", "live").await);
        assert!(!state.is_deploying("frontend", "staging").await);
    }

    #[tokio::test]
    async fn test_errors_append_only() {
        let state = test_state();
        state.record_error("first".to_string()).await;
        state.record_error("second".to_string()).await;

        assert_eq!(state.errors().await, vec!["first", "second"]);
    }
}
