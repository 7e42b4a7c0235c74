//! 领域模型模块
//!
//! 纯数据结构与状态判定，不依赖 tokio

pub mod project;
pub mod status;
pub mod container;
pub mod log;
pub mod message;

// Re-exports for convenience
pub use project::{Environment, Project, TaskStatus, User, TASK_DEPLOY};
pub use status::{env_status, is_deployable, EnvTag, EnvironmentStatus, ProjectStatusReport};
pub use container::{ContainerDetail, ContainerRecord, ContainerSummary};
pub use log::{DeployLogEntry, LogEntry, LogLevel};
pub use message::{ClientRequest, ServerEnvelope, ServerMessage};
