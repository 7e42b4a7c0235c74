//! 配置模块
//!
//! 环境变量解析与运行时覆盖

pub mod env;

pub use env::{EnvConfig, RuntimeConfig};
