//! 服务层模块
//!
//! socket 连接、REST 回退与控制台渲染

pub mod socket;
pub mod rest;
pub mod monitor;
