//! REST 回退客户端
//!
//! 对应服务端的 `/rest/*` 端点，socket 不可用时仍能查询与部署；
//! 部署端点是流式响应，片段边到边写进部署日志流

use std::collections::HashMap;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;

use crate::domain::container::ContainerRecord;
use crate::domain::log::DeployLogEntry;
use crate::domain::project::User;
use crate::domain::status::ProjectStatusReport;
use crate::error::ClientResult;
use crate::state::DeployStream;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// REST 客户端，复用连接池
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 当前登录用户
    pub async fn user(&self) -> ClientResult<User> {
        let user = self
            .client
            .get(self.endpoint("/rest/user"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user)
    }

    /// 项目容器列表
    pub async fn containers(&self, project: &str) -> ClientResult<Vec<ContainerRecord>> {
        let records = self
            .client
            .get(self.endpoint(&format!("/rest/containers/{}", project)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    /// 全部项目状态
    pub async fn status(&self) -> ClientResult<HashMap<String, ProjectStatusReport>> {
        let reports = self
            .client
            .get(self.endpoint("/rest/status/"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reports)
    }

    /// 触发部署并跟踪流式输出
    ///
    /// 整个部署共用请求开始时刻的 date key，所有片段都归并到同一个缓冲区
    pub async fn deploy(
        &self,
        project: &str,
        environment: &str,
        deploys: &DeployStream,
    ) -> ClientResult<String> {
        let response = self
            .client
            .get(self.endpoint(&format!("/rest/deploy/{}/{}", project, environment)))
            // 部署可能远超常规超时
            .timeout(Duration::from_secs(30 * 60))
            .send()
            .await?
            .error_for_status()?;

        let template = DeployLogEntry::new(project, environment, String::new());
        let mut key = template.key();

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            let entry = DeployLogEntry {
                log: String::from_utf8_lossy(&chunk).into_owned(),
                ..template.clone()
            };
            key = deploys.append(&entry).await;
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let client = RestClient::new("http://localhost:8080");
        assert_eq!(client.endpoint("/rest/user"), "http://localhost:8080/rest/user");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let client = RestClient::new("http://localhost:8080/");
        assert_eq!(
            client.endpoint("/rest/containers/frontend"),
            "http://localhost:8080/rest/containers/frontend"
        );
    }
}
