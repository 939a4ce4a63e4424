//! GitHub 兼容 REST 客户端
//!
//! 只发 GET 请求，因此可以安全地按退避策略自动重试：
//! 超时、403/429 限流和 5xx 重试，404 与其他 4xx 直接返回。

use std::time::Duration;

use async_trait::async_trait;
use contrib_shared::config::UpstreamConfig;
use contrib_shared::observability::metrics;
use contrib_shared::retry::{RetryPolicy, retry_with_policy};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{UpstreamClient, UpstreamCommit, UpstreamPullRequest};
use crate::error::{BadgeError, Result};
use crate::models::RepositorySnapshot;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";

/// GitHub 兼容客户端
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    per_page: u32,
    retry_policy: RetryPolicy,
}

impl GithubClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| BadgeError::Internal(format!("HTTP 客户端初始化失败: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page.clamp(1, 100),
            retry_policy: RetryPolicy::with_max_retries(config.max_retries),
        })
    }

    /// 发送带重试的 GET 请求并解析 JSON
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();

        retry_with_policy(
            &self.retry_policy,
            endpoint,
            BadgeError::is_retryable,
            move || async move { self.get_once(endpoint, token, url, query).await },
        )
        .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        token: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!(endpoint, url, "请求上游 API");

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream_request(endpoint, "transport_error");
                if e.is_timeout() {
                    BadgeError::UpstreamTimeout(endpoint.to_string())
                } else {
                    BadgeError::upstream(endpoint, e.to_string())
                }
            })?;

        let status = response.status();
        if let Some(err) = classify_status(endpoint, url, status) {
            metrics::record_upstream_request(endpoint, status_outcome(status));
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| {
            metrics::record_upstream_request(endpoint, "transport_error");
            if e.is_timeout() {
                BadgeError::UpstreamTimeout(endpoint.to_string())
            } else {
                BadgeError::upstream(endpoint, e.to_string())
            }
        })?;

        metrics::record_upstream_request(endpoint, "success");
        Ok(serde_json::from_slice(&body)?)
    }

    fn page_query(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("per_page", self.per_page.to_string()),
            ("page", page.max(1).to_string()),
        ]
    }
}

/// 把非成功状态码映射为错误；成功返回 None
fn classify_status(endpoint: &str, url: &str, status: StatusCode) -> Option<BadgeError> {
    if status.is_success() {
        return None;
    }
    let err = match status {
        StatusCode::NOT_FOUND => BadgeError::UpstreamNotFound(url.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            BadgeError::UpstreamRateLimited(endpoint.to_string())
        }
        s if s.is_server_error() => BadgeError::upstream(endpoint, format!("HTTP {}", s.as_u16())),
        s => BadgeError::UpstreamRejected {
            endpoint: endpoint.to_string(),
            status: s.as_u16(),
        },
    };
    Some(err)
}

fn status_outcome(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => "rate_limited",
        s if s.is_server_error() => "server_error",
        _ => "rejected",
    }
}

#[async_trait]
impl UpstreamClient for GithubClient {
    fn page_size(&self) -> u32 {
        self.per_page
    }

    async fn get_repository(&self, token: &str, github_id: i64) -> Result<RepositorySnapshot> {
        self.get_json(
            "repository",
            token,
            &format!("/repositories/{github_id}"),
            &[],
        )
        .await
    }

    async fn list_pull_requests(
        &self,
        token: &str,
        full_name: &str,
        page: u32,
    ) -> Result<Vec<UpstreamPullRequest>> {
        let mut query = self.page_query(page);
        query.push(("state", "all".to_string()));
        self.get_json(
            "pull_requests",
            token,
            &format!("/repos/{full_name}/pulls"),
            &query,
        )
        .await
    }

    async fn get_pull_request(
        &self,
        token: &str,
        full_name: &str,
        number: i32,
    ) -> Result<UpstreamPullRequest> {
        self.get_json(
            "pull_request",
            token,
            &format!("/repos/{full_name}/pulls/{number}"),
            &[],
        )
        .await
    }

    async fn list_commits(
        &self,
        token: &str,
        full_name: &str,
        author: &str,
        page: u32,
    ) -> Result<Vec<UpstreamCommit>> {
        let mut query = self.page_query(page);
        query.push(("author", author.to_string()));
        self.get_json(
            "commits",
            token,
            &format!("/repos/{full_name}/commits"),
            &query,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(classify_status("pulls", "/x", StatusCode::OK).is_none());

        let not_found = classify_status("pulls", "/x", StatusCode::NOT_FOUND).unwrap();
        assert!(matches!(not_found, BadgeError::UpstreamNotFound(_)));
        assert!(!not_found.is_retryable());

        let limited = classify_status("pulls", "/x", StatusCode::TOO_MANY_REQUESTS).unwrap();
        assert!(limited.is_retryable());

        let forbidden = classify_status("pulls", "/x", StatusCode::FORBIDDEN).unwrap();
        assert!(matches!(forbidden, BadgeError::UpstreamRateLimited(_)));

        let bad_gateway = classify_status("pulls", "/x", StatusCode::BAD_GATEWAY).unwrap();
        assert!(bad_gateway.is_retryable());

        let unauthorized = classify_status("pulls", "/x", StatusCode::UNAUTHORIZED).unwrap();
        assert!(!unauthorized.is_retryable());
    }

    #[test]
    fn test_client_normalizes_config() {
        let config = UpstreamConfig {
            api_base_url: "https://ghe.example.com/api/v3/".to_string(),
            per_page: 500,
            ..Default::default()
        };
        let client = GithubClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(client.page_size(), 100);
        assert_eq!(
            client.page_query(0),
            vec![("per_page", "100".to_string()), ("page", "1".to_string())]
        );
    }
}
