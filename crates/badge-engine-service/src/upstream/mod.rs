//! 上游代码托管平台 API
//!
//! 定义引擎消费的四个只读接口：仓库详情、PR 列表、PR 详情、提交列表。
//! 所有请求都携带查询用户的 bearer 凭证。

mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::RepositorySnapshot;

pub use github::GithubClient;

/// 上游账号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamAccount {
    pub login: String,
    pub id: i64,
}

/// 上游 PR
///
/// 列表接口不返回 merged / commits / additions / deletions，缺省为 0；
/// 详情接口与 pull_request Webhook 都会携带这些字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamPullRequest {
    pub id: i64,
    pub number: i32,
    #[serde(default)]
    pub title: String,
    pub state: String,
    pub user: UpstreamAccount,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub commits: i32,
    #[serde(default)]
    pub additions: i32,
    #[serde(default)]
    pub deletions: i32,
}

impl UpstreamPullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged || self.merged_at.is_some()
    }

    /// 是否由该上游账号创建
    pub fn is_authored_by(&self, github_id: i64, login: &str) -> bool {
        self.user.id == github_id || self.user.login.eq_ignore_ascii_case(login)
    }
}

/// 提交作者时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCommitAuthor {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// 提交内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCommitDetail {
    #[serde(default)]
    pub author: Option<UpstreamCommitAuthor>,
}

/// 上游提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamCommit {
    pub sha: String,
    /// 提交邮箱未关联账号时为空
    #[serde(default)]
    pub author: Option<UpstreamAccount>,
    pub commit: UpstreamCommitDetail,
}

impl UpstreamCommit {
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|a| a.date)
    }
}

/// 上游 API 客户端接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// 每页条数；返回条数小于它即为最后一页
    fn page_size(&self) -> u32;

    async fn get_repository(&self, token: &str, github_id: i64) -> Result<RepositorySnapshot>;

    /// PR 列表（state=all）
    async fn list_pull_requests(
        &self,
        token: &str,
        full_name: &str,
        page: u32,
    ) -> Result<Vec<UpstreamPullRequest>>;

    async fn get_pull_request(
        &self,
        token: &str,
        full_name: &str,
        number: i32,
    ) -> Result<UpstreamPullRequest>;

    /// 按作者过滤的提交列表
    async fn list_commits(
        &self,
        token: &str,
        full_name: &str,
        author: &str,
        page: u32,
    ) -> Result<Vec<UpstreamCommit>>;
}
