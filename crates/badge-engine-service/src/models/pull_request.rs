//! 本地 PR 账本
//!
//! 由 pull_request Webhook 按 (repository_id, number) 幂等写入，供账本聚合统计使用

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// PR 账本记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRecord {
    pub id: i64,
    pub repository_id: i64,
    /// 作者能解析到本地用户时才有值
    #[sqlx(default)]
    pub user_id: Option<i64>,
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub author_login: String,
    #[sqlx(default)]
    pub author_github_id: Option<i64>,
    /// open / closed
    pub state: String,
    pub merged: bool,
    pub commits: i32,
    pub additions: i32,
    pub deletions: i32,
    pub opened_at: DateTime<Utc>,
    #[sqlx(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// PR 账本写入参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestUpsert {
    pub repository_id: i64,
    pub user_id: Option<i64>,
    pub github_id: i64,
    pub number: i32,
    pub title: String,
    pub author_login: String,
    pub author_github_id: Option<i64>,
    pub state: String,
    pub merged: bool,
    pub commits: i32,
    pub additions: i32,
    pub deletions: i32,
    pub opened_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}
