//! PR 账本仓储
//!
//! 查询时通过 author_github_id 关联用户表，写入时尚未注册的作者在之后注册也能被统计到

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PullRequestRepositoryTrait;
use crate::error::Result;
use crate::models::{PullRequestRecord, PullRequestUpsert};

const PULL_REQUEST_SELECT: &str = r#"
    SELECT pr.id, pr.repository_id, COALESCE(pr.user_id, u.id) AS user_id, pr.github_id,
           pr.number, pr.title, pr.author_login, pr.author_github_id, pr.state, pr.merged,
           pr.commits, pr.additions, pr.deletions, pr.opened_at, pr.merged_at, pr.closed_at,
           pr.updated_at
    FROM pull_requests pr
    LEFT JOIN users u ON u.github_id = pr.author_github_id
"#;

/// PR 账本仓储
pub struct PullRequestRepository {
    pool: PgPool,
}

impl PullRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_repository_user(
        &self,
        repository_id: i64,
        user_id: i64,
    ) -> Result<Vec<PullRequestRecord>> {
        let records = sqlx::query_as::<_, PullRequestRecord>(&format!(
            r#"
            {PULL_REQUEST_SELECT}
            WHERE pr.repository_id = $1 AND COALESCE(pr.user_id, u.id) = $2
            ORDER BY pr.number ASC
            "#
        ))
        .bind(repository_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn list_by_repository(&self, repository_id: i64) -> Result<Vec<PullRequestRecord>> {
        let records = sqlx::query_as::<_, PullRequestRecord>(&format!(
            r#"
            {PULL_REQUEST_SELECT}
            WHERE pr.repository_id = $1
            ORDER BY pr.number ASC
            "#
        ))
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// 按 (repository_id, number) 写入或覆盖
    ///
    /// 合并状态单调：行一旦记为已合并，之后到达的未合并投递（重投的 opened /
    /// synchronize）不会改回状态、合并时间和提交/行数，账本聚合因此与投递顺序无关
    pub async fn upsert(&self, record: &PullRequestUpsert) -> Result<PullRequestRecord> {
        let saved = sqlx::query_as::<_, PullRequestRecord>(
            r#"
            INSERT INTO pull_requests (
                repository_id, user_id, github_id, number, title, author_login,
                author_github_id, state, merged, commits, additions, deletions,
                opened_at, merged_at, closed_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
            ON CONFLICT (repository_id, number) DO UPDATE
            SET user_id = COALESCE(EXCLUDED.user_id, pull_requests.user_id),
                github_id = EXCLUDED.github_id,
                title = EXCLUDED.title,
                author_login = EXCLUDED.author_login,
                author_github_id = EXCLUDED.author_github_id,
                state = CASE WHEN pull_requests.merged THEN pull_requests.state
                             ELSE EXCLUDED.state END,
                merged = pull_requests.merged OR EXCLUDED.merged,
                commits = CASE WHEN pull_requests.merged AND NOT EXCLUDED.merged
                               THEN pull_requests.commits ELSE EXCLUDED.commits END,
                additions = CASE WHEN pull_requests.merged AND NOT EXCLUDED.merged
                                 THEN pull_requests.additions ELSE EXCLUDED.additions END,
                deletions = CASE WHEN pull_requests.merged AND NOT EXCLUDED.merged
                                 THEN pull_requests.deletions ELSE EXCLUDED.deletions END,
                merged_at = COALESCE(pull_requests.merged_at, EXCLUDED.merged_at),
                closed_at = CASE WHEN pull_requests.merged THEN pull_requests.closed_at
                                 ELSE EXCLUDED.closed_at END,
                updated_at = NOW()
            RETURNING id, repository_id, user_id, github_id, number, title, author_login,
                      author_github_id, state, merged, commits, additions, deletions,
                      opened_at, merged_at, closed_at, updated_at
            "#,
        )
        .bind(record.repository_id)
        .bind(record.user_id)
        .bind(record.github_id)
        .bind(record.number)
        .bind(&record.title)
        .bind(&record.author_login)
        .bind(record.author_github_id)
        .bind(&record.state)
        .bind(record.merged)
        .bind(record.commits)
        .bind(record.additions)
        .bind(record.deletions)
        .bind(record.opened_at)
        .bind(record.merged_at)
        .bind(record.closed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }
}

#[async_trait]
impl PullRequestRepositoryTrait for PullRequestRepository {
    async fn list_by_repository_user(
        &self,
        repository_id: i64,
        user_id: i64,
    ) -> Result<Vec<PullRequestRecord>> {
        self.list_by_repository_user(repository_id, user_id).await
    }

    async fn list_by_repository(&self, repository_id: i64) -> Result<Vec<PullRequestRecord>> {
        self.list_by_repository(repository_id).await
    }

    async fn upsert(&self, record: &PullRequestUpsert) -> Result<PullRequestRecord> {
        self.upsert(record).await
    }
}
