//! 仓库仓储
//!
//! 提供仓库记录的查询，以及导入事务中使用的插入与快照同步

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::RepoRepositoryTrait;
use crate::error::Result;
use crate::models::{Repository, RepositorySnapshot};

const REPOSITORY_COLUMNS: &str = r#"
    id, github_id, name, full_name, owner_login, description, language, visibility,
    stars_count, forks_count, default_branch, topics, html_url, owner_id, active,
    last_sync_at, created_at, updated_at
"#;

/// 仓库仓储
pub struct RepoRepository {
    pool: PgPool,
}

impl RepoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取启用中的仓库
    pub async fn get_repository(&self, id: i64) -> Result<Option<Repository>> {
        let repository = sqlx::query_as::<_, Repository>(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = $1 AND active = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(repository)
    }

    pub async fn find_by_github_id(&self, github_id: i64) -> Result<Option<Repository>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_github_id_in_tx(&mut conn, github_id).await
    }

    // ==================== 事务内操作 ====================

    /// 在事务内按上游 ID 查找（包括已停用的仓库）
    pub async fn find_by_github_id_in_tx(
        conn: &mut PgConnection,
        github_id: i64,
    ) -> Result<Option<Repository>> {
        let repository = sqlx::query_as::<_, Repository>(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE github_id = $1"
        ))
        .bind(github_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(repository)
    }

    /// 在事务内根据快照创建仓库
    ///
    /// 并发导入同一仓库时，输掉竞争的一方命中 github_id 唯一约束，返回 None，
    /// 调用方应重新查找并按更新处理
    pub async fn insert_in_tx(
        conn: &mut PgConnection,
        snapshot: &RepositorySnapshot,
        owner_id: i64,
    ) -> Result<Option<Repository>> {
        let repository = sqlx::query_as::<_, Repository>(&format!(
            r#"
            INSERT INTO repositories (
                github_id, name, full_name, owner_login, description, language, visibility,
                stars_count, forks_count, default_branch, topics, html_url, owner_id,
                active, last_sync_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, TRUE, NOW())
            ON CONFLICT (github_id) DO NOTHING
            RETURNING {REPOSITORY_COLUMNS}
            "#
        ))
        .bind(snapshot.id)
        .bind(&snapshot.name)
        .bind(&snapshot.full_name)
        .bind(&snapshot.owner.login)
        .bind(&snapshot.description)
        .bind(&snapshot.language)
        .bind(snapshot.visibility())
        .bind(snapshot.stargazers_count)
        .bind(snapshot.forks_count)
        .bind(&snapshot.default_branch)
        .bind(&snapshot.topics)
        .bind(&snapshot.html_url)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(repository)
    }

    /// 用快照覆盖可变字段并刷新 last_sync_at
    ///
    /// 重新导入已停用的仓库会将其恢复为启用
    pub async fn update_sync_data_in_tx(
        conn: &mut PgConnection,
        id: i64,
        snapshot: &RepositorySnapshot,
    ) -> Result<Repository> {
        let repository = sqlx::query_as::<_, Repository>(&format!(
            r#"
            UPDATE repositories
            SET name = $2, full_name = $3, owner_login = $4, description = $5,
                language = $6, visibility = $7, stars_count = $8, forks_count = $9,
                default_branch = $10, topics = $11, html_url = $12,
                active = TRUE, last_sync_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {REPOSITORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&snapshot.name)
        .bind(&snapshot.full_name)
        .bind(&snapshot.owner.login)
        .bind(&snapshot.description)
        .bind(&snapshot.language)
        .bind(snapshot.visibility())
        .bind(snapshot.stargazers_count)
        .bind(snapshot.forks_count)
        .bind(&snapshot.default_branch)
        .bind(&snapshot.topics)
        .bind(&snapshot.html_url)
        .fetch_one(&mut *conn)
        .await?;

        Ok(repository)
    }
}

#[async_trait]
impl RepoRepositoryTrait for RepoRepository {
    async fn get_repository(&self, id: i64) -> Result<Option<Repository>> {
        self.get_repository(id).await
    }

    async fn find_by_github_id(&self, github_id: i64) -> Result<Option<Repository>> {
        self.find_by_github_id(github_id).await
    }
}
