//! 用户仓储
//!
//! 用户表由外部系统维护，这里只读

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::UserRepositoryTrait;
use crate::error::Result;
use crate::models::User;

const USER_COLUMNS: &str = "id, github_id, username, access_token, created_at, updated_at";

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_github_id(&self, github_id: i64) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_github_id_in_tx(&mut conn, github_id).await
    }

    /// 按登录名查找（大小写不敏感）
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // ==================== 事务内操作 ====================

    /// 在事务内按上游 ID 查找用户
    pub async fn find_by_github_id_in_tx(
        conn: &mut PgConnection,
        github_id: i64,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE github_id = $1"
        ))
        .bind(github_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.get_user(id).await
    }

    async fn find_by_github_id(&self, github_id: i64) -> Result<Option<User>> {
        self.find_by_github_id(github_id).await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.find_by_login(login).await
    }
}
