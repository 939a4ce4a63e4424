//! 成员关系仓储
//!
//! (user_id, repository_id) 唯一；导入时以 upsert 写入，永不产生重复行

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::MembershipRepositoryTrait;
use crate::error::Result;
use crate::models::{MembershipRole, UserRepositoryMembership};

const MEMBERSHIP_COLUMNS: &str = r#"
    id, user_id, repository_id, role, permissions, active, last_accessed_at,
    created_at, updated_at
"#;

/// 成员关系仓储
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 仓库下启用中的成员
    pub async fn list_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<UserRepositoryMembership>> {
        let memberships = sqlx::query_as::<_, UserRepositoryMembership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM user_repository_memberships
            WHERE repository_id = $1 AND active = TRUE
            ORDER BY user_id ASC
            "#
        ))
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(memberships)
    }

    /// 在事务内写入成员关系
    ///
    /// 冲突时更新角色、权限、启用标记和访问时间
    pub async fn upsert_in_tx(
        conn: &mut PgConnection,
        user_id: i64,
        repository_id: i64,
        role: MembershipRole,
    ) -> Result<UserRepositoryMembership> {
        let membership = sqlx::query_as::<_, UserRepositoryMembership>(&format!(
            r#"
            INSERT INTO user_repository_memberships (
                user_id, repository_id, role, permissions, active, last_accessed_at
            )
            VALUES ($1, $2, $3, $4, TRUE, NOW())
            ON CONFLICT (user_id, repository_id) DO UPDATE
            SET role = EXCLUDED.role,
                permissions = EXCLUDED.permissions,
                active = TRUE,
                last_accessed_at = NOW(),
                updated_at = NOW()
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(repository_id)
        .bind(role)
        .bind(role.permissions())
        .fetch_one(&mut *conn)
        .await?;

        Ok(membership)
    }
}

#[async_trait]
impl MembershipRepositoryTrait for MembershipRepository {
    async fn list_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<UserRepositoryMembership>> {
        self.list_by_repository(repository_id).await
    }
}
