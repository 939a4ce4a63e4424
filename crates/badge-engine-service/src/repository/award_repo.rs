//! 授予记录仓储
//!
//! (user_id, badge_id) 唯一约束是"至多授予一次"的最终裁决者：
//! 并发评估中输掉竞争的写入通过 ON CONFLICT DO NOTHING 变成空操作

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::AwardRepositoryTrait;
use crate::error::Result;
use crate::models::{Award, NewAward};

const AWARD_COLUMNS: &str = r#"
    id, user_id, badge_id, repository_id, awarded_at, actual_value, awarded_by,
    metadata, acknowledged
"#;

/// 授予记录仓储
pub struct AwardRepository {
    pool: PgPool,
}

impl AwardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 用户在某仓库下已获得的徽章
    pub async fn list_user_awards(&self, user_id: i64, repository_id: i64) -> Result<Vec<Award>> {
        let awards = sqlx::query_as::<_, Award>(&format!(
            r#"
            SELECT {AWARD_COLUMNS}
            FROM user_badges
            WHERE user_id = $1 AND repository_id = $2
            ORDER BY awarded_at ASC
            "#
        ))
        .bind(user_id)
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(awards)
    }

    /// 创建授予记录
    ///
    /// 已存在同一 (user_id, badge_id) 时返回 None
    pub async fn create_award(&self, award: &NewAward) -> Result<Option<Award>> {
        let created = sqlx::query_as::<_, Award>(&format!(
            r#"
            INSERT INTO user_badges (user_id, badge_id, repository_id, actual_value, awarded_by, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            RETURNING {AWARD_COLUMNS}
            "#
        ))
        .bind(award.user_id)
        .bind(award.badge_id)
        .bind(award.repository_id)
        .bind(award.actual_value)
        .bind(award.awarded_by)
        .bind(&award.metadata)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }

    /// 标记已读
    pub async fn acknowledge(&self, user_id: i64, award_id: i64) -> Result<Option<Award>> {
        let award = sqlx::query_as::<_, Award>(&format!(
            r#"
            UPDATE user_badges
            SET acknowledged = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING {AWARD_COLUMNS}
            "#
        ))
        .bind(award_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(award)
    }
}

#[async_trait]
impl AwardRepositoryTrait for AwardRepository {
    async fn list_user_awards(&self, user_id: i64, repository_id: i64) -> Result<Vec<Award>> {
        self.list_user_awards(user_id, repository_id).await
    }

    async fn create_award(&self, award: &NewAward) -> Result<Option<Award>> {
        self.create_award(award).await
    }

    async fn acknowledge(&self, user_id: i64, award_id: i64) -> Result<Option<Award>> {
        self.acknowledge(user_id, award_id).await
    }
}
