//! 徽章仓储
//!
//! 徽章目录的数据访问；批量插入依赖 (repository_id, criteria_type, criteria_value)
//! 唯一约束保证重复播种不会产生重复徽章

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, QueryBuilder};

use super::traits::BadgeRepositoryTrait;
use crate::error::Result;
use crate::models::{Badge, NewBadge};

const BADGE_COLUMNS: &str = r#"
    id, repository_id, name, description, icon, criteria_type, criteria_value,
    active, is_default, created_by, created_at, updated_at
"#;

/// 徽章仓储
pub struct BadgeRepository {
    pool: PgPool,
}

impl BadgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 仓库内启用的徽章，按阈值升序（同阈值按 ID）
    pub async fn list_active_badges(&self, repository_id: i64) -> Result<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(&format!(
            r#"
            SELECT {BADGE_COLUMNS}
            FROM badges
            WHERE repository_id = $1 AND active = TRUE
            ORDER BY criteria_value ASC, id ASC
            "#
        ))
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    // ==================== 事务内操作 ====================

    /// 默认徽章只在导入事务内播种
    pub async fn count_default_badges_in_tx(
        conn: &mut PgConnection,
        repository_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM badges WHERE repository_id = $1 AND is_default = TRUE",
        )
        .bind(repository_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// 在事务内批量插入徽章，冲突行跳过
    pub async fn insert_badges_in_tx(
        conn: &mut PgConnection,
        repository_id: i64,
        created_by: Option<i64>,
        badges: &[NewBadge],
    ) -> Result<Vec<Badge>> {
        if badges.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::new(
            "INSERT INTO badges (repository_id, name, description, icon, criteria_type, \
             criteria_value, active, is_default, created_by) ",
        );
        builder.push_values(badges, |mut row, badge| {
            row.push_bind(repository_id)
                .push_bind(badge.name.as_str())
                .push_bind(badge.description.as_str())
                .push_bind(badge.icon.as_str())
                .push_bind(badge.criteria_type)
                .push_bind(badge.criteria_value)
                .push_bind(true)
                .push_bind(badge.is_default)
                .push_bind(created_by);
        });
        builder.push(" ON CONFLICT (repository_id, criteria_type, criteria_value) DO NOTHING");
        builder.push(format!(" RETURNING {BADGE_COLUMNS}"));

        let mut inserted = builder
            .build_query_as::<Badge>()
            .fetch_all(&mut *conn)
            .await?;
        inserted.sort_by_key(|b| (b.criteria_value, b.id));

        Ok(inserted)
    }
}

#[async_trait]
impl BadgeRepositoryTrait for BadgeRepository {
    async fn list_active_badges(&self, repository_id: i64) -> Result<Vec<Badge>> {
        self.list_active_badges(repository_id).await
    }
}
