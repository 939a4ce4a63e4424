//! 徽章目录
//!
//! 仓库作用域内的徽章定义：按阈值升序列出启用徽章，以及幂等的默认徽章播种

use std::sync::Arc;

use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{Badge, default_badge_set};
use crate::repository::{BadgeRepository, BadgeRepositoryTrait};

/// 徽章目录
pub struct BadgeCatalog {
    badge_repo: Arc<dyn BadgeRepositoryTrait>,
}

impl BadgeCatalog {
    pub fn new(badge_repo: Arc<dyn BadgeRepositoryTrait>) -> Self {
        Self { badge_repo }
    }

    /// 启用中的徽章，按阈值升序
    pub async fn list_active(&self, repository_id: i64) -> Result<Vec<Badge>> {
        self.badge_repo.list_active_badges(repository_id).await
    }

    /// 在导入事务内播种默认徽章
    ///
    /// 仓库已有默认徽章时不再创建，返回空列表；并发播种由唯一约束去重
    #[instrument(skip(conn))]
    pub async fn seed_defaults_in_tx(
        conn: &mut PgConnection,
        repository_id: i64,
        created_by: Option<i64>,
    ) -> Result<Vec<Badge>> {
        if BadgeRepository::count_default_badges_in_tx(conn, repository_id).await? > 0 {
            return Ok(Vec::new());
        }
        let created =
            BadgeRepository::insert_badges_in_tx(conn, repository_id, created_by, &default_badge_set())
                .await?;

        info!(
            repository_id,
            badges_created = created.len(),
            "默认徽章已播种"
        );
        Ok(created)
    }
}
