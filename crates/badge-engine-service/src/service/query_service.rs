//! 徽章查询服务
//!
//! 只读的徽章进度查询，以及授予记录唯一允许的修改：标记已读

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use super::dto::{BadgeProgress, BadgeProgressReport};
use crate::catalog::BadgeCatalog;
use crate::error::{BadgeError, Result};
use crate::evaluator;
use crate::models::Award;
use crate::repository::{AwardRepositoryTrait, RepoRepositoryTrait, UserRepositoryTrait};
use crate::statistics::{StatisticsProviders, StatisticsSource};

/// 徽章查询服务
pub struct BadgeQueryService {
    users: Arc<dyn UserRepositoryTrait>,
    repositories: Arc<dyn RepoRepositoryTrait>,
    catalog: Arc<BadgeCatalog>,
    awards: Arc<dyn AwardRepositoryTrait>,
    statistics: StatisticsProviders,
}

impl BadgeQueryService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        repositories: Arc<dyn RepoRepositoryTrait>,
        catalog: Arc<BadgeCatalog>,
        awards: Arc<dyn AwardRepositoryTrait>,
        statistics: StatisticsProviders,
    ) -> Self {
        Self {
            users,
            repositories,
            catalog,
            awards,
            statistics,
        }
    }

    /// 用户在仓库中每个启用徽章的进度
    ///
    /// 统计拉取失败时直接返回错误，不展示部分数据
    #[instrument(skip(self))]
    pub async fn get_badge_progress(
        &self,
        user_id: i64,
        repository_id: i64,
        source: Option<StatisticsSource>,
    ) -> Result<BadgeProgressReport> {
        let repository = self
            .repositories
            .get_repository(repository_id)
            .await?
            .ok_or(BadgeError::RepositoryNotFound(repository_id))?;
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(BadgeError::UserNotFound(user_id))?;

        let statistics = self
            .statistics
            .select(source)
            .get_statistics(&repository, &user)
            .await?;
        let badges = self.catalog.list_active(repository_id).await?;
        let awarded: HashMap<i64, Award> = self
            .awards
            .list_user_awards(user_id, repository_id)
            .await?
            .into_iter()
            .map(|a| (a.badge_id, a))
            .collect();

        let progress: Vec<BadgeProgress> = badges
            .iter()
            .map(|badge| {
                let current_value = evaluator::actual_value(&statistics, badge);
                let award = awarded.get(&badge.id);
                BadgeProgress {
                    badge_id: badge.id,
                    name: badge.name.clone(),
                    description: badge.description.clone(),
                    icon: badge.icon.clone(),
                    criteria_type: badge.criteria_type,
                    criteria_value: badge.criteria_value,
                    current_value,
                    percentage: if award.is_some() {
                        100
                    } else {
                        BadgeProgress::percentage(badge, current_value)
                    },
                    earned: award.is_some(),
                    awarded_at: award.map(|a| a.awarded_at),
                }
            })
            .collect();

        Ok(BadgeProgressReport {
            user_id,
            repository_id,
            statistics,
            earned_count: progress.iter().filter(|p| p.earned).count(),
            badges: progress,
        })
    }

    /// 标记授予记录为已读
    #[instrument(skip(self))]
    pub async fn acknowledge_award(&self, user_id: i64, award_id: i64) -> Result<Award> {
        let award = self
            .awards
            .acknowledge(user_id, award_id)
            .await?
            .ok_or(BadgeError::AwardNotFound(award_id))?;

        info!(user_id, award_id, "授予记录已确认");
        Ok(award)
    }
}
