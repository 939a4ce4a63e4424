//! 徽章授予服务
//!
//! 编排 徽章目录 × 贡献统计 × 资格评估 × 授予记录，是整个引擎的核心。
//!
//! ## 单用户流程
//!
//! 1. 拉取统计 -> 2. 无任何贡献则直接返回空结果 -> 3. 按阈值升序加载启用徽章
//!    -> 4. 加载已授予集合（force_recheck 时跳过）-> 5. 逐个评估并写入
//!    -> 6. 唯一约束冲突视为成功的空操作 -> 7. 汇总
//!
//! 单个徽章写入失败只记入错误列表，不影响其余徽章的评估。
//! 统计拉取失败时不授予任何徽章。

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use contrib_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use super::dto::{
    AwardOptions, AwardResult, AwardTrigger, AwardedBadge, BatchAwardResult, ItemError,
};
use crate::catalog::BadgeCatalog;
use crate::error::{BadgeError, Result};
use crate::evaluator;
use crate::models::{ContributorStatistics, NewAward, Repository};
use crate::repository::{
    AwardRepositoryTrait, MembershipRepositoryTrait, RepoRepositoryTrait, UserRepositoryTrait,
};
use crate::statistics::StatisticsProviders;

/// 单用户授予接口
///
/// 通过 trait 解耦 Webhook 网关与授予服务，网关测试中使用 mock
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ContributionAwarder: Send + Sync {
    /// 对单个用户/仓库执行实时评估
    async fn check_and_award(
        &self,
        user_id: i64,
        repository_id: i64,
        trigger: AwardTrigger,
    ) -> Result<AwardResult>;
}

/// 徽章授予服务
pub struct AwardService {
    users: Arc<dyn UserRepositoryTrait>,
    repositories: Arc<dyn RepoRepositoryTrait>,
    catalog: Arc<BadgeCatalog>,
    awards: Arc<dyn AwardRepositoryTrait>,
    memberships: Arc<dyn MembershipRepositoryTrait>,
    statistics: StatisticsProviders,
}

impl AwardService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        repositories: Arc<dyn RepoRepositoryTrait>,
        catalog: Arc<BadgeCatalog>,
        awards: Arc<dyn AwardRepositoryTrait>,
        memberships: Arc<dyn MembershipRepositoryTrait>,
        statistics: StatisticsProviders,
    ) -> Self {
        Self {
            users,
            repositories,
            catalog,
            awards,
            memberships,
            statistics,
        }
    }

    async fn load_repository(&self, repository_id: i64) -> Result<Repository> {
        self.repositories
            .get_repository(repository_id)
            .await?
            .ok_or(BadgeError::RepositoryNotFound(repository_id))
    }

    /// 单用户评估
    #[instrument(skip(self, trigger, options), fields(awarded_by = trigger.awarded_by().as_str()))]
    pub async fn award_for_user(
        &self,
        user_id: i64,
        repository_id: i64,
        trigger: AwardTrigger,
        options: AwardOptions,
    ) -> Result<AwardResult> {
        let started = Instant::now();

        let repository = self.load_repository(repository_id).await?;
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(BadgeError::UserNotFound(user_id))?;

        let provider = self.statistics.select(options.source);
        let statistics = match provider.get_statistics(&repository, &user).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(user_id, repository_id, error = %e, "统计拉取失败，本次不授予任何徽章");
                let mut result = AwardResult::empty(user_id, repository_id);
                result.errors.push(ItemError::new("statistics", &e));
                return Ok(result);
            }
        };

        let result = self
            .evaluate(&repository, user_id, statistics, &trigger, options.force_recheck)
            .await?;

        metrics::record_evaluation("single", started.elapsed().as_secs_f64());
        Ok(result)
    }

    /// 仓库批量评估
    ///
    /// 贡献者为统计结果中的用户与仓库成员的并集
    #[instrument(skip(self, options), fields(force_recheck = options.force_recheck))]
    pub async fn award_for_repository(
        &self,
        repository_id: i64,
        options: AwardOptions,
    ) -> Result<BatchAwardResult> {
        let started = Instant::now();
        let repository = self.load_repository(repository_id).await?;

        let mut batch = BatchAwardResult {
            repository_id,
            ..Default::default()
        };

        let provider = self.statistics.select(options.source);
        let mut statistics = match provider.get_repository_statistics(&repository).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(repository_id, error = %e, "仓库统计拉取失败，本次不授予任何徽章");
                batch.errors.push(ItemError::new("statistics", &e));
                return Ok(batch);
            }
        };

        let members = self.memberships.list_by_repository(repository_id).await?;
        let contributors: BTreeSet<i64> = statistics
            .keys()
            .copied()
            .chain(members.iter().map(|m| m.user_id))
            .collect();

        let trigger = AwardTrigger::System;
        for user_id in contributors {
            let stats = statistics.remove(&user_id).unwrap_or_default();
            match self
                .evaluate(&repository, user_id, stats, &trigger, options.force_recheck)
                .await
            {
                Ok(result) => {
                    batch.total_awarded += result.awarded_count();
                    batch.results.push(result);
                }
                Err(e) => {
                    warn!(user_id, repository_id, error = %e, "贡献者评估失败");
                    batch.errors.push(ItemError::new(format!("user:{user_id}"), &e));
                }
            }
            batch.contributors_evaluated += 1;
        }

        metrics::record_evaluation("batch", started.elapsed().as_secs_f64());
        info!(
            repository_id,
            contributors = batch.contributors_evaluated,
            total_awarded = batch.total_awarded,
            errors = batch.errors.len(),
            "仓库批量评估完成"
        );
        Ok(batch)
    }

    /// 核心评估流程
    async fn evaluate(
        &self,
        repository: &Repository,
        user_id: i64,
        statistics: ContributorStatistics,
        trigger: &AwardTrigger,
        force_recheck: bool,
    ) -> Result<AwardResult> {
        let mut result = AwardResult::empty(user_id, repository.id);

        if !statistics.has_activity() {
            debug!(user_id, repository_id = repository.id, "无贡献记录");
            result.statistics = statistics;
            return Ok(result);
        }

        let badges = self.catalog.list_active(repository.id).await?;

        let awarded: HashSet<i64> = if force_recheck {
            HashSet::new()
        } else {
            self.awards
                .list_user_awards(user_id, repository.id)
                .await?
                .into_iter()
                .map(|a| a.badge_id)
                .collect()
        };
        result.already_awarded_count = awarded.len();

        let awarded_by = trigger.awarded_by();
        for badge in badges.iter().filter(|b| !awarded.contains(&b.id)) {
            result.evaluated_count += 1;

            if !evaluator::is_eligible(&statistics, badge) {
                continue;
            }

            let actual_value = evaluator::actual_value(&statistics, badge);
            let new_award = NewAward {
                user_id,
                badge_id: badge.id,
                repository_id: repository.id,
                actual_value,
                awarded_by,
                metadata: trigger.metadata(),
            };

            match self.awards.create_award(&new_award).await {
                Ok(Some(award)) => {
                    metrics::record_badge_award(awarded_by.as_str());
                    info!(
                        user_id,
                        badge_id = badge.id,
                        award_id = award.id,
                        actual_value,
                        "徽章已授予"
                    );
                    result.newly_awarded.push(AwardedBadge {
                        award_id: award.id,
                        badge_id: badge.id,
                        name: badge.name.clone(),
                        description: badge.description.clone(),
                        icon: badge.icon.clone(),
                        criteria_type: badge.criteria_type,
                        criteria_value: badge.criteria_value,
                        actual_value,
                        awarded_at: award.awarded_at,
                    });
                }
                Ok(None) => {
                    // 并发评估已写入同一 (user, badge)
                    debug!(user_id, badge_id = badge.id, "徽章已存在，跳过");
                }
                Err(e) => {
                    warn!(user_id, badge_id = badge.id, error = %e, "徽章写入失败");
                    result
                        .errors
                        .push(ItemError::new(format!("badge:{}", badge.id), &e));
                }
            }
        }

        result.statistics = statistics;
        Ok(result)
    }
}

#[async_trait]
impl ContributionAwarder for AwardService {
    async fn check_and_award(
        &self,
        user_id: i64,
        repository_id: i64,
        trigger: AwardTrigger,
    ) -> Result<AwardResult> {
        self.award_for_user(user_id, repository_id, trigger, AwardOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::badge;
    use crate::models::{Award, CriteriaType, MembershipRole, UserRepositoryMembership};
    use crate::repository::{
        MockAwardRepositoryTrait, MockBadgeRepositoryTrait, MockMembershipRepositoryTrait,
        MockRepoRepositoryTrait, MockUserRepositoryTrait,
    };
    use crate::statistics::ledger::tests::{repository, user};
    use crate::statistics::{MockStatisticsProvider, StatisticsProvider};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn merged(merged_prs: i64) -> ContributorStatistics {
        ContributorStatistics {
            total_prs: merged_prs,
            merged_prs,
            total_commits: merged_prs * 2,
            first_contribution: Some(Utc::now()),
            last_contribution: Some(Utc::now()),
            ..Default::default()
        }
    }

    fn tiered_badges() -> Vec<crate::models::Badge> {
        vec![
            badge(1, CriteriaType::Prs, 1),
            badge(2, CriteriaType::Prs, 5),
            badge(3, CriteriaType::Prs, 20),
        ]
    }

    fn award_from(new: &NewAward, id: i64) -> Award {
        Award {
            id,
            user_id: new.user_id,
            badge_id: new.badge_id,
            repository_id: new.repository_id,
            awarded_at: Utc::now(),
            actual_value: new.actual_value,
            awarded_by: new.awarded_by,
            metadata: new.metadata.clone(),
            acknowledged: false,
        }
    }

    fn existing_award(badge_id: i64) -> Award {
        Award {
            id: 100 + badge_id,
            user_id: 7,
            badge_id,
            repository_id: 1,
            awarded_at: Utc::now(),
            actual_value: 5,
            awarded_by: crate::models::AwardedBy::System,
            metadata: serde_json::json!({}),
            acknowledged: false,
        }
    }

    struct Fixture {
        users: MockUserRepositoryTrait,
        repositories: MockRepoRepositoryTrait,
        badges: MockBadgeRepositoryTrait,
        awards: MockAwardRepositoryTrait,
        memberships: MockMembershipRepositoryTrait,
        statistics: MockStatisticsProvider,
    }

    impl Fixture {
        fn new() -> Self {
            let mut users = MockUserRepositoryTrait::new();
            users.expect_get_user().returning(|id| Ok(Some(user(id))));
            let mut repositories = MockRepoRepositoryTrait::new();
            repositories
                .expect_get_repository()
                .returning(|id| Ok((id == 1).then(repository)));

            Self {
                users,
                repositories,
                badges: MockBadgeRepositoryTrait::new(),
                awards: MockAwardRepositoryTrait::new(),
                memberships: MockMembershipRepositoryTrait::new(),
                statistics: MockStatisticsProvider::new(),
            }
        }

        fn with_badges(mut self, badges: Vec<crate::models::Badge>) -> Self {
            self.badges
                .expect_list_active_badges()
                .returning(move |_| Ok(badges.clone()));
            self
        }

        fn with_user_stats(mut self, stats: ContributorStatistics) -> Self {
            self.statistics
                .expect_get_statistics()
                .returning(move |_, _| Ok(stats.clone()));
            self
        }

        fn build(self) -> AwardService {
            let provider: Arc<dyn StatisticsProvider> = Arc::new(self.statistics);
            AwardService::new(
                Arc::new(self.users),
                Arc::new(self.repositories),
                Arc::new(BadgeCatalog::new(Arc::new(self.badges))),
                Arc::new(self.awards),
                Arc::new(self.memberships),
                StatisticsProviders::new(provider),
            )
        }
    }

    #[tokio::test]
    async fn test_awards_only_reached_thresholds() {
        let mut fixture = Fixture::new()
            .with_badges(tiered_badges())
            .with_user_stats(merged(5));
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(Vec::new()));
        let next_id = AtomicI64::new(1);
        fixture
            .awards
            .expect_create_award()
            .times(2)
            .returning(move |new| Ok(Some(award_from(new, next_id.fetch_add(1, Ordering::SeqCst)))));

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        let awarded: Vec<i64> = result.newly_awarded.iter().map(|a| a.badge_id).collect();
        assert_eq!(awarded, vec![1, 2]);
        assert!(result.newly_awarded.iter().all(|a| a.actual_value == 5));
        assert_eq!(result.evaluated_count, 3);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_reevaluation_is_idempotent() {
        let mut fixture = Fixture::new()
            .with_badges(tiered_badges())
            .with_user_stats(merged(5));
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(vec![existing_award(1), existing_award(2)]));
        fixture.awards.expect_create_award().never();

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        assert!(result.newly_awarded.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.already_awarded_count, 2);
        assert_eq!(result.evaluated_count, 1);
    }

    #[tokio::test]
    async fn test_unique_conflict_is_a_silent_no_op() {
        let mut fixture = Fixture::new()
            .with_badges(vec![badge(1, CriteriaType::Prs, 1)])
            .with_user_stats(merged(3));
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(Vec::new()));
        fixture
            .awards
            .expect_create_award()
            .times(1)
            .returning(|_| Ok(None));

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        assert!(result.newly_awarded.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_per_badge_error_does_not_abort() {
        let mut fixture = Fixture::new()
            .with_badges(tiered_badges())
            .with_user_stats(merged(5));
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(Vec::new()));
        fixture.awards.expect_create_award().times(2).returning(|new| {
            if new.badge_id == 1 {
                Err(BadgeError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(Some(award_from(new, 9)))
            }
        });

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        assert_eq!(result.awarded_count(), 1);
        assert_eq!(result.newly_awarded[0].badge_id, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].item, "badge:1");
    }

    #[tokio::test]
    async fn test_no_activity_returns_empty_result() {
        let mut fixture = Fixture::new().with_user_stats(ContributorStatistics::empty());
        fixture.badges.expect_list_active_badges().never();
        fixture.awards.expect_list_user_awards().never();

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        assert!(result.newly_awarded.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.evaluated_count, 0);
    }

    #[tokio::test]
    async fn test_statistics_failure_awards_nothing() {
        let mut fixture = Fixture::new();
        fixture
            .statistics
            .expect_get_statistics()
            .returning(|_, _| Err(BadgeError::UpstreamTimeout("pull_requests".to_string())));
        fixture.badges.expect_list_active_badges().never();
        fixture.awards.expect_create_award().never();

        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::System, AwardOptions::default())
            .await
            .unwrap();

        assert!(result.newly_awarded.is_empty());
        assert_eq!(result.statistics, ContributorStatistics::empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "UPSTREAM_TIMEOUT");
    }

    #[tokio::test]
    async fn test_force_recheck_skips_awarded_lookup() {
        let mut fixture = Fixture::new()
            .with_badges(tiered_badges())
            .with_user_stats(merged(5));
        fixture.awards.expect_list_user_awards().never();
        // 已持有的徽章在存储层去重
        fixture
            .awards
            .expect_create_award()
            .times(2)
            .returning(|_| Ok(None));

        let options = AwardOptions {
            force_recheck: true,
            ..Default::default()
        };
        let result = fixture
            .build()
            .award_for_user(7, 1, AwardTrigger::Manual, options)
            .await
            .unwrap();

        assert_eq!(result.evaluated_count, 3);
        assert!(result.newly_awarded.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_trigger_is_recorded_on_award() {
        let mut fixture = Fixture::new()
            .with_badges(vec![badge(1, CriteriaType::Prs, 1)])
            .with_user_stats(merged(1));
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(Vec::new()));
        fixture
            .awards
            .expect_create_award()
            .withf(|new| {
                new.awarded_by == crate::models::AwardedBy::Webhook
                    && new.metadata["deliveryId"] == "delivery-1"
            })
            .times(1)
            .returning(|new| Ok(Some(award_from(new, 1))));

        let trigger = AwardTrigger::Webhook {
            delivery_id: "delivery-1".to_string(),
        };
        let result = fixture.build().check_and_award(7, 1, trigger).await.unwrap();
        assert_eq!(result.awarded_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_repository_is_not_found() {
        let fixture = Fixture::new();
        let result = fixture
            .build()
            .award_for_user(7, 404, AwardTrigger::System, AwardOptions::default())
            .await;
        assert!(matches!(result, Err(BadgeError::RepositoryNotFound(404))));
    }

    #[tokio::test]
    async fn test_batch_covers_contributors_and_members() {
        let mut fixture = Fixture::new().with_badges(tiered_badges());
        fixture
            .statistics
            .expect_get_repository_statistics()
            .returning(|_| Ok(HashMap::from([(7, merged(5)), (8, merged(1))])));
        fixture.memberships.expect_list_by_repository().returning(|_| {
            Ok(vec![UserRepositoryMembership {
                id: 1,
                user_id: 99,
                repository_id: 1,
                role: MembershipRole::Owner,
                permissions: MembershipRole::Owner.permissions(),
                active: true,
                last_accessed_at: Utc::now(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }])
        });
        fixture
            .awards
            .expect_list_user_awards()
            .returning(|_, _| Ok(Vec::new()));
        fixture
            .awards
            .expect_create_award()
            .times(3)
            .returning(|new| Ok(Some(award_from(new, new.user_id * 10 + new.badge_id))));

        let batch = fixture
            .build()
            .award_for_repository(1, AwardOptions::default())
            .await
            .unwrap();

        assert_eq!(batch.contributors_evaluated, 3);
        assert_eq!(batch.total_awarded, 3);
        let owner = batch.results.iter().find(|r| r.user_id == 99).unwrap();
        assert!(owner.newly_awarded.is_empty());
        assert!(batch.errors.is_empty());
    }

    #[tokio::test]
    async fn test_batch_statistics_failure_awards_nothing() {
        let mut fixture = Fixture::new();
        fixture
            .statistics
            .expect_get_repository_statistics()
            .returning(|_| Err(BadgeError::MissingCredential(99)));
        fixture.memberships.expect_list_by_repository().never();
        fixture.awards.expect_create_award().never();

        let batch = fixture
            .build()
            .award_for_repository(1, AwardOptions::default())
            .await
            .unwrap();

        assert_eq!(batch.total_awarded, 0);
        assert_eq!(batch.errors.len(), 1);
    }
}
