//! 账本聚合策略
//!
//! 对本地 PR 账本求和并取首末时间。只有已合并 PR 的提交数与增删行数计入，
//! 与上游策略只对已合并 PR 拉取详情保持一致。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::StatisticsProvider;
use crate::error::Result;
use crate::models::{ContributorStatistics, PullRequestRecord, Repository, User};
use crate::repository::PullRequestRepositoryTrait;

/// 聚合一组 PR 记录
///
/// 结果只取决于记录内容，与顺序无关
pub fn aggregate_pull_requests<'a>(
    records: impl IntoIterator<Item = &'a PullRequestRecord>,
) -> ContributorStatistics {
    let mut stats = ContributorStatistics::empty();

    for record in records {
        stats.total_prs += 1;
        stats.observe(record.opened_at);

        if record.merged {
            stats.merged_prs += 1;
            stats.total_commits += i64::from(record.commits);
            stats.total_additions += i64::from(record.additions);
            stats.total_deletions += i64::from(record.deletions);
            if let Some(merged_at) = record.merged_at {
                stats.observe(merged_at);
            }
        }
    }

    stats
}

/// 基于本地 PR 账本的统计提供者
pub struct LedgerStatisticsProvider {
    pull_requests: Arc<dyn PullRequestRepositoryTrait>,
}

impl LedgerStatisticsProvider {
    pub fn new(pull_requests: Arc<dyn PullRequestRepositoryTrait>) -> Self {
        Self { pull_requests }
    }
}

#[async_trait]
impl StatisticsProvider for LedgerStatisticsProvider {
    #[instrument(skip(self, repository, user), fields(repository_id = repository.id, user_id = user.id))]
    async fn get_statistics(
        &self,
        repository: &Repository,
        user: &User,
    ) -> Result<ContributorStatistics> {
        let records = self
            .pull_requests
            .list_by_repository_user(repository.id, user.id)
            .await?;
        Ok(aggregate_pull_requests(&records))
    }

    #[instrument(skip(self, repository), fields(repository_id = repository.id))]
    async fn get_repository_statistics(
        &self,
        repository: &Repository,
    ) -> Result<HashMap<i64, ContributorStatistics>> {
        let records = self.pull_requests.list_by_repository(repository.id).await?;

        let mut by_user: HashMap<i64, Vec<&PullRequestRecord>> = HashMap::new();
        for record in &records {
            // 作者未关联本地用户的 PR 无法授予
            if let Some(user_id) = record.user_id {
                by_user.entry(user_id).or_default().push(record);
            }
        }

        Ok(by_user
            .into_iter()
            .map(|(user_id, records)| (user_id, aggregate_pull_requests(records)))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::MockPullRequestRepositoryTrait;
    use chrono::{DateTime, Duration, Utc};

    pub(crate) fn record(
        number: i32,
        user_id: Option<i64>,
        merged: bool,
        commits: i32,
        opened_at: DateTime<Utc>,
    ) -> PullRequestRecord {
        PullRequestRecord {
            id: i64::from(number),
            repository_id: 1,
            user_id,
            github_id: 10_000 + i64::from(number),
            number,
            title: format!("PR #{number}"),
            author_login: "octocat".to_string(),
            author_github_id: Some(1001),
            state: if merged { "closed" } else { "open" }.to_string(),
            merged,
            commits,
            additions: 10,
            deletions: 2,
            opened_at,
            merged_at: merged.then(|| opened_at + Duration::hours(4)),
            closed_at: merged.then(|| opened_at + Duration::hours(4)),
            updated_at: opened_at,
        }
    }

    pub(crate) fn repository() -> Repository {
        Repository {
            id: 1,
            github_id: 42,
            name: "widgets".to_string(),
            full_name: "acme/widgets".to_string(),
            owner_login: "acme".to_string(),
            description: None,
            language: Some("Rust".to_string()),
            visibility: "public".to_string(),
            stars_count: 0,
            forks_count: 0,
            default_branch: "main".to_string(),
            topics: Vec::new(),
            html_url: None,
            owner_id: 99,
            active: true,
            last_sync_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn user(id: i64) -> User {
        User {
            id,
            github_id: 1000 + id,
            username: format!("user{id}"),
            access_token: Some(format!("token-{id}")),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_aggregate_counts_only_merged_work() {
        let t0 = Utc::now() - Duration::days(10);
        let records = vec![
            record(1, Some(7), true, 3, t0),
            record(2, Some(7), false, 5, t0 + Duration::days(1)),
            record(3, Some(7), true, 4, t0 + Duration::days(2)),
        ];

        let stats = aggregate_pull_requests(&records);
        assert_eq!(stats.total_prs, 3);
        assert_eq!(stats.merged_prs, 2);
        assert_eq!(stats.total_commits, 7);
        assert_eq!(stats.total_additions, 20);
        assert_eq!(stats.total_deletions, 4);
        assert_eq!(stats.first_contribution, Some(t0));
        assert_eq!(
            stats.last_contribution,
            Some(t0 + Duration::days(2) + Duration::hours(4))
        );
    }

    #[test]
    fn test_aggregate_is_deterministic_and_order_independent() {
        let t0 = Utc::now() - Duration::days(3);
        let mut records = vec![
            record(1, Some(7), true, 1, t0),
            record(2, Some(7), true, 2, t0 + Duration::days(1)),
            record(3, Some(7), false, 0, t0 + Duration::days(2)),
        ];

        let first = aggregate_pull_requests(&records);
        let second = aggregate_pull_requests(&records);
        records.reverse();
        let reversed = aggregate_pull_requests(&records);

        assert_eq!(first, second);
        assert_eq!(first, reversed);
    }

    #[test]
    fn test_aggregate_empty() {
        let stats = aggregate_pull_requests(Vec::<PullRequestRecord>::new().iter());
        assert_eq!(stats, ContributorStatistics::empty());
        assert!(!stats.has_activity());
    }

    #[tokio::test]
    async fn test_repository_statistics_groups_by_user() {
        let t0 = Utc::now() - Duration::days(5);
        let mut repo = MockPullRequestRepositoryTrait::new();
        repo.expect_list_by_repository().returning(move |_| {
            Ok(vec![
                record(1, Some(7), true, 1, t0),
                record(2, Some(8), true, 2, t0),
                record(3, Some(7), true, 3, t0),
                record(4, None, true, 9, t0),
            ])
        });

        let provider = LedgerStatisticsProvider::new(Arc::new(repo));
        let stats = provider
            .get_repository_statistics(&repository())
            .await
            .unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[&7].merged_prs, 2);
        assert_eq!(stats[&7].total_commits, 4);
        assert_eq!(stats[&8].merged_prs, 1);
    }

    #[tokio::test]
    async fn test_user_statistics_from_ledger() {
        let t0 = Utc::now() - Duration::days(5);
        let mut repo = MockPullRequestRepositoryTrait::new();
        repo.expect_list_by_repository_user()
            .withf(|repository_id, user_id| *repository_id == 1 && *user_id == 7)
            .returning(move |_, _| Ok(vec![record(1, Some(7), true, 6, t0)]));

        let provider = LedgerStatisticsProvider::new(Arc::new(repo));
        let stats = provider
            .get_statistics(&repository(), &user(7))
            .await
            .unwrap();
        assert_eq!(stats.merged_prs, 1);
        assert_eq!(stats.total_commits, 6);
    }
}
