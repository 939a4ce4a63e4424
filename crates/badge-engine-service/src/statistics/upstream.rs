//! 上游实时拉取策略
//!
//! 1. 分页拉取仓库全部 PR（state=all），按作者过滤
//! 2. 对已合并 PR 拉取详情，取提交数与增删行数
//! 3. 分页拉取按作者过滤的提交历史，覆盖 PR 之外的直接提交
//! 4. 提交数取两者最大值而非求和
//!
//! 第 4 步是近似值：PR 内提交与直接提交可能重叠，取最大值避免重复计数，
//! 但 squash 合并等情况下并不精确。
//!
//! 任一请求失败即整体失败，已聚合的部分结果被丢弃。分页受 `max_pages` 限制。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::StatisticsProvider;
use crate::error::{BadgeError, Result};
use crate::models::{ContributorStatistics, Repository, User};
use crate::repository::UserRepositoryTrait;
use crate::upstream::{UpstreamClient, UpstreamCommit, UpstreamPullRequest};

/// 合并两种提交计数
///
/// 近似：取最大值避免 PR 提交与直接提交重复计数
pub fn combine_commit_counts(pr_commits: i64, direct_commits: i64) -> i64 {
    pr_commits.max(direct_commits)
}

/// 基于上游 API 的统计提供者
pub struct UpstreamStatisticsProvider {
    client: Arc<dyn UpstreamClient>,
    users: Arc<dyn UserRepositoryTrait>,
    max_pages: u32,
}

impl UpstreamStatisticsProvider {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        users: Arc<dyn UserRepositoryTrait>,
        max_pages: u32,
    ) -> Self {
        Self {
            client,
            users,
            max_pages: max_pages.max(1),
        }
    }

    /// 解析访问令牌：优先查询用户自己的，其次仓库所有者的
    async fn resolve_token(&self, repository: &Repository, user: Option<&User>) -> Result<String> {
        if let Some(token) = user
            .filter(|u| u.has_credential())
            .and_then(|u| u.access_token.clone())
        {
            return Ok(token);
        }

        let owner = self
            .users
            .get_user(repository.owner_id)
            .await?
            .ok_or(BadgeError::UserNotFound(repository.owner_id))?;

        match owner.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(BadgeError::MissingCredential(
                user.map_or(repository.owner_id, |u| u.id),
            )),
        }
    }

    async fn fetch_pull_requests(
        &self,
        token: &str,
        full_name: &str,
    ) -> Result<Vec<UpstreamPullRequest>> {
        let page_size = self.client.page_size() as usize;
        let mut all = Vec::new();

        for page in 1..=self.max_pages {
            let batch = self
                .client
                .list_pull_requests(token, full_name, page)
                .await?;
            let is_last = batch.len() < page_size;
            all.extend(batch);
            if is_last {
                return Ok(all);
            }
        }

        warn!(full_name, max_pages = self.max_pages, "PR 列表达到分页上限，结果被截断");
        Ok(all)
    }

    async fn fetch_commits(
        &self,
        token: &str,
        full_name: &str,
        author: &str,
    ) -> Result<Vec<UpstreamCommit>> {
        let page_size = self.client.page_size() as usize;
        let mut all = Vec::new();

        for page in 1..=self.max_pages {
            let batch = self
                .client
                .list_commits(token, full_name, author, page)
                .await?;
            let is_last = batch.len() < page_size;
            all.extend(batch);
            if is_last {
                return Ok(all);
            }
        }

        warn!(full_name, author, max_pages = self.max_pages, "提交列表达到分页上限，结果被截断");
        Ok(all)
    }

    /// 在已拉取的 PR 列表上计算某个用户的统计
    async fn compute_for_user(
        &self,
        token: &str,
        repository: &Repository,
        pull_requests: &[UpstreamPullRequest],
        user: &User,
    ) -> Result<ContributorStatistics> {
        let mut stats = ContributorStatistics::empty();
        let mut pr_commits: i64 = 0;

        for pr in pull_requests
            .iter()
            .filter(|pr| pr.is_authored_by(user.github_id, &user.username))
        {
            stats.total_prs += 1;
            stats.observe(pr.created_at);

            if pr.is_merged() {
                let detail = self
                    .client
                    .get_pull_request(token, &repository.full_name, pr.number)
                    .await?;
                stats.merged_prs += 1;
                pr_commits += i64::from(detail.commits);
                stats.total_additions += i64::from(detail.additions);
                stats.total_deletions += i64::from(detail.deletions);
                if let Some(merged_at) = detail.merged_at.or(pr.merged_at) {
                    stats.observe(merged_at);
                }
            }
        }

        let commits = self
            .fetch_commits(token, &repository.full_name, &user.username)
            .await?;
        for authored_at in commits.iter().filter_map(UpstreamCommit::authored_at) {
            stats.observe(authored_at);
        }

        stats.total_commits = combine_commit_counts(pr_commits, commits.len() as i64);

        debug!(
            user_id = user.id,
            merged_prs = stats.merged_prs,
            pr_commits,
            direct_commits = commits.len(),
            "上游统计完成"
        );
        Ok(stats)
    }
}

#[async_trait]
impl StatisticsProvider for UpstreamStatisticsProvider {
    #[instrument(skip(self, repository, user), fields(repository_id = repository.id, user_id = user.id))]
    async fn get_statistics(
        &self,
        repository: &Repository,
        user: &User,
    ) -> Result<ContributorStatistics> {
        let token = self.resolve_token(repository, Some(user)).await?;
        let pull_requests = self
            .fetch_pull_requests(&token, &repository.full_name)
            .await?;
        self.compute_for_user(&token, repository, &pull_requests, user)
            .await
    }

    #[instrument(skip(self, repository), fields(repository_id = repository.id))]
    async fn get_repository_statistics(
        &self,
        repository: &Repository,
    ) -> Result<HashMap<i64, ContributorStatistics>> {
        let token = self.resolve_token(repository, None).await?;
        let pull_requests = self
            .fetch_pull_requests(&token, &repository.full_name)
            .await?;

        let mut author_ids: Vec<i64> = pull_requests.iter().map(|pr| pr.user.id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut result = HashMap::new();
        for github_id in author_ids {
            // 未注册的作者无法授予，跳过
            let Some(user) = self.users.find_by_github_id(github_id).await? else {
                continue;
            };
            let stats = self
                .compute_for_user(&token, repository, &pull_requests, &user)
                .await?;
            result.insert(user.id, stats);
        }

        info!(contributors = result.len(), "上游仓库统计完成");
        Ok(result)
    }
}
