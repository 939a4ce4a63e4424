//! 仓储 Trait 定义
//!
//! 服务层依赖这些抽象而非具体实现，测试中使用 mockall 生成的 mock。
//! 导入事务中的写操作不走 trait，直接调用各仓储的 `*_in_tx` 静态函数。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Award, Badge, NewAward, NewWebhookEvent, PullRequestRecord, PullRequestUpsert,
    Repository, User, UserRepositoryMembership, WebhookEventRecord,
};

/// 用户仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_github_id(&self, github_id: i64) -> Result<Option<User>>;
    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;
}

/// 仓库仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RepoRepositoryTrait: Send + Sync {
    async fn get_repository(&self, id: i64) -> Result<Option<Repository>>;
    async fn find_by_github_id(&self, github_id: i64) -> Result<Option<Repository>>;
}

/// 徽章仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait BadgeRepositoryTrait: Send + Sync {
    /// 仓库内启用的徽章，按阈值升序
    async fn list_active_badges(&self, repository_id: i64) -> Result<Vec<Badge>>;
}

/// 授予记录仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AwardRepositoryTrait: Send + Sync {
    async fn list_user_awards(&self, user_id: i64, repository_id: i64) -> Result<Vec<Award>>;
    /// 创建授予记录；命中 (user_id, badge_id) 唯一约束时返回 None
    async fn create_award(&self, award: &NewAward) -> Result<Option<Award>>;
    /// 设置 acknowledged 标记；记录不存在或不属于该用户时返回 None
    async fn acknowledge(&self, user_id: i64, award_id: i64) -> Result<Option<Award>>;
}

/// PR 账本仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PullRequestRepositoryTrait: Send + Sync {
    async fn list_by_repository_user(
        &self,
        repository_id: i64,
        user_id: i64,
    ) -> Result<Vec<PullRequestRecord>>;
    /// 仓库全部 PR，user_id 为作者解析后的本地用户
    async fn list_by_repository(&self, repository_id: i64) -> Result<Vec<PullRequestRecord>>;
    async fn upsert(&self, record: &PullRequestUpsert) -> Result<PullRequestRecord>;
}

/// Webhook 事件仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait WebhookEventRepositoryTrait: Send + Sync {
    /// 记录投递；delivery_id 已存在时返回 None
    async fn record(&self, event: &NewWebhookEvent) -> Result<Option<WebhookEventRecord>>;
}

/// 成员关系仓储接口
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait MembershipRepositoryTrait: Send + Sync {
    async fn list_by_repository(&self, repository_id: i64)
    -> Result<Vec<UserRepositoryMembership>>;
}
