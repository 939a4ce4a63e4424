//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 唯一性不变量全部由数据库约束保证，写入使用 `INSERT ... ON CONFLICT`
//! - 事务控制由调用方（导入服务）决定，事务内操作以 `*_in_tx` 静态函数提供
//! - 定义 trait 接口以支持 mock 测试

mod award_repo;
mod badge_repo;
mod membership_repo;
mod pull_request_repo;
mod repo_repo;
mod traits;
mod user_repo;
mod webhook_event_repo;

pub use award_repo::AwardRepository;
pub use badge_repo::BadgeRepository;
pub use membership_repo::MembershipRepository;
pub use pull_request_repo::PullRequestRepository;
pub use repo_repo::RepoRepository;
pub use traits::*;
pub use user_repo::UserRepository;
pub use webhook_event_repo::WebhookEventRepository;
