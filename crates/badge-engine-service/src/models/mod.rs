//! 徽章引擎领域模型
//!
//! 包含仓库、徽章、授予记录、成员关系、PR 账本与 Webhook 审计等实体

pub mod award;
pub mod badge;
pub mod enums;
pub mod pull_request;
pub mod repository;
pub mod statistics;
pub mod user;
pub mod webhook_event;

// 重新导出常用类型
pub use award::{Award, NewAward};
pub use badge::{Badge, NewBadge, default_badge_set};
pub use enums::{
    AwardedBy, CriteriaType, MembershipRole, PERMISSION_MANAGE_BADGES, PERMISSION_READ,
    PERMISSION_SYNC,
};
pub use pull_request::{PullRequestRecord, PullRequestUpsert};
pub use repository::{
    Repository, RepositorySnapshot, SnapshotOwner, SnapshotPermissions, UserRepositoryMembership,
};
pub use statistics::ContributorStatistics;
pub use user::User;
pub use webhook_event::{NewWebhookEvent, WebhookEventRecord};
