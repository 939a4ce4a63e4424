//! 贡献者徽章引擎
//!
//! 根据贡献统计为仓库贡献者评估并授予徽章。
//!
//! ## 核心功能
//!
//! - **仓库导入/同步**：导入上游仓库快照，建立成员关系并为所有者初始化默认徽章
//! - **贡献统计**：从本地 PR 账本或上游 API 计算贡献者统计
//! - **资格评估**：按徽章的指标类型与阈值判断是否满足条件
//! - **徽章授予**：单用户实时评估与仓库级批量评估，授予记录由唯一约束去重
//! - **Webhook 接入**：签名校验、事件记录、触发实时评估
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `evaluator`: 资格评估
//! - `catalog`: 徽章目录
//! - `statistics`: 贡献统计提供者
//! - `upstream`: 上游 API 客户端
//! - `service`: 业务服务层
//! - `webhook`: Webhook 接入网关

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod repository;
pub mod service;
pub mod statistics;
pub mod upstream;
pub mod webhook;

pub use catalog::BadgeCatalog;
pub use error::{BadgeError, Result};
pub use models::*;
pub use repository::{
    AwardRepository, BadgeRepository, MembershipRepository, PullRequestRepository,
    RepoRepository, UserRepository, WebhookEventRepository,
};
pub use service::{
    AwardService, BadgeQueryService, ContributionAwarder, ImportService, dto,
};
pub use statistics::{
    LedgerStatisticsProvider, StatisticsProvider, StatisticsProviders, StatisticsSource,
    UpstreamStatisticsProvider,
};
pub use upstream::{GithubClient, UpstreamClient};
pub use webhook::{WebhookGateway, WebhookOutcome, WebhookRequest};
