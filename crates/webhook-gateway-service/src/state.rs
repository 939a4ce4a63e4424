//! 应用状态定义

use std::sync::Arc;

use badge_engine::{AwardService, BadgeQueryService, ImportService, WebhookGateway};
use contrib_shared::database::Database;

/// Axum 应用共享状态
///
/// 各服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub webhook: Arc<WebhookGateway>,
    pub awards: Arc<AwardService>,
    pub imports: Arc<ImportService>,
    pub queries: Arc<BadgeQueryService>,
    /// 内部接口令牌，未配置时内部路由拒绝所有请求
    pub internal_token: Option<Arc<str>>,
}
