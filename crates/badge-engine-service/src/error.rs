//! 徽章引擎错误类型
//!
//! 定义认证、资源缺失、上游拉取、唯一约束冲突和事务级故障等错误，
//! 并提供重试判定与事务故障判定，供导入服务决定整体回滚还是逐项记录。

use contrib_shared::error::InfraError;
use thiserror::Error;

/// 徽章引擎错误类型
#[derive(Debug, Error)]
pub enum BadgeError {
    // === 认证错误 ===
    #[error("Webhook 签名校验失败")]
    AuthenticationFailure,

    // === 资源不存在 ===
    #[error("仓库不存在: {0}")]
    RepositoryNotFound(i64),

    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    #[error("徽章不存在: {0}")]
    BadgeNotFound(i64),

    #[error("成员关系不存在: user_id={user_id}, repository_id={repository_id}")]
    MembershipNotFound { user_id: i64, repository_id: i64 },

    #[error("授予记录不存在: {0}")]
    AwardNotFound(i64),

    // === 上游错误 ===
    #[error("上游拉取失败: {endpoint} - {message}")]
    UpstreamFetch { endpoint: String, message: String },

    #[error("上游请求超时: {0}")]
    UpstreamTimeout(String),

    #[error("上游限流: {0}")]
    UpstreamRateLimited(String),

    #[error("上游资源不存在: {0}")]
    UpstreamNotFound(String),

    #[error("上游拒绝请求: {endpoint} - HTTP {status}")]
    UpstreamRejected { endpoint: String, status: u16 },

    #[error("缺少上游访问凭证: user_id={0}")]
    MissingCredential(i64),

    // === 冲突 ===
    #[error("唯一约束冲突: {entity} {key}")]
    Conflict { entity: String, key: String },

    // === 事务 ===
    #[error("事务失败: {0}")]
    Transaction(String),

    // === 请求错误 ===
    #[error("请求体不是合法 JSON: {0}")]
    MalformedPayload(String),

    #[error("缺少请求头: {0}")]
    MissingHeader(&'static str),

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("基础设施错误: {0}")]
    Infra(#[from] InfraError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 徽章引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, BadgeError>;

impl BadgeError {
    /// 构造上游拉取错误
    pub fn upstream(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 检查是否为可重试的错误
    ///
    /// 只有幂等的上游读请求会据此自动重试
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamTimeout(_) | Self::UpstreamRateLimited(_) => true,
            Self::UpstreamFetch { .. } => true,
            Self::Database(e) => is_connection_fault(e),
            Self::Infra(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// 是否为上游相关错误
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFetch { .. }
                | Self::UpstreamTimeout(_)
                | Self::UpstreamRateLimited(_)
                | Self::UpstreamNotFound(_)
                | Self::UpstreamRejected { .. }
                | Self::MissingCredential(_)
        )
    }

    /// 是否为事务级故障
    ///
    /// 连接断开、连接池耗尽等存储层故障会让整个导入事务回滚；
    /// 单条数据的约束错误、校验错误只记入逐项错误列表。
    pub fn is_transaction_fault(&self) -> bool {
        match self {
            Self::Transaction(_) => true,
            Self::Database(e) => is_connection_fault(e),
            Self::Infra(InfraError::Database(e)) => is_connection_fault(e),
            _ => false,
        }
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailure => "AUTHENTICATION_FAILURE",
            Self::RepositoryNotFound(_) => "REPOSITORY_NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::BadgeNotFound(_) => "BADGE_NOT_FOUND",
            Self::MembershipNotFound { .. } => "MEMBERSHIP_NOT_FOUND",
            Self::AwardNotFound(_) => "AWARD_NOT_FOUND",
            Self::UpstreamFetch { .. } => "UPSTREAM_FETCH_ERROR",
            Self::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            Self::UpstreamRateLimited(_) => "UPSTREAM_RATE_LIMITED",
            Self::UpstreamNotFound(_) => "UPSTREAM_NOT_FOUND",
            Self::UpstreamRejected { .. } => "UPSTREAM_REJECTED",
            Self::MissingCredential(_) => "MISSING_CREDENTIAL",
            Self::Conflict { .. } => "CONFLICT",
            Self::Transaction(_) => "TRANSACTION_ERROR",
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Self::MissingHeader(_) => "MISSING_HEADER",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Infra(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// 判断 sqlx 错误是否为连接级故障（而非单条语句的约束/数据错误）
/// 连接级故障：网络/连接池错误，以及服务端断开会话的 SQLSTATE
/// （08 类连接异常、57P01..57P03 管理员终止或服务关闭）
fn is_connection_fault(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| is_session_lost_state(&code)),
        _ => false,
    }
}

fn is_session_lost_state(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

/// 判断 sqlx 错误是否为唯一约束冲突（PostgreSQL 23505）
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl From<validator::ValidationErrors> for BadgeError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
