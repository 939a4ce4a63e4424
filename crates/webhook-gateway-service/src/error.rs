//! 网关错误类型定义
//!
//! 将引擎错误映射为 HTTP 状态码与统一响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use badge_engine::BadgeError;
use serde_json::json;

/// 网关错误类型
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("未授权: {0}")]
    Unauthorized(String),

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] BadgeError),
}

impl GatewayError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e {
                BadgeError::AuthenticationFailure => StatusCode::UNAUTHORIZED,

                BadgeError::MalformedPayload(_)
                | BadgeError::MissingHeader(_)
                | BadgeError::Validation(_) => StatusCode::BAD_REQUEST,

                BadgeError::RepositoryNotFound(_)
                | BadgeError::UserNotFound(_)
                | BadgeError::BadgeNotFound(_)
                | BadgeError::MembershipNotFound { .. }
                | BadgeError::AwardNotFound(_) => StatusCode::NOT_FOUND,

                BadgeError::MissingCredential(_) => StatusCode::UNPROCESSABLE_ENTITY,

                BadgeError::UpstreamFetch { .. }
                | BadgeError::UpstreamTimeout(_)
                | BadgeError::UpstreamRateLimited(_)
                | BadgeError::UpstreamNotFound(_)
                | BadgeError::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,

                BadgeError::Conflict { .. } => StatusCode::CONFLICT,

                BadgeError::Transaction(_)
                | BadgeError::Database(_)
                | BadgeError::Serialization(_)
                | BadgeError::Infra(_)
                | BadgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Engine(e) => e.error_code(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx 只返回通用提示，详细信息仅记录日志
        let message = if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "请求处理失败");
            "服务内部错误，请稍后重试".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn all_error_variants() -> Vec<(GatewayError, StatusCode, &'static str)> {
        vec![
            (
                GatewayError::Engine(BadgeError::AuthenticationFailure),
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILURE",
            ),
            (
                GatewayError::Unauthorized("missing token".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                GatewayError::Engine(BadgeError::MalformedPayload("eof".into())),
                StatusCode::BAD_REQUEST,
                "MALFORMED_PAYLOAD",
            ),
            (
                GatewayError::Engine(BadgeError::MissingHeader("X-Event-Type")),
                StatusCode::BAD_REQUEST,
                "MISSING_HEADER",
            ),
            (
                GatewayError::Engine(BadgeError::RepositoryNotFound(3)),
                StatusCode::NOT_FOUND,
                "REPOSITORY_NOT_FOUND",
            ),
            (
                GatewayError::Engine(BadgeError::AwardNotFound(9)),
                StatusCode::NOT_FOUND,
                "AWARD_NOT_FOUND",
            ),
            (
                GatewayError::Engine(BadgeError::UpstreamRateLimited("/repos".into())),
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_RATE_LIMITED",
            ),
            (
                GatewayError::Engine(BadgeError::Transaction("connection reset".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "TRANSACTION_ERROR",
            ),
        ]
    }

    #[test]
    fn test_status_and_code_mapping() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "{error}");
            assert_eq!(error.error_code(), code, "{error}");
        }
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let response =
            GatewayError::Engine(BadgeError::Internal("pool exhausted".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("pool exhausted"));
    }
}
