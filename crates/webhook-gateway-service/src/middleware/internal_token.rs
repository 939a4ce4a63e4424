//! 内部接口令牌认证中间件
//!
//! 内部路由供同一部署内的 CRUD 层调用，通过 X-Internal-Token 头传递共享令牌。
//! 比较双方令牌的 SHA-256 摘要，耗时与令牌内容无关。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::GatewayError;
use crate::state::AppState;

/// 内部令牌 Header 名称
pub const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// 定长摘要逐字节比较，不提前返回
fn digests_match(provided: &str, expected: &str) -> bool {
    digest(provided)
        .iter()
        .zip(digest(expected).iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// 内部令牌认证中间件
pub async fn internal_token_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some(expected) = state.internal_token.as_deref().filter(|t| !t.is_empty()) else {
        warn!("未配置内部接口令牌，拒绝请求");
        return Err(GatewayError::Unauthorized("内部接口未启用".to_string()));
    };

    let provided = request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::Unauthorized("缺少内部令牌".to_string()))?;

    if !digests_match(provided, expected) {
        warn!(path = %request.uri().path(), "内部令牌无效");
        return Err(GatewayError::Unauthorized("内部令牌无效".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digests_match() {
        assert!(digests_match("s3cret", "s3cret"));
        assert!(!digests_match("s3cret", "s3cret "));
        assert!(!digests_match("", "s3cret"));
    }
}
