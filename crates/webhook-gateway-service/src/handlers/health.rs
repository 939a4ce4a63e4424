//! 健康检查

use axum::{Json, extract::State, http::StatusCode};

use crate::state::AppState;

/// 存活探针
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "webhook-gateway-service"
    }))
}

/// 就绪探针：检查数据库连接
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = state.db.health_check().await.is_ok();
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "service": "webhook-gateway-service",
            "checks": {
                "database": if db_ok { "ok" } else { "fail" }
            }
        })),
    )
}
