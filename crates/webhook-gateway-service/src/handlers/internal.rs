//! 内部接口处理器
//!
//! 暴露引擎的五个操作（以及授予记录确认）给同一部署内的 CRUD 层

use axum::{
    Json,
    extract::{Path, Query, State},
};
use badge_engine::dto::{
    AwardOptions, AwardResult, AwardTrigger, BadgeProgressReport, BatchAwardResult, ImportResult,
};
use badge_engine::models::{Award, Repository};
use tracing::info;

use crate::dto::{AcknowledgeRequest, ApiResponse, ImportRepositoriesRequest, ProgressQuery};
use crate::error::{GatewayError, Result};
use crate::state::AppState;

/// 导入仓库快照
///
/// POST /internal/repositories/import
pub async fn import_repositories(
    State(state): State<AppState>,
    Json(req): Json<ImportRepositoriesRequest>,
) -> Result<Json<ApiResponse<ImportResult>>> {
    if req.repositories.is_empty() {
        return Err(GatewayError::Validation("repositories 不能为空".to_string()));
    }

    let result = state
        .imports
        .import_repositories(req.user_id, &req.repositories)
        .await?;

    info!(
        user_id = req.user_id,
        imported = result.imported.len(),
        updated = result.updated.len(),
        "仓库导入请求完成"
    );
    Ok(Json(ApiResponse::success(result)))
}

/// 从上游同步仓库
///
/// POST /internal/repositories/{id}/sync
pub async fn sync_repository(
    State(state): State<AppState>,
    Path(repository_id): Path<i64>,
) -> Result<Json<ApiResponse<Repository>>> {
    let repository = state.imports.sync_repository(repository_id).await?;
    Ok(Json(ApiResponse::success(repository)))
}

/// 仓库批量评估
///
/// POST /internal/repositories/{id}/awards
pub async fn award_for_repository(
    State(state): State<AppState>,
    Path(repository_id): Path<i64>,
    Json(options): Json<AwardOptions>,
) -> Result<Json<ApiResponse<BatchAwardResult>>> {
    let result = state
        .awards
        .award_for_repository(repository_id, options)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 单用户人工触发评估
///
/// POST /internal/repositories/{id}/users/{user_id}/awards
pub async fn award_for_user(
    State(state): State<AppState>,
    Path((repository_id, user_id)): Path<(i64, i64)>,
    Json(options): Json<AwardOptions>,
) -> Result<Json<ApiResponse<AwardResult>>> {
    let result = state
        .awards
        .award_for_user(user_id, repository_id, AwardTrigger::Manual, options)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 徽章进度
///
/// GET /internal/repositories/{id}/users/{user_id}/progress
pub async fn badge_progress(
    State(state): State<AppState>,
    Path((repository_id, user_id)): Path<(i64, i64)>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ApiResponse<BadgeProgressReport>>> {
    let report = state
        .queries
        .get_badge_progress(user_id, repository_id, query.source)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// 确认授予记录
///
/// POST /internal/awards/{id}/acknowledge
pub async fn acknowledge_award(
    State(state): State<AppState>,
    Path(award_id): Path<i64>,
    Json(req): Json<AcknowledgeRequest>,
) -> Result<Json<ApiResponse<Award>>> {
    let award = state.queries.acknowledge_award(req.user_id, award_id).await?;
    Ok(Json(ApiResponse::success(award)))
}
