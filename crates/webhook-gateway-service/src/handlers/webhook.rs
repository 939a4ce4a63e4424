//! Webhook 接收处理器
//!
//! 以原始字节接收请求体，签名校验在网关内完成，之前不做任何解析。

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use badge_engine::webhook::{
    DELIVERY_ID_HEADER, EVENT_TYPE_HEADER, SIGNATURE_HEADER, WebhookOutcome, WebhookRequest,
};

use crate::dto::{ApiResponse, WebhookAck};
use crate::error::Result;
use crate::state::AppState;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 接收一次投递
///
/// POST /webhook
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookAck>>> {
    let request = WebhookRequest {
        event_type: header(&headers, EVENT_TYPE_HEADER),
        delivery_id: header(&headers, DELIVERY_ID_HEADER),
        signature: header(&headers, SIGNATURE_HEADER),
        body: body.to_vec(),
    };
    let delivery_id = request.delivery_id.clone().unwrap_or_default();

    let ack = match state.webhook.handle(request).await? {
        WebhookOutcome::Processed {
            event_id,
            dispatched,
            ..
        } => WebhookAck {
            status: "processed".to_string(),
            delivery_id,
            event_id: Some(event_id),
            dispatched,
        },
        WebhookOutcome::Duplicate { delivery_id } => WebhookAck {
            status: "duplicate".to_string(),
            delivery_id,
            event_id: None,
            dispatched: false,
        },
    };

    Ok(Json(ApiResponse::success(ack)))
}
