//! Webhook 接入
//!
//! - `signature`: HMAC-SHA256 签名计算与校验
//! - `payload`: 按事件类型分类的载荷
//! - `gateway`: 单次投递的处理状态机

pub mod gateway;
pub mod payload;
pub mod signature;

pub use gateway::{
    DELIVERY_ID_HEADER, EVENT_TYPE_HEADER, SIGNATURE_HEADER, WebhookGateway, WebhookOutcome,
    WebhookRequest,
};
pub use payload::{ActivityKind, EventEnvelope, ParsedEvent, WebhookPayload};
