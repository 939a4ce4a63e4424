//! Webhook 网关服务
//!
//! 徽章引擎的 HTTP 入口。
//!
//! ## 路由
//!
//! - `POST /webhook`：接收上游 Webhook 投递
//! - `GET /health`、`GET /ready`：存活与就绪探针
//! - `/internal/*`：内部令牌保护的引擎操作

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::GatewayError;
pub use routes::build_router;
pub use state::AppState;
