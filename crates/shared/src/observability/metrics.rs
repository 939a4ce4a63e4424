//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标
///
/// 描述会出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("badge_awards_total", "Total number of badges awarded");
    metrics::describe_counter!(
        "badge_evaluations_total",
        "Total number of contributor evaluations"
    );
    metrics::describe_histogram!(
        "award_evaluation_duration_seconds",
        "Contributor evaluation duration in seconds"
    );

    metrics::describe_counter!(
        "webhook_deliveries_total",
        "Total number of inbound webhook deliveries"
    );
    metrics::describe_counter!(
        "repository_imports_total",
        "Total number of imported or updated repositories"
    );
    metrics::describe_counter!(
        "upstream_requests_total",
        "Total number of upstream API requests"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// 记录徽章授予
#[inline]
pub fn record_badge_award(awarded_by: &str) {
    metrics::counter!("badge_awards_total", "awarded_by" => awarded_by.to_string()).increment(1);
}

/// 记录一次贡献者评估
#[inline]
pub fn record_evaluation(mode: &str, duration_secs: f64) {
    metrics::counter!("badge_evaluations_total", "mode" => mode.to_string()).increment(1);
    metrics::histogram!("award_evaluation_duration_seconds", "mode" => mode.to_string())
        .record(duration_secs);
}

/// 记录 Webhook 投递
#[inline]
pub fn record_webhook_delivery(event_type: &str, outcome: &str) {
    metrics::counter!(
        "webhook_deliveries_total",
        "event_type" => event_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录仓库导入结果
#[inline]
pub fn record_repository_import(status: &str) {
    metrics::counter!("repository_imports_total", "status" => status.to_string()).increment(1);
}

/// 记录上游 API 请求
#[inline]
pub fn record_upstream_request(endpoint: &str, outcome: &str) {
    metrics::counter!(
        "upstream_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
