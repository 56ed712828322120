use std::time::{Duration, Instant};

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{error, trace};

use crate::analytics::AccountingSnapshot;
use crate::api::AppState;

const DIRECTORY_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub directory: DirectoryCheck,
    pub accounting: AccountingSnapshot,
    pub response_time_ms: u32,
}

#[derive(Debug, Serialize)]
pub struct DirectoryCheck {
    pub backend: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct HealthService;

impl HealthService {
    /// 链接目录不可达时返回 503，记账队列状态只做展示
    pub async fn readiness_check(state: web::Data<AppState>) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received readiness check");

        let backend = state.directory.backend_name();
        let error = match tokio::time::timeout(
            DIRECTORY_CHECK_TIMEOUT,
            state.directory.health_check(),
        )
        .await
        {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!("Link directory health check failed: {}", e);
                Some(e.to_string())
            }
            Err(_) => {
                error!("Link directory health check timed out");
                Some("timeout".to_string())
            }
        };

        let healthy = error.is_none();
        let body = ReadinessResponse {
            status: if healthy { "ready" } else { "unavailable" },
            directory: DirectoryCheck {
                backend,
                healthy,
                error,
            },
            accounting: state.accounting.stats(),
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        if healthy {
            HttpResponse::Ok().json(body)
        } else {
            HttpResponse::ServiceUnavailable().json(body)
        }
    }

    pub async fn liveness_check() -> impl Responder {
        HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health/live", web::get().to(HealthService::liveness_check))
        .route("/health/live", web::head().to(HealthService::liveness_check))
        .route("/health/ready", web::get().to(HealthService::readiness_check))
        .route("/health/ready", web::head().to(HealthService::readiness_check));
}
