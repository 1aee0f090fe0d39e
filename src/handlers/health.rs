use actix_web::{get, web, HttpResponse};

use crate::models::HealthResponse;
use crate::services::RecommendationService;

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Distinct areas and cuisines for client-side filter dropdowns.
#[get("/metadata")]
pub async fn metadata(service: web::Data<RecommendationService>) -> HttpResponse {
    HttpResponse::Ok().json(service.metadata())
}
