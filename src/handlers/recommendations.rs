use crate::{
    error::ApiError,
    models::{validate_preference, RecommendationResponse},
    services::RecommendationService,
};
use actix_web::{web, HttpResponse, ResponseError};
use serde_json::Value;
use uuid::Uuid;

pub fn recommendations_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/recommend").route(web::post().to(recommend)));
}

/// Error body tagged with the request id.
fn error_response(err: ApiError, request_id: &str) -> HttpResponse {
    if err.status_code().is_server_error() {
        tracing::error!("Request {} failed: {}", request_id, err);
    }
    HttpResponse::build(err.status_code()).json(err.to_response(Some(request_id.to_string())))
}

/// Rank restaurants for a JSON preference object.
///
/// The body is taken raw so malformed JSON is reported in the same error
/// shape as validation failures.
pub async fn recommend(
    body: web::Bytes,
    recommendation_service: web::Data<RecommendationService>,
) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();

    let raw = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => {
            return error_response(
                ApiError::BadRequest(
                    "Request body must be a JSON object with Content-Type: application/json"
                        .to_string(),
                ),
                &request_id,
            )
        }
    };

    let validated = match validate_preference(&raw) {
        Ok(validated) => validated,
        Err(err) => return error_response(err.into(), &request_id),
    };

    match recommendation_service.recommend(&validated).await {
        Ok(recommendations) => HttpResponse::Ok().json(RecommendationResponse {
            request_id,
            model_used: recommendation_service.model().to_string(),
            filters_applied: validated,
            recommendations,
        }),
        Err(err) => error_response(err, &request_id),
    }
}
