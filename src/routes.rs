use actix_web::{web, Scope};

use crate::handlers::{health_check, metadata, recommendations_config};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .service(metadata)
        .configure(recommendations_config)
}
