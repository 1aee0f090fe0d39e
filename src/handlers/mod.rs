pub mod health;
pub mod recommendations;

pub use health::{health_check, metadata};
pub use recommendations::recommendations_config;

#[cfg(test)]
mod tests {
    use crate::config::RecommendSettings;
    use crate::models::RestaurantRecord;
    use crate::routes::api_routes;
    use crate::services::llm_client::scripted::ScriptedLlmClient;
    use crate::services::{RecommendationService, RestaurantDataStore};
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn record(name: &str, location: &str, cuisines: &str, cost: &str, rate: &str) -> RestaurantRecord {
        RestaurantRecord {
            name: name.to_string(),
            location: Some(location.to_string()),
            listed_in_city: Some(location.to_string()),
            cuisines: Some(cuisines.to_string()),
            approx_cost: Some(cost.to_string()),
            rate: Some(rate.to_string()),
            ..RestaurantRecord::default()
        }
    }

    fn service(completion: &str) -> web::Data<RecommendationService> {
        let store = RestaurantDataStore::new(vec![
            record("Onesta", "Banashankari", "Italian, Pizza", "600", "4.6/5"),
            record("Addhuri Udupi Bhojana", "Banashankari", "South Indian", "300", "3.9/5"),
            record("Truffles", "Koramangala", "Cafe, American", "900", "4.4/5"),
            record("ONESTA", "Banashankari", "Italian", "600", "4.0/5"),
            record("Meghana Foods", "Indiranagar", "Biryani, North Indian", "1,000", "4.3/5"),
        ]);
        web::Data::new(RecommendationService::new(
            Arc::new(store),
            Arc::new(ScriptedLlmClient::replying(completion)),
            RecommendSettings::default(),
        ))
    }

    macro_rules! app {
        ($completion:expr) => {
            test::init_service(
                App::new()
                    .app_data(service($completion))
                    .service(api_routes()),
            )
            .await
        };
    }

    macro_rules! post {
        ($app:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/recommend")
                .insert_header(("content-type", "application/json"))
                .set_payload($body.to_string())
                .to_request();
            let resp = test::call_service($app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    #[actix_web::test]
    async fn test_health() {
        let app = app!("[]");
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_metadata_is_sorted() {
        let app = app!("[]");
        let req = test::TestRequest::get().uri("/api/metadata").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["areas"], json!(["Banashankari", "Indiranagar", "Koramangala"]));
        assert_eq!(body["cuisines"][0], "American");
    }

    #[actix_web::test]
    async fn test_recommend_happy_path() {
        let completion = json!([
            {"rank": 1, "restaurant_name": "Addhuri Udupi Bhojana", "explanation": "Cheap and tasty."},
            {"rank": 2, "restaurant_name": "Onesta", "explanation": "Higher rating."}
        ])
        .to_string();
        let app = app!(&completion);

        let (status, body) = post!(&app, r#"{"location": "Banashankari", "max_results": 2}"#);

        assert_eq!(status, StatusCode::OK);
        assert!(body["request_id"].is_string());
        assert_eq!(body["model_used"], "grok-2-latest");
        assert_eq!(body["filters_applied"], json!({"location": "Banashankari", "max_results": 2}));
        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["restaurant_name"], "Addhuri Udupi Bhojana");
        assert_eq!(recs[0]["rank"], 1);
        assert_eq!(recs[1]["restaurant_name"], "Onesta");
        assert_eq!(recs[1]["explanation"], "Higher rating.");
    }

    #[actix_web::test]
    async fn test_empty_preference_uses_whole_pool_and_dedupes() {
        let app = app!("not json");
        let (status, body) = post!(&app, "{}");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filters_applied"], json!({}));
        let names: Vec<&str> = body["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["restaurant_name"].as_str().unwrap())
            .collect();
        // Rating order, one entry per name.
        assert_eq!(
            names,
            vec!["Onesta", "Truffles", "Meghana Foods", "Addhuri Udupi Bhojana"]
        );
        let ranks: Vec<i64> = body["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rank"].as_i64().unwrap())
            .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[actix_web::test]
    async fn test_validation_error_is_422_with_request_id() {
        let app = app!("[]");
        let (status, body) = post!(&app, r#"{"min_rating": 9, "mood": "cozy"}"#);

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Validation error");
        assert!(body["request_id"].is_string());
        let details = body["details"].as_array().unwrap();
        assert!(details.iter().any(|d| d == "Unknown fields: mood"));
        assert!(details.iter().any(|d| d == "min_rating must be <= 5"));
    }

    #[actix_web::test]
    async fn test_non_object_body_is_400() {
        let app = app!("[]");
        for body in ["not json", "[1, 2]", ""] {
            let (status, json) = post!(&app, body);
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Bad request");
            assert!(json["request_id"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_no_matches_is_empty_success() {
        let app = app!("[]");
        let (status, body) = post!(&app, r#"{"cuisine": "Ethiopian"}"#);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendations"], json!([]));
    }
}
