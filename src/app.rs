use crate::{
    config::Config,
    error::Result,
    routes::api_routes,
    services::{loader, ChatCompletionsClient, LlmClient, RecommendationService, RestaurantDataStore},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::{info, warn};
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        let bind_address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}", bind_address);

        self.run_with_listener(listener).await
    }

    /// Load the dataset, wire the services and serve on an already bound listener.
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        info!("Loading restaurant dataset...");
        let records = loader::load_dataset(&self.config)
            .await
            .context("Failed to load restaurant dataset")?;
        let store = Arc::new(RestaurantDataStore::new(records));
        info!("Dataset ready with {} restaurants", store.len());

        if self.config.api_key().is_none() {
            warn!("APP_XAI_API_KEY is not set; recommendations will use retrieval order");
        }
        let client: Arc<dyn LlmClient> = Arc::new(ChatCompletionsClient::new(
            self.config.api_key(),
            &self.config.xai_base_url,
            self.config.llm_temperature,
        ));

        let recommendation_service = web::Data::new(RecommendationService::new(
            store,
            client,
            self.config.recommend_settings(),
        ));

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(recommendation_service.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
