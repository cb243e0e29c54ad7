mod analysis;
mod config;
mod gemini;
mod routes;
mod vision;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use analysis::StylistService;
use config::AppConfig;
use gemini::{GeminiClient, VisionModel};
use routes::configure_routes;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(format!("Configuration error: {}", e)));
        }
    };

    let client = match GeminiClient::new(&config.model) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to create model client: {}", e);
            return Err(std::io::Error::other(format!("Model client error: {}", e)));
        }
    };
    log::info!(
        "Using model endpoint {} (timeout {}s)",
        client.endpoint(),
        config.model.timeout_secs
    );

    let model: Arc<dyn VisionModel> = Arc::new(client);
    let service = web::Data::new(StylistService::new(model, config.model.timeout()));
    let server_config = web::Data::new(config.server.clone());

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(service.clone())
            .app_data(server_config.clone())
            .configure(configure_routes)
    });

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await
}
