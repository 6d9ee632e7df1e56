// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, store, and start HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use places_api::auth::JwtConfig;
use places_api::config::{self, Config, StoreBackend};
use places_api::db::{MemoryPlaceStore, PlaceRepository, PlaceStore};
use places_api::handlers;
use places_api::services::{FixedGeocoder, Geocoder, ImageStorage};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting places-api...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize the store
    let store: Arc<dyn PlaceStore> = match config.store_backend {
        StoreBackend::Postgres => match config::init_db_pool(&config).await {
            Ok(pool) => Arc::new(PlaceRepository::new(pool)),
            Err(e) => {
                log::error!("Failed to connect to database: {}", e);
                std::process::exit(1);
            }
        },
        StoreBackend::Memory => {
            log::warn!("Using in-memory store - data is lost on restart");
            Arc::new(MemoryPlaceStore::new())
        }
    };

    // 5. Collaborators shared by every worker
    let geocoder: Arc<dyn Geocoder> = Arc::new(FixedGeocoder::default());
    let images = ImageStorage::new(&config.upload_dir, config.max_upload_bytes);
    let jwt = JwtConfig::new(config.jwt_key.clone());
    log::info!("Storing uploads in {}", config.upload_dir);

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let cors_origin = config.cors_origin.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(geocoder.clone()))
            .app_data(web::Data::new(images.clone()))
            .app_data(web::Data::new(jwt.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(handlers::cors(&cors_origin))
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::uploads_config)
            .configure(handlers::places_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
