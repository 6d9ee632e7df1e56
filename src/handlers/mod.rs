// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components and build the CORS middleware

pub mod health;
pub mod places;
pub mod uploads;

pub use health::config as health_config;
pub use places::config as places_config;
pub use uploads::config as uploads_config;

use actix_cors::Cors;
use actix_web::http::{header, Method};

/// CORS middleware from the configured origin list.
///
/// `*` allows any origin; otherwise the value is a comma-separated list of
/// exact origins. Preflights for other methods or headers are rejected.
pub fn cors(origins: &str) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allowed_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allowed_header("X-Requested-With")
        .max_age(3600);

    if origins.trim() == "*" {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}
