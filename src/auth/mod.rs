// src/auth/mod.rs
// DOCUMENTATION: Caller identity for write endpoints
// PURPOSE: Resolve the authenticated user id from the Authorization header

pub mod jwt;

pub use jwt::{issue_token, verify_token, Claims, JwtConfig};

use crate::errors::PlacesError;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

const AUTH_FAILED: &str = "Authentication failed!";

/// Authenticated caller extracted from `Authorization: Bearer <token>`
/// DOCUMENTATION: Add as a handler argument to require authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    fn from_request_sync(req: &HttpRequest) -> Result<Self, PlacesError> {
        let config = req.app_data::<web::Data<JwtConfig>>().ok_or_else(|| {
            log::error!("JwtConfig missing from application data");
            PlacesError::Internal("Something went wrong, please try again.".to_string())
        })?;

        let token = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlacesError::Unauthorized(AUTH_FAILED.to_string()))?;

        let claims = verify_token(token, config.get_ref()).map_err(|e| {
            log::warn!("Rejected bearer token: {}", e);
            PlacesError::Unauthorized(AUTH_FAILED.to_string())
        })?;

        Ok(Caller {
            user_id: claims.user_id,
        })
    }
}

impl FromRequest for Caller {
    type Error = PlacesError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_request_sync(req))
    }
}
