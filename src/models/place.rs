// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Defines all serialization/deserialization models for API and storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Geographic coordinates of a place
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Represents a complete place record
/// DOCUMENTATION: Maps to the places table in PostgreSQL
/// The creator's users.places list holds this id while both records exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier (UUID v4)
    pub id: Uuid,

    /// Short title shown in listings
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Street address as submitted
    pub address: String,

    /// Coordinates resolved from the address
    pub location: Location,

    /// Path of the stored image file
    pub image: String,

    /// Id of the owning user
    pub creator: Uuid,

    /// When record was created
    pub created_at: DateTime<Utc>,

    /// When record was last modified
    pub updated_at: DateTime<Utc>,
}

/// Text fields of the multipart body for POST /api/places
/// DOCUMENTATION: `creator` is accepted for client compatibility only,
/// ownership always comes from the authenticated caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreatePlaceRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[validate(length(min = 5, message = "description must be at least 5 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "address must not be empty"))]
    pub address: String,

    #[serde(default)]
    pub creator: Option<String>,
}

/// Request DTO for PATCH /api/places/{pid}
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePlaceRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[validate(length(min = 5, message = "description must be at least 5 characters"))]
    pub description: String,
}

/// Response DTO for a single place
/// DOCUMENTATION: `id` and `creator` serialize as hyphenated UUID strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Location,
    pub image: String,
    pub creator: Uuid,
}

/// `{"place": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceEnvelope {
    pub place: PlaceResponse,
}

/// `{"places": [...]}`
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceListEnvelope {
    pub places: Vec<PlaceResponse>,
}

/// `{"message": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl Place {
    /// Build a new, not yet persisted place owned by `creator`
    pub fn new(
        title: String,
        description: String,
        address: String,
        location: Location,
        image: String,
        creator: Uuid,
    ) -> Self {
        let now = Utc::now();
        Place {
            id: Uuid::new_v4(),
            title,
            description,
            address,
            location,
            image,
            creator,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convert Place to PlaceResponse for API
    pub fn to_response(&self) -> PlaceResponse {
        PlaceResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            location: self.location,
            image: self.image.clone(),
            creator: self.creator,
        }
    }
}
