// src/models/user.rs
// DOCUMENTATION: Owner records for places
// PURPOSE: User identity plus the ids of the places it created

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner of places
/// DOCUMENTATION: `places` is the denormalized list of owned place ids,
/// kept in step with places.creator inside store transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub places: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a user through the seed binary or test fixtures
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl User {
    pub fn new(new_user: NewUser) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            image: new_user.image,
            places: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owns(&self, place_id: Uuid) -> bool {
        self.places.contains(&place_id)
    }
}
